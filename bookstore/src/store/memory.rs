//! In-process book store
//!
//! Selected with a `mem://` URL. Documents live in a `BTreeMap` keyed by
//! identifier behind a tokio `RwLock`. Listing sorts by `title` using the same
//! cross-type ordering a MongoDB sort applies: missing or `null` first, then
//! numbers, strings, objects, arrays, booleans.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use super::{BookRepository, StoreOperation, StoreResult, UpdateOutcome};
use crate::books::{BookDocument, BookPatch, Fields, NewBook, PageWindow};
use crate::ids::BookId;

#[derive(Debug, Default)]
struct Collection {
    books: BTreeMap<BookId, Fields>,
    /// Message returned by every operation while set
    #[cfg(test)]
    failure: Option<String>,
}

impl Collection {
    #[allow(clippy::unused_self)]
    fn check(&self, operation: StoreOperation) -> StoreResult<()> {
        #[cfg(test)]
        if let Some(message) = &self.failure {
            return Err(
                super::StoreError::connection_failed(message.clone()).with_operation(operation),
            );
        }
        let _ = operation;
        Ok(())
    }
}

/// Book store held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBookStore {
    inner: Arc<RwLock<Collection>>,
}

impl MemoryBookStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.inner.read().await.books.len()
    }

    /// Whether the store holds no documents
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.books.is_empty()
    }

    /// Make every subsequent operation fail with `message`, or clear the
    /// failure with `None`.
    #[cfg(test)]
    pub(crate) async fn set_failure(&self, message: Option<&str>) {
        self.inner.write().await.failure = message.map(str::to_string);
    }
}

impl BookRepository for MemoryBookStore {
    async fn list(&self, window: PageWindow) -> StoreResult<Vec<BookDocument>> {
        let collection = self.inner.read().await;
        collection.check(StoreOperation::FindAll)?;

        let mut books: Vec<(&BookId, &Fields)> = collection.books.iter().collect();
        // stable, so equal titles keep identifier order
        books.sort_by(|(_, a), (_, b)| compare_sort_keys(a.get("title"), b.get("title")));

        let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);

        Ok(books
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(id, fields)| BookDocument::new(*id, fields.clone()))
            .collect())
    }

    async fn find_by_id(&self, id: &BookId) -> StoreResult<Option<BookDocument>> {
        let collection = self.inner.read().await;
        collection.check(StoreOperation::FindById)?;

        Ok(collection
            .books
            .get(id)
            .map(|fields| BookDocument::new(*id, fields.clone())))
    }

    async fn insert(&self, book: NewBook) -> StoreResult<BookId> {
        let mut collection = self.inner.write().await;
        collection.check(StoreOperation::Insert)?;

        let id = BookId::new();
        collection.books.insert(id, book.into_fields());
        Ok(id)
    }

    async fn delete(&self, id: &BookId) -> StoreResult<bool> {
        let mut collection = self.inner.write().await;
        collection.check(StoreOperation::Delete)?;

        Ok(collection.books.remove(id).is_some())
    }

    async fn merge(&self, id: &BookId, patch: BookPatch) -> StoreResult<UpdateOutcome> {
        let mut collection = self.inner.write().await;
        collection.check(StoreOperation::Update)?;

        let Some(fields) = collection.books.get_mut(id) else {
            return Ok(UpdateOutcome::default());
        };

        let mut modified = false;
        for (key, value) in patch.into_fields() {
            if fields.get(&key) != Some(&value) {
                fields.insert(key, value);
                modified = true;
            }
        }

        Ok(UpdateOutcome {
            matched: true,
            modified,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.read().await.check(StoreOperation::Ping)
    }
}

/// Position of a value's type in the cross-type sort order
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Object(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Bool(_)) => 8,
    }
}

fn compare_sort_keys(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        // binary comparison, no collation
        (Some(Value::String(x)), Some(Value::String(y))) => x.as_bytes().cmp(y.as_bytes()),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
