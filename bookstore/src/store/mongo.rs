//! MongoDB book store
//!
//! Documents are stored untyped (`bson::Document`) because books are
//! schemaless beyond their required fields. JSON bodies are converted with
//! `bson::to_document` on the way in and rendered as relaxed Extended JSON on
//! the way out, with `_id` reduced to its hex string.

use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde_json::Value;

use super::{BookRepository, StoreError, StoreOperation, StoreResult, UpdateOutcome};
use crate::books::{BookDocument, BookPatch, NewBook, PageWindow, ID_FIELD};
use crate::config::DatabaseConfig;
use crate::error::sanitize_url;
use crate::ids::BookId;

/// Book collection in a MongoDB database
#[derive(Debug, Clone)]
pub struct MongoBookStore {
    database: Database,
    collection: Collection<Document>,
}

impl MongoBookStore {
    /// Connect and verify the server answers a ping.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url_safe = sanitize_url(&config.url);

        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| classify(StoreOperation::Connect, &e))?;
        options.connect_timeout = Some(config.connect_timeout());
        options.server_selection_timeout = Some(config.connect_timeout());

        let client =
            Client::with_options(options).map_err(|e| classify(StoreOperation::Connect, &e))?;
        let store = Self::from_client(&client, &config.database, &config.collection);

        if let Err(e) = store.ping().await {
            tracing::error!("Failed to connect to MongoDB at '{}': {}", url_safe, e);
            return Err(e.with_operation(StoreOperation::Connect));
        }

        tracing::info!(
            "MongoDB connected: url={}, db={}, collection={}",
            url_safe,
            config.database,
            config.collection
        );
        Ok(store)
    }

    /// Wrap an existing client
    pub fn from_client(client: &Client, database: &str, collection: &str) -> Self {
        let database = client.database(database);
        let collection = database.collection::<Document>(collection);
        Self {
            database,
            collection,
        }
    }
}

impl BookRepository for MongoBookStore {
    async fn list(&self, window: PageWindow) -> StoreResult<Vec<BookDocument>> {
        let op = StoreOperation::FindAll;
        // the server takes signed 64-bit skip and limit
        let skip = window.skip.min(i64::MAX as u64);
        let limit = i64::try_from(window.limit).unwrap_or(i64::MAX);

        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "title": 1 })
            .skip(skip)
            .limit(limit)
            .await
            .map_err(|e| classify(op, &e))?;

        let documents: Vec<Document> = cursor.try_collect().await.map_err(|e| classify(op, &e))?;
        documents
            .into_iter()
            .map(|document| to_book(document, op))
            .collect()
    }

    async fn find_by_id(&self, id: &BookId) -> StoreResult<Option<BookDocument>> {
        let op = StoreOperation::FindById;
        self.collection
            .find_one(doc! { "_id": id.object_id() })
            .await
            .map_err(|e| classify(op, &e))?
            .map(|document| to_book(document, op))
            .transpose()
    }

    async fn insert(&self, book: NewBook) -> StoreResult<BookId> {
        let op = StoreOperation::Insert;
        let document = bson::to_document(book.fields())
            .map_err(|e| StoreError::serialization_error(op, e.to_string()))?;

        let result = self
            .collection
            .insert_one(document)
            .await
            .map_err(|e| classify(op, &e))?;

        result
            .inserted_id
            .as_object_id()
            .map(BookId::from)
            .ok_or_else(|| {
                StoreError::database_error(
                    op,
                    format!("inserted _id is not an ObjectId: {}", result.inserted_id),
                )
            })
    }

    async fn delete(&self, id: &BookId) -> StoreResult<bool> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.object_id() })
            .await
            .map_err(|e| classify(StoreOperation::Delete, &e))?;
        Ok(result.deleted_count > 0)
    }

    async fn merge(&self, id: &BookId, patch: BookPatch) -> StoreResult<UpdateOutcome> {
        let op = StoreOperation::Update;
        let fields = bson::to_document(patch.fields())
            .map_err(|e| StoreError::serialization_error(op, e.to_string()))?;

        let result = self
            .collection
            .update_one(doc! { "_id": id.object_id() }, doc! { "$set": fields })
            .await
            .map_err(|e| classify(op, &e))?;

        Ok(UpdateOutcome {
            matched: result.matched_count > 0,
            modified: result.modified_count > 0,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| classify(StoreOperation::Ping, &e))
    }
}

/// Convert a stored document into its JSON form.
fn to_book(mut document: Document, op: StoreOperation) -> StoreResult<BookDocument> {
    let id = match document.remove(ID_FIELD) {
        Some(Bson::ObjectId(oid)) => BookId::from(oid),
        Some(other) => {
            return Err(StoreError::serialization_error(
                op,
                format!("document _id is not an ObjectId: {other}"),
            ))
        }
        None => {
            return Err(StoreError::serialization_error(
                op,
                "document has no _id",
            ))
        }
    };

    let Value::Object(fields) = Bson::Document(document).into_relaxed_extjson() else {
        return Err(StoreError::serialization_error(
            op,
            "document did not render as a JSON object",
        ));
    };

    Ok(BookDocument::new(id, fields))
}

/// Map a driver error onto the store error categories.
fn classify(op: StoreOperation, err: &mongodb::error::Error) -> StoreError {
    let message = err.to_string();
    match err.kind.as_ref() {
        ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut => {
            StoreError::timeout(op, message)
        }
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::ConnectionPoolCleared { .. }
        | ErrorKind::DnsResolve { .. } => {
            StoreError::connection_failed(message).with_operation(op)
        }
        ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_) => {
            StoreError::serialization_error(op, message)
        }
        _ => StoreError::database_error(op, message),
    }
}
