//! Document store access
//!
//! [`BookRepository`] is the seam between the HTTP handlers and persistence.
//! Two backends implement it:
//!
//! - [`MongoBookStore`] for `mongodb://` and `mongodb+srv://` URLs
//! - [`MemoryBookStore`] for `mem://`, used by tests and local runs
//!
//! [`BookStore`] picks one at startup from the configured URL, following the
//! same runtime scheme selection used for other connection strings.
//!
//! The repository only accepts validated payloads ([`NewBook`], [`BookPatch`])
//! and typed identifiers ([`BookId`]).

mod error;
mod memory;
mod mongo;

use std::future::Future;

pub use error::{StoreError, StoreErrorKind, StoreOperation};
pub use memory::MemoryBookStore;
pub use mongo::MongoBookStore;

use crate::books::{BookDocument, BookPatch, NewBook, PageWindow};
use crate::config::DatabaseConfig;
use crate::error::sanitize_url;
use crate::ids::BookId;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcome of a partial update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// A document with the identifier exists
    pub matched: bool,
    /// At least one field changed value
    pub modified: bool,
}

/// Persistence operations on the book collection
///
/// Uses RPITIT so implementations can be written with `async fn`.
pub trait BookRepository: Send + Sync {
    /// One window of the collection, sorted by `title` ascending.
    fn list(
        &self,
        window: PageWindow,
    ) -> impl Future<Output = StoreResult<Vec<BookDocument>>> + Send;

    /// The document with the given identifier, if any.
    fn find_by_id(
        &self,
        id: &BookId,
    ) -> impl Future<Output = StoreResult<Option<BookDocument>>> + Send;

    /// Insert a new document and return its assigned identifier.
    fn insert(&self, book: NewBook) -> impl Future<Output = StoreResult<BookId>> + Send;

    /// Delete by identifier. Returns `true` if a document was removed.
    fn delete(&self, id: &BookId) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Set the patch's fields on the matching document, leaving the rest
    /// untouched.
    fn merge(
        &self,
        id: &BookId,
        patch: BookPatch,
    ) -> impl Future<Output = StoreResult<UpdateOutcome>> + Send;

    /// Round-trip to the backend.
    fn ping(&self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Store selected at startup
#[derive(Debug, Clone)]
pub enum BookStore {
    /// MongoDB collection
    Mongo(MongoBookStore),
    /// In-process collection
    Memory(MemoryBookStore),
}

impl BookStore {
    /// Connect to the store named by the configured URL.
    ///
    /// A single attempt is made. The MongoDB backend pings the server before
    /// returning so an unreachable database fails startup.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        if config.is_in_memory() {
            tracing::info!(
                "Using in-memory book store: collection={}",
                config.collection
            );
            return Ok(Self::memory());
        }

        tracing::debug!("Connecting to MongoDB: {}", sanitize_url(&config.url));
        let store = MongoBookStore::connect(config).await?;
        Ok(Self::Mongo(store))
    }

    /// Empty in-process store
    pub fn memory() -> Self {
        Self::Memory(MemoryBookStore::new())
    }

    /// Backend name for logs and health output
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Mongo(_) => "mongodb",
            Self::Memory(_) => "memory",
        }
    }
}

impl BookRepository for BookStore {
    async fn list(&self, window: PageWindow) -> StoreResult<Vec<BookDocument>> {
        match self {
            Self::Mongo(store) => store.list(window).await,
            Self::Memory(store) => store.list(window).await,
        }
    }

    async fn find_by_id(&self, id: &BookId) -> StoreResult<Option<BookDocument>> {
        match self {
            Self::Mongo(store) => store.find_by_id(id).await,
            Self::Memory(store) => store.find_by_id(id).await,
        }
    }

    async fn insert(&self, book: NewBook) -> StoreResult<BookId> {
        match self {
            Self::Mongo(store) => store.insert(book).await,
            Self::Memory(store) => store.insert(book).await,
        }
    }

    async fn delete(&self, id: &BookId) -> StoreResult<bool> {
        match self {
            Self::Mongo(store) => store.delete(id).await,
            Self::Memory(store) => store.delete(id).await,
        }
    }

    async fn merge(&self, id: &BookId, patch: BookPatch) -> StoreResult<UpdateOutcome> {
        match self {
            Self::Mongo(store) => store.merge(id, patch).await,
            Self::Memory(store) => store.merge(id, patch).await,
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        match self {
            Self::Mongo(store) => store.ping().await,
            Self::Memory(store) => store.ping().await,
        }
    }
}
