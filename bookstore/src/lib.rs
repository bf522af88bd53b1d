//! # bookstore
//!
//! HTTP CRUD service over a MongoDB collection of books.
//!
//! ## Features
//!
//! - **Paginated listing**: four books per page, sorted by title
//! - **CRUD by identifier**: get, create, delete and partial update
//! - **Validation before I/O**: malformed identifiers and bodies never reach the store
//! - **Pluggable store**: MongoDB, or an in-process store for `mem://` URLs
//! - **Middleware stack**: request IDs, panic recovery, body size limit, tracing
//! - **`.env` support**: deployment variables may live in `./.env`
//! - **Health checks**: liveness and readiness probes
//! - **Graceful shutdown**: SIGTERM and SIGINT
//!
//! ## Example
//!
//! ```rust,no_run
//! use bookstore::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = BookStore::connect(&config.database).await?;
//!     let state = AppState::new(config.clone(), store);
//!
//!     Server::new(config).serve(state).await
//! }
//! ```

pub mod books;
pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod state;
pub mod store;

/// Commonly used types
pub mod prelude {
    pub use crate::books::{
        BookDocument, BookPatch, BookValidationError, NewBook, PageWindow, REQUIRED_FIELDS,
    };
    pub use crate::config::{Config, RequiredFieldPolicy};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiOperation};
    pub use crate::health::{health, readiness};
    pub use crate::ids::{BookId, MakeTypedRequestId, RequestId};
    pub use crate::observability::init_tracing;
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::store::{
        BookRepository, BookStore, MemoryBookStore, MongoBookStore, StoreError, StoreErrorKind,
        StoreOperation,
    };
}
