//! HTTP handlers for the book collection
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/api/books?page=N` | [`list_books`] |
//! | POST | `/api/books` | [`create_book`] |
//! | GET | `/api/books/{id}` | [`get_book`] |
//! | PATCH | `/api/books/{id}` | [`update_book`] |
//! | DELETE | `/api/books/{id}` | [`delete_book`] |
//!
//! Errors are returned as [`ApiError`], which renders the `{error, details}`
//! envelope with the matching status code.

mod books;
mod error;

pub use books::{
    create_book, delete_book, get_book, list_books, update_book, BookCreated, BookDeleted,
    BookUpdated,
};
pub use error::{
    ApiError, ApiErrorKind, ApiErrorResponse, ApiOperation, INVALID_ID_MESSAGE,
    INVALID_JSON_MESSAGE,
};

use axum::{routing::get, Router};

use crate::state::AppState;

/// Book routes, ready to be given state
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
}
