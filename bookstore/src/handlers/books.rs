//! Book collection endpoints
//!
//! Each handler validates its input before touching the store, then maps the
//! store outcome to a status and body. Store faults are never retried.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ApiOperation};
use crate::books::{BookDocument, BookPatch, Fields, NewBook, PageWindow};
use crate::ids::BookId;
use crate::state::AppState;
use crate::store::BookRepository;

/// Body of a successful create
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCreated {
    /// Confirmation message
    pub message: &'static str,
    /// Assigned identifier
    pub book_id: BookId,
    /// The submitted fields
    pub book: Fields,
}

/// Body of a successful delete
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDeleted {
    /// Confirmation message
    pub message: &'static str,
    /// Identifier of the removed book
    pub deleted_id: BookId,
}

/// Body of a successful partial update
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdated {
    /// Confirmation message
    pub message: &'static str,
    /// Identifier of the updated book
    pub updated_id: BookId,
    /// 1 when any stored value changed, else 0
    pub modified_count: u64,
}

fn parse_id(raw: &str, operation: ApiOperation) -> Result<BookId, ApiError> {
    BookId::parse(raw).map_err(|_| ApiError::invalid_id(operation))
}

/// First value of `key` among the decoded query pairs
fn first_param<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// `GET /api/books?page=N`
///
/// A repeated `page` uses its first value. An unreadable query string is
/// treated like an absent `page`.
pub async fn list_books(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<BookDocument>>, ApiError> {
    let pairs = query.map(|Query(pairs)| pairs).unwrap_or_default();
    let window = PageWindow::from_query(
        first_param(&pairs, "page"),
        state.config().books.page_size,
    );

    let books = state
        .store()
        .list(window)
        .await
        .map_err(|e| ApiError::store_fault(ApiOperation::List, &e))?;

    tracing::debug!(page = window.page, count = books.len(), "Listed books");
    Ok(Json(books))
}

/// `GET /api/books/{id}`
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookDocument>, ApiError> {
    let id = parse_id(&id, ApiOperation::Get)?;

    state
        .store()
        .find_by_id(&id)
        .await
        .map_err(|e| ApiError::store_fault(ApiOperation::Get, &e))?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(ApiOperation::Get))
}

/// `POST /api/books`
pub async fn create_book(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<BookCreated>), ApiError> {
    let op = ApiOperation::Create;
    let Json(body) = body.map_err(|r| ApiError::invalid_body(op, &r))?;

    let book = NewBook::validate(&body, state.config().books.required_field_policy)
        .map_err(|e| ApiError::validation(op, &e))?;
    let submitted = book.fields().clone();

    let book_id = state
        .store()
        .insert(book)
        .await
        .map_err(|e| ApiError::store_fault(op, &e))?;

    tracing::info!(book_id = %book_id, "Book added");
    Ok((
        StatusCode::CREATED,
        Json(BookCreated {
            message: "Book added successfully!",
            book_id,
            book: submitted,
        }),
    ))
}

/// `DELETE /api/books/{id}`
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookDeleted>, ApiError> {
    let op = ApiOperation::Delete;
    let id = parse_id(&id, op)?;

    let deleted = state
        .store()
        .delete(&id)
        .await
        .map_err(|e| ApiError::store_fault(op, &e))?;
    if !deleted {
        return Err(ApiError::not_found(op));
    }

    tracing::info!(book_id = %id, "Book deleted");
    Ok(Json(BookDeleted {
        message: "Book deleted successfully!",
        deleted_id: id,
    }))
}

/// `PATCH /api/books/{id}`
///
/// The identifier is checked before the body is looked at.
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<BookUpdated>, ApiError> {
    let op = ApiOperation::Update;
    let id = parse_id(&id, op)?;
    let Json(body) = body.map_err(|r| ApiError::invalid_body(op, &r))?;

    let patch = BookPatch::validate(&body, &state.config().books.mutable_fields)
        .map_err(|e| ApiError::validation(op, &e))?;

    let outcome = state
        .store()
        .merge(&id, patch)
        .await
        .map_err(|e| ApiError::store_fault(op, &e))?;
    if !outcome.matched {
        return Err(ApiError::not_found(op));
    }

    tracing::info!(book_id = %id, modified = outcome.modified, "Book updated");
    Ok(Json(BookUpdated {
        message: "Book updated successfully!",
        updated_id: id,
        modified_count: u64::from(outcome.modified),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, RequiredFieldPolicy};
    use crate::handlers::routes;
    use crate::store::{BookStore, MemoryBookStore};
    use axum::{
        body::Body,
        http::{header, Method, Request},
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;

    fn app_with(config: Config, store: &MemoryBookStore) -> Router {
        routes().with_state(AppState::new(config, BookStore::Memory(store.clone())))
    }

    fn app(store: &MemoryBookStore) -> Router {
        app_with(Config::default(), store)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        send_request(app, builder.body(body).unwrap()).await
    }

    async fn send_request(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn sample(title: &str) -> Value {
        json!({
            "title": title,
            "author": "B",
            "pages": 100,
            "genres": ["x"],
            "rating": 5,
        })
    }

    async fn create(app: &Router, body: Value) -> String {
        let (status, json) = send(app, Method::POST, "/api/books", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        json["bookId"].as_str().unwrap().to_string()
    }

    fn titles(json: &Value) -> Vec<&str> {
        json.as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_create_get_delete_lifecycle() {
        let store = MemoryBookStore::new();
        let app = app(&store);

        let (status, created) =
            send(&app, Method::POST, "/api/books", Some(sample("A"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["message"], "Book added successfully!");
        assert_eq!(created["book"], sample("A"));
        let id = created["bookId"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 24);

        let uri = format!("/api/books/{id}");
        let (status, book) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(book["_id"], id.as_str());
        for (key, value) in sample("A").as_object().unwrap() {
            assert_eq!(&book[key], value);
        }

        let (status, deleted) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            deleted,
            json!({"message": "Book deleted successfully!", "deletedId": id})
        );

        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Book not found"}));

        // deleting again is a 404, not a fault
        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Book not found."}));
    }

    #[tokio::test]
    async fn test_create_missing_fields() {
        let store = MemoryBookStore::new();
        let app = app(&store);

        let (status, body) =
            send(&app, Method::POST, "/api/books", Some(json!({"title": "A"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "All required fields (title, author, pages, genres, rating) must be provided."})
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_falsy_fields_by_default() {
        let store = MemoryBookStore::new();
        let app = app(&store);

        let mut body = sample("A");
        body["pages"] = json!(0);
        let (status, _) = send(&app, Method::POST, "/api/books", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut config = Config::default();
        config.books.required_field_policy = RequiredFieldPolicy::Present;
        let lenient = app_with(config, &store);
        let (status, _) = send(&lenient, Method::POST, "/api/books", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_rejects_client_identifier() {
        let store = MemoryBookStore::new();
        let app = app(&store);

        let mut body = sample("A");
        body["_id"] = json!("65f1c0a2b3d4e5f601234567");
        let (status, json) = send(&app, Method::POST, "/api/books", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("identifier"));
    }

    #[tokio::test]
    async fn test_create_malformed_json() {
        let store = MemoryBookStore::new();
        let app = app(&store);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/books")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let (status, body) = send_request(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request body is not valid JSON.");
        assert!(body["details"].is_string());

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/books")
            .body(Body::from(sample("A").to_string()))
            .unwrap();
        let (status, body) = send_request(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request body is not valid JSON.");
    }

    #[tokio::test]
    async fn test_list_pages_sorted_by_title() {
        let store = MemoryBookStore::new();
        let app = app(&store);
        for title in ["F", "B", "E", "A", "C", "D"] {
            create(&app, sample(title)).await;
        }

        let (status, page1) = send(&app, Method::GET, "/api/books", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&page1), vec!["A", "B", "C", "D"]);

        let (_, page2) = send(&app, Method::GET, "/api/books?page=2", None).await;
        assert_eq!(titles(&page2), vec!["E", "F"]);

        let (status, page3) = send(&app, Method::GET, "/api/books?page=3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page3, json!([]));

        let (status, huge) =
            send(&app, Method::GET, "/api/books?page=99999999999999999999", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(huge, json!([]));
    }

    #[tokio::test]
    async fn test_list_invalid_pages_match_first_page() {
        let store = MemoryBookStore::new();
        let app = app(&store);
        for title in ["C", "A", "E", "B", "D"] {
            create(&app, sample(title)).await;
        }

        let (_, first) = send(&app, Method::GET, "/api/books?page=1", None).await;
        for query in ["page=0", "page=-4", "page=abc", "page=", "page=1abc", "other=3"] {
            let (status, body) =
                send(&app, Method::GET, &format!("/api/books?{query}"), None).await;
            assert_eq!(status, StatusCode::OK, "{query}");
            assert_eq!(body, first, "{query}");
        }
    }

    #[tokio::test]
    async fn test_list_repeated_and_hex_pages() {
        let store = MemoryBookStore::new();
        let app = app(&store);
        for title in ["F", "B", "E", "A", "C", "D"] {
            create(&app, sample(title)).await;
        }

        for query in ["page=2&page=3", "page=2&page=1", "page=0x2", "other=1&page=%32"] {
            let (status, body) =
                send(&app, Method::GET, &format!("/api/books?{query}"), None).await;
            assert_eq!(status, StatusCode::OK, "{query}");
            assert_eq!(titles(&body), vec!["E", "F"], "{query}");
        }
    }

    #[tokio::test]
    async fn test_list_configured_page_size() {
        let store = MemoryBookStore::new();
        let mut config = Config::default();
        config.books.page_size = 2;
        let app = app_with(config, &store);
        for title in ["C", "A", "B"] {
            create(&app, sample(title)).await;
        }

        let (_, page2) = send(&app, Method::GET, "/api/books?page=2", None).await;
        assert_eq!(titles(&page2), vec!["C"]);
    }

    #[tokio::test]
    async fn test_malformed_ids_are_rejected_before_store_access() {
        let store = MemoryBookStore::new();
        let app = app(&store);
        store.set_failure(Some("store must not be reached")).await;

        let expected = json!({"error": "Id not a valid Document Id"});
        for id in ["123", "not-an-id", "65f1c0a2b3d4e5f60123456g", "aaaaaaaaaaaa"] {
            let uri = format!("/api/books/{id}");

            let (status, body) = send(&app, Method::GET, &uri, None).await;
            assert_eq!((status, &body), (StatusCode::BAD_REQUEST, &expected));

            let (status, body) = send(&app, Method::DELETE, &uri, None).await;
            assert_eq!((status, &body), (StatusCode::BAD_REQUEST, &expected));

            let (status, body) =
                send(&app, Method::PATCH, &uri, Some(json!({"title": "X"}))).await;
            assert_eq!((status, &body), (StatusCode::BAD_REQUEST, &expected));
        }
    }

    #[tokio::test]
    async fn test_patch_checks_id_before_body() {
        let store = MemoryBookStore::new();
        let app = app(&store);

        let request = Request::builder()
            .method(Method::PATCH)
            .uri("/api/books/bogus")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap();
        let (status, body) = send_request(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Id not a valid Document Id");
    }

    #[tokio::test]
    async fn test_patch_merges_fields() {
        let store = MemoryBookStore::new();
        let app = app(&store);
        let id = create(&app, sample("A")).await;
        let uri = format!("/api/books/{id}");

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"rating": 9}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Book updated successfully!", "updatedId": id, "modifiedCount": 1})
        );

        let (_, book) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(book["rating"], 9);
        assert_eq!(book["title"], "A");

        // same value again reports no modification
        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"rating": 9}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["modifiedCount"], 0);
    }

    #[tokio::test]
    async fn test_patch_unknown_id() {
        let store = MemoryBookStore::new();
        let app = app(&store);

        let uri = format!("/api/books/{}", BookId::new());
        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({"title": "X"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Book not found."}));
    }

    #[tokio::test]
    async fn test_patch_body_rejections() {
        let store = MemoryBookStore::new();
        let app = app(&store);
        let id = create(&app, sample("A")).await;
        let uri = format!("/api/books/{id}");

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No updates provided."}));

        let (status, body) =
            send(&app, Method::PATCH, &uri, Some(json!({"_id": id, "title": "X"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "The document identifier cannot be modified."}));

        let (status, body) =
            send(&app, Method::PATCH, &uri, Some(json!({"isbn": "978"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Fields not allowed in update: isbn"}));

        let (status, _) = send(&app, Method::PATCH, &uri, Some(json!(["title"]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // nothing was written
        let (_, book) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(book["title"], "A");
    }

    #[tokio::test]
    async fn test_store_faults_map_to_500() {
        let store = MemoryBookStore::new();
        let app = app(&store);
        let id = create(&app, sample("A")).await;
        let uri = format!("/api/books/{id}");
        store.set_failure(Some("connection reset")).await;

        let cases = [
            (Method::GET, "/api/books".to_string(), None, "Internal Server Error"),
            (Method::GET, uri.clone(), None, "Internal Server Error"),
            (
                Method::POST,
                "/api/books".to_string(),
                Some(sample("B")),
                "An error occurred while adding the book.",
            ),
            (
                Method::DELETE,
                uri.clone(),
                None,
                "An error occurred while deleting the book.",
            ),
            (
                Method::PATCH,
                uri.clone(),
                Some(json!({"title": "C"})),
                "An error occurred while updating the book.",
            ),
        ];

        for (method, uri, body, message) in cases {
            let (status, json) = send(&app, method, &uri, body).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(json, json!({"error": message, "details": "connection reset"}));
        }
    }
}
