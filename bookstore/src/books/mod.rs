//! Book documents and the request-validation contract
//!
//! Books are schemaless JSON objects. Five fields are required on create;
//! anything else is passed through untouched. Validation produces the typed
//! payloads [`NewBook`] and [`BookPatch`], which are the only inputs the
//! store accepts, so an unvalidated body can never reach the database.

mod pagination;

pub use pagination::{parse_page, PageWindow, DEFAULT_PAGE_SIZE};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::RequiredFieldPolicy;
use crate::ids::BookId;

/// JSON object holding a document's fields
pub type Fields = Map<String, Value>;

/// Name of the identifier field
pub const ID_FIELD: &str = "_id";

/// Fields every new book must carry
pub const REQUIRED_FIELDS: [&str; 5] = ["title", "author", "pages", "genres", "rating"];

/// A stored book.
///
/// Serializes as the document's fields with `_id` rendered as hex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookDocument {
    /// Store-assigned identifier
    #[serde(rename = "_id")]
    pub id: BookId,
    /// Every other field, as stored
    #[serde(flatten)]
    pub fields: Fields,
}

impl BookDocument {
    /// Create a document from its identifier and fields.
    ///
    /// Any `_id` key inside `fields` is dropped in favour of `id`.
    pub fn new(id: BookId, mut fields: Fields) -> Self {
        fields.remove(ID_FIELD);
        Self { id, fields }
    }

    /// The `title` field, if present
    pub fn title(&self) -> Option<&Value> {
        self.fields.get("title")
    }
}

/// Validated payload for creating a book
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook(Fields);

impl NewBook {
    /// Validate a create request body.
    pub fn validate(body: &Value, policy: RequiredFieldPolicy) -> Result<Self, BookValidationError> {
        let Some(fields) = body.as_object() else {
            return Err(BookValidationError::MissingRequiredFields);
        };

        let all_present = REQUIRED_FIELDS
            .iter()
            .all(|name| fields.get(*name).is_some_and(|v| satisfies(v, policy)));
        if !all_present {
            return Err(BookValidationError::MissingRequiredFields);
        }

        if fields.contains_key(ID_FIELD) {
            return Err(BookValidationError::IdentifierSupplied);
        }

        Ok(Self(fields.clone()))
    }

    /// Borrow the fields
    pub fn fields(&self) -> &Fields {
        &self.0
    }

    /// Take the fields
    pub fn into_fields(self) -> Fields {
        self.0
    }
}

/// Validated set of fields for a partial update
#[derive(Debug, Clone, PartialEq)]
pub struct BookPatch(Fields);

impl BookPatch {
    /// Validate a partial-update body against the mutable-field allow-list.
    pub fn validate<S: AsRef<str>>(
        body: &Value,
        mutable_fields: &[S],
    ) -> Result<Self, BookValidationError> {
        let Some(fields) = body.as_object() else {
            return Err(BookValidationError::NotAnObject);
        };

        if fields.is_empty() {
            return Err(BookValidationError::EmptyUpdate);
        }

        if fields.contains_key(ID_FIELD) {
            return Err(BookValidationError::IdentifierImmutable);
        }

        let rejected: Vec<String> = fields
            .keys()
            .filter(|key| !mutable_fields.iter().any(|allowed| allowed.as_ref() == key.as_str()))
            .cloned()
            .collect();
        if !rejected.is_empty() {
            return Err(BookValidationError::FieldsNotAllowed(rejected));
        }

        Ok(Self(fields.clone()))
    }

    /// Borrow the fields
    pub fn fields(&self) -> &Fields {
        &self.0
    }

    /// Take the fields
    pub fn into_fields(self) -> Fields {
        self.0
    }
}

/// Rejections produced while validating request bodies
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookValidationError {
    /// A required field is absent or does not satisfy the policy
    #[error("All required fields (title, author, pages, genres, rating) must be provided.")]
    MissingRequiredFields,

    /// Create body carried an `_id`
    #[error("The document identifier is assigned by the store and cannot be supplied.")]
    IdentifierSupplied,

    /// Update body is not a JSON object
    #[error("Update body must be a JSON object.")]
    NotAnObject,

    /// Update body has no fields
    #[error("No updates provided.")]
    EmptyUpdate,

    /// Update body tried to set `_id`
    #[error("The document identifier cannot be modified.")]
    IdentifierImmutable,

    /// Update body names fields outside the allow-list
    #[error("Fields not allowed in update: {}", .0.join(", "))]
    FieldsNotAllowed(Vec<String>),
}

/// Whether a required field's value counts as provided.
fn satisfies(value: &Value, policy: RequiredFieldPolicy) -> bool {
    match policy {
        RequiredFieldPolicy::Present => !value.is_null(),
        RequiredFieldPolicy::Truthy => is_truthy(value),
    }
}

/// Truthiness used by the default required-field policy.
///
/// `null`, `false`, zero, the empty string and the empty array are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
