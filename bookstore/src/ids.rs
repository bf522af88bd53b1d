//! Identifiers used by the service
//!
//! # Book IDs
//!
//! Books are addressed by the store-assigned document identifier: a 12-byte
//! ObjectId whose text form is exactly 24 hexadecimal characters.
//!
//! ```rust
//! use bookstore::ids::{is_valid_id, BookId};
//!
//! assert!(is_valid_id("65f1c0a2b3d4e5f601234567"));
//! assert!(!is_valid_id("not-an-id"));
//!
//! let id = BookId::parse("65f1c0a2b3d4e5f601234567").unwrap();
//! assert_eq!(id.to_string(), "65f1c0a2b3d4e5f601234567");
//! ```
//!
//! # Request IDs
//!
//! Request IDs use the TypeID format with UUIDv7 for time-sortability, which
//! makes them easy to correlate in logs: `req_01h455vb4pex5vsknk084sn02q`.

use std::fmt;

use http::Request;
use mongodb::bson::oid::ObjectId;
use mti::prelude::*;
use serde::{Serialize, Serializer};
use tower_http::request_id::{MakeRequestId, RequestId as TowerRequestId};

/// Length of the text form of a document identifier
pub const ID_HEX_LEN: usize = 24;

/// Returns true iff `s` is a well-formed document identifier.
///
/// Handlers call this before touching the store so malformed identifiers
/// never cause I/O.
#[must_use]
pub fn is_valid_id(s: &str) -> bool {
    s.len() == ID_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// A store-assigned book identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BookId(ObjectId);

impl BookId {
    /// Generate a fresh identifier.
    ///
    /// ObjectIds embed a timestamp, a per-process random value and a counter,
    /// so identifiers generated by one process are never reused.
    #[must_use]
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// Parse the 24-character hex form.
    pub fn parse(s: &str) -> Result<Self, BookIdError> {
        if !is_valid_id(s) {
            return Err(BookIdError::Malformed(s.to_string()));
        }
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|_| BookIdError::Malformed(s.to_string()))
    }

    /// Returns the lowercase hex form.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }

    /// Returns the underlying `ObjectId`.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for BookId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl Serialize for BookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Error type for book ID parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookIdError {
    /// The string is not 24 hexadecimal characters.
    #[error("'{0}' is not a valid document id")]
    Malformed(String),
}

/// A type-safe request identifier for log correlation.
///
/// Format: `req_<base32-encoded-uuidv7>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(MagicTypeId);

impl RequestId {
    /// The prefix used for request IDs
    pub const PREFIX: &'static str = "req";

    /// Creates a new request ID with a UUIDv7 (time-sortable).
    #[must_use]
    pub fn new() -> Self {
        Self(Self::PREFIX.create_type_id::<V7>())
    }

    /// Returns the request ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `MakeRequestId` implementation that generates `RequestId`s for tower-http.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeTypedRequestId;

impl MakeRequestId for MakeTypedRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<TowerRequestId> {
        let id = RequestId::new();
        let header_value = http::HeaderValue::from_str(id.as_str()).ok()?;
        Some(TowerRequestId::new(header_value))
    }
}
