//! Content type hints for entity payloads.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A MIME-like hint about the shape of a node's entity.
///
/// Stored alongside the entity and cleared together with it. The kernel
/// never interprets the string; concrete APIs agree on the values they use.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentType(pub Cow<'static, str>);

impl ContentType {
    /// JSON payloads (`application/json`), the common case on the bus.
    pub const JSON: ContentType = ContentType(Cow::Borrowed("application/json"));

    /// Opaque binary payloads (`application/octet-stream`).
    pub const OCTET_STREAM: ContentType = ContentType(Cow::Borrowed("application/octet-stream"));

    /// Create a content type from a static string.
    pub const fn from_static(s: &'static str) -> Self {
        ContentType(Cow::Borrowed(s))
    }

    /// Create a content type from an owned string.
    pub fn new(s: impl Into<String>) -> Self {
        ContentType(Cow::Owned(s.into()))
    }

    /// Get the content type string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if this is the JSON content type.
    pub fn is_json(&self) -> bool {
        self == &Self::JSON
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&'static str> for ContentType {
    fn from(s: &'static str) -> Self {
        ContentType(Cow::Borrowed(s))
    }
}
