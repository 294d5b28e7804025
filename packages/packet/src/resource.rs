//! Resource path type and matching patterns for dynamic nodes.

use std::fmt;

use regex::Regex;

use crate::PacketError;

/// A validated resource path.
///
/// Canonical form starts with `/`, components are separated by `/`, and no
/// component is empty. Whitespace and control characters are rejected so a
/// path can always travel inside a packet unescaped.
///
/// Ordering is lexicographic on the canonical string, which is what
/// collection reads and the root-level `list` action rely on.
///
/// # Examples
///
/// ```rust
/// use interbus_packet::Resource;
///
/// let r = Resource::parse("/foo/bar").unwrap();
/// assert_eq!(r.as_str(), "/foo/bar");
/// assert_eq!(r.components().count(), 2);
///
/// assert!(Resource::parse("foo").is_err());      // no leading slash
/// assert!(Resource::parse("/foo//bar").is_err()); // empty component
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Resource(String);

impl Resource {
    /// Parse a resource string, validating its shape.
    ///
    /// `/` alone is the root resource: it addresses the whole store rather
    /// than one node.
    pub fn parse(s: &str) -> Result<Self, PacketError> {
        let invalid = |message: &str| PacketError::InvalidResource {
            resource: s.to_string(),
            message: message.to_string(),
        };

        if s.is_empty() {
            return Err(invalid("empty resource"));
        }
        if !s.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("whitespace or control character"));
        }
        if s != "/" {
            for component in s[1..].split('/') {
                if component.is_empty() {
                    return Err(invalid("empty path component"));
                }
            }
        }

        Ok(Resource(s.to_string()))
    }

    /// The canonical path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the root resource (`/`), addressing the whole store.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Iterate over path components, root yielding none.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Whether this resource lives strictly under `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        self.0.len() > prefix.len() + 1
            && self.0.starts_with(prefix)
            && self.0.as_bytes()[prefix.len()] == b'/'
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Resource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A predicate over resources, used by dynamic (collection) nodes.
///
/// Backed by a regular expression over the canonical path string. The
/// `prefix` constructor covers the common "everything under this subtree"
/// case without hand-writing a regex.
#[derive(Clone, Debug)]
pub struct ResourcePattern(Regex);

impl ResourcePattern {
    /// Compile a pattern from a regular expression over path strings.
    pub fn new(pattern: &str) -> Result<Self, PacketError> {
        Ok(ResourcePattern(Regex::new(pattern)?))
    }

    /// A pattern matching every resource strictly under `prefix`.
    ///
    /// `prefix("/foo")` matches `/foo/1` and `/foo/a/b` but not `/foo`
    /// itself or `/foobar`.
    pub fn prefix(prefix: &str) -> Self {
        let escaped = regex::escape(prefix.trim_end_matches('/'));
        let regex = Regex::new(&format!("^{}/.+$", escaped))
            .expect("escaped prefix compiles as a regex");
        ResourcePattern(regex)
    }

    /// Test a resource against the pattern.
    pub fn matches(&self, resource: &Resource) -> bool {
        self.0.is_match(resource.as_str())
    }

    /// The pattern source string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
