//! Error types for the wire layer.

/// Errors raised while parsing resources, patterns, or packets.
///
/// These are ordinary recoverable values: the router folds resource parse
/// failures into a `noMatch` response rather than letting them escape.
#[derive(thiserror::Error, Debug)]
pub enum PacketError {
    /// The resource string is not a valid path.
    #[error("invalid resource '{resource}': {message}")]
    InvalidResource { resource: String, message: String },

    /// A dynamic-node predicate failed to compile.
    #[error("invalid resource pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Packet (de)serialization failed.
    #[error("packet encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
