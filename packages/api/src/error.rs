//! Error types for the routing kernel.

use interbus_packet::PacketError;

/// Errors internal to the kernel.
///
/// None of these reach a requester as a failure: the router folds wire-level
/// parse errors into a `noMatch` response, and only transport refusal
/// propagates to the caller of `route_packet`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Wire-level parse failure.
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    /// The transport collaborator refused an outbound packet.
    #[error("participant send failed: {message}")]
    Send { message: String },
}

impl Error {
    /// Build a transport refusal error.
    pub fn send(message: impl Into<String>) -> Self {
        Error::Send {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_error_conversion() {
        let packet_err = interbus_packet::Resource::parse("bad").unwrap_err();
        let e: Error = packet_err.into();
        assert!(matches!(e, Error::Packet(_)));
        assert!(format!("{}", e).contains("packet error"));
    }

    #[test]
    fn send_error_display() {
        let e = Error::send("peer gone");
        assert!(format!("{}", e).contains("peer gone"));
    }
}
