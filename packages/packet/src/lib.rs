//! Wire-level types for the interbus resource API kernel.
//!
//! This layer defines what travels on the inter-window bus:
//! - `Resource`: validated path addressing one node (plus `ResourcePattern`
//!   predicates for dynamic nodes)
//! - `Packet`: the one shape shared by requests, replies, and notifications
//! - `Action` / `Outcome` / `LeaderState`: the closed vocabularies routing
//!   decisions are made over
//! - `ContentType`: MIME-like hint for entity payloads
//!
//! The routing and storage semantics live one layer up in `interbus-api`.
//!
//! # Example
//!
//! ```rust
//! use interbus_packet::{Action, Packet, Resource};
//!
//! let packet = Packet::request(Action::Get)
//!     .with_resource("/node")
//!     .with_msg_id("1234")
//!     .with_src("srcParticipant");
//!
//! let resource = Resource::parse(packet.resource.as_deref().unwrap()).unwrap();
//! assert_eq!(resource.as_str(), "/node");
//! ```

mod content_type;
mod error;
mod packet;
mod resource;

pub use content_type::ContentType;
pub use error::PacketError;
pub use packet::{Action, LeaderState, Outcome, Packet};
pub use resource::{Resource, ResourcePattern};
