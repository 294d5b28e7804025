//! Shared routing and storage kernel for resource-style bus APIs.
//!
//! Independent execution contexts address, read, mutate, and subscribe to a
//! common set of named resources through packets; this crate is the kernel
//! every such API inherits:
//!
//! - `ResourceStore`: path-keyed nodes with dynamic-pattern lookup and lazy
//!   creation through an injected `NodeFactory`
//! - `ValueNode` / `CollectionNode`: versioned value cells and store-derived
//!   collections
//! - `PermissionValidator` / `PreconditionValidator`: capability and
//!   compare-and-swap gates
//! - `WatchRegistry`: per-node subscriptions and `changed` fan-out
//! - `PacketRouter`: the pipeline tying it all together
//!
//! Transport, leader election, and identity resolution live outside: the
//! kernel consumes a `Participant` for delivery, a `LeaderState` per packet,
//! and precomputed capability tokens on the packet. Only the elected leader
//! originates notifications, so replicated instances keep single-writer
//! semantics without consensus.
//!
//! # Example
//!
//! ```rust
//! use interbus_api::{BufferParticipant, PacketContext, PacketRouter, ResourceStore};
//! use interbus_packet::{Action, LeaderState, Packet};
//!
//! async fn set_and_get() -> Result<(), interbus_api::Error> {
//!     let mut router = PacketRouter::new(ResourceStore::new(), BufferParticipant::new());
//!
//!     let mut ctx = PacketContext::new(
//!         Packet::request(Action::Set)
//!             .with_resource("/node")
//!             .with_entity(serde_json::json!({"foo": 1}))
//!             .with_msg_id("1")
//!             .with_src("requester"),
//!         LeaderState::Leader,
//!     );
//!     router.route_packet(&mut ctx).await?;
//!     Ok(())
//! }
//! ```

mod context;
mod error;
mod node;
mod router;
mod store;
mod validate;
mod watch;

pub use context::{BufferParticipant, PacketContext, Participant};
pub use error::Error;
pub use node::{CollectionNode, Node, ValueNode, Watcher};
pub use router::PacketRouter;
pub use store::{CreatePolicy, NodeFactory, ResourceStore, ValueNodeFactory};
pub use validate::{PermissionValidator, PreconditionValidator};
pub use watch::WatchRegistry;

// Re-export wire types for convenience
pub use interbus_packet::{
    Action, ContentType, LeaderState, Outcome, Packet, PacketError, Resource, ResourcePattern,
};
