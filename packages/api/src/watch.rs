//! Watcher subscription bookkeeping and change fan-out.

use interbus_packet::{Outcome, Packet};
use serde_json::{json, Value as JsonValue};

use crate::context::Participant;
use crate::node::{Node, Watcher};
use crate::Error;

/// Per-node subscriber list management and change notification.
///
/// Watcher entries live on the nodes themselves; this registry holds the
/// rules for adding, removing, and notifying them. Only the router calls
/// `notify`, only after an actual mutation, and only while the hosting
/// instance is the elected leader.
pub struct WatchRegistry;

impl WatchRegistry {
    /// Append a watcher entry.
    ///
    /// No duplicate-subscription key is enforced: re-watching appends, and
    /// each entry gets its own notification.
    pub fn subscribe(node: &mut Node, src: String, msg_id: String) {
        node.watchers_mut().push(Watcher { src, msg_id });
    }

    /// Remove the watcher entries whose correlation id equals `reply_to`.
    ///
    /// The correlation is asymmetric: an `unWatch` packet names the
    /// subscription to cancel via its own `replyTo` field, which must equal
    /// the `msgId` the original `watch` was issued under. The subscriber
    /// address must match as well.
    pub fn unsubscribe(node: &mut Node, src: &str, reply_to: &str) {
        node.watchers_mut()
            .retain(|w| !(w.src == src && w.msg_id == reply_to));
    }

    /// Emit one `changed` packet per watcher, in subscription order.
    ///
    /// Each notification is addressed to the watcher's subscriber,
    /// correlates back via the subscription's `msgId`, and carries the old
    /// and new values. Resolves once every packet has been accepted by the
    /// participant.
    pub async fn notify<P: Participant>(
        participant: &mut P,
        node: &Node,
        old_value: &JsonValue,
        new_value: &JsonValue,
    ) -> Result<(), Error> {
        for watcher in node.watchers() {
            let packet = Packet {
                response: Some(Outcome::Changed),
                dst: Some(watcher.src.clone()),
                reply_to: Some(watcher.msg_id.clone()),
                resource: Some(node.resource().as_str().to_string()),
                entity: Some(json!({
                    "oldValue": old_value,
                    "newValue": new_value,
                })),
                ..Default::default()
            };
            participant.send(packet).await?;
        }
        Ok(())
    }
}
