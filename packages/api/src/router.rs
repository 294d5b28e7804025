//! The packet routing pipeline.
//!
//! One inbound packet travels resolve -> authorize -> precondition ->
//! dispatch -> notify, with an early exit carrying a failure outcome at any
//! gate. Every packet yields exactly one direct reply (`ok`, `badAction`,
//! `noPerm`, or `noMatch`) plus zero or more `changed` notifications to
//! watchers. Packets are processed one at a time; a node's version counter
//! and watcher list are never touched outside this pipeline.

use interbus_packet::{Action, LeaderState, Outcome, Packet, Resource};
use serde_json::Value as JsonValue;

use crate::context::{PacketContext, Participant};
use crate::store::{CreatePolicy, ResourceStore};
use crate::validate::{PermissionValidator, PreconditionValidator};
use crate::watch::WatchRegistry;
use crate::Error;

/// Where a packet is dispatched: the whole store, or one resolved node.
enum Target {
    Root,
    Node(Resource),
}

/// Routes inbound packets through the store and fans out change
/// notifications to watchers.
///
/// Owns the store and the transport collaborator. The returned future of
/// `route_packet` settles only after every reply has been queued on the
/// context and every notification accepted by the participant.
pub struct PacketRouter<P: Participant> {
    store: ResourceStore,
    participant: P,
}

impl<P: Participant> PacketRouter<P> {
    pub fn new(store: ResourceStore, participant: P) -> Self {
        Self { store, participant }
    }

    pub fn store(&self) -> &ResourceStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResourceStore {
        &mut self.store
    }

    pub fn participant(&self) -> &P {
        &self.participant
    }

    pub fn participant_mut(&mut self) -> &mut P {
        &mut self.participant
    }

    /// Route one inbound packet to completion.
    pub async fn route_packet(&mut self, ctx: &mut PacketContext) -> Result<(), Error> {
        let action = match ctx.packet().action.as_deref().and_then(Action::parse) {
            Some(action) => action,
            None => {
                let reply = ctx.make_reply(Outcome::BadAction);
                ctx.reply(reply);
                return Ok(());
            }
        };
        log::debug!(
            "routing {} {}",
            action,
            ctx.packet().resource.as_deref().unwrap_or("/")
        );

        // Collection membership snapshots must precede resolution: resolving
        // a mutating packet can already materialize the node.
        let dynamic_snapshots = if action.is_mutating() {
            self.dynamic_snapshots()
        } else {
            Vec::new()
        };

        let target = match self.resolve(action, ctx.packet()) {
            Ok(target) => target,
            Err(outcome) => {
                let reply = ctx.make_reply(outcome);
                ctx.reply(reply);
                return Ok(());
            }
        };

        // Permission and precondition gates apply to resolved nodes; root
        // actions have no node to check.
        let mut target_snapshot: Option<(u64, JsonValue)> = None;
        if let Target::Node(key) = &target {
            let node = match self.store.get(key) {
                Some(node) => node,
                None => {
                    let reply = ctx.make_reply(Outcome::NoMatch);
                    ctx.reply(reply);
                    return Ok(());
                }
            };
            let granted = ctx.packet().permissions.as_deref().unwrap_or(&[]);
            if !PermissionValidator::authorize(node.permissions(), granted) {
                let reply = ctx.make_reply(Outcome::NoPerm);
                ctx.reply(reply);
                return Ok(());
            }
            if !PreconditionValidator::check(node.version(), ctx.packet().if_tag) {
                let reply = ctx.make_reply(Outcome::NoMatch);
                ctx.reply(reply);
                return Ok(());
            }
            if action.is_mutating() {
                let entity = node
                    .as_value()
                    .and_then(|v| v.entity().cloned())
                    .unwrap_or(JsonValue::Null);
                target_snapshot = Some((node.version(), entity));
            }
        }

        match (&target, action) {
            (Target::Root, Action::List) => self.root_handle_list(ctx),
            (Target::Root, _) => {
                let reply = ctx.make_reply(Outcome::BadAction);
                ctx.reply(reply);
            }
            (Target::Node(key), Action::Get) => self.handle_get(key, ctx),
            (Target::Node(key), Action::Set) => self.handle_set(key, ctx),
            (Target::Node(key), Action::Delete) => self.handle_delete(key, ctx),
            (Target::Node(key), Action::Watch) => self.handle_watch(key, ctx),
            (Target::Node(key), Action::Unwatch) => self.handle_unwatch(key, ctx),
            (Target::Node(_), Action::List) => {
                let reply = ctx.make_reply(Outcome::BadAction);
                ctx.reply(reply);
            }
        }

        if action.is_mutating() && ctx.leader_state() == LeaderState::Leader {
            self.notify_changes(&target, target_snapshot, dynamic_snapshots)
                .await?;
        }

        Ok(())
    }

    /// Resolve the packet's target.
    ///
    /// Mutating actions resolve by exact path, creating on miss, and never
    /// through a dynamic predicate: a write under a collection's pattern
    /// must create the child, not address the collection. Structural path
    /// errors fold into `noMatch`.
    fn resolve(&mut self, action: Action, packet: &Packet) -> Result<Target, Outcome> {
        let raw = match packet.resource.as_deref() {
            None => return Ok(Target::Root),
            Some(raw) => raw,
        };
        let resource = Resource::parse(raw).map_err(|_| Outcome::NoMatch)?;
        if resource.is_root() {
            return Ok(Target::Root);
        }

        if action.is_mutating() {
            self.store.ensure(packet, &resource);
            return Ok(Target::Node(resource));
        }

        match self.store.lookup(&resource) {
            Some(node) => Ok(Target::Node(node.resource().clone())),
            None => match self.store.create_policy() {
                CreatePolicy::Always => {
                    self.store.ensure(packet, &resource);
                    Ok(Target::Node(resource))
                }
                CreatePolicy::WriteOnly => Err(Outcome::NoMatch),
            },
        }
    }

    fn handle_get(&mut self, key: &Resource, ctx: &mut PacketContext) {
        let node = match self.store.get(key) {
            Some(node) => node,
            None => {
                let reply = ctx.make_reply(Outcome::NoMatch);
                ctx.reply(reply);
                return;
            }
        };
        let (entity, content_type) = match node.as_collection() {
            Some(collection) => (Some(self.store.collection_entity(collection.pattern())), None),
            None => match node.as_value() {
                Some(value) => (value.entity().cloned(), value.content_type().cloned()),
                None => (None, None),
            },
        };
        let mut reply = ctx.make_reply(Outcome::Ok);
        reply.entity = entity;
        reply.content_type = content_type;
        ctx.reply(reply);
    }

    fn handle_set(&mut self, key: &Resource, ctx: &mut PacketContext) {
        let node = match self.store.get_mut(key) {
            Some(node) => node,
            None => {
                let reply = ctx.make_reply(Outcome::NoMatch);
                ctx.reply(reply);
                return;
            }
        };
        match node.as_value_mut() {
            Some(value) => {
                value.set(
                    ctx.packet().entity.clone(),
                    ctx.packet().content_type.clone(),
                );
                let reply = ctx.make_reply(Outcome::Ok);
                ctx.reply(reply);
            }
            // collections have no set handler
            None => {
                let reply = ctx.make_reply(Outcome::BadAction);
                ctx.reply(reply);
            }
        }
    }

    fn handle_delete(&mut self, key: &Resource, ctx: &mut PacketContext) {
        let node = match self.store.get_mut(key) {
            Some(node) => node,
            None => {
                let reply = ctx.make_reply(Outcome::NoMatch);
                ctx.reply(reply);
                return;
            }
        };
        match node.as_value_mut() {
            Some(value) => {
                value.clear();
                let reply = ctx.make_reply(Outcome::Ok);
                ctx.reply(reply);
            }
            None => {
                let reply = ctx.make_reply(Outcome::BadAction);
                ctx.reply(reply);
            }
        }
    }

    fn handle_watch(&mut self, key: &Resource, ctx: &mut PacketContext) {
        let node = match self.store.get_mut(key) {
            Some(node) => node,
            None => {
                let reply = ctx.make_reply(Outcome::NoMatch);
                ctx.reply(reply);
                return;
            }
        };
        let src = ctx.packet().src.clone().unwrap_or_default();
        let msg_id = ctx.packet().msg_id.clone().unwrap_or_default();
        WatchRegistry::subscribe(node, src, msg_id);
        let reply = ctx.make_reply(Outcome::Ok);
        ctx.reply(reply);
    }

    fn handle_unwatch(&mut self, key: &Resource, ctx: &mut PacketContext) {
        let node = match self.store.get_mut(key) {
            Some(node) => node,
            None => {
                let reply = ctx.make_reply(Outcome::NoMatch);
                ctx.reply(reply);
                return;
            }
        };
        let src = ctx.packet().src.clone().unwrap_or_default();
        let reply_to = ctx.packet().reply_to.clone().unwrap_or_default();
        WatchRegistry::unsubscribe(node, &src, &reply_to);
        let reply = ctx.make_reply(Outcome::Ok);
        ctx.reply(reply);
    }

    fn root_handle_list(&mut self, ctx: &mut PacketContext) {
        let paths: Vec<JsonValue> = self
            .store
            .list(None)
            .into_iter()
            .map(|r| JsonValue::String(r.as_str().to_string()))
            .collect();
        let mut reply = ctx.make_reply(Outcome::Ok);
        reply.entity = Some(JsonValue::Array(paths));
        ctx.reply(reply);
    }

    /// Current computed entity of every dynamic node, in registration order.
    fn dynamic_snapshots(&self) -> Vec<(Resource, JsonValue)> {
        self.store
            .dynamic_nodes()
            .iter()
            .filter_map(|resource| {
                let collection = self.store.get(resource)?.as_collection()?;
                Some((
                    resource.clone(),
                    self.store.collection_entity(collection.pattern()),
                ))
            })
            .collect()
    }

    /// Fan out `changed` notifications after a mutating dispatch.
    ///
    /// The target node notifies when its version moved; each dynamic node
    /// notifies (and advances its version) when its computed membership
    /// changed.
    async fn notify_changes(
        &mut self,
        target: &Target,
        target_snapshot: Option<(u64, JsonValue)>,
        dynamic_snapshots: Vec<(Resource, JsonValue)>,
    ) -> Result<(), Error> {
        if let (Target::Node(key), Some((old_version, old_entity))) = (target, target_snapshot) {
            if let Some(node) = self.store.get(key) {
                if node.version() != old_version {
                    let new_entity = node
                        .as_value()
                        .and_then(|v| v.entity().cloned())
                        .unwrap_or(JsonValue::Null);
                    WatchRegistry::notify(&mut self.participant, node, &old_entity, &new_entity)
                        .await?;
                }
            }
        }

        for (resource, old_list) in dynamic_snapshots {
            let new_list = match self.store.get(&resource).and_then(|n| n.as_collection()) {
                Some(collection) => self.store.collection_entity(collection.pattern()),
                None => continue,
            };
            if new_list != old_list {
                if let Some(node) = self.store.get_mut(&resource) {
                    node.bump_version();
                }
                if let Some(node) = self.store.get(&resource) {
                    WatchRegistry::notify(&mut self.participant, node, &old_list, &new_list)
                        .await?;
                }
            }
        }

        Ok(())
    }
}
