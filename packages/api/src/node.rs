//! Node variants stored at resource paths.

use interbus_packet::{ContentType, Resource, ResourcePattern};
use serde_json::Value as JsonValue;

/// A subscriber awaiting change notifications for one resource.
///
/// `msg_id` is the correlation id the original `watch` request was issued
/// under; a later `unWatch` names it in its own `replyTo` field to locate
/// the subscription to cancel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Watcher {
    /// Subscriber address notifications are sent to.
    pub src: String,
    /// Correlation id captured at subscription time.
    pub msg_id: String,
}

/// A versioned value cell at one resource path.
///
/// `entity` and `content_type` are set and cleared together. `version`
/// advances by exactly one per accepted `set` and resets to `0` on delete:
/// delete clears value state entirely rather than advancing history.
#[derive(Clone, Debug)]
pub struct ValueNode {
    resource: Resource,
    entity: Option<JsonValue>,
    content_type: Option<ContentType>,
    version: u64,
    permissions: Vec<String>,
    watchers: Vec<Watcher>,
}

impl ValueNode {
    /// Create an empty node at a resource, version 0.
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            entity: None,
            content_type: None,
            version: 0,
            permissions: Vec::new(),
            watchers: Vec::new(),
        }
    }

    /// Create a node with initial value state.
    ///
    /// Used by concrete APIs to seed well-known resources.
    pub fn with_entity(
        resource: Resource,
        entity: JsonValue,
        content_type: ContentType,
        version: u64,
    ) -> Self {
        Self {
            resource,
            entity: Some(entity),
            content_type: Some(content_type),
            version,
            permissions: Vec::new(),
            watchers: Vec::new(),
        }
    }

    /// Current entity, `None` when the node holds no value.
    pub fn entity(&self) -> Option<&JsonValue> {
        self.entity.as_ref()
    }

    /// Current content type hint.
    pub fn content_type(&self) -> Option<&ContentType> {
        self.content_type.as_ref()
    }

    /// Replace the value state, advancing the version by one.
    pub fn set(&mut self, entity: Option<JsonValue>, content_type: Option<ContentType>) {
        self.entity = entity;
        self.content_type = content_type;
        self.version += 1;
    }

    /// Clear to the empty state: no entity, no content type, version 0.
    pub fn clear(&mut self) {
        self.entity = None;
        self.content_type = None;
        self.version = 0;
    }
}

/// A derived node whose value is computed from the store.
///
/// Reading a collection yields the lexicographically ordered list of
/// resource paths currently matching its pattern, recomputed fresh on each
/// read. It has no settable entity of its own; `set`/`delete` have no
/// handler on a collection. Its version advances when the router observes
/// a membership change.
#[derive(Clone, Debug)]
pub struct CollectionNode {
    resource: Resource,
    pattern: ResourcePattern,
    version: u64,
    permissions: Vec<String>,
    watchers: Vec<Watcher>,
}

impl CollectionNode {
    /// Create a collection at a resource over a matching predicate.
    pub fn new(resource: Resource, pattern: ResourcePattern) -> Self {
        Self {
            resource,
            pattern,
            version: 0,
            permissions: Vec::new(),
            watchers: Vec::new(),
        }
    }

    /// The predicate member paths must satisfy.
    pub fn pattern(&self) -> &ResourcePattern {
        &self.pattern
    }
}

/// Closed set of node variants.
///
/// Plain value cells and store-derived collections share the same watcher,
/// permission, and version surface; only value nodes carry mutable entity
/// state.
#[derive(Clone, Debug)]
pub enum Node {
    Value(ValueNode),
    Collection(CollectionNode),
}

impl Node {
    /// The path this node lives at, immutable after creation.
    pub fn resource(&self) -> &Resource {
        match self {
            Node::Value(n) => &n.resource,
            Node::Collection(n) => &n.resource,
        }
    }

    /// Current version.
    pub fn version(&self) -> u64 {
        match self {
            Node::Value(n) => n.version,
            Node::Collection(n) => n.version,
        }
    }

    /// Advance the version by one.
    ///
    /// Value nodes bump through `ValueNode::set`; this is for collections,
    /// whose version moves when their computed membership changes.
    pub fn bump_version(&mut self) {
        match self {
            Node::Value(n) => n.version += 1,
            Node::Collection(n) => n.version += 1,
        }
    }

    /// Capability tokens required to act on this node; empty = unrestricted.
    pub fn permissions(&self) -> &[String] {
        match self {
            Node::Value(n) => &n.permissions,
            Node::Collection(n) => &n.permissions,
        }
    }

    /// Replace the required capability tokens.
    pub fn set_permissions(&mut self, permissions: Vec<String>) {
        match self {
            Node::Value(n) => n.permissions = permissions,
            Node::Collection(n) => n.permissions = permissions,
        }
    }

    /// Current watchers in subscription order.
    pub fn watchers(&self) -> &[Watcher] {
        match self {
            Node::Value(n) => &n.watchers,
            Node::Collection(n) => &n.watchers,
        }
    }

    /// Mutable access to the watcher list.
    pub fn watchers_mut(&mut self) -> &mut Vec<Watcher> {
        match self {
            Node::Value(n) => &mut n.watchers,
            Node::Collection(n) => &mut n.watchers,
        }
    }

    pub fn as_value(&self) -> Option<&ValueNode> {
        match self {
            Node::Value(n) => Some(n),
            Node::Collection(_) => None,
        }
    }

    pub fn as_value_mut(&mut self) -> Option<&mut ValueNode> {
        match self {
            Node::Value(n) => Some(n),
            Node::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionNode> {
        match self {
            Node::Value(_) => None,
            Node::Collection(n) => Some(n),
        }
    }
}
