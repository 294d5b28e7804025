//! Path-keyed node storage with dynamic lookup and lazy creation.

use std::collections::BTreeMap;

use interbus_packet::{Packet, Resource, ResourcePattern};
use serde_json::Value as JsonValue;

use crate::node::{CollectionNode, Node, ValueNode};

/// Builds nodes for paths referenced for the first time.
///
/// Concrete APIs supply their own factory so that a `set` on an unknown
/// path materializes a node of the right subtype instead of failing.
pub trait NodeFactory: Send + Sync {
    /// Construct a fresh node for `resource`, with the triggering packet
    /// available for subtype decisions.
    fn make_node(&self, packet: &Packet, resource: &Resource) -> Node;
}

/// Default factory: an empty value node at the referenced path.
pub struct ValueNodeFactory;

impl NodeFactory for ValueNodeFactory {
    fn make_node(&self, _packet: &Packet, resource: &Resource) -> Node {
        Node::Value(ValueNode::new(resource.clone()))
    }
}

/// Whether reads of unknown resources materialize an empty node.
///
/// Writes always materialize. The historical behavior is `Always`; flip to
/// `WriteOnly` to answer unknown-resource reads with `noMatch` instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CreatePolicy {
    /// Any reference creates the node.
    #[default]
    Always,
    /// Only mutating actions create.
    WriteOnly,
}

/// Mapping from resource path to node.
///
/// Exact lookup first; paths without an exact entry are tested against every
/// registered dynamic node's predicate in registration order. Keys are held
/// in a `BTreeMap` so enumeration is deterministic and already in the
/// lexicographic order `list` and collection reads promise.
///
/// Invariant: at most one node per path. Nodes are owned by the store and
/// never destroyed, only cleared to the empty state.
pub struct ResourceStore {
    nodes: BTreeMap<Resource, Node>,
    /// Dynamic node paths in registration order.
    dynamic: Vec<Resource>,
    factory: Box<dyn NodeFactory>,
    create_policy: CreatePolicy,
}

impl ResourceStore {
    /// An empty store with the default value-node factory.
    pub fn new() -> Self {
        Self::with_factory(Box::new(ValueNodeFactory))
    }

    /// An empty store creating unknown nodes through `factory`.
    pub fn with_factory(factory: Box<dyn NodeFactory>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            dynamic: Vec::new(),
            factory,
            create_policy: CreatePolicy::default(),
        }
    }

    /// Set the unknown-resource read policy.
    pub fn with_create_policy(mut self, policy: CreatePolicy) -> Self {
        self.create_policy = policy;
        self
    }

    pub fn create_policy(&self) -> CreatePolicy {
        self.create_policy
    }

    /// Insert a node under its own path, replacing any existing node there.
    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.resource().clone(), node);
    }

    /// Register a collection for pattern-based lookup in addition to its
    /// own exact path.
    pub fn add_dynamic_node(&mut self, node: CollectionNode) {
        let node = Node::Collection(node);
        let resource = node.resource().clone();
        self.nodes.insert(resource.clone(), node);
        self.dynamic.push(resource);
    }

    /// Exact-match access.
    pub fn get(&self, resource: &Resource) -> Option<&Node> {
        self.nodes.get(resource)
    }

    /// Exact-match mutable access.
    pub fn get_mut(&mut self, resource: &Resource) -> Option<&mut Node> {
        self.nodes.get_mut(resource)
    }

    /// Resolve a path: exact match first, then each dynamic node's
    /// predicate in registration order.
    pub fn lookup(&self, resource: &Resource) -> Option<&Node> {
        if self.nodes.contains_key(resource) {
            return self.nodes.get(resource);
        }
        for dynamic in &self.dynamic {
            if let Some(node) = self.nodes.get(dynamic) {
                if let Some(collection) = node.as_collection() {
                    if collection.pattern().matches(resource) {
                        return Some(node);
                    }
                }
            }
        }
        None
    }

    /// Return the node at an exact path, creating it via the factory when
    /// absent.
    ///
    /// Deliberately skips dynamic predicates: a write under a collection's
    /// pattern must create the child, not address the collection.
    pub fn ensure(&mut self, packet: &Packet, resource: &Resource) -> &mut Node {
        let factory = &self.factory;
        self.nodes.entry(resource.clone()).or_insert_with(|| {
            log::debug!("creating node at {}", resource);
            factory.make_node(packet, resource)
        })
    }

    /// All known resource paths in lexicographic order, optionally filtered.
    pub fn list(&self, pattern: Option<&ResourcePattern>) -> Vec<Resource> {
        self.nodes
            .keys()
            .filter(|r| pattern.map_or(true, |p| p.matches(r)))
            .cloned()
            .collect()
    }

    /// The computed entity of a collection: matching paths as a JSON array.
    pub fn collection_entity(&self, pattern: &ResourcePattern) -> JsonValue {
        JsonValue::Array(
            self.list(Some(pattern))
                .into_iter()
                .map(|r| JsonValue::String(r.as_str().to_string()))
                .collect(),
        )
    }

    /// Paths of registered dynamic nodes, in registration order.
    pub fn dynamic_nodes(&self) -> &[Resource] {
        &self.dynamic
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interbus_packet::{Action, ContentType};
    use serde_json::json;

    fn resource(s: &str) -> Resource {
        Resource::parse(s).unwrap()
    }

    fn seeded_store() -> ResourceStore {
        let mut store = ResourceStore::new();
        for i in 1..=3 {
            store.insert(Node::Value(ValueNode::with_entity(
                resource(&format!("/foo/{}", i)),
                json!({ "foo": i }),
                ContentType::JSON,
                1,
            )));
        }
        store
    }

    #[test]
    fn ensure_creates_missing_nodes() {
        let mut store = ResourceStore::new();
        let packet = Packet::request(Action::Set).with_resource("/node");
        let node = store.ensure(&packet, &resource("/node"));
        assert_eq!(node.version(), 0);
        assert_eq!(store.len(), 1);

        // second ensure returns the same node
        store
            .get_mut(&resource("/node"))
            .unwrap()
            .as_value_mut()
            .unwrap()
            .set(Some(json!(1)), None);
        let node = store.ensure(&packet, &resource("/node"));
        assert_eq!(node.version(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ensure_skips_dynamic_predicates() {
        let mut store = seeded_store();
        store.add_dynamic_node(CollectionNode::new(
            resource("/foo"),
            ResourcePattern::prefix("/foo"),
        ));

        let packet = Packet::request(Action::Set).with_resource("/foo/4");
        let node = store.ensure(&packet, &resource("/foo/4"));
        assert!(node.as_value().is_some());
        assert_eq!(node.resource().as_str(), "/foo/4");
    }

    #[test]
    fn lookup_prefers_exact_match() {
        let mut store = seeded_store();
        store.add_dynamic_node(CollectionNode::new(
            resource("/foo"),
            ResourcePattern::prefix("/foo"),
        ));

        let node = store.lookup(&resource("/foo/1")).unwrap();
        assert!(node.as_value().is_some());
    }

    #[test]
    fn lookup_falls_back_to_dynamic_in_registration_order() {
        let mut store = ResourceStore::new();
        store.add_dynamic_node(CollectionNode::new(
            resource("/all"),
            ResourcePattern::new("^/.+$").unwrap(),
        ));
        store.add_dynamic_node(CollectionNode::new(
            resource("/foo"),
            ResourcePattern::prefix("/foo"),
        ));

        // both patterns match; the first registered wins
        let node = store.lookup(&resource("/foo/99")).unwrap();
        assert_eq!(node.resource().as_str(), "/all");
    }

    #[test]
    fn lookup_missing_is_none() {
        let store = seeded_store();
        assert!(store.lookup(&resource("/nowhere")).is_none());
    }

    #[test]
    fn list_is_sorted_regardless_of_insertion_order() {
        let mut store = ResourceStore::new();
        for path in ["/c", "/a", "/b"] {
            store.insert(Node::Value(ValueNode::new(resource(path))));
        }
        let paths: Vec<String> = store
            .list(None)
            .into_iter()
            .map(|r| r.as_str().to_string())
            .collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn list_filters_by_pattern() {
        let mut store = seeded_store();
        store.insert(Node::Value(ValueNode::new(resource("/bar/1"))));
        let pattern = ResourcePattern::prefix("/foo");
        let paths: Vec<String> = store
            .list(Some(&pattern))
            .into_iter()
            .map(|r| r.as_str().to_string())
            .collect();
        assert_eq!(paths, vec!["/foo/1", "/foo/2", "/foo/3"]);
    }

    #[test]
    fn collection_entity_is_sorted_path_array() {
        let store = seeded_store();
        let pattern = ResourcePattern::prefix("/foo");
        assert_eq!(
            store.collection_entity(&pattern),
            json!(["/foo/1", "/foo/2", "/foo/3"])
        );
    }

    #[test]
    fn add_dynamic_node_registers_exact_path_too() {
        let mut store = ResourceStore::new();
        store.add_dynamic_node(CollectionNode::new(
            resource("/foo"),
            ResourcePattern::prefix("/foo"),
        ));
        assert!(store.get(&resource("/foo")).is_some());
        assert_eq!(store.dynamic_nodes().len(), 1);
    }

    #[test]
    fn custom_factory_decides_subtype() {
        struct CollectionFactory;
        impl NodeFactory for CollectionFactory {
            fn make_node(&self, _packet: &Packet, resource: &Resource) -> Node {
                Node::Collection(CollectionNode::new(
                    resource.clone(),
                    ResourcePattern::prefix(resource.as_str()),
                ))
            }
        }

        let mut store = ResourceStore::with_factory(Box::new(CollectionFactory));
        let packet = Packet::request(Action::Set).with_resource("/things");
        let node = store.ensure(&packet, &resource("/things"));
        assert!(node.as_collection().is_some());
    }
}
