//! The packet shape shared by requests, replies, and notifications.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::ContentType;

/// The routing verbs the kernel understands.
///
/// Inbound packets carry a free-form action string; unknown strings fail
/// `parse` and the router answers them with `badAction`. This closed enum
/// is the dispatch key for the per-node-variant handler tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Get,
    Set,
    Delete,
    Watch,
    Unwatch,
    List,
}

impl Action {
    /// Parse the wire form of an action.
    pub fn parse(s: &str) -> Option<Action> {
        match s {
            "get" => Some(Action::Get),
            "set" => Some(Action::Set),
            "delete" => Some(Action::Delete),
            "watch" => Some(Action::Watch),
            "unWatch" => Some(Action::Unwatch),
            "list" => Some(Action::List),
            _ => None,
        }
    }

    /// The wire form of this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Get => "get",
            Action::Set => "set",
            Action::Delete => "delete",
            Action::Watch => "watch",
            Action::Unwatch => "unWatch",
            Action::List => "list",
        }
    }

    /// Whether this action may change a node's value.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Action::Set | Action::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response outcome taxonomy.
///
/// Every inbound packet yields exactly one of `Ok`, `BadAction`, `NoPerm`,
/// or `NoMatch` as its direct reply. `Changed` is reserved for asynchronous
/// watcher notifications. All outcomes are ordinary response values, never
/// thrown failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Successful get/set/delete/watch/unWatch/list.
    #[serde(rename = "ok")]
    Ok,
    /// Asynchronous notification to a watcher, not a direct reply.
    #[serde(rename = "changed")]
    Changed,
    /// No handler bound for the requested action on the resolved target.
    #[serde(rename = "badAction")]
    BadAction,
    /// Permission gate failed.
    #[serde(rename = "noPerm")]
    NoPerm,
    /// Version precondition mismatch, or structurally invalid resource.
    #[serde(rename = "noMatch")]
    NoMatch,
}

impl Outcome {
    /// The wire form of this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Changed => "changed",
            Outcome::BadAction => "badAction",
            Outcome::NoPerm => "noPerm",
            Outcome::NoMatch => "noMatch",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role of the hosting instance for one packet.
///
/// Leadership election happens upstream; the kernel only consumes the
/// result. Only a `Leader` originates `changed` notifications, preserving
/// single-writer semantics across replicated instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeaderState {
    Leader,
    Follower,
    Election,
}

/// One bus packet.
///
/// The same shape carries requests, direct replies, and `changed`
/// notifications; unused fields stay `None` and are skipped on the wire.
/// Fields are camelCase on the wire (`msgId`, `replyTo`, `ifTag`,
/// `contentType`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Packet {
    /// Target resource path. Absent (or `/`) addresses the root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Requested verb, free-form on the wire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    /// Opaque payload of `content_type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<JsonValue>,

    /// MIME-like hint for `entity`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,

    /// Expected node version for optimistic concurrency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_tag: Option<u64>,

    /// Correlation id of this packet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,

    /// Correlation id of the packet this one answers or cancels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    /// Originating participant address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    /// Destination participant address (replies and notifications).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,

    /// Outcome of a reply or notification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Outcome>,

    /// Capability tokens granted to the requester, resolved upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
}

impl Packet {
    /// Start a request packet for an action.
    pub fn request(action: Action) -> Self {
        Packet {
            action: Some(action.as_str().to_string()),
            ..Default::default()
        }
    }

    /// Set the target resource.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set the entity payload.
    pub fn with_entity(mut self, entity: JsonValue) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Set the content type hint.
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Set the expected version precondition.
    pub fn with_if_tag(mut self, if_tag: u64) -> Self {
        self.if_tag = Some(if_tag);
        self
    }

    /// Set the correlation id.
    pub fn with_msg_id(mut self, msg_id: impl Into<String>) -> Self {
        self.msg_id = Some(msg_id.into());
        self
    }

    /// Set the id of the packet this one answers or cancels.
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    /// Set the originating participant.
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Set the requester's granted capability tokens.
    pub fn with_permissions(mut self, permissions: Vec<String>) -> Self {
        self.permissions = Some(permissions);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_parse_known_verbs() {
        assert_eq!(Action::parse("get"), Some(Action::Get));
        assert_eq!(Action::parse("set"), Some(Action::Set));
        assert_eq!(Action::parse("delete"), Some(Action::Delete));
        assert_eq!(Action::parse("watch"), Some(Action::Watch));
        assert_eq!(Action::parse("unWatch"), Some(Action::Unwatch));
        assert_eq!(Action::parse("list"), Some(Action::List));
    }

    #[test]
    fn action_parse_rejects_unknown() {
        assert_eq!(Action::parse("OMG NO SUCH ACTION"), None);
        assert_eq!(Action::parse("unwatch"), None); // wire form is camelCase
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn action_roundtrips_through_wire_form() {
        for action in [
            Action::Get,
            Action::Set,
            Action::Delete,
            Action::Watch,
            Action::Unwatch,
            Action::List,
        ] {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
    }

    #[test]
    fn mutating_actions() {
        assert!(Action::Set.is_mutating());
        assert!(Action::Delete.is_mutating());
        assert!(!Action::Get.is_mutating());
        assert!(!Action::Watch.is_mutating());
        assert!(!Action::Unwatch.is_mutating());
        assert!(!Action::List.is_mutating());
    }

    #[test]
    fn outcome_wire_strings() {
        assert_eq!(serde_json::to_string(&Outcome::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&Outcome::BadAction).unwrap(),
            "\"badAction\""
        );
        assert_eq!(
            serde_json::to_string(&Outcome::NoPerm).unwrap(),
            "\"noPerm\""
        );
        assert_eq!(
            serde_json::to_string(&Outcome::NoMatch).unwrap(),
            "\"noMatch\""
        );
        assert_eq!(
            serde_json::to_string(&Outcome::Changed).unwrap(),
            "\"changed\""
        );
    }

    #[test]
    fn packet_wire_fields_are_camel_case() {
        let packet = Packet::request(Action::Set)
            .with_resource("/node")
            .with_entity(json!({"bar": 2}))
            .with_content_type(ContentType::from_static("application/fake+json"))
            .with_if_tag(1)
            .with_msg_id("1234")
            .with_src("srcParticipant");

        let wire = serde_json::to_value(&packet).unwrap();
        assert_eq!(wire["action"], "set");
        assert_eq!(wire["resource"], "/node");
        assert_eq!(wire["contentType"], "application/fake+json");
        assert_eq!(wire["ifTag"], 1);
        assert_eq!(wire["msgId"], "1234");
        assert!(wire.get("replyTo").is_none());
        assert!(wire.get("dst").is_none());
    }

    #[test]
    fn packet_deserializes_sparse_json() {
        let packet: Packet = serde_json::from_str(
            r#"{"resource": "/node", "action": "get", "msgId": "1234", "src": "a"}"#,
        )
        .unwrap();
        assert_eq!(packet.resource.as_deref(), Some("/node"));
        assert_eq!(packet.action.as_deref(), Some("get"));
        assert_eq!(packet.msg_id.as_deref(), Some("1234"));
        assert!(packet.entity.is_none());
        assert!(packet.if_tag.is_none());
    }

    #[test]
    fn leader_state_wire_form() {
        assert_eq!(
            serde_json::to_string(&LeaderState::Leader).unwrap(),
            "\"leader\""
        );
        assert_eq!(
            serde_json::to_string(&LeaderState::Follower).unwrap(),
            "\"follower\""
        );
    }
}
