//! Hypergraph entity records and their JSON wire form.
//!
//! Wire records are tagged by `type` (`node`, `context`, `ref`, `link`,
//! `connector`). Empty maps and absent parents are omitted when encoding and
//! default when decoding.

use std::collections::BTreeMap;

use hk_fi::{Fi, LAMBDA};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property map in insertion order.
pub type Properties = serde_json::Map<String, Value>;

/// role -> bound entity id -> anchor keys.
pub type Binds = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Fresh blank identifier (`_:<uuid>`).
pub fn blank_id() -> String {
    format!("_:{}", uuid::Uuid::new_v4())
}

// ============================================================================
// Anchors and interfaces
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnchorType {
    #[default]
    Spatial,
    Temporal,
    Text,
}

/// Descriptor stored under an anchor key in a node's `interfaces`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Interface {
    #[serde(rename = "type", default)]
    pub anchor_type: AnchorType,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(rename = "metaProperties", default, skip_serializing_if = "Properties::is_empty")]
    pub metaproperties: Properties,
}

/// A named pointer into a node's interface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Anchor {
    pub key: String,
    pub anchor_type: AnchorType,
    pub properties: Properties,
    pub metaproperties: Properties,
}

impl Anchor {
    pub fn new(key: impl Into<String>, anchor_type: AnchorType) -> Self {
        Self {
            key: key.into(),
            anchor_type,
            ..Self::default()
        }
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Payload shared by `node` and `context` records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Node {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(rename = "metaProperties", default, skip_serializing_if = "Properties::is_empty")]
    pub metaproperties: Properties,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub interfaces: BTreeMap<String, Interface>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn add_anchor(&mut self, anchor: Anchor) {
        self.interfaces.insert(
            anchor.key,
            Interface {
                anchor_type: anchor.anchor_type,
                properties: anchor.properties,
                metaproperties: anchor.metaproperties,
            },
        );
    }

    pub fn anchor(&self, key: &str) -> Option<Anchor> {
        self.interfaces.get(key).map(|i| Anchor {
            key: key.to_string(),
            anchor_type: i.anchor_type,
            properties: i.properties.clone(),
            metaproperties: i.metaproperties.clone(),
        })
    }
}

/// A second, context-scoped identity for an entity defined elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReferenceNode {
    pub id: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(rename = "metaProperties", default, skip_serializing_if = "Properties::is_empty")]
    pub metaproperties: Properties,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub interfaces: BTreeMap<String, Interface>,
}

impl ReferenceNode {
    pub fn new(id: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

// ============================================================================
// Connectors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorClass {
    Hierarchy,
    #[default]
    Facts,
    Reasoning,
    Constraint,
    Causal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RoleType {
    #[default]
    #[serde(rename = "n")]
    None,
    #[serde(rename = "s")]
    Subject,
    #[serde(rename = "o")]
    Object,
    #[serde(rename = "p")]
    Parent,
    #[serde(rename = "c")]
    Child,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Connector {
    pub id: String,
    #[serde(rename = "className", default)]
    pub class_name: ConnectorClass,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub roles: BTreeMap<String, RoleType>,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(rename = "metaProperties", default, skip_serializing_if = "Properties::is_empty")]
    pub metaproperties: Properties,
}

impl Connector {
    pub fn new(id: impl Into<String>, class_name: ConnectorClass) -> Self {
        Self {
            id: id.into(),
            class_name,
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>, role_type: RoleType) -> Self {
        self.roles.insert(role.into(), role_type);
        self
    }
}

// ============================================================================
// Links
// ============================================================================

/// A link's connector: a reference by id or an inline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkConnector {
    Id(String),
    Inline(Box<Connector>),
}

impl LinkConnector {
    pub fn id(&self) -> &str {
        match self {
            LinkConnector::Id(id) => id,
            LinkConnector::Inline(c) => &c.id,
        }
    }
}

impl Default for LinkConnector {
    fn default() -> Self {
        LinkConnector::Id(String::new())
    }
}

impl From<&str> for LinkConnector {
    fn from(id: &str) -> Self {
        LinkConnector::Id(id.to_string())
    }
}

impl From<String> for LinkConnector {
    fn from(id: String) -> Self {
        LinkConnector::Id(id)
    }
}

impl From<Connector> for LinkConnector {
    fn from(c: Connector) -> Self {
        LinkConnector::Inline(Box::new(c))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Link {
    pub id: String,
    pub connector: LinkConnector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub binds: Binds,
    #[serde(default, skip_serializing_if = "Properties::is_empty")]
    pub properties: Properties,
    #[serde(rename = "metaProperties", default, skip_serializing_if = "Properties::is_empty")]
    pub metaproperties: Properties,
}

impl Link {
    pub fn new(id: impl Into<String>, connector: impl Into<LinkConnector>) -> Self {
        Self {
            id: id.into(),
            connector: connector.into(),
            ..Self::default()
        }
    }

    /// Link with a fresh blank id.
    pub fn blank(connector: impl Into<LinkConnector>) -> Self {
        Self::new(blank_id(), connector)
    }

    /// `subject`/`object` link binding both entities whole.
    pub fn spo(connector: impl Into<LinkConnector>, subject: &str, object: &str) -> Self {
        let mut link = Self::blank(connector);
        link.add_bind("subject", subject);
        link.add_bind("object", object);
        link
    }

    /// `subject`/`object` link binding `(entity, anchor key)` pairs.
    pub fn anchored_spo(
        connector: impl Into<LinkConnector>,
        subject: (&str, &str),
        object: (&str, &str),
    ) -> Self {
        let mut link = Self::blank(connector);
        link.add_anchored_bind("subject", subject.0, subject.1);
        link.add_anchored_bind("object", object.0, object.1);
        link
    }

    /// `subject`/`object` link whose ends are addressed by FIs: the root id
    /// names the entity and the anchor chain becomes the anchor key.
    pub fn from_fis(connector: impl Into<LinkConnector>, subject: &Fi, object: &Fi) -> Self {
        let (s_id, s_anchor) = subject.split_root();
        let (o_id, o_anchor) = object.split_root();
        let mut link = Self::blank(connector);
        link.add_anchored_bind("subject", &s_id, s_anchor.as_deref().unwrap_or(LAMBDA));
        link.add_anchored_bind("object", &o_id, o_anchor.as_deref().unwrap_or(LAMBDA));
        link
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn add_bind(&mut self, role: &str, entity: &str) {
        self.add_anchored_bind(role, entity, LAMBDA);
    }

    pub fn add_anchored_bind(&mut self, role: &str, entity: &str, anchor: &str) {
        self.binds
            .entry(role.to_string())
            .or_default()
            .entry(entity.to_string())
            .or_default()
            .push(anchor.to_string());
    }

    pub fn connector_id(&self) -> &str {
        self.connector.id()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.binds.keys().map(String::as_str)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.binds.contains_key(role)
    }

    /// Entity ids bound to `role`.
    pub fn bound(&self, role: &str) -> Vec<&str> {
        self.binds
            .get(role)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// `(entity id, anchor keys)` pairs bound to `role`.
    pub fn bound_with_anchors(&self, role: &str) -> Vec<(&str, &[String])> {
        self.binds
            .get(role)
            .map(|m| m.iter().map(|(k, v)| (k.as_str(), v.as_slice())).collect())
            .unwrap_or_default()
    }

    pub fn first_bound(&self, role: &str) -> Option<&str> {
        self.binds.get(role)?.keys().next().map(String::as_str)
    }

    /// Every bound entity id, across roles.
    pub fn bound_ids(&self) -> impl Iterator<Item = &str> {
        self.binds.values().flat_map(|m| m.keys().map(String::as_str))
    }
}

// ============================================================================
// Entity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Node,
    Context,
    Reference,
    Link,
    Connector,
}

impl EntityKind {
    /// Wire tag for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::Node => "node",
            EntityKind::Context => "context",
            EntityKind::Reference => "ref",
            EntityKind::Link => "link",
            EntityKind::Connector => "connector",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "node" => EntityKind::Node,
            "context" => EntityKind::Context,
            "ref" => EntityKind::Reference,
            "link" => EntityKind::Link,
            "connector" => EntityKind::Connector,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Entity {
    Node(Node),
    Context(Node),
    #[serde(rename = "ref")]
    Reference(ReferenceNode),
    Link(Link),
    Connector(Connector),
}

impl Entity {
    pub fn node(id: impl Into<String>) -> Self {
        Entity::Node(Node::new(id))
    }

    pub fn context(id: impl Into<String>) -> Self {
        Entity::Context(Node::new(id))
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Node(_) => EntityKind::Node,
            Entity::Context(_) => EntityKind::Context,
            Entity::Reference(_) => EntityKind::Reference,
            Entity::Link(_) => EntityKind::Link,
            Entity::Connector(_) => EntityKind::Connector,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Node(n) | Entity::Context(n) => &n.id,
            Entity::Reference(r) => &r.id,
            Entity::Link(l) => &l.id,
            Entity::Connector(c) => &c.id,
        }
    }

    pub fn parent(&self) -> Option<&str> {
        match self {
            Entity::Node(n) | Entity::Context(n) => n.parent.as_deref(),
            Entity::Reference(r) => r.parent.as_deref(),
            Entity::Link(l) => l.parent.as_deref(),
            Entity::Connector(_) => None,
        }
    }

    pub fn properties(&self) -> &Properties {
        match self {
            Entity::Node(n) | Entity::Context(n) => &n.properties,
            Entity::Reference(r) => &r.properties,
            Entity::Link(l) => &l.properties,
            Entity::Connector(c) => &c.properties,
        }
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        match self {
            Entity::Node(n) | Entity::Context(n) => &mut n.properties,
            Entity::Reference(r) => &mut r.properties,
            Entity::Link(l) => &mut l.properties,
            Entity::Connector(c) => &mut c.properties,
        }
    }

    pub fn metaproperties(&self) -> &Properties {
        match self {
            Entity::Node(n) | Entity::Context(n) => &n.metaproperties,
            Entity::Reference(r) => &r.metaproperties,
            Entity::Link(l) => &l.metaproperties,
            Entity::Connector(c) => &c.metaproperties,
        }
    }

    /// Interfaces of node-like entities.
    pub fn interfaces(&self) -> Option<&BTreeMap<String, Interface>> {
        match self {
            Entity::Node(n) | Entity::Context(n) => Some(&n.interfaces),
            Entity::Reference(r) => Some(&r.interfaces),
            Entity::Link(_) | Entity::Connector(_) => None,
        }
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Entity::Link(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_connector(&self) -> Option<&Connector> {
        match self {
            Entity::Connector(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(self, Entity::Context(_))
    }

    pub fn to_record(&self) -> Value {
        // Entity serialization has no fallible parts (string keys, JSON values).
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<Link> for Entity {
    fn from(l: Link) -> Self {
        Entity::Link(l)
    }
}

impl From<Connector> for Entity {
    fn from(c: Connector) -> Self {
        Entity::Connector(c)
    }
}

impl From<ReferenceNode> for Entity {
    fn from(r: ReferenceNode) -> Self {
        Entity::Reference(r)
    }
}
