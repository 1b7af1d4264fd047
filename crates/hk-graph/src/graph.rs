//! Arena-backed hypergraph container.
//!
//! Entities live in a slot vector addressed by `u32` handles; secondary
//! indices map a handle to the bitmap of handles related to it:
//!
//! - connector -> links using it
//! - entity -> links binding it
//! - context -> member entities
//!
//! Handles are never reused, so a bitmap never refers to a different entity
//! than the one it was built for. Removal takes an entity out of its slot
//! before cascading, which keeps parent/bind cycles from recursing forever.

use ahash::AHashMap;
use roaring::RoaringBitmap;
use serde_json::Value;
use thiserror::Error;

use crate::entity::{Connector, ConnectorClass, Entity, EntityKind, Link, LinkConnector, Node};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid entity type: {0}")]
    InvalidEntityType(String),

    #[error("malformed `{kind}` record: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("parent `{parent}` of `{id}` is not a context")]
    ParentNotContext { id: String, parent: String },

    #[error("`{id}` cannot be its own parent")]
    SelfParent { id: String },

    #[error("connector `{connector}` of link `{link}` names a non-connector entity")]
    NotAConnector { link: String, connector: String },

    #[error("`{id}` is the connector of existing links and must stay a connector")]
    ConnectorInUse { id: String },

    #[error("`{id}` is a context with members and must stay a context")]
    ContextHasMembers { id: String },
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Default, Clone, PartialEq)]
struct Indexes {
    links_by_connector: AHashMap<u32, RoaringBitmap>,
    links_by_bound: AHashMap<u32, RoaringBitmap>,
    members_by_context: AHashMap<u32, RoaringBitmap>,
}

fn index_insert(map: &mut AHashMap<u32, RoaringBitmap>, key: u32, value: u32) {
    map.entry(key).or_default().insert(value);
}

fn index_remove(map: &mut AHashMap<u32, RoaringBitmap>, key: u32, value: u32) {
    if let Some(set) = map.get_mut(&key) {
        set.remove(value);
        if set.is_empty() {
            map.remove(&key);
        }
    }
}

/// In-memory hypergraph with referential-integrity bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    slots: Vec<Option<Entity>>,
    by_id: AHashMap<String, u32>,
    /// Placeholders created for bind targets and connectors not yet added.
    stubs: RoaringBitmap,
    indexes: Indexes,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes and adds a list of wire records, in order.
    pub fn from_records(records: &[Value]) -> Result<Self> {
        let mut graph = Self::new();
        for record in records {
            graph.add_record(record.clone())?;
        }
        Ok(graph)
    }

    /// Wire records for every non-stub entity, in insertion order.
    pub fn to_records(&self) -> Vec<Value> {
        self.entities().map(Entity::to_record).collect()
    }

    /// Number of non-stub entities.
    pub fn len(&self) -> usize {
        self.by_id.len() - self.stubs.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stub_count(&self) -> usize {
        self.stubs.len() as usize
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Entity by id, stubs included.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.handle(id).and_then(|h| self.slot(h))
    }

    pub fn is_stub(&self, id: &str) -> bool {
        self.handle(id).is_some_and(|h| self.stubs.contains(h))
    }

    /// Non-stub entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(h, _)| !self.stubs.contains(*h as u32))
            .filter_map(|(_, e)| e.as_ref())
    }

    pub fn links_of_connector(&self, connector: &str) -> Vec<&Entity> {
        self.related(&self.indexes.links_by_connector, connector)
    }

    pub fn links_binding(&self, entity: &str) -> Vec<&Entity> {
        self.related(&self.indexes.links_by_bound, entity)
    }

    pub fn members_of(&self, context: &str) -> Vec<&Entity> {
        self.related(&self.indexes.members_by_context, context)
    }

    fn related(&self, map: &AHashMap<u32, RoaringBitmap>, id: &str) -> Vec<&Entity> {
        let Some(set) = self.handle(id).and_then(|h| map.get(&h)) else {
            return Vec::new();
        };
        set.iter().filter_map(|h| self.slot(h)).collect()
    }

    fn handle(&self, id: &str) -> Option<u32> {
        self.by_id.get(id).copied()
    }

    fn slot(&self, handle: u32) -> Option<&Entity> {
        self.slots.get(handle as usize).and_then(Option::as_ref)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Decodes one wire record and adds it.
    pub fn add_record(&mut self, record: Value) -> Result<Vec<Entity>> {
        self.add(Entity::from_record(record)?)
    }

    /// Adds (or replaces) an entity.
    ///
    /// Returns the entity together with any Context created for an absent
    /// parent and any inline connector. Bind targets and connectors that are
    /// not yet in the graph become stubs and are not returned.
    pub fn add(&mut self, entity: Entity) -> Result<Vec<Entity>> {
        self.check(&entity)?;
        if let Entity::Link(link) = &entity {
            if let LinkConnector::Inline(connector) = &link.connector {
                self.check(&Entity::Connector((**connector).clone()))?;
            }
        }

        let mut added = Vec::new();
        if let Some(parent) = entity.parent() {
            self.ensure_context(parent, &mut added);
        }
        if let Entity::Link(link) = &entity {
            match &link.connector {
                LinkConnector::Inline(connector) => {
                    let connector = Entity::Connector((**connector).clone());
                    self.insert(connector.clone());
                    added.push(connector);
                }
                LinkConnector::Id(id) => self.ensure_stub(id, true),
            }
            for bound in link.bound_ids() {
                self.ensure_stub(bound, false);
            }
        }
        self.insert(entity.clone());
        added.insert(0, entity);
        Ok(added)
    }

    fn check(&self, entity: &Entity) -> Result<()> {
        let id = entity.id();
        if let Some(parent) = entity.parent() {
            if parent == id {
                return Err(GraphError::SelfParent { id: id.to_string() });
            }
            if let Some(existing) = self.get(parent) {
                let upgradable_stub = self.is_stub(parent) && existing.kind() == EntityKind::Node;
                if !existing.is_context() && !upgradable_stub {
                    return Err(GraphError::ParentNotContext {
                        id: id.to_string(),
                        parent: parent.to_string(),
                    });
                }
            }
        }
        if let Entity::Link(link) = entity {
            let connector = link.connector_id();
            let inline = matches!(link.connector, LinkConnector::Inline(_));
            if let Some(existing) = self.get(connector) {
                if !inline && existing.kind() != EntityKind::Connector && !self.is_stub(connector) {
                    return Err(GraphError::NotAConnector {
                        link: id.to_string(),
                        connector: connector.to_string(),
                    });
                }
            }
        }
        if let Some(handle) = self.handle(id) {
            if entity.kind() != EntityKind::Connector
                && self.indexes.links_by_connector.contains_key(&handle)
            {
                return Err(GraphError::ConnectorInUse { id: id.to_string() });
            }
            if !entity.is_context() && self.indexes.members_by_context.contains_key(&handle) {
                return Err(GraphError::ContextHasMembers { id: id.to_string() });
            }
        }
        Ok(())
    }

    fn ensure_context(&mut self, id: &str, added: &mut Vec<Entity>) {
        match self.handle(id) {
            None => {
                let context = Entity::context(id);
                tracing::debug!(context = %id, "auto-creating parent context");
                self.insert(context.clone());
                added.push(context);
            }
            Some(handle) if self.stubs.contains(handle) => {
                let context = Entity::context(id);
                self.stubs.remove(handle);
                self.slots[handle as usize] = Some(context.clone());
                added.push(context);
            }
            Some(_) => {}
        }
    }

    fn ensure_stub(&mut self, id: &str, connector: bool) {
        if let Some(handle) = self.handle(id) {
            // A stub first seen as a bind target may later turn out to be a connector.
            let retype = connector
                && self.stubs.contains(handle)
                && self.slot(handle).is_some_and(|e| e.kind() != EntityKind::Connector);
            if retype {
                self.slots[handle as usize] =
                    Some(Entity::Connector(Connector::new(id, ConnectorClass::Facts)));
            }
            return;
        }
        let stub = if connector {
            Entity::Connector(Connector::new(id, ConnectorClass::Facts))
        } else {
            Entity::Node(Node::new(id))
        };
        let handle = self.insert(stub);
        self.stubs.insert(handle);
    }

    /// Places `entity` in its slot (reusing the handle of an existing entity
    /// with the same id) and indexes it.
    fn insert(&mut self, entity: Entity) -> u32 {
        let Some(handle) = self.handle(entity.id()) else {
            let handle = self.slots.len() as u32;
            self.by_id.insert(entity.id().to_string(), handle);
            self.slots.push(Some(entity));
            self.index(handle);
            return handle;
        };
        let mut orphans = Vec::new();
        if let Some(previous) = self.slots[handle as usize].take() {
            self.deindex(handle, &previous, &mut orphans);
        }
        self.stubs.remove(handle);
        self.slots[handle as usize] = Some(entity);
        self.index(handle);
        self.collect_stubs(orphans);
        handle
    }

    fn index(&mut self, handle: u32) {
        let Some(entity) = self.slot(handle) else {
            return;
        };
        let parent = entity.parent().and_then(|p| self.handle(p));
        let mut connector = None;
        let mut bound = Vec::new();
        if let Entity::Link(link) = entity {
            connector = self.handle(link.connector_id());
            bound = link.bound_ids().filter_map(|id| self.handle(id)).collect();
        }
        if let Some(parent) = parent {
            index_insert(&mut self.indexes.members_by_context, parent, handle);
        }
        if let Some(connector) = connector {
            index_insert(&mut self.indexes.links_by_connector, connector, handle);
        }
        for target in bound {
            index_insert(&mut self.indexes.links_by_bound, target, handle);
        }
    }

    /// Drops `entity`'s own index entries. Stub handles it referenced are
    /// pushed to `orphans` for collection once the caller is done.
    fn deindex(&mut self, handle: u32, entity: &Entity, orphans: &mut Vec<u32>) {
        if let Some(parent) = entity.parent().and_then(|p| self.handle(p)) {
            index_remove(&mut self.indexes.members_by_context, parent, handle);
        }
        if let Entity::Link(link) = entity {
            if let Some(connector) = self.handle(link.connector_id()) {
                index_remove(&mut self.indexes.links_by_connector, connector, handle);
                orphans.push(connector);
            }
            let targets: Vec<u32> = link.bound_ids().filter_map(|id| self.handle(id)).collect();
            for target in targets {
                index_remove(&mut self.indexes.links_by_bound, target, handle);
                orphans.push(target);
            }
        }
    }

    fn is_referenced(&self, handle: u32) -> bool {
        self.indexes.links_by_bound.contains_key(&handle)
            || self.indexes.links_by_connector.contains_key(&handle)
            || self.indexes.members_by_context.contains_key(&handle)
    }

    fn collect_stubs(&mut self, candidates: Vec<u32>) {
        for handle in candidates {
            if self.stubs.contains(handle) && !self.is_referenced(handle) {
                let mut removed = Vec::new();
                self.remove_handle(handle, &mut removed);
            }
        }
    }

    /// Removes `id` and everything that depends on it. Absent ids are a no-op.
    ///
    /// Returns the removed non-stub entities.
    pub fn remove(&mut self, id: &str) -> Vec<Entity> {
        let mut removed = Vec::new();
        if let Some(handle) = self.handle(id) {
            self.remove_handle(handle, &mut removed);
        }
        removed
    }

    fn remove_handle(&mut self, handle: u32, removed: &mut Vec<Entity>) {
        let Some(entity) = self.slots[handle as usize].take() else {
            return;
        };
        self.by_id.remove(entity.id());
        let was_stub = self.stubs.remove(handle);

        let mut orphans = Vec::new();
        self.deindex(handle, &entity, &mut orphans);

        let links = [
            self.indexes.links_by_bound.remove(&handle),
            self.indexes.links_by_connector.remove(&handle),
        ];
        let members = self.indexes.members_by_context.remove(&handle);
        for link in links.into_iter().flatten().flat_map(|set| set.into_iter()) {
            self.remove_handle(link, removed);
        }
        if let Some(members) = members {
            tracing::trace!(context = %entity.id(), members = members.len(), "removing context members");
            for member in &members {
                self.remove_handle(member, removed);
            }
        }

        if !was_stub {
            removed.push(entity);
        }
        self.collect_stubs(orphans);
    }

    /// True when every index matches what a full rebuild would produce.
    pub fn indexes_consistent(&self) -> bool {
        let mut rebuilt = Graph {
            slots: self.slots.clone(),
            by_id: self.by_id.clone(),
            stubs: self.stubs.clone(),
            indexes: Indexes::default(),
        };
        for handle in 0..rebuilt.slots.len() as u32 {
            rebuilt.index(handle);
        }
        let ids_ok = self
            .by_id
            .iter()
            .all(|(id, &h)| self.slot(h).is_some_and(|e| e.id() == id));
        let unreferenced_stub = self.stubs.iter().any(|h| !self.is_referenced(h));
        ids_ok && !unreferenced_stub && rebuilt.indexes == self.indexes
    }
}

impl Entity {
    /// Decodes one wire record, rejecting missing or unknown `type` tags.
    pub fn from_record(record: Value) -> Result<Entity> {
        let tag = record.get("type").and_then(Value::as_str);
        let Some(kind) = tag.and_then(EntityKind::from_tag) else {
            return Err(GraphError::InvalidEntityType(
                tag.map(str::to_string).unwrap_or_else(|| "<missing>".to_string()),
            ));
        };
        serde_json::from_value(record).map_err(|source| GraphError::Decode {
            kind: kind.tag(),
            source,
        })
    }
}

impl Link {
    /// Adds this link to `graph`.
    pub fn add_to(self, graph: &mut Graph) -> Result<Vec<Entity>> {
        graph.add(Entity::Link(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::RoleType;
    use serde_json::json;

    fn ids(entities: &[Entity]) -> Vec<&str> {
        entities.iter().map(Entity::id).collect()
    }

    #[test]
    fn absent_parent_is_created_as_context() {
        let mut graph = Graph::new();
        let added = graph.add(Entity::Node(Node::new("n").with_parent("ctx"))).unwrap();
        assert_eq!(ids(&added), vec!["n", "ctx"]);
        assert!(graph.get("ctx").unwrap().is_context());
        let members: Vec<&str> = graph.members_of("ctx").iter().map(|e| e.id()).collect();
        assert_eq!(members, vec!["n"]);
    }

    #[test]
    fn parent_must_be_a_context() {
        let mut graph = Graph::new();
        graph.add(Entity::node("plain")).unwrap();
        let err = graph.add(Entity::Node(Node::new("child").with_parent("plain"))).unwrap_err();
        assert!(matches!(err, GraphError::ParentNotContext { .. }));
        assert!(!graph.contains("child"));
    }

    #[test]
    fn link_targets_become_stubs_until_defined() {
        let mut graph = Graph::new();
        let added = Link::spo("likes", "alice", "bob").add_to(&mut graph).unwrap();
        assert_eq!(added.len(), 1);
        assert!(graph.is_stub("alice"));
        assert!(graph.is_stub("likes"));
        assert_eq!(graph.len(), 1);

        graph.add(Entity::node("alice")).unwrap();
        assert!(!graph.is_stub("alice"));
        assert_eq!(graph.links_binding("alice").len(), 1);
        assert!(graph.indexes_consistent());
    }

    #[test]
    fn unknown_record_type_is_rejected_without_mutation() {
        let mut graph = Graph::new();
        for record in [json!({"type": "anchor", "id": "a"}), json!({"id": "b"})] {
            let err = graph.add_record(record).unwrap_err();
            assert!(matches!(err, GraphError::InvalidEntityType(_)));
        }
        assert!(graph.is_empty());
        assert_eq!(graph.stub_count(), 0);
    }

    #[test]
    fn removing_a_node_cascades_to_links() {
        let mut graph = Graph::new();
        graph.add(Entity::Node(Node::new("a").with_parent("ctx"))).unwrap();
        graph.add(Entity::node("b")).unwrap();
        graph
            .add(Entity::Connector(
                Connector::new("knows", ConnectorClass::Facts)
                    .with_role("subject", RoleType::Subject)
                    .with_role("object", RoleType::Object),
            ))
            .unwrap();
        let link = Link::spo("knows", "a", "b");
        let link_id = link.id.clone();
        link.add_to(&mut graph).unwrap();

        let removed = graph.remove("a");
        assert_eq!(ids(&removed), vec![link_id.as_str(), "a"]);
        assert!(graph.members_of("ctx").is_empty());
        assert!(graph.links_of_connector("knows").is_empty());
        assert!(graph.indexes_consistent());
    }

    #[test]
    fn removing_a_connector_removes_its_links_and_orphan_stubs() {
        let mut graph = Graph::new();
        Link::spo("rel", "x", "y").add_to(&mut graph).unwrap();
        Link::spo("rel", "x", "z").add_to(&mut graph).unwrap();
        graph.add(Entity::Connector(Connector::new("rel", ConnectorClass::Causal))).unwrap();

        graph.remove("rel");
        assert!(graph.is_empty());
        assert_eq!(graph.stub_count(), 0);
        assert!(graph.indexes_consistent());
    }

    #[test]
    fn removing_a_context_removes_members_recursively() {
        let mut graph = Graph::new();
        graph.add(Entity::Context(Node::new("inner").with_parent("outer"))).unwrap();
        graph.add(Entity::Node(Node::new("leaf").with_parent("inner"))).unwrap();
        Link::spo("r", "leaf", "elsewhere").with_parent("outer").add_to(&mut graph).unwrap();

        graph.remove("outer");
        assert!(graph.is_empty());
        assert!(graph.indexes_consistent());
        assert!(graph.remove("outer").is_empty());
    }

    #[test]
    fn upsert_reindexes_links() {
        let mut graph = Graph::new();
        let mut link = Link::new("l", "r");
        link.add_bind("subject", "a");
        graph.add(Entity::Link(link.clone())).unwrap();

        link.binds.clear();
        link.add_bind("subject", "b");
        graph.add(Entity::Link(link)).unwrap();

        assert!(!graph.contains("a"));
        assert_eq!(graph.links_binding("b").len(), 1);
        assert!(graph.indexes_consistent());
    }

    #[test]
    fn connector_in_use_keeps_its_kind() {
        let mut graph = Graph::new();
        Link::spo("r", "a", "b").add_to(&mut graph).unwrap();
        let err = graph.add(Entity::node("r")).unwrap_err();
        assert!(matches!(err, GraphError::ConnectorInUse { .. }));
        graph.add(Entity::node("a")).unwrap();
        let err = Link::spo("a", "x", "y").add_to(&mut graph).unwrap_err();
        assert!(matches!(err, GraphError::NotAConnector { .. }));
        assert!(!graph.contains("x"));
    }

    #[test]
    fn bound_stub_can_become_a_connector() {
        let mut graph = Graph::new();
        Link::spo("type", "<p>", "Property").add_to(&mut graph).unwrap();
        Link::spo("<p>", "alice", "bob").add_to(&mut graph).unwrap();
        assert_eq!(graph.get("<p>").map(Entity::kind), Some(EntityKind::Connector));
        assert_eq!(graph.links_of_connector("<p>").len(), 1);
        assert_eq!(graph.links_binding("<p>").len(), 1);
        assert!(graph.indexes_consistent());
    }

    #[test]
    fn stub_parent_is_upgraded_to_context() {
        let mut graph = Graph::new();
        Link::spo("r", "ctx", "b").add_to(&mut graph).unwrap();
        let added = graph.add(Entity::Node(Node::new("m").with_parent("ctx"))).unwrap();
        assert_eq!(ids(&added), vec!["m", "ctx"]);
        assert!(graph.get("ctx").unwrap().is_context());
        assert!(!graph.is_stub("ctx"));
    }

    #[test]
    fn records_roundtrip_through_graph() {
        let records = vec![
            json!({"type": "context", "id": "ctx"}),
            json!({"type": "node", "id": "a", "parent": "ctx", "properties": {"name": "A"}}),
            json!({"type": "connector", "id": "r", "className": "facts", "roles": {"subject": "s"}}),
            json!({"type": "link", "id": "l", "connector": "r", "parent": "ctx", "binds": {"subject": {"a": ["λ"]}}}),
        ];
        let graph = Graph::from_records(&records).unwrap();
        assert_eq!(graph.to_records(), records);
    }
}
