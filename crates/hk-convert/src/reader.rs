//! Graph entities to ontology context.
//!
//! Two passes over one context's entities. The first classifies named
//! elements from their `instanceOf` meta links and indexes compound
//! expression links by head node, so that the second pass can resolve a
//! reference to any entity regardless of its position in the input.

use ahash::{AHashMap, AHashSet};
use hk_fi::Ifi;
use hk_graph::{Entity, Link, Properties};
use hk_ontology::{
    Concept, ConceptExpr, ContextBuilder, ContextRef, HkoContext, HkoElement, Individual,
    Property, PropertyValue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::*;
use crate::error::{ConvertError, Result, SkipReason};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Read node properties as literal property assertions.
    pub expand_node_properties: bool,
    /// Skip links and nodes whose parent is not the context being read.
    pub check_link_parent: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            expand_node_properties: true,
            check_link_parent: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntity {
    pub id: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReport {
    /// Elements newly added to the context.
    pub added: usize,
    pub skipped: Vec<SkippedEntity>,
}

#[derive(Debug, Clone, Default)]
pub struct Reader {
    config: ReaderConfig,
}

impl Reader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Reads `entities` into `context`.
    ///
    /// Entities that encode no ontology element are skipped and listed in
    /// the report rather than failing the read.
    pub fn read_into_context(
        &self,
        entities: &[Entity],
        context: &mut HkoContext,
    ) -> Result<ReadReport> {
        let mut session = ReadSession::new(&self.config, entities, context.builder());
        session.preprocess();
        session.route_all(context)
    }

    /// Decodes wire records and reads them into `context`.
    pub fn read_records(&self, records: &[Value], context: &mut HkoContext) -> Result<ReadReport> {
        let entities = records
            .iter()
            .cloned()
            .map(Entity::from_record)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.read_into_context(&entities, context)
    }
}

/// The context whose record has id `id`, with its parent chain rebuilt from
/// the other context records in `entities`.
pub fn context_from_entities(entities: &[Entity], id: &str) -> Option<ContextRef> {
    let parents = context_parents(entities);
    parents
        .contains_key(id)
        .then(|| resolve_context(&parents, id, None))
}

fn context_parents(entities: &[Entity]) -> AHashMap<&str, Option<&str>> {
    entities
        .iter()
        .filter(|e| e.is_context())
        .map(|e| (e.id(), e.parent()))
        .collect()
}

/// Walks parent ids upward until a root, a cycle, or `known` is reached,
/// then rebuilds the chain top-down.
fn resolve_context(
    parents: &AHashMap<&str, Option<&str>>,
    id: &str,
    known: Option<(&str, &ContextRef)>,
) -> ContextRef {
    let mut chain: Vec<&str> = Vec::new();
    let mut base = None;
    let mut current = Some(id);
    while let Some(cid) = current {
        if let Some((known_id, known_ref)) = known {
            if cid == known_id {
                base = Some(known_ref.clone());
                break;
            }
        }
        if chain.contains(&cid) {
            break;
        }
        chain.push(cid);
        current = parents.get(cid).copied().flatten();
    }
    chain
        .iter()
        .rev()
        .fold(base, |parent, cid| {
            Some(ContextRef::new(decode_iri(cid), parent.as_ref()))
        })
        .unwrap_or_else(|| ContextRef::root(decode_iri(id)))
}

/// Element iri and declaring context of a context-qualified id.
fn qualified_parts(id: &str) -> Option<(String, ContextRef)> {
    let ifi = Ifi::parse(id).ok()?;
    let key = ifi.key()?.to_string();
    let context = ContextRef::from_ifi(&ifi.context()?)?;
    Some((key, context))
}

/// Where pass two sends an entity.
enum Route<'e> {
    SubConceptOf(&'e Link),
    EquivalentConcept(&'e Link),
    ImportContext(&'e Link),
    ConceptAssertion(&'e Link),
    PropertyAssertion(&'e Link),
    NodeProperties(&'e Properties),
    /// Compound expression links, read when an axiom refers to their head.
    Expression,
    /// Contexts, plus nodes and connectors without literal properties.
    Inert,
    Unrecognized(&'e Link),
}

enum Routed {
    Added(Vec<HkoElement>),
    Ignored,
    Skipped(SkipReason),
}

type ReadResult<T> = std::result::Result<T, SkipReason>;

/// State of one read.
struct ReadSession<'a> {
    config: &'a ReaderConfig,
    builder: ContextBuilder,
    context_id: String,
    index: AHashMap<&'a str, &'a Entity>,
    parents: AHashMap<&'a str, Option<&'a str>>,
    /// Entities left for routing once meta links are consumed.
    working: Vec<&'a Entity>,
    preprocessed: bool,
    /// Head node id -> compound expression link.
    expressions: AHashMap<&'a str, &'a Link>,
    // Per-id memos.
    tbox_concepts: AHashMap<String, Concept>,
    tbox_properties: AHashMap<String, Property>,
    abox: AHashMap<String, Individual>,
    expanded: AHashMap<String, ConceptExpr>,
    pending: AHashSet<String>,
}

impl<'a> ReadSession<'a> {
    fn new(config: &'a ReaderConfig, entities: &'a [Entity], builder: ContextBuilder) -> Self {
        Self {
            config,
            context_id: builder.context().graph_id(),
            builder,
            index: entities.iter().map(|e| (e.id(), e)).collect(),
            parents: context_parents(entities),
            working: entities.iter().collect(),
            preprocessed: false,
            expressions: AHashMap::new(),
            tbox_concepts: AHashMap::new(),
            tbox_properties: AHashMap::new(),
            abox: AHashMap::new(),
            expanded: AHashMap::new(),
            pending: AHashSet::new(),
        }
    }

    fn context(&self) -> &ContextRef {
        self.builder.context()
    }

    // ========================================================================
    // Pass 1
    // ========================================================================

    fn preprocess(&mut self) {
        let entities = std::mem::take(&mut self.working);
        let mut meta = 0usize;
        for entity in entities {
            let Entity::Link(link) = entity else {
                self.working.push(entity);
                continue;
            };
            let connector = link.connector_id();
            if connector == INSTANCE_OF {
                let subject = link.first_bound(SUBJECT);
                let consumed = match (subject, link.first_bound(OBJECT)) {
                    (Some(s), Some(CONCEPT_SENTINEL)) => {
                        self.concept(s);
                        true
                    }
                    (Some(s), Some(PROPERTY_SENTINEL)) => {
                        self.property(s);
                        true
                    }
                    (Some(s), Some(INDIVIDUAL_SENTINEL)) => {
                        self.individual(s);
                        true
                    }
                    _ => false,
                };
                if consumed {
                    meta += 1;
                    continue;
                }
            } else if EXPRESSION_CONNECTORS.contains(&connector) {
                if let Some(head) = link.first_bound(HEAD_CONCEPT) {
                    self.expressions.insert(head, link);
                }
            }
            self.working.push(entity);
        }
        self.preprocessed = true;
        debug!(
            context = %self.context().ifi(),
            meta_links = meta,
            expressions = self.expressions.len(),
            remaining = self.working.len(),
            "preprocessing complete"
        );
    }

    // ========================================================================
    // Named elements
    // ========================================================================

    /// Iri and declaring context of the element stored under `id`.
    fn named_parts(&self, id: &str) -> (String, ContextRef) {
        if let Some(Entity::Reference(reference)) = self.index.get(id) {
            if let Some(target) = &reference.reference {
                let context = qualified_parts(id)
                    .map(|(_, c)| c)
                    .unwrap_or_else(|| self.context().clone());
                return (decode_iri(target).to_string(), context);
            }
        }
        qualified_parts(id)
            .unwrap_or_else(|| (decode_iri(id).to_string(), self.context().clone()))
    }

    fn concept(&mut self, id: &str) -> Concept {
        if let Some(concept) = self.tbox_concepts.get(id) {
            return concept.clone();
        }
        let (iri, context) = self.named_parts(id);
        let concept = Concept::new(iri, &context);
        self.tbox_concepts.insert(id.to_string(), concept.clone());
        concept
    }

    fn property(&mut self, id: &str) -> Property {
        if let Some(property) = self.tbox_properties.get(id) {
            return property.clone();
        }
        let (iri, context) = self.named_parts(id);
        let property = Property::new(iri, &context);
        self.tbox_properties.insert(id.to_string(), property.clone());
        property
    }

    fn individual(&mut self, id: &str) -> Individual {
        if let Some(individual) = self.abox.get(id) {
            return individual.clone();
        }
        let (iri, context) = self.named_parts(id);
        let individual = Individual::new(iri, &context);
        self.abox.insert(id.to_string(), individual.clone());
        individual
    }

    fn context_ref(&self, id: &str) -> ContextRef {
        resolve_context(
            &self.parents,
            id,
            Some((self.context_id.as_str(), self.context())),
        )
    }

    // ========================================================================
    // Concept expressions
    // ========================================================================

    /// The concept expression that `id` stands for in a bind.
    fn expression(&mut self, id: &str) -> ReadResult<ConceptExpr> {
        let Some(link) = self.expressions.get(id).copied() else {
            return Ok(ConceptExpr::Named(self.concept(id)));
        };
        if let Some(expr) = self.expanded.get(id) {
            return Ok(expr.clone());
        }
        if !self.pending.insert(id.to_string()) {
            return Err(SkipReason::CyclicExpression {
                head: id.to_string(),
            });
        }
        let result = self.compound(link);
        self.pending.remove(id);
        let expr = result?;
        self.expanded.insert(id.to_string(), expr.clone());
        Ok(expr)
    }

    fn compound(&mut self, link: &'a Link) -> ReadResult<ConceptExpr> {
        let connector = link.connector_id();
        match connector {
            EXISTS | FORALL => {
                let property = self.property(required(link, PROPERTY)?);
                let concept = self.expression(required(link, CONCEPT)?)?;
                Ok(if connector == EXISTS {
                    self.builder.exists(property, concept)
                } else {
                    self.builder.forall(property, concept)
                })
            }
            CONJUNCTION | DISJUNCTION => {
                let mut operands = Vec::new();
                for (id, anchors) in link.bound_with_anchors(CONCEPTS) {
                    // One anchor key per occurrence of the operand.
                    for _ in 0..anchors.len().max(1) {
                        operands.push(self.expression(id)?);
                    }
                }
                Ok(if connector == CONJUNCTION {
                    self.builder.conjunction(operands)
                } else {
                    self.builder.disjunction(operands)
                })
            }
            NOT => {
                let concept = self.expression(required(link, CONCEPT)?)?;
                Ok(self.builder.negation(concept))
            }
            _ => Err(SkipReason::UnrecognizedLink {
                connector: connector.to_string(),
            }),
        }
    }

    // ========================================================================
    // Pass 2
    // ========================================================================

    fn classify(&self, entity: &'a Entity) -> Route<'a> {
        match entity {
            // A connector carries literals when its property id is punned
            // with an individual.
            Entity::Node(_) | Entity::Reference(_) | Entity::Connector(_) => {
                let properties = entity.properties();
                if self.config.expand_node_properties && !properties.is_empty() {
                    Route::NodeProperties(properties)
                } else {
                    Route::Inert
                }
            }
            Entity::Context(_) => Route::Inert,
            Entity::Link(link) => match link.connector_id() {
                c if EXPRESSION_CONNECTORS.contains(&c) => Route::Expression,
                SUB_CONCEPT_OF => Route::SubConceptOf(link),
                EQ_CONCEPT_TO => Route::EquivalentConcept(link),
                IMPORT_CONTEXT => Route::ImportContext(link),
                INSTANCE_OF => Route::ConceptAssertion(link),
                _ if link.has_role(SUBJECT) && link.has_role(OBJECT) && link.binds.len() == 2 => {
                    Route::PropertyAssertion(link)
                }
                _ => Route::Unrecognized(link),
            },
        }
    }

    fn route(&mut self, entity: &'a Entity) -> Result<Routed> {
        if !self.preprocessed {
            return Err(ConvertError::PreprocessingIncomplete);
        }
        let route = self.classify(entity);
        if matches!(route, Route::Expression | Route::Inert) {
            return Ok(Routed::Ignored);
        }
        if self.config.check_link_parent {
            if let Some(parent) = entity.parent() {
                if parent != self.context_id {
                    return Ok(Routed::Skipped(SkipReason::ForeignParent {
                        parent: parent.to_string(),
                    }));
                }
            }
        }
        Ok(match self.build(entity, route) {
            Ok(elements) => Routed::Added(elements),
            Err(reason) => Routed::Skipped(reason),
        })
    }

    fn build(&mut self, entity: &'a Entity, route: Route<'a>) -> ReadResult<Vec<HkoElement>> {
        let element: HkoElement = match route {
            Route::SubConceptOf(link) => {
                let sub = self.expression(required(link, SUB)?)?;
                let sup = self.expression(required(link, SUP)?)?;
                self.builder.sub_concept_of(sub, sup).into()
            }
            Route::EquivalentConcept(link) => {
                let left = self.expression(required(link, LEFT)?)?;
                let right = self.expression(required(link, RIGHT)?)?;
                self.builder.equivalent_concept(left, right).into()
            }
            Route::ImportContext(link) => {
                let sub = self.context_ref(required(link, SUB)?);
                let sup = self.context_ref(required(link, SUP)?);
                self.builder.import_context(&sub, &sup).into()
            }
            Route::ConceptAssertion(link) => {
                let concept = self.expression(required(link, OBJECT)?)?;
                let individual = self.individual(required(link, SUBJECT)?);
                self.builder.concept_assertion(concept, individual).into()
            }
            Route::PropertyAssertion(link) => {
                let property = self.property(link.connector_id());
                let subject = self.individual(required(link, SUBJECT)?);
                let object = self.individual(required(link, OBJECT)?);
                self.builder.property_assertion(property, subject, object).into()
            }
            Route::NodeProperties(properties) => return Ok(self.node_properties(entity, properties)),
            Route::Expression | Route::Inert => return Ok(Vec::new()),
            Route::Unrecognized(link) => {
                return Err(SkipReason::UnrecognizedLink {
                    connector: link.connector_id().to_string(),
                })
            }
        };
        Ok(vec![element])
    }

    /// One literal assertion per property value; arrays give one per item.
    fn node_properties(&mut self, entity: &'a Entity, properties: &'a Properties) -> Vec<HkoElement> {
        let subject = self.individual(entity.id());
        let mut out = Vec::new();
        for (key, value) in properties {
            let property = self.property(key);
            let values: Vec<String> = match value {
                Value::Array(items) => items.iter().map(literal_text).collect(),
                other => vec![literal_text(other)],
            };
            for value in values {
                out.push(
                    self.builder
                        .property_assertion(
                            property.clone(),
                            subject.clone(),
                            PropertyValue::Literal(value),
                        )
                        .into(),
                );
            }
        }
        out
    }

    fn route_all(&mut self, context: &mut HkoContext) -> Result<ReadReport> {
        let mut report = ReadReport::default();
        let working = self.working.clone();
        for entity in working {
            match self.route(entity)? {
                Routed::Added(elements) => {
                    for element in elements {
                        if context.add(element) {
                            report.added += 1;
                        }
                    }
                }
                Routed::Skipped(reason) => {
                    warn!(id = %entity.id(), %reason, "skipping entity");
                    report.skipped.push(SkippedEntity {
                        id: entity.id().to_string(),
                        reason,
                    });
                }
                Routed::Ignored => {}
            }
        }
        debug!(
            context = %self.context().ifi(),
            added = report.added,
            skipped = report.skipped.len(),
            "entities routed"
        );
        Ok(report)
    }
}

fn required<'l>(link: &'l Link, role: &str) -> ReadResult<&'l str> {
    link.first_bound(role).ok_or_else(|| SkipReason::MissingBind {
        role: role.to_string(),
    })
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hk_graph::{Link, Node};

    fn context() -> HkoContext {
        HkoContext::new(ContextRef::root("http://ex.org/c"))
    }

    #[test]
    fn routing_requires_preprocessing() {
        let entities = vec![Entity::node("<a>")];
        let ctx = context();
        let config = ReaderConfig::default();
        let mut session = ReadSession::new(&config, &entities, ctx.builder());
        assert!(matches!(
            session.route(&entities[0]),
            Err(ConvertError::PreprocessingIncomplete)
        ));
        session.preprocess();
        assert!(matches!(session.route(&entities[0]), Ok(Routed::Ignored)));
    }

    #[test]
    fn forward_references_resolve_to_expressions() {
        // The axiom precedes the expression it refers to.
        let mut axiom = Link::new("ax", SUB_CONCEPT_OF).with_parent("<http://ex.org/c>");
        axiom.add_bind(SUB, "<A>");
        axiom.add_bind(SUP, "_:head");
        let mut exists = Link::new("ex", EXISTS).with_parent("<http://ex.org/c>");
        exists.add_bind(HEAD_CONCEPT, "_:head");
        exists.add_bind(PROPERTY, "<p>");
        exists.add_bind(CONCEPT, "<B>");
        let entities = vec![Entity::Link(axiom), Entity::Link(exists)];

        let mut ctx = context();
        let report = Reader::default().read_into_context(&entities, &mut ctx).unwrap();
        assert_eq!(report.added, 1);
        let b = ctx.builder();
        let expected = b.sub_concept_of(b.concept("A"), b.exists(b.property("p"), b.concept("B")));
        assert!(ctx.contains(&expected.into()));
    }

    #[test]
    fn unknown_shapes_are_reported() {
        let mut odd = Link::new("odd", "whatever").with_parent("<http://ex.org/c>");
        odd.add_bind("x", "<a>");
        let elsewhere = Link::spo("<p>", "<a>", "<b>").with_parent("<http://ex.org/other>");
        let mut missing = Link::new("missing", SUB_CONCEPT_OF).with_parent("<http://ex.org/c>");
        missing.add_bind(SUB, "<A>");
        let entities = vec![
            Entity::Link(odd),
            Entity::Link(elsewhere.clone()),
            Entity::Link(missing),
        ];

        let mut ctx = context();
        let report = Reader::default().read_into_context(&entities, &mut ctx).unwrap();
        assert!(ctx.is_empty());
        let reasons: Vec<_> = report.skipped.iter().map(|s| (s.id.as_str(), &s.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                ("odd", &SkipReason::UnrecognizedLink { connector: "whatever".to_string() }),
                (
                    elsewhere.id.as_str(),
                    &SkipReason::ForeignParent { parent: "<http://ex.org/other>".to_string() }
                ),
                ("missing", &SkipReason::MissingBind { role: SUP.to_string() }),
            ]
        );
    }

    #[test]
    fn self_referencing_expressions_are_skipped() {
        let mut not = Link::new("n", NOT).with_parent("<http://ex.org/c>");
        not.add_bind(HEAD_CONCEPT, "_:h");
        not.add_bind(CONCEPT, "_:h");
        let mut axiom = Link::new("ax", SUB_CONCEPT_OF).with_parent("<http://ex.org/c>");
        axiom.add_bind(SUB, "<A>");
        axiom.add_bind(SUP, "_:h");
        let entities = vec![Entity::Link(not), Entity::Link(axiom)];

        let mut ctx = context();
        let report = Reader::default().read_into_context(&entities, &mut ctx).unwrap();
        assert_eq!(
            report.skipped,
            vec![SkippedEntity {
                id: "ax".to_string(),
                reason: SkipReason::CyclicExpression { head: "_:h".to_string() },
            }]
        );
    }

    #[test]
    fn node_properties_become_literal_assertions() {
        let node = Node::new("<john>")
            .with_parent("<http://ex.org/c>")
            .with_property("<age>", serde_json::json!(["40", 41]))
            .with_property("<name>", "John");
        let entities = vec![Entity::Node(node)];

        let mut ctx = context();
        let report = Reader::default().read_into_context(&entities, &mut ctx).unwrap();
        assert_eq!(report.added, 3);
        let b = ctx.builder();
        let age = b.property_assertion(b.property("age"), b.individual("john"), 41i64);
        assert!(ctx.contains(&age.into()));

        let mut untouched = context();
        let report = Reader::new(ReaderConfig {
            expand_node_properties: false,
            ..ReaderConfig::default()
        })
        .read_into_context(&entities, &mut untouched)
        .unwrap();
        assert_eq!(report.added, 0);
    }

    #[test]
    fn connector_properties_become_literal_assertions() {
        let mut connector = crate::constants::property_connector("<x>");
        connector.properties.insert("<x>".to_string(), serde_json::json!("v"));
        let entities = vec![Entity::Connector(connector)];

        let mut ctx = context();
        let report = Reader::default().read_into_context(&entities, &mut ctx).unwrap();
        assert_eq!(report.added, 1);
        assert!(report.skipped.is_empty());
        let b = ctx.builder();
        let punned = b.property_assertion(b.property("x"), b.individual("x"), "v");
        assert!(ctx.contains(&punned.into()));
    }

    #[test]
    fn records_with_unknown_types_are_rejected() {
        let records = vec![serde_json::json!({"type": "anchor", "id": "a"})];
        let mut ctx = context();
        assert!(matches!(
            Reader::default().read_records(&records, &mut ctx),
            Err(ConvertError::Graph(hk_graph::GraphError::InvalidEntityType(_)))
        ));
    }

    #[test]
    fn context_chain_is_rebuilt_from_records() {
        let entities = vec![
            Entity::context("<http://ex.org/root>"),
            Entity::Context(Node::new("<http://ex.org/child>").with_parent("<http://ex.org/root>")),
        ];
        let child = context_from_entities(&entities, "<http://ex.org/child>").unwrap();
        let root = ContextRef::root("http://ex.org/root");
        assert_eq!(child, ContextRef::child("http://ex.org/child", &root));
        assert!(context_from_entities(&entities, "<http://ex.org/none>").is_none());
    }
}
