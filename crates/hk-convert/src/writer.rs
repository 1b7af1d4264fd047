//! Ontology context to graph entities.
//!
//! Named elements are memoized by identity so each is written once; compound
//! expressions get a fresh blank head node per occurrence unless
//! [`WriterConfig::dedupe_compound_expressions`] is set.

use ahash::{AHashMap, AHashSet};
use hk_fi::Ifi;
use hk_graph::{blank_id, Entity, Link, Node, ReferenceNode};
use hk_ontology::{
    Assertion, Axiom, Concept, ConceptExpr, ContextRef, HkoContext, HkoElement, Individual,
    Property, PropertyValue,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::constants::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Share one blank node among structurally equal compound expressions
    /// within a single write.
    pub dedupe_compound_expressions: bool,
    /// Append the reserved connector definitions to the output.
    pub emit_well_known_connectors: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            dedupe_compound_expressions: false,
            emit_well_known_connectors: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Writer {
    config: WriterConfig,
}

impl Writer {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Encodes `context` and its elements as graph entities.
    pub fn write_context(&self, context: &HkoContext) -> Vec<Entity> {
        let mut kit = WriteKit::new(&self.config, context);
        kit.write_context_record(context.reference());
        for element in context.elements() {
            kit.write_element(element);
        }
        if self.config.emit_well_known_connectors {
            kit.fix_connectors();
        }
        debug!(
            context = %context.ifi(),
            elements = context.len(),
            entities = kit.out.len(),
            "context written"
        );
        kit.out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NamedKind {
    Concept,
    Property,
    Individual,
}

/// State of one `write_context` call.
struct WriteKit<'a> {
    config: &'a WriterConfig,
    context: &'a ContextRef,
    context_id: String,
    out: Vec<Entity>,
    /// Output position of every node, reference, context and connector.
    positions: AHashMap<String, usize>,
    /// Ids of every context record the write will emit.
    context_ids: AHashSet<String>,
    named: AHashSet<(NamedKind, Ifi)>,
    sentinels: AHashSet<&'static str>,
    expressions: AHashMap<ConceptExpr, String>,
}

impl<'a> WriteKit<'a> {
    fn new(config: &'a WriterConfig, context: &'a HkoContext) -> Self {
        Self {
            config,
            context: context.reference(),
            context_id: context.reference().graph_id(),
            out: Vec::new(),
            positions: AHashMap::new(),
            context_ids: context_record_ids(context),
            named: AHashSet::new(),
            sentinels: AHashSet::new(),
            expressions: AHashMap::new(),
        }
    }

    fn push(&mut self, entity: Entity) {
        if entity.as_link().is_none() {
            self.positions.insert(entity.id().to_string(), self.out.len());
        }
        self.out.push(entity);
    }

    fn link(&mut self, connector: &str, binds: &[(&str, &str)]) {
        let mut link = Link::blank(connector).with_parent(self.context_id.as_str());
        for (role, id) in binds {
            link.add_bind(role, id);
        }
        self.push(Entity::Link(link));
    }

    // ========================================================================
    // Contexts
    // ========================================================================

    /// Writes the record of `context` after those of its ancestors.
    fn write_context_record(&mut self, context: &ContextRef) -> String {
        let id = context.graph_id();
        if self.positions.contains_key(&id) {
            return id;
        }
        let mut record = Node::new(id.as_str());
        if let Some(parent) = context.parent() {
            record.parent = Some(self.write_context_record(parent));
        }
        self.push(Entity::Context(record));
        id
    }

    // ========================================================================
    // Named elements
    // ========================================================================

    /// `<iri>` for elements of this context, the qualified IFI otherwise.
    /// A local iri that names a written context also takes the IFI form.
    fn named_id(&self, iri: &str, context: &ContextRef, ifi: &Ifi) -> String {
        let id = encode_iri(iri);
        if context == self.context && !self.context_ids.contains(&id) {
            id
        } else {
            ifi.to_string()
        }
    }

    /// Returns false when the element was already written.
    fn first_visit(&mut self, kind: NamedKind, ifi: &Ifi) -> bool {
        self.named.insert((kind, ifi.clone()))
    }

    fn write_concept(&mut self, concept: &Concept) -> String {
        let id = self.named_id(concept.iri(), concept.context(), concept.ifi());
        if self.first_visit(NamedKind::Concept, concept.ifi()) {
            self.write_node(&id, concept.iri(), concept.context());
            self.meta_link(&id, CONCEPT_SENTINEL);
        }
        id
    }

    fn write_individual(&mut self, individual: &Individual) -> String {
        let id = self.named_id(individual.iri(), individual.context(), individual.ifi());
        if self.first_visit(NamedKind::Individual, individual.ifi()) {
            self.write_node(&id, individual.iri(), individual.context());
            self.meta_link(&id, INDIVIDUAL_SENTINEL);
        }
        id
    }

    fn write_property(&mut self, property: &Property) -> String {
        let id = self.named_id(property.iri(), property.context(), property.ifi());
        if self.first_visit(NamedKind::Property, property.ifi()) {
            self.write_connector(&id);
            self.meta_link(&id, PROPERTY_SENTINEL);
        }
        id
    }

    /// Links name their property by id, so the entity under `id` must be a
    /// connector. A node already written for a punned concept or individual
    /// is turned into one in place, keeping its properties.
    fn write_connector(&mut self, id: &str) {
        let Some(&position) = self.positions.get(id) else {
            self.push(Entity::Connector(property_connector(id)));
            return;
        };
        let entity = &mut self.out[position];
        if entity.as_connector().is_none() {
            let mut connector = property_connector(id);
            connector.properties = std::mem::take(entity.properties_mut());
            trace!(id, "punned node written as connector");
            *entity = Entity::Connector(connector);
        }
    }

    /// A node for an element of this context, a reference node otherwise.
    fn write_node(&mut self, id: &str, iri: &str, context: &ContextRef) {
        if self.positions.contains_key(id) {
            return;
        }
        let entity = if context == self.context {
            Entity::Node(Node::new(id).with_parent(self.context_id.as_str()))
        } else {
            Entity::Reference(
                ReferenceNode::new(id, encode_iri(iri)).with_parent(self.context_id.as_str()),
            )
        };
        self.push(entity);
    }

    fn meta_link(&mut self, subject: &str, sentinel: &'static str) {
        if self.sentinels.insert(sentinel) {
            self.push(Entity::Node(Node::new(sentinel)));
        }
        self.link(INSTANCE_OF, &[(SUBJECT, subject), (OBJECT, sentinel)]);
    }

    // ========================================================================
    // Concept expressions
    // ========================================================================

    /// Writes `expr` and returns the id that stands for it in binds.
    fn write_expr(&mut self, expr: &ConceptExpr) -> String {
        if self.config.dedupe_compound_expressions {
            if let Some(head) = self.expressions.get(expr) {
                return head.clone();
            }
        }
        let (connector, binds): (&str, Vec<(&str, String)>) = match expr {
            ConceptExpr::Named(concept) => return self.write_concept(concept),
            ConceptExpr::Exists { property, concept } => (
                EXISTS,
                vec![
                    (PROPERTY, self.write_property(property)),
                    (CONCEPT, self.write_expr(concept)),
                ],
            ),
            ConceptExpr::Forall { property, concept } => (
                FORALL,
                vec![
                    (PROPERTY, self.write_property(property)),
                    (CONCEPT, self.write_expr(concept)),
                ],
            ),
            ConceptExpr::Conjunction(junction) => (
                CONJUNCTION,
                junction
                    .operands()
                    .iter()
                    .map(|operand| (CONCEPTS, self.write_expr(operand)))
                    .collect(),
            ),
            ConceptExpr::Disjunction(junction) => (
                DISJUNCTION,
                junction
                    .operands()
                    .iter()
                    .map(|operand| (CONCEPTS, self.write_expr(operand)))
                    .collect(),
            ),
            ConceptExpr::Negation(concept) => (NOT, vec![(CONCEPT, self.write_expr(concept))]),
        };

        let head = blank_id();
        self.push(Entity::Node(Node::new(head.as_str()).with_parent(self.context_id.as_str())));
        let mut link = Link::blank(connector).with_parent(self.context_id.as_str());
        link.add_bind(HEAD_CONCEPT, &head);
        // Repeated operands bind the same id once per occurrence.
        for (role, id) in &binds {
            link.add_bind(role, id);
        }
        self.push(Entity::Link(link));
        trace!(head = %head, connector, "compound expression written");

        if self.config.dedupe_compound_expressions {
            self.expressions.insert(expr.clone(), head.clone());
        }
        head
    }

    // ========================================================================
    // Axioms and assertions
    // ========================================================================

    fn write_element(&mut self, element: &HkoElement) {
        match element {
            HkoElement::Axiom(axiom) => self.write_axiom(axiom),
            HkoElement::Assertion(assertion) => self.write_assertion(assertion),
        }
    }

    fn write_axiom(&mut self, axiom: &Axiom) {
        match axiom {
            Axiom::SubConceptOf { sub, sup, .. } => {
                let sub = self.write_expr(sub);
                let sup = self.write_expr(sup);
                self.link(SUB_CONCEPT_OF, &[(SUB, &sub), (SUP, &sup)]);
            }
            Axiom::EquivalentConcept { left, right, .. } => {
                let left = self.write_expr(left);
                let right = self.write_expr(right);
                self.link(EQ_CONCEPT_TO, &[(LEFT, &left), (RIGHT, &right)]);
            }
            Axiom::ImportContext { sub, sup, .. } => {
                let sub = self.write_context_record(sub);
                let sup = self.write_context_record(sup);
                self.link(IMPORT_CONTEXT, &[(SUB, &sub), (SUP, &sup)]);
            }
        }
    }

    fn write_assertion(&mut self, assertion: &Assertion) {
        match assertion {
            Assertion::Concept(a) => {
                let concept = self.write_expr(&a.concept);
                let individual = self.write_individual(&a.individual);
                self.link(INSTANCE_OF, &[(SUBJECT, &individual), (OBJECT, &concept)]);
            }
            Assertion::Property(a) => {
                let property = self.write_property(&a.property);
                let subject = self.write_individual(&a.subject);
                match &a.value {
                    PropertyValue::Individual(object) => {
                        let object = self.write_individual(object);
                        self.link(&property, &[(SUBJECT, &subject), (OBJECT, &object)]);
                    }
                    PropertyValue::Literal(value) => self.write_literal(&subject, &property, value),
                }
            }
        }
    }

    /// Stores a literal on the subject's node, turning the entry into an
    /// array once a second value arrives.
    fn write_literal(&mut self, subject: &str, property: &str, value: &str) {
        let position = match self.positions.get(subject) {
            Some(&position) => position,
            None => {
                self.push(Entity::Node(Node::new(subject).with_parent(self.context_id.as_str())));
                self.out.len() - 1
            }
        };
        let properties = self.out[position].properties_mut();
        let value = Value::String(value.to_string());
        match properties.get_mut(property) {
            None => {
                properties.insert(property.to_string(), value);
            }
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }

    /// Appends each reserved connector definition not already written.
    fn fix_connectors(&mut self) {
        for connector in well_known_connectors() {
            if !self.positions.contains_key(&connector.id) {
                self.push(Entity::Connector(connector));
            }
        }
    }
}

/// The written context, its ancestors, and both sides of every import
/// together with their ancestors.
fn context_record_ids(context: &HkoContext) -> AHashSet<String> {
    let mut ids = AHashSet::new();
    let mut add_chain = |mut current: Option<&ContextRef>| {
        while let Some(c) = current {
            ids.insert(c.graph_id());
            current = c.parent();
        }
    };
    add_chain(Some(context.reference()));
    for axiom in context.axioms() {
        if let Axiom::ImportContext { sub, sup, .. } = axiom {
            add_chain(Some(sub));
            add_chain(Some(sup));
        }
    }
    ids
}
