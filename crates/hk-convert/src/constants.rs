//! Reserved ids and bind roles of the ontology encoding.

use hk_graph::{Connector, ConnectorClass, RoleType};

pub const INSTANCE_OF: &str = "<http://www.w3.org/1999/02/22-rdf-syntax-ns#type>";

pub const CONCEPT_SENTINEL: &str = "<http://brl.ibm.com/ontologies/hko#Concept>";
pub const PROPERTY_SENTINEL: &str = "<http://brl.ibm.com/ontologies/hko#Property>";
pub const INDIVIDUAL_SENTINEL: &str = "<http://brl.ibm.com/ontologies/hko#Individual>";

pub const SUB_CONCEPT_OF: &str = "subConceptOf";
pub const EQ_CONCEPT_TO: &str = "eqConceptTo";
pub const EXISTS: &str = "exists";
pub const FORALL: &str = "forall";
pub const CONJUNCTION: &str = "conjunction";
pub const DISJUNCTION: &str = "disjunction";
pub const NOT: &str = "not";
pub const IMPORT_CONTEXT: &str = "importContext";

pub const SUBJECT: &str = "subject";
pub const OBJECT: &str = "object";
pub const SUB: &str = "sub";
pub const SUP: &str = "sup";
pub const LEFT: &str = "left";
pub const RIGHT: &str = "right";
pub const HEAD_CONCEPT: &str = "head_concept";
pub const PROPERTY: &str = "property";
pub const CONCEPT: &str = "concept";
pub const CONCEPTS: &str = "concepts";

/// Connectors whose links encode compound concept expressions.
pub const EXPRESSION_CONNECTORS: [&str; 5] = [EXISTS, FORALL, CONJUNCTION, DISJUNCTION, NOT];

/// `<iri>`
pub fn encode_iri(iri: &str) -> String {
    format!("<{iri}>")
}

/// Strips the enclosing diamonds; ids without them are taken as raw IRIs.
pub fn decode_iri(id: &str) -> &str {
    id.strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(id)
}

/// Connector used by the subject/object links of a property.
pub fn property_connector(id: impl Into<String>) -> Connector {
    Connector::new(id, ConnectorClass::Facts)
        .with_role(SUBJECT, RoleType::Subject)
        .with_role(OBJECT, RoleType::Object)
}

/// Definitions of every connector the encoding reserves.
pub fn well_known_connectors() -> Vec<Connector> {
    let expression = |id: &str| {
        Connector::new(id, ConnectorClass::Facts)
            .with_role(HEAD_CONCEPT, RoleType::Subject)
            .with_role(PROPERTY, RoleType::Object)
            .with_role(CONCEPT, RoleType::Object)
    };
    let junction = |id: &str| {
        Connector::new(id, ConnectorClass::Facts)
            .with_role(HEAD_CONCEPT, RoleType::Subject)
            .with_role(CONCEPTS, RoleType::Object)
    };
    vec![
        Connector::new(INSTANCE_OF, ConnectorClass::Hierarchy)
            .with_role(SUBJECT, RoleType::Child)
            .with_role(OBJECT, RoleType::Parent),
        Connector::new(SUB_CONCEPT_OF, ConnectorClass::Hierarchy)
            .with_role(SUB, RoleType::Child)
            .with_role(SUP, RoleType::Parent),
        Connector::new(EQ_CONCEPT_TO, ConnectorClass::Facts)
            .with_role(LEFT, RoleType::Subject)
            .with_role(RIGHT, RoleType::Object),
        expression(EXISTS),
        expression(FORALL),
        junction(CONJUNCTION),
        junction(DISJUNCTION),
        Connector::new(NOT, ConnectorClass::Facts)
            .with_role(HEAD_CONCEPT, RoleType::Subject)
            .with_role(CONCEPT, RoleType::Object),
        Connector::new(IMPORT_CONTEXT, ConnectorClass::Facts)
            .with_role(SUB, RoleType::Subject)
            .with_role(SUP, RoleType::Object),
    ]
}
