//! HyperKnowledge hypergraph model
//!
//! - [`entity`]: node, context, reference, connector and link records with
//!   their JSON wire form
//! - [`graph`]: an arena-indexed container that keeps the connector, bind
//!   and context-membership indices consistent across adds and cascading
//!   removals
//! - [`validate`]: reports binds that disagree with their connector

pub mod entity;
pub mod graph;
pub mod validate;

pub use entity::{
    blank_id, Anchor, AnchorType, Binds, Connector, ConnectorClass, Entity, EntityKind,
    Interface, Link, LinkConnector, Node, Properties, ReferenceNode, RoleType,
};
pub use graph::{Graph, GraphError};
pub use hk_fi::LAMBDA;
pub use validate::{validate, BindIssue, BindViolation, Severity};
