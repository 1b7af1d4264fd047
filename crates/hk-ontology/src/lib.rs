//! # HyperKnowledge Ontology
//!
//! Description-logic style ontology values grouped into contexts:
//!
//! - named [`Concept`]s, [`Property`]s and [`Individual`]s, identified by
//!   their context-qualified IFI
//! - compound [`ConceptExpr`]essions (exists, forall, and, or, not)
//! - [`Axiom`]s and [`Assertion`]s owned by an [`HkoContext`]
//! - a [`ContextManager`] registry and an [`AssertedReasoner`] that answers
//!   direct (non-inferred) queries over one context

pub mod builder;
pub mod context;
pub mod element;
pub mod error;
pub mod manager;
pub mod reasoner;

pub use builder::ContextBuilder;
pub use context::{ContextRef, HkoContext};
pub use element::{
    Assertion, Axiom, Concept, ConceptAssertion, ConceptExpr, HkoElement, Individual, Junction,
    Property, PropertyAssertion, PropertyValue,
};
pub use error::{OntologyError, ReasonerError, Result};
pub use manager::{ContextManager, SharedContext};
pub use reasoner::AssertedReasoner;
