//! Factory API for constructing ontology elements inside a context.

use crate::context::ContextRef;
use crate::element::{
    Assertion, Axiom, Concept, ConceptAssertion, ConceptExpr, Individual, Junction, Property,
    PropertyAssertion, PropertyValue,
};

/// Creates elements owned by one context.
///
/// Named elements and compound expressions built here are only values; they
/// become part of a context once an axiom or assertion using them is added.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    context: ContextRef,
}

impl ContextBuilder {
    pub fn new(context: ContextRef) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ContextRef {
        &self.context
    }

    // ------------------------------------------------------------------
    // Named elements
    // ------------------------------------------------------------------

    pub fn concept(&self, iri: impl Into<String>) -> Concept {
        Concept::new(iri, &self.context)
    }

    pub fn property(&self, iri: impl Into<String>) -> Property {
        Property::new(iri, &self.context)
    }

    pub fn individual(&self, iri: impl Into<String>) -> Individual {
        Individual::new(iri, &self.context)
    }

    // ------------------------------------------------------------------
    // Concept expressions
    // ------------------------------------------------------------------

    pub fn exists(&self, property: Property, concept: impl Into<ConceptExpr>) -> ConceptExpr {
        ConceptExpr::Exists {
            property,
            concept: Box::new(concept.into()),
        }
    }

    pub fn forall(&self, property: Property, concept: impl Into<ConceptExpr>) -> ConceptExpr {
        ConceptExpr::Forall {
            property,
            concept: Box::new(concept.into()),
        }
    }

    pub fn conjunction<C: Into<ConceptExpr>>(
        &self,
        concepts: impl IntoIterator<Item = C>,
    ) -> ConceptExpr {
        ConceptExpr::Conjunction(Junction::new(concepts.into_iter().map(Into::into)))
    }

    pub fn disjunction<C: Into<ConceptExpr>>(
        &self,
        concepts: impl IntoIterator<Item = C>,
    ) -> ConceptExpr {
        ConceptExpr::Disjunction(Junction::new(concepts.into_iter().map(Into::into)))
    }

    pub fn negation(&self, concept: impl Into<ConceptExpr>) -> ConceptExpr {
        ConceptExpr::Negation(Box::new(concept.into()))
    }

    // ------------------------------------------------------------------
    // Axioms
    // ------------------------------------------------------------------

    pub fn sub_concept_of(
        &self,
        sub: impl Into<ConceptExpr>,
        sup: impl Into<ConceptExpr>,
    ) -> Axiom {
        Axiom::SubConceptOf {
            context: self.context.clone(),
            sub: sub.into(),
            sup: sup.into(),
        }
    }

    pub fn equivalent_concept(
        &self,
        left: impl Into<ConceptExpr>,
        right: impl Into<ConceptExpr>,
    ) -> Axiom {
        Axiom::EquivalentConcept {
            context: self.context.clone(),
            left: left.into(),
            right: right.into(),
        }
    }

    /// `sub` imports everything `sup` declares.
    pub fn import_context(&self, sub: &ContextRef, sup: &ContextRef) -> Axiom {
        Axiom::ImportContext {
            context: self.context.clone(),
            sub: sub.clone(),
            sup: sup.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Assertions
    // ------------------------------------------------------------------

    pub fn concept_assertion(
        &self,
        concept: impl Into<ConceptExpr>,
        individual: Individual,
    ) -> Assertion {
        Assertion::Concept(ConceptAssertion {
            context: self.context.clone(),
            concept: concept.into(),
            individual,
        })
    }

    pub fn property_assertion(
        &self,
        property: Property,
        subject: Individual,
        value: impl Into<PropertyValue>,
    ) -> Assertion {
        Assertion::Property(PropertyAssertion {
            context: self.context.clone(),
            property,
            subject,
            value: value.into(),
        })
    }
}
