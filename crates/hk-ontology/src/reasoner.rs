//! Reasoner over the asserted (non-inferred) content of one context.
//!
//! Indices are built once from the context's elements; queries are map
//! lookups or filters over the cached lists and never re-scan the context.
//! Only direct facts are reported: instances of a sub-concept are not
//! instances of its super-concept here.

use ahash::AHashMap;
use tracing::debug;

use crate::context::HkoContext;
use crate::element::{
    Assertion, Axiom, ConceptAssertion, ConceptExpr, HkoElement, Individual, Property,
    PropertyAssertion, PropertyValue,
};
use crate::error::ReasonerError;

#[derive(Debug, Default)]
pub struct AssertedReasoner {
    concepts_by_individual: AHashMap<Individual, Vec<ConceptExpr>>,
    individuals_by_concept: AHashMap<ConceptExpr, Vec<Individual>>,
    values_by_subject: AHashMap<(Individual, Property), Vec<PropertyValue>>,
    subjects_by_value: AHashMap<(PropertyValue, Property), Vec<Individual>>,
    axioms: Vec<Axiom>,
    assertions: Vec<Assertion>,
}

impl AssertedReasoner {
    pub fn new(context: &HkoContext) -> Self {
        let mut reasoner = Self::default();
        reasoner.reset(context);
        reasoner
    }

    /// Drops every index and rebuilds from `context`.
    pub fn reset(&mut self, context: &HkoContext) {
        *self = Self::default();
        for element in context.elements() {
            match element {
                HkoElement::Axiom(axiom) => self.axioms.push(axiom.clone()),
                HkoElement::Assertion(assertion) => {
                    self.index(assertion);
                    self.assertions.push(assertion.clone());
                }
            }
        }
        debug!(
            context = %context.ifi(),
            axioms = self.axioms.len(),
            assertions = self.assertions.len(),
            "reasoner indices built"
        );
    }

    fn index(&mut self, assertion: &Assertion) {
        match assertion {
            Assertion::Concept(a) => {
                insert_unique(
                    self.concepts_by_individual.entry(a.individual.clone()).or_default(),
                    &a.concept,
                );
                insert_unique(
                    self.individuals_by_concept.entry(a.concept.clone()).or_default(),
                    &a.individual,
                );
            }
            Assertion::Property(a) => {
                insert_unique(
                    self.values_by_subject
                        .entry((a.subject.clone(), a.property.clone()))
                        .or_default(),
                    &a.value,
                );
                insert_unique(
                    self.subjects_by_value
                        .entry((a.value.clone(), a.property.clone()))
                        .or_default(),
                    &a.subject,
                );
            }
        }
    }

    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    // ========================================================================
    // Concept queries
    // ========================================================================

    /// Sub-concepts declared by `SubConceptOf(sub, concept)` axioms.
    ///
    /// Conjunctive sub-expressions are returned as written, not decomposed.
    /// Each sub-concept appears once, whichever context declared the axiom.
    pub fn direct_sub_concepts_of(&self, concept: &ConceptExpr) -> Vec<&ConceptExpr> {
        let mut subs = Vec::new();
        for axiom in &self.axioms {
            if let Axiom::SubConceptOf { sub, sup, .. } = axiom {
                if sup == concept && !subs.contains(&sub) {
                    subs.push(sub);
                }
            }
        }
        subs
    }

    pub fn direct_instances_of(&self, concept: &ConceptExpr) -> &[Individual] {
        self.individuals_by_concept
            .get(concept)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn direct_concepts_of(&self, individual: &Individual) -> &[ConceptExpr] {
        self.concepts_by_individual
            .get(individual)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_direct_instance_of(&self, individual: &Individual, concept: &ConceptExpr) -> bool {
        self.direct_concepts_of(individual).contains(concept)
    }

    /// Same as [`AssertedReasoner::is_direct_instance_of`]; no inference is
    /// performed.
    pub fn is_instance_of(&self, individual: &Individual, concept: &ConceptExpr) -> bool {
        self.is_direct_instance_of(individual, concept)
    }

    // ========================================================================
    // Property queries
    // ========================================================================

    /// Values `v` such that `(property subject v)` is asserted.
    pub fn related_values(&self, property: &Property, subject: &Individual) -> &[PropertyValue] {
        self.values_by_subject
            .get(&(subject.clone(), property.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Subjects `s` such that `(property s value)` is asserted.
    pub fn entities_relating_to(&self, property: &Property, value: &PropertyValue) -> &[Individual] {
        self.subjects_by_value
            .get(&(value.clone(), property.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The single value of `property` on `subject`.
    pub fn related_value(
        &self,
        property: &Property,
        subject: &Individual,
    ) -> Result<Option<&PropertyValue>, ReasonerError> {
        match self.related_values(property, subject) {
            [] => Ok(None),
            [value] => Ok(Some(value)),
            values => Err(ReasonerError::MultipleValues {
                subject: subject.clone(),
                property: property.clone(),
                values: values.to_vec(),
            }),
        }
    }

    // ========================================================================
    // Pattern queries
    // ========================================================================

    /// Property assertions matching every given field; `None` matches anything.
    pub fn property_assertion_pattern(
        &self,
        property: Option<&Property>,
        subject: Option<&Individual>,
        value: Option<&PropertyValue>,
    ) -> Vec<&PropertyAssertion> {
        self.assertions
            .iter()
            .filter_map(|a| match a {
                Assertion::Property(pa) => Some(pa),
                Assertion::Concept(_) => None,
            })
            .filter(|pa| property.map_or(true, |p| &pa.property == p))
            .filter(|pa| subject.map_or(true, |s| &pa.subject == s))
            .filter(|pa| value.map_or(true, |v| &pa.value == v))
            .collect()
    }

    pub fn concept_assertion_pattern(
        &self,
        concept: Option<&ConceptExpr>,
        individual: Option<&Individual>,
    ) -> Vec<&ConceptAssertion> {
        self.assertions
            .iter()
            .filter_map(|a| match a {
                Assertion::Concept(ca) => Some(ca),
                Assertion::Property(_) => None,
            })
            .filter(|ca| concept.map_or(true, |c| &ca.concept == c))
            .filter(|ca| individual.map_or(true, |i| &ca.individual == i))
            .collect()
    }
}

/// Index values are sets kept in first-seen order.
fn insert_unique<T: PartialEq + Clone>(values: &mut Vec<T>, value: &T) {
    if !values.contains(value) {
        values.push(value.clone());
    }
}
