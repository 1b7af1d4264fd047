//! Named elements, concept expressions, axioms and assertions.
//!
//! Everything here is an immutable value. Named elements compare by IFI;
//! compound expressions compare structurally, with conjunction and
//! disjunction operands compared as multisets.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use hk_fi::Ifi;

use crate::context::ContextRef;

// ============================================================================
// Named elements
// ============================================================================

macro_rules! named_element {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            iri: String,
            context: ContextRef,
            ifi: Ifi,
        }

        impl $name {
            pub fn new(iri: impl Into<String>, context: &ContextRef) -> Self {
                let iri = iri.into();
                let ifi = Ifi::qualify(context.ifi(), &iri);
                Self {
                    iri,
                    context: context.clone(),
                    ifi,
                }
            }

            pub fn iri(&self) -> &str {
                &self.iri
            }

            pub fn context(&self) -> &ContextRef {
                &self.context
            }

            pub fn ifi(&self) -> &Ifi {
                &self.ifi
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.ifi == other.ifi
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.ifi.hash(state);
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.ifi.cmp(&other.ifi)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.iri)
            }
        }
    };
}

named_element!(
    /// A named (atomic) concept.
    Concept
);
named_element!(Property);
named_element!(Individual);

// ============================================================================
// Concept expressions
// ============================================================================

/// Operand list of a conjunction or disjunction.
///
/// Keeps the written order for display; equality, hashing and ordering use
/// the sorted operands, so `(and a b) == (and b a)` while `(and a a b)` and
/// `(and a b)` differ.
#[derive(Debug, Clone)]
pub struct Junction {
    operands: Vec<ConceptExpr>,
}

impl Junction {
    pub fn new(operands: impl IntoIterator<Item = ConceptExpr>) -> Self {
        Self {
            operands: operands.into_iter().collect(),
        }
    }

    pub fn operands(&self) -> &[ConceptExpr] {
        &self.operands
    }

    fn sorted(&self) -> Vec<&ConceptExpr> {
        let mut sorted: Vec<_> = self.operands.iter().collect();
        sorted.sort();
        sorted
    }
}

impl PartialEq for Junction {
    fn eq(&self, other: &Self) -> bool {
        self.operands.len() == other.operands.len() && self.sorted() == other.sorted()
    }
}

impl Eq for Junction {}

impl Hash for Junction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted().hash(state);
    }
}

impl PartialOrd for Junction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Junction {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sorted().cmp(&other.sorted())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConceptExpr {
    Named(Concept),
    Exists {
        property: Property,
        concept: Box<ConceptExpr>,
    },
    Forall {
        property: Property,
        concept: Box<ConceptExpr>,
    },
    Conjunction(Junction),
    Disjunction(Junction),
    Negation(Box<ConceptExpr>),
}

impl ConceptExpr {
    pub fn as_named(&self) -> Option<&Concept> {
        match self {
            ConceptExpr::Named(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, ConceptExpr::Named(_))
    }
}

impl From<Concept> for ConceptExpr {
    fn from(c: Concept) -> Self {
        ConceptExpr::Named(c)
    }
}

impl From<&Concept> for ConceptExpr {
    fn from(c: &Concept) -> Self {
        ConceptExpr::Named(c.clone())
    }
}

fn write_operands(f: &mut fmt::Formatter<'_>, op: &str, junction: &Junction) -> fmt::Result {
    write!(f, "({op}")?;
    for operand in junction.operands() {
        write!(f, " {operand}")?;
    }
    write!(f, ")")
}

impl fmt::Display for ConceptExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConceptExpr::Named(c) => write!(f, "{c}"),
            ConceptExpr::Exists { property, concept } => write!(f, "(exists {property} {concept})"),
            ConceptExpr::Forall { property, concept } => write!(f, "(forall {property} {concept})"),
            ConceptExpr::Conjunction(j) => write_operands(f, "and", j),
            ConceptExpr::Disjunction(j) => write_operands(f, "or", j),
            ConceptExpr::Negation(c) => write!(f, "(not {c})"),
        }
    }
}

// ============================================================================
// Axioms
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axiom {
    SubConceptOf {
        context: ContextRef,
        sub: ConceptExpr,
        sup: ConceptExpr,
    },
    EquivalentConcept {
        context: ContextRef,
        left: ConceptExpr,
        right: ConceptExpr,
    },
    ImportContext {
        context: ContextRef,
        sub: ContextRef,
        sup: ContextRef,
    },
}

impl Axiom {
    pub fn context(&self) -> &ContextRef {
        match self {
            Axiom::SubConceptOf { context, .. }
            | Axiom::EquivalentConcept { context, .. }
            | Axiom::ImportContext { context, .. } => context,
        }
    }

    fn set_context(&mut self, new: ContextRef) {
        match self {
            Axiom::SubConceptOf { context, .. }
            | Axiom::EquivalentConcept { context, .. }
            | Axiom::ImportContext { context, .. } => *context = new,
        }
    }
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axiom::SubConceptOf { sub, sup, .. } => write!(f, "(subconcept {sub} {sup})"),
            Axiom::EquivalentConcept { left, right, .. } => write!(f, "(eqconcept {left} {right})"),
            Axiom::ImportContext { sub, sup, .. } => write!(f, "(import {sub} {sup})"),
        }
    }
}

// ============================================================================
// Assertions
// ============================================================================

/// Second argument of a property assertion. Literals are kept in string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyValue {
    Individual(Individual),
    Literal(String),
}

impl PropertyValue {
    pub fn literal(value: impl fmt::Display) -> Self {
        PropertyValue::Literal(value.to_string())
    }

    pub fn as_individual(&self) -> Option<&Individual> {
        match self {
            PropertyValue::Individual(i) => Some(i),
            PropertyValue::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            PropertyValue::Literal(s) => Some(s),
            PropertyValue::Individual(_) => None,
        }
    }
}

impl From<Individual> for PropertyValue {
    fn from(i: Individual) -> Self {
        PropertyValue::Individual(i)
    }
}

impl From<&Individual> for PropertyValue {
    fn from(i: &Individual) -> Self {
        PropertyValue::Individual(i.clone())
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Literal(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Literal(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::literal(n)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::literal(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::literal(b)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Individual(i) => write!(f, "{i}"),
            PropertyValue::Literal(s) => write!(f, "\"{s}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConceptAssertion {
    pub context: ContextRef,
    pub concept: ConceptExpr,
    pub individual: Individual,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyAssertion {
    pub context: ContextRef,
    pub property: Property,
    pub subject: Individual,
    pub value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Assertion {
    Concept(ConceptAssertion),
    Property(PropertyAssertion),
}

impl Assertion {
    pub fn context(&self) -> &ContextRef {
        match self {
            Assertion::Concept(a) => &a.context,
            Assertion::Property(a) => &a.context,
        }
    }

    fn set_context(&mut self, new: ContextRef) {
        match self {
            Assertion::Concept(a) => a.context = new,
            Assertion::Property(a) => a.context = new,
        }
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Concept(a) => write!(f, "({} {})", a.concept, a.individual),
            Assertion::Property(a) => write!(f, "({} {} {})", a.property, a.subject, a.value),
        }
    }
}

impl From<ConceptAssertion> for Assertion {
    fn from(a: ConceptAssertion) -> Self {
        Assertion::Concept(a)
    }
}

impl From<PropertyAssertion> for Assertion {
    fn from(a: PropertyAssertion) -> Self {
        Assertion::Property(a)
    }
}

// ============================================================================
// Context elements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HkoElement {
    Axiom(Axiom),
    Assertion(Assertion),
}

impl HkoElement {
    pub fn context(&self) -> &ContextRef {
        match self {
            HkoElement::Axiom(a) => a.context(),
            HkoElement::Assertion(a) => a.context(),
        }
    }

    /// The same element owned by `context`. Named operands keep their own
    /// contexts.
    pub fn with_context(mut self, context: &ContextRef) -> Self {
        match &mut self {
            HkoElement::Axiom(a) => a.set_context(context.clone()),
            HkoElement::Assertion(a) => a.set_context(context.clone()),
        }
        self
    }
}

impl fmt::Display for HkoElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HkoElement::Axiom(a) => write!(f, "{a}"),
            HkoElement::Assertion(a) => write!(f, "{a}"),
        }
    }
}

impl From<Axiom> for HkoElement {
    fn from(a: Axiom) -> Self {
        HkoElement::Axiom(a)
    }
}

impl From<Assertion> for HkoElement {
    fn from(a: Assertion) -> Self {
        HkoElement::Assertion(a)
    }
}

impl From<ConceptAssertion> for HkoElement {
    fn from(a: ConceptAssertion) -> Self {
        HkoElement::Assertion(Assertion::Concept(a))
    }
}

impl From<PropertyAssertion> for HkoElement {
    fn from(a: PropertyAssertion) -> Self {
        HkoElement::Assertion(Assertion::Property(a))
    }
}
