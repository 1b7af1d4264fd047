//! Ontology contexts.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use hk_fi::Ifi;

use crate::builder::ContextBuilder;
use crate::element::{Assertion, Axiom, HkoElement};

/// Handle to a context: its IRI, its parent chain and the derived IFI.
///
/// Every element declared in a context carries one of these. Identity is the
/// IFI.
#[derive(Debug, Clone)]
pub struct ContextRef {
    iri: String,
    parent: Option<Arc<ContextRef>>,
    ifi: Ifi,
}

impl ContextRef {
    pub fn root(iri: impl Into<String>) -> Self {
        let iri = iri.into();
        let ifi = Ifi::from_iri(&iri);
        Self {
            iri,
            parent: None,
            ifi,
        }
    }

    pub fn child(iri: impl Into<String>, parent: &ContextRef) -> Self {
        let iri = iri.into();
        let ifi = Ifi::qualify(&parent.ifi, &iri);
        Self {
            iri,
            parent: Some(Arc::new(parent.clone())),
            ifi,
        }
    }

    pub fn new(iri: impl Into<String>, parent: Option<&ContextRef>) -> Self {
        match parent {
            Some(parent) => Self::child(iri, parent),
            None => Self::root(iri),
        }
    }

    /// Rebuilds a context handle from its IFI (the inverse of [`ContextRef::ifi`]).
    pub fn from_ifi(ifi: &Ifi) -> Option<Self> {
        match (ifi.key(), ifi.context()) {
            (Some(key), Some(parent)) => {
                let parent = Self::from_ifi(&parent)?;
                Some(Self::child(key.to_string(), &parent))
            }
            _ => ifi.root_iri().map(Self::root),
        }
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn parent(&self) -> Option<&ContextRef> {
        self.parent.as_deref()
    }

    pub fn ifi(&self) -> &Ifi {
        &self.ifi
    }

    /// Graph id of this context's record: `<iri>`.
    pub fn graph_id(&self) -> String {
        format!("<{}>", self.iri)
    }

    pub fn builder(&self) -> ContextBuilder {
        ContextBuilder::new(self.clone())
    }
}

impl PartialEq for ContextRef {
    fn eq(&self, other: &Self) -> bool {
        self.ifi == other.ifi
    }
}

impl Eq for ContextRef {}

impl Hash for ContextRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ifi.hash(state);
    }
}

impl PartialOrd for ContextRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ContextRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ifi.cmp(&other.ifi)
    }
}

impl fmt::Display for ContextRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iri)
    }
}

/// A context together with the axioms and assertions it owns.
///
/// Elements form a set, so re-adding an element is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HkoContext {
    reference: ContextRef,
    elements: BTreeSet<HkoElement>,
}

impl HkoContext {
    pub fn new(reference: ContextRef) -> Self {
        Self {
            reference,
            elements: BTreeSet::new(),
        }
    }

    pub fn reference(&self) -> &ContextRef {
        &self.reference
    }

    pub fn iri(&self) -> &str {
        self.reference.iri()
    }

    pub fn ifi(&self) -> &Ifi {
        self.reference.ifi()
    }

    pub fn builder(&self) -> ContextBuilder {
        self.reference.builder()
    }

    /// Returns false when the element was already present.
    pub fn add(&mut self, element: impl Into<HkoElement>) -> bool {
        self.elements.insert(element.into())
    }

    pub fn extend<E: Into<HkoElement>>(&mut self, elements: impl IntoIterator<Item = E>) {
        self.elements.extend(elements.into_iter().map(Into::into));
    }

    pub fn remove(&mut self, element: &HkoElement) -> bool {
        self.elements.remove(element)
    }

    pub fn contains(&self, element: &HkoElement) -> bool {
        self.elements.contains(element)
    }

    pub fn elements(&self) -> &BTreeSet<HkoElement> {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn axioms(&self) -> impl Iterator<Item = &Axiom> {
        self.elements.iter().filter_map(|e| match e {
            HkoElement::Axiom(a) => Some(a),
            HkoElement::Assertion(_) => None,
        })
    }

    pub fn assertions(&self) -> impl Iterator<Item = &Assertion> {
        self.elements.iter().filter_map(|e| match e {
            HkoElement::Assertion(a) => Some(a),
            HkoElement::Axiom(_) => None,
        })
    }
}

impl fmt::Display for HkoContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[ ", self.reference)?;
        for (i, e) in self.elements.iter().enumerate() {
            if i > 0 {
                writeln!(f, ",")?;
            }
            write!(f, "{e}")?;
        }
        write!(f, " ]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_identity_follows_parent_chain() {
        let root = ContextRef::root("http://ex.org/root");
        let a = ContextRef::child("http://ex.org/a", &root);
        let b = ContextRef::root("http://ex.org/a");
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(&root));
        assert_eq!(a.graph_id(), "<http://ex.org/a>");
    }

    #[test]
    fn context_ref_is_recoverable_from_its_ifi() {
        let root = ContextRef::root("http://ex.org/root");
        let child = ContextRef::child("http://ex.org/child#v1", &root);
        let grandchild = ContextRef::child("http://ex.org/gc", &child);

        let parsed = Ifi::parse(&grandchild.ifi().to_string()).unwrap();
        let rebuilt = ContextRef::from_ifi(&parsed).unwrap();
        assert_eq!(rebuilt, grandchild);
        assert_eq!(rebuilt.iri(), "http://ex.org/gc");
        assert_eq!(rebuilt.parent().map(ContextRef::iri), Some("http://ex.org/child#v1"));
        assert_eq!(
            rebuilt.parent().and_then(ContextRef::parent).map(ContextRef::iri),
            Some("http://ex.org/root")
        );
    }

    #[test]
    fn elements_have_set_semantics() {
        let ctx = ContextRef::root("http://ex.org/c");
        let b = ctx.builder();
        let mut context = HkoContext::new(ctx);
        let axiom = b.sub_concept_of(b.concept("http://ex.org/A"), b.concept("http://ex.org/B"));
        assert!(context.add(axiom.clone()));
        assert!(!context.add(axiom));
        assert_eq!(context.len(), 1);
        assert_eq!(context.axioms().count(), 1);
        assert_eq!(context.assertions().count(), 0);
    }
}
