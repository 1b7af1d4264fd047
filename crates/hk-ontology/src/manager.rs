//! Registry of live contexts, keyed by context IFI.

use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use hk_fi::Ifi;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::builder::ContextBuilder;
use crate::context::{ContextRef, HkoContext};
use crate::element::{Assertion, Axiom, HkoElement};
use crate::error::{OntologyError, Result};

/// A context shared between the registry and its users.
pub type SharedContext = Arc<RwLock<HkoContext>>;

#[derive(Debug, Default)]
pub struct ContextManager {
    contexts: AHashMap<Ifi, SharedContext>,
}

impl ContextManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry for hosts that do not thread one through.
    pub fn global() -> &'static Mutex<ContextManager> {
        static GLOBAL: OnceLock<Mutex<ContextManager>> = OnceLock::new();
        GLOBAL.get_or_init(|| Mutex::new(ContextManager::new()))
    }

    /// Creates and registers a new context.
    pub fn create_context(
        &mut self,
        iri: impl Into<String>,
        parent: Option<&ContextRef>,
    ) -> Result<SharedContext> {
        let reference = ContextRef::new(iri, parent);
        if self.contexts.contains_key(reference.ifi()) {
            return Err(OntologyError::DuplicateContext {
                iri: reference.iri().to_string(),
            });
        }
        debug!(context = %reference.ifi(), "registering context");
        let shared = Arc::new(RwLock::new(HkoContext::new(reference.clone())));
        self.contexts.insert(reference.ifi().clone(), Arc::clone(&shared));
        Ok(shared)
    }

    /// The registered context, or a fresh unregistered placeholder.
    pub fn get_context(&self, iri: impl Into<String>, parent: Option<&ContextRef>) -> SharedContext {
        let reference = ContextRef::new(iri, parent);
        match self.contexts.get(reference.ifi()) {
            Some(shared) => Arc::clone(shared),
            None => Arc::new(RwLock::new(HkoContext::new(reference))),
        }
    }

    /// Registers an existing context; fails if its IFI is taken.
    pub fn register(&mut self, context: HkoContext) -> Result<SharedContext> {
        let ifi = context.ifi().clone();
        if self.contexts.contains_key(&ifi) {
            return Err(OntologyError::DuplicateContext {
                iri: context.iri().to_string(),
            });
        }
        let shared = Arc::new(RwLock::new(context));
        self.contexts.insert(ifi, Arc::clone(&shared));
        Ok(shared)
    }

    pub fn lookup(&self, reference: &ContextRef) -> Option<SharedContext> {
        self.contexts.get(reference.ifi()).cloned()
    }

    pub fn contains(&self, reference: &ContextRef) -> bool {
        self.contexts.contains_key(reference.ifi())
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn context_builder(&self, reference: &ContextRef) -> ContextBuilder {
        ContextBuilder::new(reference.clone())
    }

    /// Adds `axiom` to the registered context `target`, rebinding it to that
    /// context. Returns false if the axiom was already present or `target` is
    /// not registered.
    pub fn add_axiom(&self, target: &ContextRef, axiom: Axiom) -> bool {
        self.add_element(target, HkoElement::Axiom(axiom))
    }

    pub fn add_assertion(&self, target: &ContextRef, assertion: Assertion) -> bool {
        self.add_element(target, HkoElement::Assertion(assertion))
    }

    fn add_element(&self, target: &ContextRef, element: HkoElement) -> bool {
        match self.contexts.get(target.ifi()) {
            Some(shared) => shared.write().add(element.with_context(target)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_duplicates() {
        let mut manager = ContextManager::new();
        let root = manager.create_context("http://ex.org/root", None).unwrap();
        let root_ref = root.read().reference().clone();
        manager.create_context("http://ex.org/child", Some(&root_ref)).unwrap();

        assert!(matches!(
            manager.create_context("http://ex.org/root", None),
            Err(OntologyError::DuplicateContext { .. })
        ));
        // Same iri under a different parent is a different context.
        manager.create_context("http://ex.org/root", Some(&root_ref)).unwrap();
        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn get_returns_registered_instance_or_placeholder() {
        let mut manager = ContextManager::new();
        let created = manager.create_context("http://ex.org/c", None).unwrap();
        let fetched = manager.get_context("http://ex.org/c", None);
        assert!(Arc::ptr_eq(&created, &fetched));

        let placeholder = manager.get_context("http://ex.org/missing", None);
        assert!(placeholder.read().is_empty());
        assert!(!manager.contains(placeholder.read().reference()));
    }

    #[test]
    fn add_helpers_rebind_to_target() {
        let mut manager = ContextManager::new();
        let shared = manager.create_context("http://ex.org/c", None).unwrap();
        let target = shared.read().reference().clone();
        let elsewhere = ContextRef::root("http://ex.org/elsewhere");
        let b = manager.context_builder(&elsewhere);

        let john = b.individual("john");
        assert!(manager.add_assertion(&target, b.concept_assertion(b.concept("Person"), john)));
        assert!(manager.add_axiom(&target, b.sub_concept_of(b.concept("A"), b.concept("B"))));
        assert!(!manager.add_axiom(&elsewhere, b.sub_concept_of(b.concept("A"), b.concept("B"))));

        let context = shared.read();
        assert_eq!(context.len(), 2);
        assert!(context.elements().iter().all(|e| e.context() == &target));
    }

    #[test]
    fn global_registry_is_shared() {
        let iri = "http://ex.org/global-registry-test";
        ContextManager::global().lock().create_context(iri, None).unwrap();
        assert!(ContextManager::global()
            .lock()
            .contains(&ContextRef::root(iri)));
    }
}
