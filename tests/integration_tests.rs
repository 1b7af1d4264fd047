//! Integration tests for the complete HyperKnowledge pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - Ontology builder → Writer → Graph → Reader
//! - Reader → Asserted reasoner
//! - Persisted context files
//!
//! Run with: cargo test --test integration_tests

use hk_convert::constants::{
    CONCEPT_SENTINEL, CONJUNCTION, EXISTS, INSTANCE_OF, OBJECT, SUBJECT, SUB_CONCEPT_OF,
};
use hk_convert::{load_context, save_context, Reader, ReaderConfig, Writer, WriterConfig};
use hk_graph::{validate, Entity, Graph, Link, Severity};
use hk_ontology::{
    AssertedReasoner, ConceptExpr, ContextManager, ContextRef, HkoContext, HkoElement,
    PropertyValue,
};
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn links<'e>(entities: &'e [Entity], connector: &str) -> Vec<&'e Link> {
    entities
        .iter()
        .filter_map(Entity::as_link)
        .filter(|l| l.connector_id() == connector)
        .collect()
}

/// `Father ⊑ Man ⊓ ∃hasChild.Person`
fn father_context() -> HkoContext {
    let mut context = HkoContext::new(ContextRef::root("http://ex.org/family"));
    let b = context.builder();
    let definition = b.conjunction([
        ConceptExpr::from(b.concept("Man")),
        b.exists(b.property("hasChild"), b.concept("Person")),
    ]);
    context.add(b.sub_concept_of(b.concept("Father"), definition));
    context
}

// ============================================================================
// Writer → Reader
// ============================================================================

#[test]
fn test_father_scenario_writes_expected_shape() {
    let context = father_context();
    let entities = Writer::default().write_context(&context);

    assert_eq!(links(&entities, EXISTS).len(), 1);
    assert_eq!(links(&entities, CONJUNCTION).len(), 1);
    assert_eq!(links(&entities, SUB_CONCEPT_OF).len(), 1);

    let concept_nodes: Vec<&str> = entities
        .iter()
        .filter(|e| matches!(e, Entity::Node(_)))
        .map(Entity::id)
        .filter(|id| ["<Father>", "<Man>", "<Person>"].contains(id))
        .collect();
    assert_eq!(concept_nodes.len(), 3);

    let concept_meta: Vec<&str> = links(&entities, INSTANCE_OF)
        .into_iter()
        .filter(|l| l.first_bound(OBJECT) == Some(CONCEPT_SENTINEL))
        .filter_map(|l| l.first_bound(SUBJECT))
        .collect();
    let mut concept_meta_sorted = concept_meta.clone();
    concept_meta_sorted.sort_unstable();
    assert_eq!(concept_meta_sorted, vec!["<Father>", "<Man>", "<Person>"]);

    // One sentinel node per kind, no matter how many elements refer to it.
    let sentinels = entities.iter().filter(|e| e.id() == CONCEPT_SENTINEL).count();
    assert_eq!(sentinels, 1);
}

#[test]
fn test_father_scenario_round_trips() {
    init_tracing();
    let context = father_context();
    let entities = Writer::default().write_context(&context);

    let mut restored = HkoContext::new(context.reference().clone());
    let report = Reader::default()
        .read_into_context(&entities, &mut restored)
        .expect("read should succeed");

    assert_eq!(report.added, 1);
    assert!(report.skipped.is_empty());
    assert_eq!(restored, context);

    let b = restored.builder();
    let expected = b.sub_concept_of(
        b.concept("Father"),
        b.conjunction([
            b.exists(b.property("hasChild"), b.concept("Person")),
            ConceptExpr::from(b.concept("Man")),
        ]),
    );
    assert!(restored.contains(&HkoElement::from(expected)));
}

#[test]
fn test_written_entities_load_into_a_graph() {
    let context = father_context();
    let entities = Writer::default().write_context(&context);

    let mut graph = Graph::new();
    for entity in entities.iter().cloned() {
        graph.add(entity).expect("writer output should be a valid graph");
    }
    assert_eq!(graph.stub_count(), 0);
    assert!(graph.indexes_consistent());
    assert!(!graph.members_of("<http://ex.org/family>").is_empty());

    let violations = validate(&graph);
    assert!(
        violations.iter().all(|v| v.issue.severity() != Severity::Error),
        "{violations:?}"
    );

    // Removing a concept node cascades to every link that binds it.
    graph.remove("<Person>");
    assert!(graph.links_binding("<Person>").is_empty());
    assert!(links(&entities, EXISTS)
        .iter()
        .all(|l| !graph.contains(&l.id)));
    assert!(graph.indexes_consistent());
}

// ============================================================================
// Reader → Reasoner
// ============================================================================

#[test]
fn test_reasoner_over_read_back_context() {
    init_tracing();
    let mut manager = ContextManager::new();
    let shared = manager
        .create_context("http://ex.org/taxonomy", None)
        .expect("fresh context");
    let reference = shared.read().reference().clone();
    let b = manager.context_builder(&reference);

    let c1 = b.concept("C1");
    let c1_1 = b.concept("C1_1");
    let c1_2 = b.concept("C1_2");
    let has_part = b.property("hasPart");
    manager.add_axiom(&reference, b.sub_concept_of(c1_1.clone(), c1.clone()));
    manager.add_axiom(&reference, b.sub_concept_of(c1_2.clone(), c1.clone()));
    for name in ["i1", "i2"] {
        manager.add_assertion(&reference, b.concept_assertion(c1_1.clone(), b.individual(name)));
    }
    manager.add_assertion(
        &reference,
        b.property_assertion(has_part.clone(), b.individual("i1"), &b.individual("i2")),
    );
    manager.add_assertion(
        &reference,
        b.property_assertion(b.property("weight"), b.individual("i1"), 12i64),
    );

    let entities = Writer::default().write_context(&shared.read());
    let mut restored = HkoContext::new(reference.clone());
    Reader::default()
        .read_into_context(&entities, &mut restored)
        .expect("read should succeed");
    assert_eq!(&restored, &*shared.read());

    let reasoner = AssertedReasoner::new(&restored);
    let c1 = ConceptExpr::from(c1);
    let mut subs: Vec<ConceptExpr> = reasoner
        .direct_sub_concepts_of(&c1)
        .into_iter()
        .cloned()
        .collect();
    subs.sort();
    let mut expected = vec![ConceptExpr::from(c1_1.clone()), ConceptExpr::from(c1_2)];
    expected.sort();
    assert_eq!(subs, expected);
    assert!(reasoner.direct_instances_of(&c1).is_empty());
    assert_eq!(reasoner.direct_instances_of(&c1_1.into()).len(), 2);

    assert_eq!(
        reasoner
            .related_value(&has_part, &b.individual("i1"))
            .expect("single value"),
        Some(&PropertyValue::from(b.individual("i2")))
    );
    assert_eq!(
        reasoner.related_values(&b.property("weight"), &b.individual("i1")),
        &[PropertyValue::literal(12)]
    );
}

// ============================================================================
// Persisted context files
// ============================================================================

#[test]
fn test_nested_context_file_round_trip() {
    init_tracing();
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("nested.json");

    let root = ContextRef::root("http://ex.org/root");
    let child = ContextRef::child("http://ex.org/child", &root);
    let mut context = HkoContext::new(child.clone());
    let b = context.builder();
    let shared = root.builder().concept("http://ex.org/Shared");
    context.add(b.import_context(&child, &root));
    context.add(b.sub_concept_of(b.concept("http://ex.org/Local"), shared));
    context.add(b.concept_assertion(
        b.negation(b.concept("http://ex.org/Local")),
        b.individual("x"),
    ));

    save_context(&path, &context, &WriterConfig::default()).expect("save");
    let (loaded, report) =
        load_context(&path, "http://ex.org/child", &ReaderConfig::default()).expect("load");

    assert!(report.skipped.is_empty());
    assert_eq!(loaded.reference(), &child);
    assert_eq!(loaded.reference().parent(), Some(&root));
    assert_eq!(loaded, context);
}

#[test]
fn test_loading_unknown_context_fails() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("family.json");
    save_context(&path, &father_context(), &WriterConfig::default()).expect("save");

    let err = load_context(&path, "http://ex.org/nope", &ReaderConfig::default())
        .expect_err("no such context record");
    assert!(err.to_string().contains("<http://ex.org/nope>"));
}
