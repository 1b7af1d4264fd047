//! Converter Round-Trip Tests
//!
//! Reading what the Writer produced must give back the written element set,
//! for contexts mixing local and foreign elements, compound expressions,
//! imports and literal assertions. Concepts, properties and individuals may
//! share an iri with each other or with a context.

use hk_convert::{Reader, ReaderConfig, Writer, WriterConfig};
use hk_graph::Graph;
use hk_ontology::{
    Concept, ConceptExpr, ContextRef, HkoContext, HkoElement, Individual, Property, PropertyValue,
};
use proptest::prelude::*;

fn root() -> ContextRef {
    ContextRef::root("http://ex.org/root")
}

fn home() -> ContextRef {
    ContextRef::child("http://ex.org/home", &root())
}

fn library() -> ContextRef {
    ContextRef::root("http://ex.org/lib")
}

fn owner(foreign: bool) -> ContextRef {
    if foreign {
        library()
    } else {
        home()
    }
}

/// Names drawn from a per-kind pool or from one shared by every kind, which
/// includes the iris of the contexts in play.
fn iri(kind: &'static str, count: usize) -> impl Strategy<Value = String> {
    prop_oneof![
        3 => (0..count).prop_map(move |i| format!("http://ex.org/{kind}{i}")),
        1 => prop_oneof![
            Just("http://ex.org/shared"),
            Just("http://ex.org/home"),
            Just("http://ex.org/root"),
            Just("http://ex.org/lib"),
        ]
        .prop_map(str::to_string),
    ]
}

fn concept() -> impl Strategy<Value = Concept> {
    (iri("C", 4), any::<bool>()).prop_map(|(iri, foreign)| Concept::new(iri, &owner(foreign)))
}

fn property() -> impl Strategy<Value = Property> {
    (iri("p", 3), any::<bool>()).prop_map(|(iri, foreign)| Property::new(iri, &owner(foreign)))
}

fn individual() -> impl Strategy<Value = Individual> {
    (iri("i", 4), any::<bool>()).prop_map(|(iri, foreign)| Individual::new(iri, &owner(foreign)))
}

fn expr() -> impl Strategy<Value = ConceptExpr> {
    concept().prop_map(ConceptExpr::from).prop_recursive(3, 16, 3, |inner| {
        let b = home().builder();
        prop_oneof![
            (property(), inner.clone()).prop_map({
                let b = b.clone();
                move |(p, c)| b.exists(p, c)
            }),
            (property(), inner.clone()).prop_map({
                let b = b.clone();
                move |(p, c)| b.forall(p, c)
            }),
            proptest::collection::vec(inner.clone(), 1..4).prop_map({
                let b = b.clone();
                move |cs| b.conjunction(cs)
            }),
            proptest::collection::vec(inner.clone(), 1..4).prop_map({
                let b = b.clone();
                move |cs| b.disjunction(cs)
            }),
            inner.prop_map(move |c| b.negation(c)),
        ]
    })
}

fn literal() -> impl Strategy<Value = PropertyValue> {
    prop_oneof![
        proptest::string::string_regex("[a-zA-Z0-9 ]{0,8}")
            .unwrap()
            .prop_map(PropertyValue::Literal),
        any::<i32>().prop_map(|n| PropertyValue::from(n as i64)),
        any::<bool>().prop_map(PropertyValue::from),
    ]
}

fn imported() -> impl Strategy<Value = ContextRef> {
    prop_oneof![
        Just(root()),
        Just(library()),
        Just(ContextRef::child("http://ex.org/ext", &library())),
    ]
}

fn element() -> impl Strategy<Value = HkoElement> {
    let b = home().builder();
    prop_oneof![
        (expr(), expr()).prop_map({
            let b = b.clone();
            move |(sub, sup)| b.sub_concept_of(sub, sup).into()
        }),
        (expr(), expr()).prop_map({
            let b = b.clone();
            move |(l, r)| b.equivalent_concept(l, r).into()
        }),
        (expr(), individual()).prop_map({
            let b = b.clone();
            move |(c, i)| b.concept_assertion(c, i).into()
        }),
        (property(), individual(), individual()).prop_map({
            let b = b.clone();
            move |(p, s, o)| b.property_assertion(p, s, o).into()
        }),
        (property(), individual(), literal()).prop_map({
            let b = b.clone();
            move |(p, s, v)| b.property_assertion(p, s, v).into()
        }),
        imported().prop_map(move |sup| b.import_context(b.context(), &sup).into()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn reading_written_entities_restores_the_context(
        elements in proptest::collection::vec(element(), 0..12),
        dedupe in any::<bool>(),
    ) {
        let mut original = HkoContext::new(home());
        original.extend(elements);

        let entities = Writer::new(WriterConfig {
            dedupe_compound_expressions: dedupe,
            ..WriterConfig::default()
        })
        .write_context(&original);

        let mut restored = HkoContext::new(home());
        let report = Reader::new(ReaderConfig::default())
            .read_into_context(&entities, &mut restored)
            .unwrap();

        prop_assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
        prop_assert_eq!(report.added, original.len());
        prop_assert_eq!(restored.elements(), original.elements());
    }

    #[test]
    fn written_entities_load_into_a_graph(
        elements in proptest::collection::vec(element(), 0..12),
        dedupe in any::<bool>(),
    ) {
        let mut original = HkoContext::new(home());
        original.extend(elements);

        let entities = Writer::new(WriterConfig {
            dedupe_compound_expressions: dedupe,
            ..WriterConfig::default()
        })
        .write_context(&original);

        let mut graph = Graph::new();
        for entity in entities.iter().cloned() {
            let id = entity.id().to_string();
            prop_assert!(graph.add(entity).is_ok(), "rejected {}", id);
        }
        prop_assert_eq!(graph.stub_count(), 0);
        prop_assert!(graph.indexes_consistent());
    }

    #[test]
    fn written_records_survive_json(elements in proptest::collection::vec(element(), 0..8)) {
        let mut original = HkoContext::new(home());
        original.extend(elements);

        let records: Vec<_> = Writer::default()
            .write_context(&original)
            .iter()
            .map(hk_graph::Entity::to_record)
            .collect();
        let text = serde_json::to_string(&records).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();

        let mut restored = HkoContext::new(home());
        Reader::default().read_records(&parsed, &mut restored).unwrap();
        prop_assert_eq!(restored, original);
    }
}

fn round_trip(original: &HkoContext) {
    let entities = Writer::default().write_context(original);
    let mut graph = Graph::new();
    for entity in entities.iter().cloned() {
        graph.add(entity).unwrap();
    }

    let mut restored = HkoContext::new(original.reference().clone());
    let report = Reader::default()
        .read_into_context(&entities, &mut restored)
        .unwrap();
    assert!(report.skipped.is_empty(), "skipped: {:?}", report.skipped);
    assert_eq!(&restored, original);
}

#[test]
fn punned_property_and_individual_round_trip_in_either_order() {
    let b = home().builder();
    let x = "http://ex.org/x";
    let literal = b.property_assertion(b.property(x), b.individual(x), "v");
    let linked = b.property_assertion(b.property(x), b.individual("a"), &b.individual("b"));
    let typed = b.concept_assertion(b.concept(x), b.individual(x));

    let mut context = HkoContext::new(home());
    context.add(literal.clone());
    round_trip(&context);

    // Concept assertions are written before property assertions, so here the
    // shared node exists before the property's connector.
    let sets: [Vec<HkoElement>; 2] = [
        vec![typed.clone().into(), linked.clone().into()],
        vec![linked.into(), typed.into(), literal.into()],
    ];
    for elements in sets {
        let mut context = HkoContext::new(home());
        context.extend(elements);
        round_trip(&context);
    }
}

#[test]
fn elements_named_like_a_context_round_trip() {
    let b = home().builder();
    let mut context = HkoContext::new(home());
    let named_home = b.individual("http://ex.org/home");
    context.add(b.property_assertion(b.property("http://ex.org/root"), named_home.clone(), 1i64));
    context.add(b.concept_assertion(b.concept("http://ex.org/lib"), named_home));
    context.add(b.import_context(&home(), &library()));
    round_trip(&context);
}
