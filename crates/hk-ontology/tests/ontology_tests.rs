//! Ontology Model Tests
//!
//! Multiset identity of compound expressions and the direct-only reasoner
//! contract.

use hk_ontology::{AssertedReasoner, ConceptExpr, ContextRef, HkoContext, HkoElement};
use proptest::prelude::*;

fn context() -> ContextRef {
    ContextRef::root("http://ex.org/multiset")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Any permutation of a conjunction's operands is the same expression;
    /// dropping one copy of a repeated operand is not.
    #[test]
    fn conjunction_is_order_insensitive_multiset(
        operands in proptest::collection::vec(0usize..4, 1..6),
        seed in any::<u64>(),
    ) {
        let b = context().builder();
        let names: Vec<ConceptExpr> = operands
            .iter()
            .map(|i| b.concept(format!("C{i}")).into())
            .collect();

        let mut shuffled = names.clone();
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        if seed % 2 == 0 {
            shuffled.reverse();
        }
        prop_assert_eq!(b.conjunction(names.clone()), b.conjunction(shuffled));

        let mut extended = names.clone();
        extended.push(names[0].clone());
        prop_assert_ne!(b.conjunction(names.clone()), b.conjunction(extended.clone()));
        prop_assert_ne!(b.conjunction(names), b.disjunction(extended));
    }
}

#[test]
fn reasoner_reports_direct_subconcepts_and_instances_only() {
    let mut context = HkoContext::new(context());
    let b = context.builder();
    let c1 = b.concept("C1");
    let c1_1 = b.concept("C1_1");
    let c1_2 = b.concept("C1_2");
    let i1 = b.individual("i1");
    let i2 = b.individual("i2");

    context.extend([
        HkoElement::from(b.sub_concept_of(c1_1.clone(), c1.clone())),
        b.sub_concept_of(c1_2.clone(), c1.clone()).into(),
        b.concept_assertion(c1_1.clone(), i1.clone()).into(),
        b.concept_assertion(c1_1.clone(), i2).into(),
    ]);

    let reasoner = AssertedReasoner::new(&context);
    let c1 = ConceptExpr::from(c1);
    let mut subs: Vec<_> = reasoner.direct_sub_concepts_of(&c1).into_iter().cloned().collect();
    subs.sort();
    let mut expected = vec![ConceptExpr::from(c1_1.clone()), ConceptExpr::from(c1_2)];
    expected.sort();
    assert_eq!(subs, expected);

    assert!(reasoner.direct_instances_of(&c1).is_empty());
    assert_eq!(reasoner.direct_instances_of(&c1_1.clone().into()).len(), 2);
    assert!(reasoner.is_direct_instance_of(&i1, &c1_1.into()));
    assert!(!reasoner.is_instance_of(&i1, &c1));
}

#[test]
fn conjunctive_subconcepts_are_not_decomposed() {
    let mut context = HkoContext::new(context());
    let b = context.builder();
    let both = b.conjunction([b.concept("A"), b.concept("B")]);
    context.add(b.sub_concept_of(both.clone(), b.concept("Top")));

    let reasoner = AssertedReasoner::new(&context);
    assert_eq!(reasoner.direct_sub_concepts_of(&b.concept("Top").into()), vec![&both]);
    assert!(reasoner.direct_sub_concepts_of(&b.concept("A").into()).is_empty());
}

#[test]
fn context_display_lists_elements() {
    let mut context = HkoContext::new(ContextRef::root("http://ex.org/d"));
    let b = context.builder();
    context.add(b.sub_concept_of(b.concept("A"), b.negation(b.concept("B"))));
    assert_eq!(context.to_string(), "http://ex.org/d:[ (subconcept A (not B)) ]");
}
