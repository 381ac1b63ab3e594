//! Unit tests for equivalence relations

use std::collections::BTreeSet;
use std::sync::Once;

use liftlog::{pc, AnyRelation, EqRelation, Pc, Relation, Val};

fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        pc::init(&["A", "B"], None).expect("first init");
    });
}

fn pc_of(text: &str) -> Pc {
    Pc::parse(text).expect("test formula parses")
}

fn tuples(eq: &EqRelation) -> BTreeSet<(Val, Val)> {
    eq.iter().map(|rec| (rec[0], rec[1])).collect()
}

#[test]
fn test_single_insert_closes_reflexively_and_symmetrically() {
    setup();
    let mut eq = EqRelation::new();
    eq.insert((1, 2), Pc::TRUE);

    assert_eq!(
        tuples(&eq),
        BTreeSet::from([(1, 1), (1, 2), (2, 1), (2, 2)])
    );
}

#[test]
fn test_transitive_closure_across_inserts() {
    setup();
    let mut eq = EqRelation::new();

    // {1,2} then {2,3} closes to the full 3x3 class.
    eq.insert((1, 2), Pc::TRUE);
    eq.insert((2, 3), Pc::TRUE);

    let expected: BTreeSet<(Val, Val)> = [
        (1, 1), (2, 2), (3, 3),
        (1, 2), (2, 1),
        (2, 3), (3, 2),
        (1, 3), (3, 1),
    ]
    .into();
    assert_eq!(tuples(&eq), expected);

    for rec in eq.iter() {
        assert_eq!(rec.pc(), Pc::TRUE);
    }
}

#[test]
fn test_disjoint_classes_stay_disjoint() {
    setup();
    let mut eq = EqRelation::new();
    eq.insert((1, 2), Pc::TRUE);
    eq.insert((8, 9), Pc::TRUE);

    assert!(eq.contains(&[1, 2]));
    assert!(eq.contains(&[8, 9]));
    assert!(!eq.contains(&[1, 8]));
    assert!(!eq.contains(&[9, 2]));
    assert_eq!(eq.len(), 8);
}

#[test]
fn test_closure_invariant_holds_pointwise() {
    setup();
    let mut eq = EqRelation::new();
    eq.insert((4, 5), Pc::TRUE);
    eq.insert((5, 6), Pc::TRUE);
    eq.insert((10, 11), Pc::TRUE);

    let stored = tuples(&eq);
    for &(a, b) in &stored {
        // Symmetry and reflexivity.
        assert!(stored.contains(&(b, a)));
        assert!(stored.contains(&(a, a)));
        assert!(stored.contains(&(b, b)));
        // Transitivity.
        for &(c, d) in &stored {
            if b == c {
                assert!(stored.contains(&(a, d)));
            }
        }
    }
}

#[test]
fn test_conditioned_closure_joins_conditions() {
    setup();
    let mut eq = EqRelation::new();
    let a = pc_of("A");
    let b = pc_of("B");

    eq.insert((1, 2), a);
    eq.insert((2, 3), b);

    // The bridging pair carries the conjunction of both conditions.
    assert_eq!(eq.find(&[1, 3]).unwrap().pc(), pc_of(r"A /\ B"));
    assert_eq!(eq.find(&[3, 1]).unwrap().pc(), pc_of(r"A /\ B"));
    // The original pairs keep their own conditions.
    assert_eq!(eq.find(&[1, 2]).unwrap().pc(), a);
    assert_eq!(eq.find(&[2, 3]).unwrap().pc(), b);
}

#[test]
fn test_contradictory_conditions_do_not_bridge() {
    setup();
    let mut eq = EqRelation::new();

    eq.insert((1, 2), pc_of("A"));
    eq.insert((2, 3), pc_of("!A"));

    // 1 ~ 3 would require A /\ !A, which is unsatisfiable.
    assert!(!eq.contains(&[1, 3]));
    assert!(!eq.contains(&[3, 1]));
    assert!(eq.contains(&[1, 2]));
    assert!(eq.contains(&[2, 3]));
}

#[test]
fn test_unsat_insert_is_dropped() {
    setup();
    let mut eq = EqRelation::new();
    assert!(!eq.insert((1, 2), pc_of(r"A /\ !A")));
    assert!(eq.is_empty());
}

#[test]
fn test_merge_closes_source_pairs() {
    setup();
    let mut pairs = Relation::new(2);
    pairs.insert(&[1, 2], Pc::TRUE);
    pairs.insert(&[2, 3], Pc::TRUE);

    let mut eq = EqRelation::new();
    eq.merge(&pairs);

    assert_eq!(eq.len(), 9);
    assert!(eq.contains(&[1, 3]));
}

#[test]
fn test_any_relation_dispatch() {
    setup();
    let mut rel = AnyRelation::new(2, false);
    let mut eq = AnyRelation::new(2, true);

    rel.insert(&[1, 2], Pc::TRUE);
    eq.insert(&[1, 2], Pc::TRUE);

    assert_eq!(rel.len(), 1);
    assert_eq!(eq.len(), 4);
    assert!(!rel.is_equivalence());
    assert!(eq.is_equivalence());
    assert!(eq.contains(&[2, 1]));
    assert!(!rel.contains(&[2, 1]));

    eq.purge();
    assert!(eq.is_empty());
}
