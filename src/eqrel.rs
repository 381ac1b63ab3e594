//! Equivalence relations under presence conditions
//!
//! An [`EqRelation`] is a binary relation closed under reflexivity, symmetry
//! and transitivity. Closure is computed eagerly at insert time: inserting
//! `(a, b)` under condition `p` adds the four self-closure pairs under `p`,
//! and for every stored pair `(x, y)` under `q` that shares an element with
//! `{a, b}` and has `p /\ q` satisfiable, the eight cross pairs under
//! `p /\ q`. Everything funnels through the base relation's insert, so
//! duplicates merge their conditions as usual.
//!
//! This is the naive O(n) closure per insertion; a union-find keyed by
//! condition would be faster but must preserve these observable contents.

use crate::domain::Val;
use crate::pc::Pc;
use crate::relation::{RecordRef, Relation};

/// A binary relation maintaining its reflexive-symmetric-transitive closure.
pub struct EqRelation {
    base: Relation,
}

impl EqRelation {
    pub fn new() -> Self {
        Self { base: Relation::new(2) }
    }

    pub fn arity(&self) -> usize {
        2
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    /// Insert a pair and everything its closure implies. Returns whether the
    /// relation changed.
    pub fn insert(&mut self, pair: (Val, Val), pc: Pc) -> bool {
        let pc = pc.and(Pc::top());
        if !pc.is_sat() {
            return false;
        }

        let (a, b) = pair;
        let mut implied: Vec<([Val; 2], Pc)> =
            vec![([a, a], pc), ([a, b], pc), ([b, a], pc), ([b, b], pc)];

        for rec in self.base.iter() {
            let (x, y) = (rec[0], rec[1]);
            if x != a && x != b && y != a && y != b {
                continue;
            }
            let q = rec.pc();
            if !pc.and_sat(q) {
                continue;
            }
            let joined = pc.and(q);
            for fields in [
                [x, a], [x, b], [y, a], [y, b],
                [a, x], [a, y], [b, x], [b, y],
            ] {
                implied.push((fields, joined));
            }
        }

        let mut changed = false;
        for (fields, cond) in implied {
            changed |= self.base.insert(&fields, cond);
        }
        changed
    }

    /// Close this relation over every pair of another binary relation.
    pub fn merge(&mut self, other: &Relation) -> bool {
        debug_assert_eq!(other.arity(), 2, "relation arity mismatch");
        let pairs: Vec<([Val; 2], Pc)> = other
            .iter()
            .map(|rec| ([rec[0], rec[1]], rec.pc()))
            .collect();

        let mut changed = false;
        for (fields, cond) in pairs {
            changed |= self.insert((fields[0], fields[1]), cond);
        }
        changed
    }

    pub fn contains(&self, fields: &[Val]) -> bool {
        self.base.contains(fields)
    }

    pub fn find(&self, fields: &[Val]) -> Option<RecordRef<'_>> {
        self.base.find(fields)
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordRef<'_>> {
        self.base.iter()
    }

    pub fn purge(&mut self) {
        self.base.purge();
    }

    /// The closed contents as an ordinary relation, for probing and output.
    pub fn as_relation(&self) -> &Relation {
        &self.base
    }
}

impl Default for EqRelation {
    fn default() -> Self {
        Self::new()
    }
}

/// Either flavour of relation behind one insert contract, so the evaluation
/// driver and the stream layer need not know which they are feeding.
pub enum AnyRelation {
    Base(Relation),
    Eq(EqRelation),
}

impl AnyRelation {
    /// Create a base relation, or an equivalence relation when `equivalence`
    /// is set (arity must then be 2).
    pub fn new(arity: usize, equivalence: bool) -> Self {
        if equivalence {
            debug_assert_eq!(arity, 2, "equivalence relations are binary");
            AnyRelation::Eq(EqRelation::new())
        } else {
            AnyRelation::Base(Relation::new(arity))
        }
    }

    pub fn is_equivalence(&self) -> bool {
        matches!(self, AnyRelation::Eq(_))
    }

    pub fn arity(&self) -> usize {
        match self {
            AnyRelation::Base(rel) => rel.arity(),
            AnyRelation::Eq(eq) => eq.arity(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AnyRelation::Base(rel) => rel.len(),
            AnyRelation::Eq(eq) => eq.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&mut self, fields: &[Val], pc: Pc) -> bool {
        match self {
            AnyRelation::Base(rel) => rel.insert(fields, pc),
            AnyRelation::Eq(eq) => {
                debug_assert_eq!(fields.len(), 2, "tuple arity mismatch");
                eq.insert((fields[0], fields[1]), pc)
            }
        }
    }

    pub fn contains(&self, fields: &[Val]) -> bool {
        self.as_relation().contains(fields)
    }

    pub fn iter(&self) -> impl Iterator<Item = RecordRef<'_>> {
        self.as_relation().iter()
    }

    /// Merge another relation's contents into this one, closing them when
    /// this side is an equivalence relation.
    pub fn merge(&mut self, other: &AnyRelation) -> bool {
        match self {
            AnyRelation::Base(rel) => rel.merge(other.as_relation()),
            AnyRelation::Eq(eq) => eq.merge(other.as_relation()),
        }
    }

    pub fn purge(&mut self) {
        match self {
            AnyRelation::Base(rel) => rel.purge(),
            AnyRelation::Eq(eq) => eq.purge(),
        }
    }

    /// The stored contents viewed as a plain relation (for an equivalence
    /// relation, the materialised closure).
    pub fn as_relation(&self) -> &Relation {
        match self {
            AnyRelation::Base(rel) => rel,
            AnyRelation::Eq(eq) => eq.as_relation(),
        }
    }
}
