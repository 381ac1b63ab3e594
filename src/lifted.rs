//! Presence-condition-partitioned relations
//!
//! A [`LiftedRelation`] keeps one base relation per distinct presence
//! condition instead of merging conditions into single records. The merged
//! form and this one represent the same mathematical object; the lifted form
//! is the right shape when consumers are per-configuration — writing one
//! output per product, say — because iteration and range probes hand back
//! tuples already grouped by the condition they hold under, with no
//! post-filtering.

use indexmap::IndexMap;

use crate::domain::{ColumnMask, Val};
use crate::pc::Pc;
use crate::relation::{RecordRef, Relation};

/// A relation represented as a map from presence condition to base relation.
pub struct LiftedRelation {
    arity: usize,
    partitions: IndexMap<Pc, Relation>,
}

impl LiftedRelation {
    pub fn new(arity: usize) -> Self {
        Self { arity, partitions: IndexMap::new() }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Total tuple count across partitions.
    pub fn len(&self) -> usize {
        self.partitions.values().map(Relation::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.values().all(Relation::is_empty)
    }

    /// Number of distinct presence conditions with a partition.
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Insert a tuple into the partition of its condition, creating the
    /// partition on first use. The condition is conjoined with [`Pc::top`]
    /// first; unsatisfiable inserts are dropped without creating anything.
    pub fn insert(&mut self, fields: &[Val], pc: Pc) -> bool {
        debug_assert_eq!(fields.len(), self.arity, "tuple arity mismatch");

        let pc = pc.and(Pc::top());
        if !pc.is_sat() {
            return false;
        }

        let arity = self.arity;
        self.partitions
            .entry(pc)
            .or_insert_with(|| Relation::new(arity))
            .insert(fields, pc)
    }

    /// Route every record of a merged relation into its partition.
    pub fn absorb(&mut self, other: &Relation) -> bool {
        debug_assert_eq!(self.arity, other.arity(), "relation arity mismatch");
        let mut changed = false;
        for rec in other.iter() {
            changed |= self.insert(rec.fields(), rec.pc());
        }
        changed
    }

    /// Collapse into the merged representation: one relation whose records
    /// carry the disjunction of the conditions they appear under.
    pub fn flatten(&self) -> Relation {
        let mut merged = Relation::new(self.arity);
        for (_, relation) in &self.partitions {
            merged.merge(relation);
        }
        merged
    }

    /// The partition for a condition, if it exists.
    pub fn partition(&self, pc: Pc) -> Option<&Relation> {
        self.partitions.get(&pc)
    }

    /// Non-empty partitions, in first-insertion order.
    pub fn partitions(&self) -> impl Iterator<Item = (Pc, &Relation)> {
        self.partitions
            .iter()
            .filter(|(_, rel)| !rel.is_empty())
            .map(|(pc, rel)| (*pc, rel))
    }

    /// Every tuple with the condition it holds under, concatenating the
    /// partitions.
    pub fn iter(&self) -> impl Iterator<Item = (Pc, RecordRef<'_>)> {
        self.partitions
            .iter()
            .flat_map(|(pc, rel)| rel.iter().map(move |rec| (*pc, rec)))
    }

    /// Equality probe over the masked columns, answered per configuration:
    /// one `(condition, matches)` entry for each partition whose index
    /// produced at least one record. Ensures a suitable index exists in
    /// every partition first.
    pub fn probe(&mut self, mask: ColumnMask, probe: &[Val]) -> Vec<(Pc, Vec<RecordRef<'_>>)> {
        debug_assert_eq!(probe.len(), self.arity, "probe arity mismatch");

        let ids: Vec<_> = self
            .partitions
            .values_mut()
            .map(|rel| rel.index_for(mask))
            .collect();

        self.partitions
            .iter()
            .zip(ids)
            .filter_map(|((pc, rel), id)| {
                let hits: Vec<RecordRef<'_>> = rel.range_query(id, mask, probe).collect();
                if hits.is_empty() {
                    None
                } else {
                    Some((*pc, hits))
                }
            })
            .collect()
    }

    /// Drop everything: contents and partition keys alike. A purged lifted
    /// relation is indistinguishable from a fresh one.
    pub fn purge(&mut self) {
        self.partitions.clear();
    }
}

impl std::fmt::Debug for LiftedRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiftedRelation")
            .field("arity", &self.arity)
            .field("partitions", &self.partitions.len())
            .finish()
    }
}
