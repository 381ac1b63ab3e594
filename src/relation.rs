//! Relation storage with lifted insert semantics
//!
//! A [`Relation`] owns its tuples in block-allocated storage, keeps an
//! append-only record arena pairing each tuple with its presence condition,
//! and maintains a lazily grown family of [`SortedIndex`]es over the arena.
//! The insert contract carries the lifted semantics: a tuple whose condition
//! is unsatisfiable is dropped, and a duplicate tuple merges its condition
//! into the stored record by disjunction — a relation holds at most one
//! record per tuple identity, annotated with the union of every condition it
//! was derived under.
//!
//! Mutation (`insert`, `merge`, `purge`, `index_for`) takes `&mut self`;
//! probes take `&self`. A driver that parallelises rule evaluation wraps each
//! relation in its own `RwLock`, which yields exactly the single-writer /
//! multi-reader discipline the engine assumes.

use std::collections::BTreeMap;

use log::debug;

use crate::domain::{total_mask, ColumnMask, RecId, Val, MAX_VAL, MIN_VAL};
use crate::index::{ColumnOrder, SortedIndex};
use crate::pc::Pc;

/// Words of tuple storage per block.
const BLOCK_SIZE: usize = 1024;

/// Identifier of an index within its relation. Stable for the relation's
/// lifetime; must not be used against a different relation.
pub type IndexId = usize;

/// A borrowed view of one stored tuple and its presence condition.
#[derive(Copy, Clone, Debug)]
pub struct RecordRef<'a> {
    fields: &'a [Val],
    pc: Pc,
}

impl<'a> RecordRef<'a> {
    pub fn fields(&self) -> &'a [Val] {
        self.fields
    }

    pub fn pc(&self) -> Pc {
        self.pc
    }

    pub fn arity(&self) -> usize {
        self.fields.len()
    }
}

impl std::ops::Index<usize> for RecordRef<'_> {
    type Output = Val;

    fn index(&self, col: usize) -> &Val {
        &self.fields[col]
    }
}

/// Block-allocated tuple storage: tuples are laid out contiguously and never
/// span a block boundary, so a stored tuple is always one dense slice.
struct BlockStore {
    arity: usize,
    tuples_per_block: usize,
    blocks: Vec<Box<[Val]>>,
    len: usize,
}

impl BlockStore {
    fn new(arity: usize) -> Self {
        debug_assert!(arity > 0);
        Self {
            arity,
            tuples_per_block: (BLOCK_SIZE / arity).max(1),
            blocks: Vec::new(),
            len: 0,
        }
    }

    /// Append a tuple, allocating a fresh block when the last one is full.
    /// Returns the tuple's slot number.
    fn push(&mut self, fields: &[Val]) -> usize {
        let slot = self.len;
        let offset = (slot % self.tuples_per_block) * self.arity;
        if offset == 0 {
            self.blocks
                .push(vec![0; self.tuples_per_block * self.arity].into_boxed_slice());
        }
        let block = self.blocks.last_mut().expect("a block exists after alloc");
        block[offset..offset + self.arity].copy_from_slice(fields);
        self.len += 1;
        slot
    }

    fn fields(&self, slot: usize) -> &[Val] {
        let block = slot / self.tuples_per_block;
        let offset = (slot % self.tuples_per_block) * self.arity;
        &self.blocks[block][offset..offset + self.arity]
    }

    fn clear(&mut self) {
        self.blocks.clear();
        self.len = 0;
    }
}

struct StoredRec {
    slot: usize,
    pc: Pc,
}

/// A relation: block-allocated tuple rows, a record arena, and a lazy family
/// of sorted indexes sharing compatible orders.
pub struct Relation {
    arity: usize,
    store: BlockStore,
    records: Vec<StoredRec>,
    indexes: Vec<SortedIndex>,
    orders: BTreeMap<ColumnOrder, IndexId>,
    total: Option<IndexId>,
    len: usize,
}

impl Relation {
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            // Nullary relations never touch the store; give it width 1.
            store: BlockStore::new(arity.max(1)),
            records: Vec::new(),
            indexes: Vec::new(),
            orders: BTreeMap::new(),
            total: None,
            len: 0,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Number of tuples. For nullary relations this is 0 or 1.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The mask selecting every column of this relation.
    pub fn total_key(&self) -> ColumnMask {
        total_mask(self.arity)
    }

    /// Insert a tuple under a presence condition.
    ///
    /// The condition is conjoined with [`Pc::top`] (the feature model when
    /// one is installed); an unsatisfiable result is a no-op. Duplicate
    /// tuples merge conditions by disjunction. Every existing index sees the
    /// record before this returns.
    ///
    /// Returns whether the relation changed: a new tuple, or a widened
    /// condition on an existing one.
    pub fn insert(&mut self, fields: &[Val], pc: Pc) -> bool {
        debug_assert_eq!(fields.len(), self.arity, "tuple arity mismatch");

        let pc = pc.and(Pc::top());
        if !pc.is_sat() {
            return false;
        }

        if self.arity == 0 {
            let grew = self.len == 0;
            self.len = 1;
            return grew;
        }

        let total = self.total_index();
        if let Some(rec) = self.indexes[total].find(fields) {
            let stored = &mut self.records[rec as usize];
            let merged = stored.pc.or(pc);
            if merged == stored.pc {
                return false;
            }
            stored.pc = merged;
            return true;
        }

        let slot = self.store.push(fields);
        let rec = self.records.len() as RecId;
        self.records.push(StoredRec { slot, pc });

        let fields = self.store.fields(slot);
        for index in &mut self.indexes {
            index.insert(rec, fields);
        }

        self.len += 1;
        true
    }

    /// Merge another relation of the same arity into this one. Duplicates
    /// funnel through the ordinary insert path, so conditions union.
    pub fn merge(&mut self, other: &Relation) -> bool {
        debug_assert_eq!(self.arity, other.arity, "relation arity mismatch");

        if self.arity == 0 {
            if other.is_empty() || self.len > 0 {
                return false;
            }
            self.len = 1;
            return true;
        }

        let mut changed = false;
        for rec in other.iter() {
            changed |= self.insert(rec.fields(), rec.pc());
        }
        changed
    }

    /// Drop all tuples. Blocks and the record arena are released and every
    /// index is emptied; the index family itself (and any cached
    /// [`IndexId`]) survives.
    pub fn purge(&mut self) {
        self.store.clear();
        self.records.clear();
        for index in &mut self.indexes {
            index.purge();
        }
        self.len = 0;
    }

    // --- indexes ---

    /// Id of the total index (all columns, natural order), creating it on
    /// demand. Existence checks and the duplicate-merge path probe this.
    fn total_index(&mut self) -> IndexId {
        match self.total {
            Some(id) => id,
            None => {
                let id = self.index_for(self.total_key());
                self.total = Some(id);
                id
            }
        }
    }

    /// Get an index answering probes over the masked columns, creating one
    /// if no existing order is compatible. Newly created indexes use the
    /// participating columns in ascending order followed by the remaining
    /// columns in ascending order, and are bulk-populated from the arena.
    pub fn index_for(&mut self, mask: ColumnMask) -> IndexId {
        debug_assert!(self.arity > 0, "nullary relations have no indexes");

        let wanted = ColumnOrder::participating(mask, self.arity);
        if let Some(id) = self.compatible_index(&wanted) {
            return id;
        }

        let order = wanted.completed(self.arity);
        debug!("creating index {} over {} records", order, self.records.len());
        let mut index = SortedIndex::new(order.clone());
        let store = &self.store;
        index.insert_all(
            self.records
                .iter()
                .enumerate()
                .map(|(rec, stored)| (rec as RecId, store.fields(stored.slot))),
        );

        let id = self.indexes.len();
        self.indexes.push(index);
        self.orders.insert(order, id);
        id
    }

    /// Read-only index lookup: the hint is reused when its order is still
    /// compatible (the hot path for a join probing the same relation
    /// repeatedly), otherwise the existing orders are scanned. Returns
    /// `None` when only [`Relation::index_for`] could help.
    pub fn cached_index(&self, mask: ColumnMask, hint: Option<IndexId>) -> Option<IndexId> {
        let wanted = ColumnOrder::participating(mask, self.arity);
        if let Some(id) = hint {
            if let Some(index) = self.indexes.get(id) {
                if wanted.is_compatible(index.order()) {
                    return Some(id);
                }
            }
        }
        self.compatible_index(&wanted)
    }

    fn compatible_index(&self, wanted: &ColumnOrder) -> Option<IndexId> {
        self.orders
            .iter()
            .find(|(order, _)| wanted.is_compatible(order))
            .map(|(_, &id)| id)
    }

    /// The index itself, e.g. for inspecting its order.
    pub fn index(&self, id: IndexId) -> &SortedIndex {
        &self.indexes[id]
    }

    // --- probes ---

    /// Whether the tuple is present (under any satisfiable condition). For
    /// nullary relations this is non-emptiness.
    pub fn contains(&self, fields: &[Val]) -> bool {
        self.find(fields).is_some() || (self.arity == 0 && self.len > 0)
    }

    /// Look up a tuple through the total index.
    pub fn find(&self, fields: &[Val]) -> Option<RecordRef<'_>> {
        let total = self.total?;
        let rec = self.indexes[total].find(fields)?;
        Some(self.record(rec))
    }

    /// Resolve an arena id into a record view.
    pub fn record(&self, rec: RecId) -> RecordRef<'_> {
        let stored = &self.records[rec as usize];
        RecordRef { fields: self.store.fields(stored.slot), pc: stored.pc }
    }

    /// All records, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = RecordRef<'_>> {
        (0..self.records.len() as RecId).map(|rec| self.record(rec))
    }

    /// Records whose fields lie within `[low, high]` under the index's
    /// order. `low` and `high` follow the search-record convention:
    /// participating columns carry the probe bounds, the rest carry
    /// [`MIN_VAL`] / [`MAX_VAL`].
    pub fn range<'a>(
        &'a self,
        id: IndexId,
        low: &[Val],
        high: &[Val],
    ) -> impl Iterator<Item = RecordRef<'a>> + 'a {
        self.indexes[id].range(low, high).map(move |rec| self.record(rec))
    }

    /// Equality probe over the masked columns: builds the search records
    /// from `probe` (participating columns are read, the rest ignored) and
    /// returns the matching range.
    pub fn range_query<'a>(
        &'a self,
        id: IndexId,
        mask: ColumnMask,
        probe: &[Val],
    ) -> impl Iterator<Item = RecordRef<'a>> + 'a {
        debug_assert_eq!(probe.len(), self.arity, "probe arity mismatch");
        let mut low = vec![MIN_VAL; self.arity];
        let mut high = vec![MAX_VAL; self.arity];
        for col in 0..self.arity {
            if mask & (1u64 << col) != 0 {
                low[col] = probe[col];
                high[col] = probe[col];
            }
        }
        self.indexes[id]
            .range(&low, &high)
            .map(move |rec| self.record(rec))
    }

    /// All records in the order of the given index.
    pub fn scan(&self, id: IndexId) -> impl Iterator<Item = RecordRef<'_>> {
        self.indexes[id].iter().map(move |rec| self.record(rec))
    }
}

impl std::fmt::Debug for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relation")
            .field("arity", &self.arity)
            .field("len", &self.len)
            .field("indexes", &self.indexes.len())
            .finish()
    }
}
