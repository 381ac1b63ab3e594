//! Domain types shared across the engine
//!
//! Tuples are flat sequences of machine integers; symbols are represented by
//! integer ids resolved through an external symbol table. The width of the
//! domain is fixed at build time.

/// An element of a tuple.
///
/// Defaults to `i32`; enable the `domain64` cargo feature for `i64`.
#[cfg(feature = "domain64")]
pub type Val = i64;

/// An element of a tuple.
///
/// Defaults to `i32`; enable the `domain64` cargo feature for `i64`.
#[cfg(not(feature = "domain64"))]
pub type Val = i32;

/// Smallest domain value, used for the open end of range probes.
pub const MIN_VAL: Val = Val::MIN;

/// Largest domain value, used for the open end of range probes.
pub const MAX_VAL: Val = Val::MAX;

/// A set of columns encoded as bits: bit `i` set means column `i`
/// participates in the search.
pub type ColumnMask = u64;

/// Identifier of a record within its relation's arena.
///
/// Indexes refer to records by arena id rather than by pointer, so purging
/// the arena invalidates every index in one step.
pub type RecId = u32;

/// The mask selecting every column of a relation with the given arity.
pub fn total_mask(arity: usize) -> ColumnMask {
    debug_assert!(arity < 64, "arity out of range for a column mask");
    if arity == 0 {
        0
    } else {
        (1u64 << arity) - 1
    }
}
