//! liftlog: the in-memory relation engine of a lifted Datalog interpreter
//!
//! A lifted interpreter derives tuples that exist only under some product
//! configurations; this crate stores those tuples together with their
//! *presence conditions* — propositional formulas over feature variables —
//! and answers the probes a rule-evaluation loop needs.
//!
//! Three subsystems:
//!
//! - **Presence conditions** ([`pc`], [`bdd`]): hash-consed formulas backed
//!   by a reduced ordered BDD, so logically equivalent conditions share one
//!   `Copy` handle and satisfiability is a comparison. Parsed from the
//!   `A /\ !(B \/ C)` surface syntax ([`lexer`], [`parser`], [`ast`]).
//! - **Relations** ([`relation`], [`eqrel`], [`lifted`]): block-allocated
//!   tuple storage where duplicate tuples merge their conditions by
//!   disjunction and unsatisfiable inserts vanish; a specialised variant
//!   maintains equivalence closure; a lifted variant partitions by condition
//!   for per-configuration consumers.
//! - **Indexes** ([`index`]): sorted multi-indexes created on demand from
//!   column masks, with a compatibility rule letting one stored order serve
//!   every query whose columns form a permuted prefix of it.
//!
//! The driver must call [`pc::init`] once before any relation operation.

pub mod ast;
pub mod bdd;
pub mod domain;
pub mod eqrel;
pub mod error;
pub mod index;
pub mod io;
pub mod lexer;
pub mod lifted;
pub mod parser;
pub mod pc;
pub mod relation;

pub use ast::PcExpr;
pub use domain::{total_mask, ColumnMask, RecId, Val, MAX_VAL, MIN_VAL};
pub use eqrel::{AnyRelation, EqRelation};
pub use index::{ColumnOrder, SortedIndex};
pub use io::{
    IoDirectives, IoError, ReadStreamFactory, StreamRegistry, SymbolMask, TupleReadStream,
    TupleWriteStream, WriteStreamFactory,
};
pub use lifted::LiftedRelation;
pub use pc::{Pc, PcError};
pub use relation::{IndexId, RecordRef, Relation};
