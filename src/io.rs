//! Stream contract for ingesting and emitting tuples
//!
//! The engine moves tuples across its boundary through two single-pass
//! traits: a read stream repeatedly produces `(fields, condition)` pairs and
//! feeds `insert`; a write stream receives each stored record (nullary
//! relations are emitted as a bare marker). Concrete formats — file, CSV,
//! SQLite — live outside the core; factories are selected by the `IO`
//! directive name through a [`StreamRegistry`].
//!
//! Emitted conditions render in the same syntax the reader accepts, so a
//! written relation can be read back.

use std::collections::HashMap;
use std::fmt;

use crate::domain::Val;
use crate::eqrel::AnyRelation;
use crate::pc::Pc;
use crate::relation::{RecordRef, Relation};

/// Errors surfaced by stream implementations.
#[derive(Debug)]
pub enum IoError {
    /// No factory is registered under the requested `IO` directive name.
    UnknownStream(String),
    /// A tuple could not be decoded; the driver skips it or aborts the load.
    Malformed(String),
    /// An underlying I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStream(name) => write!(f, "no stream registered for IO={:?}", name),
            Self::Malformed(msg) => write!(f, "malformed tuple: {}", msg),
            Self::Io(err) => write!(f, "stream I/O error: {}", err),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for IoError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Key/value directives describing one I/O binding, as handed down by the
/// driver. The `IO` key names the stream implementation.
#[derive(Clone, Debug, Default)]
pub struct IoDirectives {
    entries: HashMap<String, String>,
}

impl IoDirectives {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// The stream implementation name (the `IO` directive).
    pub fn io_name(&self) -> Option<&str> {
        self.get("IO")
    }
}

/// Per-column flags marking which columns hold symbol ids that need a symbol
/// table to render. The engine only carries the mask; resolution is the
/// concrete stream's business.
#[derive(Clone, Debug)]
pub struct SymbolMask {
    symbols: Vec<bool>,
}

impl SymbolMask {
    pub fn new(symbols: Vec<bool>) -> Self {
        Self { symbols }
    }

    /// A mask marking no column symbolic.
    pub fn numeric(arity: usize) -> Self {
        Self { symbols: vec![false; arity] }
    }

    pub fn arity(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_symbol(&self, col: usize) -> bool {
        self.symbols.get(col).copied().unwrap_or(false)
    }
}

/// A single-pass source of tuples with presence conditions.
pub trait TupleReadStream {
    /// Produce the next tuple, or `None` at end of stream.
    fn read_next_tuple(&mut self) -> Result<Option<(Vec<Val>, Pc)>, IoError>;

    /// Drain the stream into a relation. Returns the number of tuples read
    /// (dropped and merged ones included).
    fn read_all(&mut self, relation: &mut AnyRelation) -> Result<usize, IoError> {
        let mut count = 0;
        while let Some((fields, pc)) = self.read_next_tuple()? {
            relation.insert(&fields, pc);
            count += 1;
        }
        Ok(count)
    }
}

/// A single-pass sink for tuples with presence conditions.
pub trait TupleWriteStream {
    /// Emit one record.
    fn write_next_tuple(&mut self, record: &RecordRef<'_>) -> Result<(), IoError>;

    /// Emit the presence of a nullary relation.
    fn write_nullary(&mut self) -> Result<(), IoError>;

    /// Emit an entire relation.
    fn write_all(&mut self, relation: &Relation) -> Result<(), IoError> {
        if relation.arity() == 0 {
            if !relation.is_empty() {
                self.write_nullary()?;
            }
            return Ok(());
        }
        for record in relation.iter() {
            self.write_next_tuple(&record)?;
        }
        Ok(())
    }
}

/// Constructs read streams for one `IO` directive name.
pub trait ReadStreamFactory {
    fn name(&self) -> &str;

    fn open(
        &self,
        directives: &IoDirectives,
        mask: &SymbolMask,
    ) -> Result<Box<dyn TupleReadStream>, IoError>;
}

/// Constructs write streams for one `IO` directive name.
pub trait WriteStreamFactory {
    fn name(&self) -> &str;

    fn open(
        &self,
        directives: &IoDirectives,
        mask: &SymbolMask,
    ) -> Result<Box<dyn TupleWriteStream>, IoError>;
}

/// Registry resolving `IO` directive names to stream factories.
#[derive(Default)]
pub struct StreamRegistry {
    readers: HashMap<String, Box<dyn ReadStreamFactory>>,
    writers: HashMap<String, Box<dyn WriteStreamFactory>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_reader(&mut self, factory: Box<dyn ReadStreamFactory>) {
        self.readers.insert(factory.name().to_string(), factory);
    }

    pub fn register_writer(&mut self, factory: Box<dyn WriteStreamFactory>) {
        self.writers.insert(factory.name().to_string(), factory);
    }

    /// Open a read stream for the given directives.
    pub fn reader(
        &self,
        directives: &IoDirectives,
        mask: &SymbolMask,
    ) -> Result<Box<dyn TupleReadStream>, IoError> {
        let name = directives.io_name().unwrap_or_default();
        match self.readers.get(name) {
            Some(factory) => factory.open(directives, mask),
            None => Err(IoError::UnknownStream(name.to_string())),
        }
    }

    /// Open a write stream for the given directives.
    pub fn writer(
        &self,
        directives: &IoDirectives,
        mask: &SymbolMask,
    ) -> Result<Box<dyn TupleWriteStream>, IoError> {
        let name = directives.io_name().unwrap_or_default();
        match self.writers.get(name) {
            Some(factory) => factory.open(directives, mask),
            None => Err(IoError::UnknownStream(name.to_string())),
        }
    }
}
