//! Presence conditions: hash-consed propositional formulas
//!
//! A [`Pc`] is a `Copy` handle into a process-wide intern table keyed by BDD
//! root. Because the BDD is canonical, two formulas get the same handle
//! exactly when they are logically equivalent, so tuple deduplication across
//! configurations is a handle comparison. Handles live until process exit;
//! nothing is freed mid-run.
//!
//! The table is installed once by [`init`] (or [`init_from_model_file`]) and
//! every operation after that goes through the global. When a feature model
//! is installed, [`Pc::top`] returns it instead of the plain `True` handle,
//! and the relation layer conjoins every incoming condition with `Pc::top()`,
//! so stored conditions are automatically constrained by the model.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{OnceLock, RwLock};

use log::{debug, error, info};

use crate::ast::PcExpr;
use crate::bdd::{Bdd, NodeRef};
use crate::parser::parse_expr;

const FALSE_IDX: u32 = 0;
const TRUE_IDX: u32 = 1;

const POISONED: &str = "presence-condition table poisoned";
const UNINITIALISED: &str =
    "presence-condition system used before pc::init (driver must initialise first)";

/// Handle to an interned presence condition.
///
/// Equality on handles is logical equivalence of the underlying formulas.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pc(u32);

/// Errors from initialisation and feature-model installation.
#[derive(Debug)]
pub enum PcError {
    /// `init` was called a second time.
    AlreadyInitialised,
    /// The feature-model formula did not parse.
    BadFeatureModel(String),
    /// The feature-model file exists but could not be read.
    ModelFileRead(String),
}

impl fmt::Display for PcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInitialised => {
                write!(f, "presence-condition system already initialised")
            }
            Self::BadFeatureModel(text) => {
                write!(f, "feature model does not parse: {:?}", text)
            }
            Self::ModelFileRead(msg) => write!(f, "cannot read feature-model file: {}", msg),
        }
    }
}

impl std::error::Error for PcError {}

/// How an interned condition renders. Parsed formulas keep their source
/// shape; derived formulas render structurally from their operands.
enum Shape {
    Leaf(Box<str>),
    Not(Pc),
    And(Pc, Pc),
    Or(Pc, Pc),
}

struct Interned {
    root: NodeRef,
    shape: Shape,
}

struct Engine {
    bdd: Bdd,
    features: HashMap<String, u32>,
    by_root: HashMap<NodeRef, Pc>,
    table: Vec<Interned>,
    model: Option<Pc>,
}

static ENGINE: OnceLock<RwLock<Engine>> = OnceLock::new();

fn engine() -> &'static RwLock<Engine> {
    ENGINE.get().expect(UNINITIALISED)
}

impl Engine {
    fn new(feature_symbols: &[&str]) -> Self {
        let bdd = Bdd::new(feature_symbols.len());
        let mut features = HashMap::with_capacity(feature_symbols.len());
        for (var, name) in feature_symbols.iter().enumerate() {
            features.insert((*name).to_string(), var as u32);
        }

        let mut by_root = HashMap::new();
        by_root.insert(NodeRef::FALSE, Pc(FALSE_IDX));
        by_root.insert(NodeRef::TRUE, Pc(TRUE_IDX));

        let table = vec![
            Interned { root: NodeRef::FALSE, shape: Shape::Leaf("False".into()) },
            Interned { root: NodeRef::TRUE, shape: Shape::Leaf("True".into()) },
        ];

        Self { bdd, features, by_root, table, model: None }
    }

    fn root(&self, pc: Pc) -> NodeRef {
        self.table[pc.0 as usize].root
    }

    fn intern(&mut self, root: NodeRef, shape: impl FnOnce() -> Shape) -> Pc {
        if let Some(&pc) = self.by_root.get(&root) {
            return pc;
        }
        let pc = Pc(self.table.len() as u32);
        self.table.push(Interned { root, shape: shape() });
        self.by_root.insert(root, pc);
        pc
    }

    fn feature_var(&mut self, name: &str) -> u32 {
        if let Some(&var) = self.features.get(name) {
            return var;
        }
        let var = self.features.len() as u32;
        debug!("registering feature {:?} as variable {}", name, var);
        self.features.insert(name.to_string(), var);
        var
    }

    fn lower(&mut self, expr: &PcExpr) -> NodeRef {
        match expr {
            PcExpr::True => NodeRef::TRUE,
            PcExpr::False => NodeRef::FALSE,
            PcExpr::Feat(name) => {
                let var = self.feature_var(name);
                self.bdd.var(var)
            }
            PcExpr::Not(sub) => {
                let sub = self.lower(sub);
                self.bdd.not(sub)
            }
            PcExpr::And(a, b) => {
                let a = self.lower(a);
                let b = self.lower(b);
                self.bdd.and(a, b)
            }
            PcExpr::Or(a, b) => {
                let a = self.lower(a);
                let b = self.lower(b);
                self.bdd.or(a, b)
            }
        }
    }

    fn intern_expr(&mut self, expr: &PcExpr) -> Pc {
        let root = self.lower(expr);
        self.intern(root, || Shape::Leaf(expr.to_string().into_boxed_str()))
    }

    fn render(&self, pc: Pc, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table[pc.0 as usize].shape {
            Shape::Leaf(text) => f.write_str(text),
            Shape::Not(sub) => {
                write!(f, "!")?;
                self.render(*sub, f)
            }
            Shape::And(a, b) => {
                write!(f, "(")?;
                self.render(*a, f)?;
                write!(f, r" /\ ")?;
                self.render(*b, f)?;
                write!(f, ")")
            }
            Shape::Or(a, b) => {
                write!(f, "(")?;
                self.render(*a, f)?;
                write!(f, r" \/ ")?;
                self.render(*b, f)?;
                write!(f, ")")
            }
        }
    }
}

/// Initialise the presence-condition system: BDD manager sized for the given
/// feature symbols, distinguished `True`/`False` handles, and optionally a
/// feature-model formula that [`Pc::top`] will return from then on.
///
/// Must be called exactly once, before any relation operation. A second call
/// fails with [`PcError::AlreadyInitialised`].
pub fn init(feature_symbols: &[&str], feature_model: Option<&str>) -> Result<(), PcError> {
    ENGINE
        .set(RwLock::new(Engine::new(feature_symbols)))
        .map_err(|_| PcError::AlreadyInitialised)?;

    if let Some(text) = feature_model {
        let model =
            Pc::parse(text).ok_or_else(|| PcError::BadFeatureModel(text.to_string()))?;
        info!("using feature model: {}", text.trim());
        engine().write().expect(POISONED).model = Some(model);
    }

    Ok(())
}

/// Initialise from an optional feature-model file: the first line holds one
/// presence-condition expression. A missing file means no feature model.
pub fn init_from_model_file(
    feature_symbols: &[&str],
    path: impl AsRef<Path>,
) -> Result<(), PcError> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("no feature-model file at {}", path.display());
        return init(feature_symbols, None);
    }

    let contents =
        std::fs::read_to_string(path).map_err(|e| PcError::ModelFileRead(e.to_string()))?;
    match contents.lines().next() {
        Some(line) if !line.trim().is_empty() => init(feature_symbols, Some(line)),
        _ => init(feature_symbols, None),
    }
}

/// Whether [`init`] has run.
pub fn is_initialised() -> bool {
    ENGINE.get().is_some()
}

/// Number of distinct interned conditions, `True` and `False` included.
pub fn count() -> usize {
    engine().read().expect(POISONED).table.len()
}

impl Pc {
    /// The distinguished unsatisfiable condition.
    pub const FALSE: Pc = Pc(FALSE_IDX);

    /// The distinguished tautology handle. Note that [`Pc::top`] — not this
    /// constant — is what insertion paths should conjoin with.
    pub const TRUE: Pc = Pc(TRUE_IDX);

    /// The effective "always present" condition: the feature model when one
    /// is installed, otherwise [`Pc::TRUE`].
    pub fn top() -> Pc {
        engine().read().expect(POISONED).model.unwrap_or(Pc::TRUE)
    }

    /// Parse and intern a textual formula. On malformed input, logs the
    /// diagnostic and returns `None`; callers skip the offending tuple.
    pub fn parse(text: &str) -> Option<Pc> {
        match parse_expr(text) {
            Ok(expr) => Some(Pc::intern(&expr)),
            Err(diagnostic) => {
                error!("{}", diagnostic);
                None
            }
        }
    }

    /// Intern a formula produced by the parser.
    pub fn intern(expr: &PcExpr) -> Pc {
        engine().write().expect(POISONED).intern_expr(expr)
    }

    /// Conjunction. Total; short-circuits around the distinguished handles
    /// without touching the BDD.
    pub fn and(self, other: Pc) -> Pc {
        if self == Pc::TRUE {
            return other;
        }
        if other == Pc::TRUE || self == other {
            return self;
        }
        if self == Pc::FALSE || other == Pc::FALSE {
            return Pc::FALSE;
        }
        let mut eng = engine().write().expect(POISONED);
        let root = {
            let (a, b) = (eng.root(self), eng.root(other));
            eng.bdd.and(a, b)
        };
        eng.intern(root, || Shape::And(self, other))
    }

    /// Disjunction. Total; dual short-circuits to [`Pc::and`].
    pub fn or(self, other: Pc) -> Pc {
        if self == Pc::FALSE {
            return other;
        }
        if other == Pc::FALSE || self == other {
            return self;
        }
        if self == Pc::TRUE || other == Pc::TRUE {
            return Pc::TRUE;
        }
        let mut eng = engine().write().expect(POISONED);
        let root = {
            let (a, b) = (eng.root(self), eng.root(other));
            eng.bdd.or(a, b)
        };
        eng.intern(root, || Shape::Or(self, other))
    }

    /// Negation.
    pub fn not(self) -> Pc {
        if self == Pc::TRUE {
            return Pc::FALSE;
        }
        if self == Pc::FALSE {
            return Pc::TRUE;
        }
        let mut eng = engine().write().expect(POISONED);
        let root = {
            let a = eng.root(self);
            eng.bdd.not(a)
        };
        eng.intern(root, || Shape::Not(self))
    }

    /// Whether `self /\ other` is satisfiable, without interning the
    /// conjunction.
    pub fn and_sat(self, other: Pc) -> bool {
        if self == Pc::FALSE || other == Pc::FALSE {
            return false;
        }
        if self == Pc::TRUE || other == Pc::TRUE || self == other {
            return true;
        }
        let mut eng = engine().write().expect(POISONED);
        let (a, b) = (eng.root(self), eng.root(other));
        let conj = eng.bdd.and(a, b);
        eng.bdd.is_sat(conj)
    }

    /// Satisfiability. Constant-time: the only unsatisfiable handle is
    /// [`Pc::FALSE`], by canonicity of the BDD.
    pub fn is_sat(self) -> bool {
        self != Pc::FALSE
    }

    /// Whether this is the distinguished tautology handle. Independent of
    /// any installed feature model.
    pub fn is_true(self) -> bool {
        self == Pc::TRUE
    }
}

impl fmt::Display for Pc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        engine().read().expect(POISONED).render(*self, f)
    }
}

impl fmt::Debug for Pc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pc({})", self.0)
    }
}
