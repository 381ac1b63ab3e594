//! Reduced ordered binary decision diagrams
//!
//! A small manager-centric BDD: all nodes live in one arena owned by the
//! [`Bdd`] manager, a unique table guarantees that structurally equal nodes
//! share one arena slot, and binary operations are memoised. Because the
//! diagram is reduced and ordered, a function is satisfiable iff its root is
//! not the `FALSE` terminal, and two functions are equivalent iff their roots
//! are the same node. The presence-condition layer builds directly on that
//! canonicity.
//!
//! Variables are identified by `u32` indices and ordered by index, root to
//! leaf. They are created on demand; the variable count passed to [`Bdd::new`]
//! is a capacity hint.

use std::collections::HashMap;

use log::debug;

/// Handle to a node in the manager's arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(u32);

impl NodeRef {
    /// The constant-false function.
    pub const FALSE: NodeRef = NodeRef(0);
    /// The constant-true function.
    pub const TRUE: NodeRef = NodeRef(1);

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            NodeRef::FALSE => write!(f, "NodeRef(F)"),
            NodeRef::TRUE => write!(f, "NodeRef(T)"),
            NodeRef(i) => write!(f, "NodeRef({})", i),
        }
    }
}

/// Sentinel variable index for the two terminal nodes. Ranks below every real
/// variable in the ordering comparisons inside `apply`.
const TERMINAL_VAR: u32 = u32::MAX;

#[derive(Copy, Clone)]
struct Node {
    var: u32,
    low: NodeRef,
    high: NodeRef,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
enum Op {
    And,
    Or,
}

/// The BDD manager: node arena, unique table, and operation caches.
pub struct Bdd {
    nodes: Vec<Node>,
    /// Unique table: (var, low, high) -> node. Guarantees structural sharing.
    unique: HashMap<(u32, NodeRef, NodeRef), NodeRef>,
    /// Memo table for binary apply operations, keyed with commutativity
    /// normalisation (smaller operand first).
    apply_cache: HashMap<(Op, NodeRef, NodeRef), NodeRef>,
    not_cache: HashMap<NodeRef, NodeRef>,
    num_vars: u32,
}

impl Bdd {
    /// Create a manager expecting roughly `num_vars` variables. The count is
    /// a capacity hint only; variables past it are accepted.
    pub fn new(num_vars: usize) -> Self {
        let mut nodes = Vec::with_capacity(16 + num_vars * 2);
        nodes.push(Node { var: TERMINAL_VAR, low: NodeRef::FALSE, high: NodeRef::FALSE });
        nodes.push(Node { var: TERMINAL_VAR, low: NodeRef::TRUE, high: NodeRef::TRUE });
        Self {
            nodes,
            unique: HashMap::new(),
            apply_cache: HashMap::new(),
            not_cache: HashMap::new(),
            num_vars: 0,
        }
    }

    /// Number of live nodes, terminals included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of variables seen so far.
    pub fn var_count(&self) -> u32 {
        self.num_vars
    }

    pub fn is_false(&self, f: NodeRef) -> bool {
        f == NodeRef::FALSE
    }

    pub fn is_true(&self, f: NodeRef) -> bool {
        f == NodeRef::TRUE
    }

    /// A reduced ordered BDD represents exactly one function per root, so
    /// satisfiability is a root comparison.
    pub fn is_sat(&self, f: NodeRef) -> bool {
        f != NodeRef::FALSE
    }

    fn var_of(&self, f: NodeRef) -> u32 {
        self.nodes[f.index()].var
    }

    fn low_of(&self, f: NodeRef) -> NodeRef {
        self.nodes[f.index()].low
    }

    fn high_of(&self, f: NodeRef) -> NodeRef {
        self.nodes[f.index()].high
    }

    /// Find-or-create the node `(var, low, high)`, preserving the reduced
    /// invariant: no node has identical cofactors, and no two nodes share a
    /// `(var, low, high)` triple.
    fn mk_node(&mut self, var: u32, low: NodeRef, high: NodeRef) -> NodeRef {
        if low == high {
            return low;
        }
        if let Some(&node) = self.unique.get(&(var, low, high)) {
            return node;
        }
        let node = NodeRef(self.nodes.len() as u32);
        self.nodes.push(Node { var, low, high });
        self.unique.insert((var, low, high), node);
        node
    }

    /// The function of a single variable.
    pub fn var(&mut self, var: u32) -> NodeRef {
        debug_assert_ne!(var, TERMINAL_VAR);
        if var >= self.num_vars {
            debug!("bdd: extending variable order to {}", var + 1);
            self.num_vars = var + 1;
        }
        self.mk_node(var, NodeRef::FALSE, NodeRef::TRUE)
    }

    /// Conjunction.
    pub fn and(&mut self, f: NodeRef, g: NodeRef) -> NodeRef {
        self.apply(Op::And, f, g)
    }

    /// Disjunction.
    pub fn or(&mut self, f: NodeRef, g: NodeRef) -> NodeRef {
        self.apply(Op::Or, f, g)
    }

    /// Negation.
    pub fn not(&mut self, f: NodeRef) -> NodeRef {
        if f == NodeRef::FALSE {
            return NodeRef::TRUE;
        }
        if f == NodeRef::TRUE {
            return NodeRef::FALSE;
        }
        if let Some(&cached) = self.not_cache.get(&f) {
            return cached;
        }
        let Node { var, low, high } = self.nodes[f.index()];
        let low = self.not(low);
        let high = self.not(high);
        let result = self.mk_node(var, low, high);
        self.not_cache.insert(f, result);
        self.not_cache.insert(result, f);
        result
    }

    fn apply(&mut self, op: Op, f: NodeRef, g: NodeRef) -> NodeRef {
        // Terminal short-circuits.
        match op {
            Op::And => {
                if f == NodeRef::FALSE || g == NodeRef::FALSE {
                    return NodeRef::FALSE;
                }
                if f == NodeRef::TRUE {
                    return g;
                }
                if g == NodeRef::TRUE || f == g {
                    return f;
                }
            }
            Op::Or => {
                if f == NodeRef::TRUE || g == NodeRef::TRUE {
                    return NodeRef::TRUE;
                }
                if f == NodeRef::FALSE {
                    return g;
                }
                if g == NodeRef::FALSE || f == g {
                    return f;
                }
            }
        }

        // Both operations are commutative; normalise the cache key.
        let key = if f <= g { (op, f, g) } else { (op, g, f) };
        if let Some(&cached) = self.apply_cache.get(&key) {
            return cached;
        }

        // Split on the topmost variable of the pair. Terminals carry the
        // sentinel variable and never win the comparison.
        let (vf, vg) = (self.var_of(f), self.var_of(g));
        let var = vf.min(vg);
        let (f_low, f_high) = if vf == var {
            (self.low_of(f), self.high_of(f))
        } else {
            (f, f)
        };
        let (g_low, g_high) = if vg == var {
            (self.low_of(g), self.high_of(g))
        } else {
            (g, g)
        };

        let low = self.apply(op, f_low, g_low);
        let high = self.apply(op, f_high, g_high);
        let result = self.mk_node(var, low, high);
        self.apply_cache.insert(key, result);
        result
    }

    /// Evaluate `f` under a total assignment: `assignment[v]` gives the value
    /// of variable `v` (missing variables read as false).
    pub fn eval(&self, f: NodeRef, assignment: &[bool]) -> bool {
        let mut cur = f;
        loop {
            if cur == NodeRef::FALSE {
                return false;
            }
            if cur == NodeRef::TRUE {
                return true;
            }
            let node = self.nodes[cur.index()];
            let bit = assignment.get(node.var as usize).copied().unwrap_or(false);
            cur = if bit { node.high } else { node.low };
        }
    }
}

impl std::fmt::Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("nodes", &self.nodes.len())
            .field("vars", &self.num_vars)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        let bdd = Bdd::new(4);
        assert!(bdd.is_false(NodeRef::FALSE));
        assert!(bdd.is_true(NodeRef::TRUE));
        assert!(bdd.is_sat(NodeRef::TRUE));
        assert!(!bdd.is_sat(NodeRef::FALSE));
    }

    #[test]
    fn test_hash_consing() {
        let mut bdd = Bdd::new(4);
        let x = bdd.var(0);
        let y = bdd.var(1);

        // Same function, same root.
        assert_eq!(bdd.var(0), x);
        let a = bdd.and(x, y);
        let b = bdd.and(y, x);
        assert_eq!(a, b);
    }

    #[test]
    fn test_boolean_laws() {
        let mut bdd = Bdd::new(4);
        let x = bdd.var(0);
        let y = bdd.var(1);

        assert_eq!(bdd.and(x, NodeRef::TRUE), x);
        assert_eq!(bdd.or(x, NodeRef::FALSE), x);
        assert_eq!(bdd.and(x, x), x);
        assert_eq!(bdd.or(x, x), x);
        assert_eq!(bdd.and(x, NodeRef::FALSE), NodeRef::FALSE);
        assert_eq!(bdd.or(x, NodeRef::TRUE), NodeRef::TRUE);

        // x ∧ ¬x = ⊥, x ∨ ¬x = ⊤
        let nx = bdd.not(x);
        assert_eq!(bdd.and(x, nx), NodeRef::FALSE);
        assert_eq!(bdd.or(x, nx), NodeRef::TRUE);

        // Double negation restores the root.
        assert_eq!(bdd.not(nx), x);

        // De Morgan: ¬(x ∧ y) == ¬x ∨ ¬y
        let xy = bdd.and(x, y);
        let lhs = bdd.not(xy);
        let ny = bdd.not(y);
        let rhs = bdd.or(nx, ny);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_canonical_equivalence() {
        let mut bdd = Bdd::new(4);
        let x = bdd.var(0);
        let y = bdd.var(1);

        // (x ∧ y) ∨ (x ∧ ¬y) == x, regardless of how it is built.
        let ny = bdd.not(y);
        let a = bdd.and(x, y);
        let b = bdd.and(x, ny);
        let or = bdd.or(a, b);
        assert_eq!(or, x);
    }

    #[test]
    fn test_eval() {
        let mut bdd = Bdd::new(4);
        let x = bdd.var(0);
        let y = bdd.var(1);
        let f = bdd.and(x, y);

        assert!(bdd.eval(f, &[true, true]));
        assert!(!bdd.eval(f, &[true, false]));
        assert!(!bdd.eval(f, &[false, true]));
        // Missing variables read as false.
        assert!(!bdd.eval(f, &[]));
    }

    #[test]
    fn test_unsat_detection() {
        let mut bdd = Bdd::new(4);
        let x = bdd.var(0);
        let y = bdd.var(1);

        // (x ∨ y) ∧ ¬x ∧ ¬y is unsatisfiable.
        let xy = bdd.or(x, y);
        let nx = bdd.not(x);
        let ny = bdd.not(y);
        let t = bdd.and(xy, nx);
        let f = bdd.and(t, ny);
        assert!(!bdd.is_sat(f));
    }
}
