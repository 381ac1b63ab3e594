//! Surface AST for presence-condition formulas
//!
//! The parser produces this tree; the presence-condition layer lowers it onto
//! the BDD manager and interns the result. The AST itself is engine-free and
//! printable in the same grammar it was parsed from, so formulas round-trip.

use std::collections::HashMap;
use std::fmt;

/// A propositional formula over feature variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PcExpr {
    /// The constant `True`.
    True,
    /// The constant `False`.
    False,
    /// A named feature variable.
    Feat(String),
    /// Negation: `!e`.
    Not(Box<PcExpr>),
    /// Conjunction: `a /\ b`.
    And(Box<PcExpr>, Box<PcExpr>),
    /// Disjunction: `a \/ b`.
    Or(Box<PcExpr>, Box<PcExpr>),
}

impl PcExpr {
    pub fn not(e: PcExpr) -> PcExpr {
        PcExpr::Not(Box::new(e))
    }

    pub fn and(a: PcExpr, b: PcExpr) -> PcExpr {
        PcExpr::And(Box::new(a), Box::new(b))
    }

    pub fn or(a: PcExpr, b: PcExpr) -> PcExpr {
        PcExpr::Or(Box::new(a), Box::new(b))
    }

    /// Names of the features mentioned, in first-occurrence order.
    pub fn features(&self) -> Vec<&str> {
        fn walk<'a>(e: &'a PcExpr, out: &mut Vec<&'a str>) {
            match e {
                PcExpr::True | PcExpr::False => {}
                PcExpr::Feat(name) => {
                    if !out.contains(&name.as_str()) {
                        out.push(name);
                    }
                }
                PcExpr::Not(sub) => walk(sub, out),
                PcExpr::And(a, b) | PcExpr::Or(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Evaluate under an assignment of feature values; unmapped features read
    /// as false. Used as the brute-force reference for the BDD lowering.
    pub fn eval(&self, assignment: &HashMap<&str, bool>) -> bool {
        match self {
            PcExpr::True => true,
            PcExpr::False => false,
            PcExpr::Feat(name) => assignment.get(name.as_str()).copied().unwrap_or(false),
            PcExpr::Not(sub) => !sub.eval(assignment),
            PcExpr::And(a, b) => a.eval(assignment) && b.eval(assignment),
            PcExpr::Or(a, b) => a.eval(assignment) || b.eval(assignment),
        }
    }
}

impl fmt::Display for PcExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PcExpr::True => write!(f, "True"),
            PcExpr::False => write!(f, "False"),
            PcExpr::Feat(name) => write!(f, "{}", name),
            PcExpr::Not(sub) => write!(f, "!{}", sub),
            PcExpr::And(a, b) => write!(f, r"({} /\ {})", a, b),
            PcExpr::Or(a, b) => write!(f, r"({} \/ {})", a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_through_parser() {
        let e = PcExpr::or(
            PcExpr::and(PcExpr::Feat("A".into()), PcExpr::not(PcExpr::Feat("B".into()))),
            PcExpr::False,
        );
        assert_eq!(e.to_string(), r"((A /\ !B) \/ False)");

        let reparsed = crate::parser::parse_expr(&e.to_string()).unwrap();
        assert_eq!(reparsed, e);
    }

    #[test]
    fn test_eval() {
        let e = PcExpr::and(PcExpr::Feat("A".into()), PcExpr::not(PcExpr::Feat("B".into())));
        let mut env = HashMap::new();
        env.insert("A", true);
        assert!(e.eval(&env));
        env.insert("B", true);
        assert!(!e.eval(&env));
    }

    #[test]
    fn test_features_in_order() {
        let e = PcExpr::or(
            PcExpr::Feat("X".into()),
            PcExpr::and(PcExpr::Feat("Y".into()), PcExpr::Feat("X".into())),
        );
        assert_eq!(e.features(), vec!["X", "Y"]);
    }
}
