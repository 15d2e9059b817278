//! Condition language for rule left-hand sides.
//!
//! A rule's condition is a tree of:
//! - `Pattern`: one fact of a given kind whose attributes satisfy literal
//!   equalities, captures into named variables, or comparisons
//! - `All`: a join of sub-conditions; a variable captured twice must agree
//! - `Any`: the union of its branches
//! - `Not`: holds while nothing in working memory satisfies the inner condition
//! - `Test`: a guard over already-bound variables
//!
//! Guards are a closed set of comparison operators. Anything else goes through
//! a `PredicateRegistry` injected into the engine, referenced by name.

use crate::models::{FactKind, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Lt(f64),
    Le(f64),
    Gt(f64),
    Ge(f64),
    /// Inclusive on both ends
    Range { low: f64, high: f64 },
    /// Strictly below `low` or strictly above `high`
    Outside { low: f64, high: f64 },
    Equals(Value),
    NotEquals(Value),
}

impl Comparison {
    /// Apply the comparison. Comparing across incompatible types is an error,
    /// never a silent false.
    pub fn evaluate(&self, value: &Value) -> std::result::Result<bool, String> {
        match self {
            Comparison::Lt(x) => Ok(numeric(value, self)? < *x),
            Comparison::Le(x) => Ok(numeric(value, self)? <= *x),
            Comparison::Gt(x) => Ok(numeric(value, self)? > *x),
            Comparison::Ge(x) => Ok(numeric(value, self)? >= *x),
            Comparison::Range { low, high } => {
                let v = numeric(value, self)?;
                Ok(*low <= v && v <= *high)
            }
            Comparison::Outside { low, high } => {
                let v = numeric(value, self)?;
                Ok(v < *low || v > *high)
            }
            Comparison::Equals(expected) => typed_eq(value, expected),
            Comparison::NotEquals(expected) => typed_eq(value, expected).map(|eq| !eq),
        }
    }
}

fn numeric(value: &Value, cmp: &Comparison) -> std::result::Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("'{}' needs a number, got {} {}", cmp, value.type_name(), value))
}

fn typed_eq(value: &Value, expected: &Value) -> std::result::Result<bool, String> {
    let comparable = (value.is_numeric() && expected.is_numeric())
        || std::mem::discriminant(value) == std::mem::discriminant(expected);
    if !comparable {
        return Err(format!(
            "cannot compare {} {} with {} {}",
            value.type_name(),
            value,
            expected.type_name(),
            expected
        ));
    }
    Ok(value.same_as(expected))
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparison::Lt(x) => write!(f, "< {}", x),
            Comparison::Le(x) => write!(f, "<= {}", x),
            Comparison::Gt(x) => write!(f, "> {}", x),
            Comparison::Ge(x) => write!(f, ">= {}", x),
            Comparison::Range { low, high } => write!(f, "in {}..={}", low, high),
            Comparison::Outside { low, high } => write!(f, "outside {}..{}", low, high),
            Comparison::Equals(v) => write!(f, "== {}", v),
            Comparison::NotEquals(v) => write!(f, "!= {}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    Compare { var: String, cmp: Comparison },
    /// Named predicate from the engine's registry, applied to bound variables in order
    Predicate { name: String, vars: Vec<String> },
}

impl Guard {
    pub fn compare(var: &str, cmp: Comparison) -> Self {
        Guard::Compare {
            var: var.to_string(),
            cmp,
        }
    }

    pub fn predicate(name: &str, vars: &[&str]) -> Self {
        Guard::Predicate {
            name: name.to_string(),
            vars: vars.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Guard::Compare { var, cmp } => write!(f, "?{} {}", var, cmp),
            Guard::Predicate { name, vars } => {
                let args: Vec<String> = vars.iter().map(|v| format!("?{}", v)).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Attribute present and equal to the literal
    Literal(Value),
    /// Attribute present; captured into (or joined against) a variable
    Capture(String),
    /// Attribute present and passing the comparison
    Test(Comparison),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub kind: FactKind,
    pub constraints: Vec<(String, Constraint)>,
}

impl Pattern {
    pub fn new(kind: FactKind) -> Self {
        Self {
            kind,
            constraints: Vec::new(),
        }
    }

    pub fn eq(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.constraints
            .push((attribute.to_string(), Constraint::Literal(value.into())));
        self
    }

    pub fn bind(mut self, attribute: &str, var: &str) -> Self {
        self.constraints
            .push((attribute.to_string(), Constraint::Capture(var.to_string())));
        self
    }

    pub fn test(mut self, attribute: &str, cmp: Comparison) -> Self {
        self.constraints
            .push((attribute.to_string(), Constraint::Test(cmp)));
        self
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, (attr, constraint)) in self.constraints.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match constraint {
                Constraint::Literal(v) => write!(f, "{}={}", attr, v)?,
                Constraint::Capture(var) => write!(f, "{}=?{}", attr, var)?,
                Constraint::Test(cmp) => write!(f, "{} {}", attr, cmp)?,
            }
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Pattern(Pattern),
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Test(Guard),
}

impl Condition {
    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::All(conditions)
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any(conditions)
    }

    pub fn not(condition: impl Into<Condition>) -> Self {
        Condition::Not(Box::new(condition.into()))
    }

    pub fn test(guard: Guard) -> Self {
        Condition::Test(guard)
    }

    /// Every fact kind the condition reads, including under negation.
    pub fn kinds(&self) -> BTreeSet<FactKind> {
        let mut kinds = BTreeSet::new();
        self.collect_kinds(&mut kinds);
        kinds
    }

    fn collect_kinds(&self, out: &mut BTreeSet<FactKind>) {
        match self {
            Condition::Pattern(p) => {
                out.insert(p.kind);
            }
            Condition::All(children) | Condition::Any(children) => {
                for child in children {
                    child.collect_kinds(out);
                }
            }
            Condition::Not(inner) => inner.collect_kinds(out),
            Condition::Test(_) => {}
        }
    }

    /// Names of registry predicates referenced anywhere in the tree.
    pub fn predicates(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_predicates(&mut names);
        names
    }

    fn collect_predicates(&self, out: &mut BTreeSet<String>) {
        match self {
            Condition::Test(Guard::Predicate { name, .. }) => {
                out.insert(name.clone());
            }
            Condition::All(children) | Condition::Any(children) => {
                for child in children {
                    child.collect_predicates(out);
                }
            }
            Condition::Not(inner) => inner.collect_predicates(out),
            Condition::Pattern(_) | Condition::Test(Guard::Compare { .. }) => {}
        }
    }
}

impl From<Pattern> for Condition {
    fn from(pattern: Pattern) -> Self {
        Condition::Pattern(pattern)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Pattern(p) => write!(f, "{}", p),
            Condition::All(children) => write_joined(f, children, " AND "),
            Condition::Any(children) => write_joined(f, children, " OR "),
            Condition::Not(inner) => write!(f, "NOT {}", inner),
            Condition::Test(guard) => write!(f, "TEST({})", guard),
        }
    }
}

fn write_joined(
    f: &mut std::fmt::Formatter<'_>,
    children: &[Condition],
    sep: &str,
) -> std::fmt::Result {
    if children.len() == 1 {
        return write!(f, "{}", children[0]);
    }
    write!(f, "(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, "{}", sep)?;
        }
        write!(f, "{}", child)?;
    }
    write!(f, ")")
}

pub type PredicateFn = dyn Fn(&[&Value]) -> std::result::Result<bool, String> + Send + Sync;

/// Named guard predicates available to rule conditions.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Arc<PredicateFn>>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, predicate: F)
    where
        F: Fn(&[&Value]) -> std::result::Result<bool, String> + Send + Sync + 'static,
    {
        self.predicates.insert(name.to_string(), Arc::new(predicate));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    pub fn evaluate(&self, name: &str, args: &[&Value]) -> std::result::Result<bool, String> {
        match self.predicates.get(name) {
            Some(predicate) => predicate(args),
            None => Err(format!("predicate '{}' is not registered", name)),
        }
    }
}

impl std::fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("PredicateRegistry")
            .field("predicates", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outside_excludes_its_bounds() {
        let cmp = Comparison::Outside {
            low: 5.5,
            high: 7.8,
        };
        assert_eq!(cmp.evaluate(&Value::Float(5.5)), Ok(false));
        assert_eq!(cmp.evaluate(&Value::Float(7.8)), Ok(false));
        assert_eq!(cmp.evaluate(&Value::Float(5.49)), Ok(true));
        assert_eq!(cmp.evaluate(&Value::Float(7.81)), Ok(true));
    }

    #[test]
    fn range_includes_its_bounds() {
        let cmp = Comparison::Range {
            low: 50.0,
            high: 150.0,
        };
        assert_eq!(cmp.evaluate(&Value::Int(50)), Ok(true));
        assert_eq!(cmp.evaluate(&Value::Int(150)), Ok(true));
        assert_eq!(cmp.evaluate(&Value::Int(151)), Ok(false));
    }

    #[test]
    fn numeric_comparison_on_text_is_an_error() {
        let err = Comparison::Gt(75.0)
            .evaluate(&Value::from("humid"))
            .unwrap_err();
        assert!(err.contains("needs a number"));
    }

    #[test]
    fn equals_refuses_cross_type() {
        assert!(Comparison::Equals(Value::Int(1))
            .evaluate(&Value::from("1"))
            .is_err());
        assert_eq!(
            Comparison::Equals(Value::Int(30)).evaluate(&Value::Float(30.0)),
            Ok(true)
        );
        assert_eq!(
            Comparison::NotEquals(Value::from("vegetative")).evaluate(&Value::from("flowering")),
            Ok(true)
        );
    }

    #[test]
    fn kinds_include_negated_patterns() {
        let cond = Condition::all(vec![
            Pattern::new(FactKind::Lab).bind("N", "n").into(),
            Condition::not(Pattern::new(FactKind::Diagnosis)),
        ]);
        let kinds = cond.kinds();
        assert!(kinds.contains(&FactKind::Lab));
        assert!(kinds.contains(&FactKind::Diagnosis));
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn predicates_are_collected() {
        let cond = Condition::all(vec![
            Pattern::new(FactKind::Weather).bind("temp", "t").into(),
            Condition::test(Guard::predicate("frost_risk", &["t"])),
        ]);
        let names = cond.predicates();
        assert!(names.contains("frost_risk"));
    }

    #[test]
    fn registry_evaluates_and_reports_missing() {
        let mut registry = PredicateRegistry::new();
        registry.register("positive", |args| {
            let v = args
                .first()
                .and_then(|v| v.as_f64())
                .ok_or_else(|| "expected a number".to_string())?;
            Ok(v > 0.0)
        });

        assert!(registry.contains("positive"));
        assert_eq!(registry.evaluate("positive", &[&Value::Int(3)]), Ok(true));
        assert!(registry.evaluate("missing", &[]).is_err());
    }

    #[test]
    fn display_reads_like_the_rule() {
        let cond = Condition::all(vec![
            Pattern::new(FactKind::Symptoms)
                .eq("leaf_spots", true)
                .eq("stem_lesions", true)
                .into(),
            Pattern::new(FactKind::Weather)
                .test("humidity", Comparison::Gt(75.0))
                .into(),
        ]);
        assert_eq!(
            cond.to_string(),
            "(Symptoms(leaf_spots=true, stem_lesions=true) AND Weather(humidity > 75))"
        );
    }
}
