//! Enumerates every binding that satisfies a condition tree against the
//! current working memory.
//!
//! Matching is a straightforward nested-loop join: conjunctions extend each
//! partial match with the next sub-condition, so variables bound earlier
//! constrain later patterns. Results are deduplicated on
//! (bindings, supporting facts).

use super::bindings::Bindings;
use super::condition::{Condition, Constraint, Guard, Pattern, PredicateRegistry};
use super::memory::WorkingMemory;
use crate::models::{Fact, FactId, Value};
use std::collections::BTreeSet;

/// One satisfying assignment and the facts that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub bindings: Bindings,
    pub support: BTreeSet<FactId>,
}

pub struct Matcher<'a> {
    memory: &'a WorkingMemory,
    predicates: &'a PredicateRegistry,
}

type MatchResult<T> = std::result::Result<T, String>;

impl<'a> Matcher<'a> {
    pub fn new(memory: &'a WorkingMemory, predicates: &'a PredicateRegistry) -> Self {
        Self { memory, predicates }
    }

    /// All distinct matches of `condition`, ordered by (bindings, support).
    ///
    /// A guard failure aborts the whole evaluation; no partial result is returned.
    pub fn matches(&self, condition: &Condition) -> MatchResult<Vec<Match>> {
        let found = self.extend(condition, &Match::default())?;
        let unique: BTreeSet<Match> = found.into_iter().collect();
        Ok(unique.into_iter().collect())
    }

    fn extend(&self, condition: &Condition, partial: &Match) -> MatchResult<Vec<Match>> {
        match condition {
            Condition::Pattern(pattern) => self.extend_pattern(pattern, partial),
            Condition::All(children) => {
                let mut frontier = vec![partial.clone()];
                for child in children {
                    let mut next = Vec::new();
                    for m in &frontier {
                        next.extend(self.extend(child, m)?);
                    }
                    if next.is_empty() {
                        return Ok(next);
                    }
                    frontier = next;
                }
                Ok(frontier)
            }
            Condition::Any(children) => {
                let mut union = BTreeSet::new();
                for child in children {
                    union.extend(self.extend(child, partial)?);
                }
                Ok(union.into_iter().collect())
            }
            Condition::Not(inner) => {
                if self.extend(inner, partial)?.is_empty() {
                    Ok(vec![partial.clone()])
                } else {
                    Ok(Vec::new())
                }
            }
            Condition::Test(guard) => {
                if self.check_guard(guard, &partial.bindings)? {
                    Ok(vec![partial.clone()])
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }

    fn extend_pattern(&self, pattern: &Pattern, partial: &Match) -> MatchResult<Vec<Match>> {
        let mut out = Vec::new();
        for (id, fact) in self.memory.query(pattern.kind) {
            if let Some(bindings) = self.unify(pattern, fact, &partial.bindings)? {
                let mut support = partial.support.clone();
                support.insert(id);
                out.push(Match { bindings, support });
            }
        }
        Ok(out)
    }

    /// Check one fact against a pattern. `Ok(None)` means no match.
    fn unify(
        &self,
        pattern: &Pattern,
        fact: &Fact,
        bound: &Bindings,
    ) -> MatchResult<Option<Bindings>> {
        let mut bindings = bound.clone();
        for (attribute, constraint) in &pattern.constraints {
            // Absent attributes never satisfy a constraint
            let Some(value) = fact.get(attribute) else {
                return Ok(None);
            };
            let ok = match constraint {
                Constraint::Literal(expected) => value.same_as(expected),
                Constraint::Capture(var) => bindings.unify(var, value),
                Constraint::Test(cmp) => cmp
                    .evaluate(value)
                    .map_err(|e| format!("{}.{}: {}", pattern.kind, attribute, e))?,
            };
            if !ok {
                return Ok(None);
            }
        }
        Ok(Some(bindings))
    }

    fn check_guard(&self, guard: &Guard, bindings: &Bindings) -> MatchResult<bool> {
        match guard {
            Guard::Compare { var, cmp } => {
                let value = lookup(bindings, var)?;
                cmp.evaluate(value).map_err(|e| format!("?{}: {}", var, e))
            }
            Guard::Predicate { name, vars } => {
                let args = vars
                    .iter()
                    .map(|var| lookup(bindings, var))
                    .collect::<MatchResult<Vec<&Value>>>()?;
                self.predicates
                    .evaluate(name, &args)
                    .map_err(|e| format!("{}: {}", name, e))
            }
        }
    }
}

fn lookup<'b>(bindings: &'b Bindings, var: &str) -> MatchResult<&'b Value> {
    bindings
        .get(var)
        .ok_or_else(|| format!("guard reads unbound variable ?{}", var))
}
