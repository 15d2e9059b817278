use crate::models::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Variable name to value map produced by a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Bindings(BTreeMap<String, Value>);

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, var: &str) -> Option<&Value> {
        self.0.get(var)
    }

    /// Bind `var`, or check consistency if it is already bound.
    /// Returns false when the existing binding disagrees.
    pub fn unify(&mut self, var: &str, value: &Value) -> bool {
        match self.0.get(var) {
            Some(existing) => existing.same_as(value),
            None => {
                self.0.insert(var.to_string(), value.clone());
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Numeric binding, accepting integers and floats.
    pub fn number(&self, var: &str) -> std::result::Result<f64, String> {
        match self.0.get(var) {
            Some(v) => v
                .as_f64()
                .ok_or_else(|| format!("expected a number, got {}", v.type_name())),
            None => Err("not bound".into()),
        }
    }

    pub fn text(&self, var: &str) -> std::result::Result<&str, String> {
        match self.0.get(var) {
            Some(v) => v
                .as_str()
                .ok_or_else(|| format!("expected a string, got {}", v.type_name())),
            None => Err("not bound".into()),
        }
    }
}

impl std::fmt::Display for Bindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (var, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "?{}={}", var, value)?;
        }
        write!(f, "}}")
    }
}
