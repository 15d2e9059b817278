pub mod agenda;
pub mod bindings;
pub mod calculations;
pub mod condition;
pub mod matcher;
pub mod memory;
pub mod rules;

pub use bindings::Bindings;
pub use condition::{Comparison, Condition, Constraint, Guard, Pattern, PredicateRegistry};
pub use rules::{EngineState, Firing, Rule, RulesEngine};
