use crate::models::{FactId, FactKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgriSenseError {
    #[error("Invalid {kind} fact: {reason}")]
    InvalidFact { kind: FactKind, reason: String },

    #[error("Guard evaluation failed in rule '{rule}': {reason}")]
    GuardEvaluation { rule: String, reason: String },

    #[error("Rule set '{rule_set}' did not reach quiescence within {limit} firings")]
    NonterminatingRuleSet { rule_set: String, limit: usize },

    #[error("Rule '{rule}' could not read binding '{var}': {reason}")]
    Binding {
        rule: String,
        var: String,
        reason: String,
    },

    #[error("Unknown fact: {0}")]
    UnknownFact(FactId),

    #[error("Unknown guard predicate: {0}")]
    UnknownPredicate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl AgriSenseError {
    /// Message shown to an operator. Input problems are reported as such since
    /// re-running without corrected input cannot succeed.
    pub fn user_message(&self) -> String {
        match self {
            AgriSenseError::InvalidFact { .. }
            | AgriSenseError::GuardEvaluation { .. }
            | AgriSenseError::Binding { .. }
            | AgriSenseError::InvalidData(_)
            | AgriSenseError::Json(_)
            | AgriSenseError::Yaml(_) => {
                format!("Insufficient or malformed input: {}", self)
            }
            AgriSenseError::NonterminatingRuleSet { .. } => {
                format!("The rule set did not settle on an answer: {}", self)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgriSenseError>;
