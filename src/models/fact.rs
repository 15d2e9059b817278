use super::value::Value;
use crate::error::{AgriSenseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of a fact in working memory. Assigned monotonically by the
/// engine and never reused until the next reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactId(pub u64);

impl std::fmt::Display for FactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "f-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FactKind {
    Crop,
    Soil,
    Lab,
    Symptoms,
    Weather,
    PestPresence,
    Diagnosis,
    Recommendation,
}

/// Type class an attribute slot admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Text,
    Bool,
    Number,
    TextList,
    /// A single string, or several as a list
    TextOrList,
}

impl ValueClass {
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            ValueClass::Text => matches!(value, Value::Text(_)),
            ValueClass::Bool => matches!(value, Value::Bool(_)),
            ValueClass::Number => value.is_numeric(),
            ValueClass::TextList => matches!(value, Value::List(_)),
            ValueClass::TextOrList => matches!(value, Value::Text(_) | Value::List(_)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueClass::Text => "a string",
            ValueClass::Bool => "a boolean",
            ValueClass::Number => "a number",
            ValueClass::TextList => "a list of strings",
            ValueClass::TextOrList => "a string or a list of strings",
        }
    }
}

const CROP_SCHEMA: &[(&str, ValueClass)] =
    &[("name", ValueClass::Text), ("stage", ValueClass::Text)];

const SOIL_SCHEMA: &[(&str, ValueClass)] = &[
    ("type", ValueClass::Text),
    ("moisture", ValueClass::Text),
    ("ph", ValueClass::Number),
];

const LAB_SCHEMA: &[(&str, ValueClass)] = &[
    ("N", ValueClass::Number),
    ("P", ValueClass::Number),
    ("K", ValueClass::Number),
    ("ph", ValueClass::Number),
];

const SYMPTOMS_SCHEMA: &[(&str, ValueClass)] = &[
    ("leaf_spots", ValueClass::Bool),
    ("yellowing", ValueClass::Bool),
    ("wilting", ValueClass::Bool),
    ("stem_lesions", ValueClass::Bool),
    ("mosaic", ValueClass::Bool),
    ("powdery_white", ValueClass::Bool),
    ("black_sooty", ValueClass::Bool),
];

const WEATHER_SCHEMA: &[(&str, ValueClass)] = &[
    ("temp", ValueClass::Number),
    ("humidity", ValueClass::Number),
    ("recent_rain_days", ValueClass::Number),
];

const PEST_SCHEMA: &[(&str, ValueClass)] = &[
    ("aphids", ValueClass::Bool),
    ("mites", ValueClass::Bool),
    ("caterpillars", ValueClass::Bool),
    ("whiteflies", ValueClass::Bool),
];

const DIAGNOSIS_SCHEMA: &[(&str, ValueClass)] = &[
    ("disease", ValueClass::Text),
    ("confidence", ValueClass::Number),
    ("notes", ValueClass::Text),
];

const RECOMMENDATION_SCHEMA: &[(&str, ValueClass)] = &[
    ("treatment", ValueClass::TextOrList),
    ("stage_advice", ValueClass::TextList),
    ("fertilizer_recommendations", ValueClass::TextList),
    ("soil_ph_note", ValueClass::TextOrList),
    ("general", ValueClass::TextOrList),
];

impl FactKind {
    pub const ALL: [FactKind; 8] = [
        FactKind::Crop,
        FactKind::Soil,
        FactKind::Lab,
        FactKind::Symptoms,
        FactKind::Weather,
        FactKind::PestPresence,
        FactKind::Diagnosis,
        FactKind::Recommendation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactKind::Crop => "Crop",
            FactKind::Soil => "Soil",
            FactKind::Lab => "Lab",
            FactKind::Symptoms => "Symptoms",
            FactKind::Weather => "Weather",
            FactKind::PestPresence => "PestPresence",
            FactKind::Diagnosis => "Diagnosis",
            FactKind::Recommendation => "Recommendation",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "crop" => Some(FactKind::Crop),
            "soil" => Some(FactKind::Soil),
            "lab" => Some(FactKind::Lab),
            "symptoms" => Some(FactKind::Symptoms),
            "weather" => Some(FactKind::Weather),
            "pestpresence" | "pest_presence" | "pests" => Some(FactKind::PestPresence),
            "diagnosis" => Some(FactKind::Diagnosis),
            "recommendation" => Some(FactKind::Recommendation),
            _ => None,
        }
    }

    /// Attribute slots this kind accepts, with the type class of each.
    pub fn schema(&self) -> &'static [(&'static str, ValueClass)] {
        match self {
            FactKind::Crop => CROP_SCHEMA,
            FactKind::Soil => SOIL_SCHEMA,
            FactKind::Lab => LAB_SCHEMA,
            FactKind::Symptoms => SYMPTOMS_SCHEMA,
            FactKind::Weather => WEATHER_SCHEMA,
            FactKind::PestPresence => PEST_SCHEMA,
            FactKind::Diagnosis => DIAGNOSIS_SCHEMA,
            FactKind::Recommendation => RECOMMENDATION_SCHEMA,
        }
    }

    pub fn slot(&self, attribute: &str) -> Option<ValueClass> {
        self.schema()
            .iter()
            .find(|(name, _)| *name == attribute)
            .map(|(_, class)| *class)
    }

    /// Kinds produced by rule bodies rather than by observation.
    pub fn is_output(&self) -> bool {
        matches!(self, FactKind::Diagnosis | FactKind::Recommendation)
    }
}

impl std::fmt::Display for FactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed, attribute-keyed record. Immutable once declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    kind: FactKind,
    attributes: BTreeMap<String, Value>,
}

impl Fact {
    pub fn new(kind: FactKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with(mut self, attribute: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(attribute.to_string(), value.into());
        self
    }

    /// Sets the attribute only when a value is present, leaving it absent otherwise.
    pub fn with_opt<V: Into<Value>>(self, attribute: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(attribute, v),
            None => self,
        }
    }

    pub fn kind(&self) -> FactKind {
        self.kind
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Check every attribute against the kind's schema.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.attributes {
            let class = self
                .kind
                .slot(name)
                .ok_or_else(|| self.invalid(format!("unknown attribute '{}'", name)))?;

            if !class.admits(value) {
                return Err(self.invalid(format!(
                    "attribute '{}' expects {}, got {}",
                    name,
                    class.as_str(),
                    value.type_name()
                )));
            }

            if let Value::Float(f) = value {
                if !f.is_finite() {
                    return Err(self.invalid(format!("attribute '{}' is not finite", name)));
                }
            }
        }

        match self.kind {
            FactKind::Diagnosis => {
                for required in ["disease", "confidence"] {
                    if !self.attributes.contains_key(required) {
                        return Err(self.invalid(format!("missing attribute '{}'", required)));
                    }
                }
            }
            FactKind::Recommendation if self.attributes.is_empty() => {
                return Err(self.invalid("a recommendation needs at least one attribute".into()));
            }
            _ => {}
        }

        Ok(())
    }

    fn invalid(&self, reason: String) -> AgriSenseError {
        AgriSenseError::InvalidFact {
            kind: self.kind,
            reason,
        }
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, (name, value)) in self.attributes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}
