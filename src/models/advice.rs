use super::fact::{Fact, FactKind};
use super::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecommendationCategory {
    Treatment,
    StageAdvice,
    Fertilizer,
    SoilPh,
    General,
}

impl RecommendationCategory {
    pub const ALL: [RecommendationCategory; 5] = [
        RecommendationCategory::Treatment,
        RecommendationCategory::StageAdvice,
        RecommendationCategory::Fertilizer,
        RecommendationCategory::SoilPh,
        RecommendationCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationCategory::Treatment => "Treatment",
            RecommendationCategory::StageAdvice => "Stage Advice",
            RecommendationCategory::Fertilizer => "Fertilizer Recommendations",
            RecommendationCategory::SoilPh => "Soil pH",
            RecommendationCategory::General => "General",
        }
    }

    /// Recommendation attribute that carries this category.
    pub fn attribute(&self) -> &'static str {
        match self {
            RecommendationCategory::Treatment => "treatment",
            RecommendationCategory::StageAdvice => "stage_advice",
            RecommendationCategory::Fertilizer => "fertilizer_recommendations",
            RecommendationCategory::SoilPh => "soil_ph_note",
            RecommendationCategory::General => "general",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            RecommendationCategory::Treatment => "⚠",
            RecommendationCategory::StageAdvice => "→",
            RecommendationCategory::Fertilizer => "+",
            RecommendationCategory::SoilPh => "~",
            RecommendationCategory::General => "ℹ",
        }
    }
}

impl std::fmt::Display for RecommendationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub disease: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Diagnosis {
    pub fn from_fact(fact: &Fact) -> Option<Self> {
        if fact.kind() != FactKind::Diagnosis {
            return None;
        }
        Some(Self {
            disease: fact.get("disease")?.as_str()?.to_string(),
            confidence: fact.get("confidence")?.as_f64()?,
            notes: fact
                .get("notes")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }

    pub fn to_fact(&self) -> Fact {
        Fact::new(FactKind::Diagnosis)
            .with("disease", self.disease.as_str())
            .with("confidence", self.confidence)
            .with_opt("notes", self.notes.as_deref())
    }

    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub items: Vec<String>,
}

impl Recommendation {
    pub fn new(category: RecommendationCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            items: vec![text.into()],
        }
    }

    pub fn with_items(category: RecommendationCategory, items: Vec<String>) -> Self {
        Self { category, items }
    }

    /// One entry per recommendation attribute present on the fact.
    pub fn from_fact(fact: &Fact) -> Vec<Self> {
        if fact.kind() != FactKind::Recommendation {
            return Vec::new();
        }

        RecommendationCategory::ALL
            .iter()
            .filter_map(|category| {
                let items = match fact.get(category.attribute())? {
                    Value::Text(s) => vec![s.clone()],
                    Value::List(list) => list.clone(),
                    _ => return None,
                };
                Some(Self::with_items(*category, items))
            })
            .collect()
    }

    /// Text categories carry a single item as a string; anything else is a list.
    pub fn to_fact(&self) -> Fact {
        let value = match (self.category, self.items.as_slice()) {
            (RecommendationCategory::StageAdvice | RecommendationCategory::Fertilizer, _) => {
                Value::List(self.items.clone())
            }
            (_, [single]) => Value::Text(single.clone()),
            _ => Value::List(self.items.clone()),
        };
        Fact::new(FactKind::Recommendation).with(self.category.attribute(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnosis_reads_back_from_fact() {
        let fact = Fact::new(FactKind::Diagnosis)
            .with("disease", "Viral Mosaic")
            .with("confidence", 0.9);
        let diag = Diagnosis::from_fact(&fact).unwrap();
        assert_eq!(diag.disease, "Viral Mosaic");
        assert!((diag.confidence - 0.9).abs() < 0.001);
        assert!(diag.notes.is_none());
        assert!((diag.confidence_percent() - 90.0).abs() < 0.001);
    }

    #[test]
    fn diagnosis_ignores_other_kinds() {
        let fact = Fact::new(FactKind::Recommendation).with("general", "x");
        assert!(Diagnosis::from_fact(&fact).is_none());
    }

    #[test]
    fn recommendation_splits_attributes_into_categories() {
        let fact = Fact::new(FactKind::Recommendation)
            .with("treatment", "Apply fungicide")
            .with("fertilizer_recommendations", vec!["Apply N", "Apply K"]);
        let recs = Recommendation::from_fact(&fact);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].category, RecommendationCategory::Treatment);
        assert_eq!(recs[1].category, RecommendationCategory::Fertilizer);
        assert_eq!(recs[1].items, vec!["Apply N".to_string(), "Apply K".to_string()]);
    }

    #[test]
    fn list_categories_become_list_attributes() {
        let rec = Recommendation::with_items(
            RecommendationCategory::StageAdvice,
            vec!["Increase potassium".into()],
        );
        let fact = rec.to_fact();
        assert!(fact.validate().is_ok());
        assert!(matches!(fact.get("stage_advice"), Some(Value::List(_))));
    }

    #[test]
    fn several_treatment_items_survive_the_fact() {
        let rec = Recommendation::with_items(
            RecommendationCategory::Treatment,
            vec!["Remove infected leaves".into(), "Apply fungicide".into()],
        );
        let fact = rec.to_fact();
        assert!(fact.validate().is_ok());
        assert_eq!(Recommendation::from_fact(&fact), vec![rec]);

        let single = Recommendation::new(RecommendationCategory::General, "Monitor");
        assert_eq!(single.to_fact().get("general"), Some(&Value::from("Monitor")));
    }

    #[test]
    fn category_display() {
        assert_eq!(RecommendationCategory::SoilPh.to_string(), "Soil pH");
        assert_eq!(RecommendationCategory::General.attribute(), "general");
    }
}
