use crate::error::Result;
use crate::logic::RulesEngine;
use crate::models::{Diagnosis, FactKind, Recommendation, RecommendationCategory};
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const NO_DIAGNOSIS: &str = "No disease detected or insufficient data.";
pub const NO_RECOMMENDATIONS: &str = "No recommendations available.";

/// What a run concluded, read back from the engine's output facts.
#[derive(Debug, Clone, Serialize)]
pub struct Advisory {
    pub diagnoses: Vec<Diagnosis>,
    pub recommendations: Vec<Recommendation>,
    /// Rule ids in firing order
    pub fired: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl Advisory {
    pub fn from_engine(engine: &RulesEngine) -> Self {
        let diagnoses = engine
            .facts_of_kind(FactKind::Diagnosis)
            .into_iter()
            .filter_map(Diagnosis::from_fact)
            .collect();

        let recommendations = engine
            .facts_of_kind(FactKind::Recommendation)
            .into_iter()
            .flat_map(Recommendation::from_fact)
            .collect();

        let fired = engine
            .firing_log()
            .iter()
            .map(|f| f.rule_id.to_string())
            .collect();

        Self {
            diagnoses,
            recommendations,
            fired,
            generated_at: Utc::now(),
        }
    }

    /// Recommendations of one category, in assertion order.
    pub fn by_category(&self, category: RecommendationCategory) -> Vec<&Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| r.category == category)
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Diagnoses ---")?;
        if self.diagnoses.is_empty() {
            writeln!(f, "{}", NO_DIAGNOSIS)?;
        }
        for diag in &self.diagnoses {
            writeln!(
                f,
                "{} ({:.0}% confidence)",
                diag.disease,
                diag.confidence_percent()
            )?;
            if let Some(notes) = &diag.notes {
                writeln!(f, "    {}", notes)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- Recommendations ---")?;
        if self.recommendations.is_empty() {
            writeln!(f, "{}", NO_RECOMMENDATIONS)?;
        }
        for category in RecommendationCategory::ALL {
            let recs = self.by_category(category);
            if recs.is_empty() {
                continue;
            }
            writeln!(f, "{} {}", category.symbol(), category)?;
            for item in recs.iter().flat_map(|r| r.items.iter()) {
                writeln!(f, "  - {}", item)?;
            }
        }
        Ok(())
    }
}
