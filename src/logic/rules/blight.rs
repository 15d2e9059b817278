use super::{Rule, DIAGNOSIS_SALIENCE};
use crate::error::Result;
use crate::logic::{Bindings, Comparison, Condition, Pattern};
use crate::models::{Diagnosis, Fact, FactKind, Recommendation, RecommendationCategory};

/// Blight-like infection diagnosis (bacterial or fungal)
///
/// Leaf spots with stem lesions in humid weather. Wet, humid conditions
/// favour blights.
///
/// Match conditions:
/// - Symptoms: leaf_spots and stem_lesions both true
/// - Weather: humidity above the configured threshold (75% by default)
pub struct BlightRule {
    pub humidity_above: f64,
}

impl Rule for BlightRule {
    fn id(&self) -> &'static str {
        "blight_like"
    }

    fn name(&self) -> &'static str {
        "Blight-like Infection"
    }

    fn salience(&self) -> i32 {
        DIAGNOSIS_SALIENCE
    }

    fn condition(&self) -> Condition {
        Condition::all(vec![
            Pattern::new(FactKind::Symptoms)
                .eq("leaf_spots", true)
                .eq("stem_lesions", true)
                .into(),
            Pattern::new(FactKind::Weather)
                .test("humidity", Comparison::Gt(self.humidity_above))
                .into(),
        ])
    }

    fn fire(&self, _bindings: &Bindings) -> Result<Vec<Fact>> {
        let diagnosis = Diagnosis {
            disease: "Blight-like infection (possible bacterial/fungal)".into(),
            confidence: 0.85,
            notes: Some("Leaf spots + stem lesions; wet humid weather favors blights".into()),
        };

        let treatment = Recommendation::new(
            RecommendationCategory::Treatment,
            "Use appropriate bactericide/fungicide; remove infected material; \
             avoid overhead irrigation",
        );

        Ok(vec![diagnosis.to_fact(), treatment.to_fact()])
    }
}
