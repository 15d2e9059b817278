use super::{Rule, DIAGNOSIS_SALIENCE};
use crate::error::Result;
use crate::logic::{Bindings, Comparison, Condition, Pattern};
use crate::models::{Diagnosis, Fact, FactKind, Recommendation, RecommendationCategory};

/// Nitrogen deficiency from yellowing plus a low lab N reading
///
/// Yellowing, especially of older leaves, points to N deficiency when the
/// lab confirms nitrogen below the configured cut-off (50 ppm by default).
pub struct NitrogenDeficiencyRule {
    pub nitrogen_below: f64,
}

impl Rule for NitrogenDeficiencyRule {
    fn id(&self) -> &'static str {
        "nitrogen_deficiency_symptom"
    }

    fn name(&self) -> &'static str {
        "Nitrogen Deficiency"
    }

    fn salience(&self) -> i32 {
        DIAGNOSIS_SALIENCE
    }

    fn condition(&self) -> Condition {
        Condition::all(vec![
            Pattern::new(FactKind::Symptoms).eq("yellowing", true).into(),
            Pattern::new(FactKind::Lab)
                .test("N", Comparison::Lt(self.nitrogen_below))
                .into(),
        ])
    }

    fn fire(&self, _bindings: &Bindings) -> Result<Vec<Fact>> {
        let diagnosis = Diagnosis {
            disease: "Nutrient deficiency - Nitrogen".into(),
            confidence: 0.8,
            notes: Some("Yellowing, especially older leaves, suggests N deficiency".into()),
        };

        let treatment = Recommendation::new(
            RecommendationCategory::Treatment,
            "Top-dress with nitrogenous fertilizer (e.g., urea) as per crop need; \
             split applications",
        );

        Ok(vec![diagnosis.to_fact(), treatment.to_fact()])
    }
}
