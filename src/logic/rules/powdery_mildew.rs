use super::{Rule, DIAGNOSIS_SALIENCE};
use crate::error::Result;
use crate::logic::{Bindings, Condition, Pattern};
use crate::models::{Diagnosis, Fact, FactKind, Recommendation, RecommendationCategory};

/// Powdery mildew diagnosis
///
/// White powdery growth on leaf surfaces together with leaf spots.
///
/// Match conditions:
/// - Symptoms: leaf_spots and powdery_white both reported true
pub struct PowderyMildewRule;

impl Rule for PowderyMildewRule {
    fn id(&self) -> &'static str {
        "powdery_mildew"
    }

    fn name(&self) -> &'static str {
        "Powdery Mildew"
    }

    fn salience(&self) -> i32 {
        DIAGNOSIS_SALIENCE
    }

    fn condition(&self) -> Condition {
        Pattern::new(FactKind::Symptoms)
            .eq("leaf_spots", true)
            .eq("powdery_white", true)
            .into()
    }

    fn fire(&self, _bindings: &Bindings) -> Result<Vec<Fact>> {
        let diagnosis = Diagnosis {
            disease: "Powdery Mildew".into(),
            confidence: 0.8,
            notes: Some("Look for white powder on leaf surfaces".into()),
        };

        let treatment = Recommendation::new(
            RecommendationCategory::Treatment,
            "Apply fungicide targeting powdery mildew; improve air circulation; \
             remove heavily infected leaves",
        );

        Ok(vec![diagnosis.to_fact(), treatment.to_fact()])
    }
}
