use super::{Rule, DIAGNOSIS_SALIENCE};
use crate::error::Result;
use crate::logic::{Bindings, Condition, Pattern};
use crate::models::{Diagnosis, Fact, FactKind, Recommendation, RecommendationCategory};

/// Viral mosaic diagnosis
///
/// Mosaic leaf patterns usually mean a virus. There is no chemical cure;
/// the response is roguing plus vector control.
pub struct ViralMosaicRule;

impl Rule for ViralMosaicRule {
    fn id(&self) -> &'static str {
        "viral_mosaic"
    }

    fn name(&self) -> &'static str {
        "Viral Mosaic"
    }

    fn salience(&self) -> i32 {
        DIAGNOSIS_SALIENCE
    }

    fn condition(&self) -> Condition {
        Pattern::new(FactKind::Symptoms).eq("mosaic", true).into()
    }

    fn fire(&self, _bindings: &Bindings) -> Result<Vec<Fact>> {
        let diagnosis = Diagnosis {
            disease: "Viral Mosaic".into(),
            confidence: 0.9,
            notes: Some(
                "Mosaic patterns on leaves often indicate virus; vector control important".into(),
            ),
        };

        let treatment = Recommendation::new(
            RecommendationCategory::Treatment,
            "No chemical cure for virus; rogue and destroy infected plants; \
             control aphids/whiteflies",
        );

        Ok(vec![diagnosis.to_fact(), treatment.to_fact()])
    }
}
