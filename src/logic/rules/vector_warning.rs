use super::{Rule, DIAGNOSIS_SALIENCE};
use crate::error::Result;
use crate::logic::{Bindings, Condition, Pattern};
use crate::models::{Diagnosis, Fact, FactKind, Recommendation, RecommendationCategory};

/// Vector-borne disease risk
///
/// Aphids and whiteflies spread plant viruses. Either one present raises
/// the risk; a report with both still fires once.
pub struct VectorWarningRule;

impl Rule for VectorWarningRule {
    fn id(&self) -> &'static str {
        "vector_warning"
    }

    fn name(&self) -> &'static str {
        "Vector-borne Disease Risk"
    }

    fn salience(&self) -> i32 {
        DIAGNOSIS_SALIENCE
    }

    fn condition(&self) -> Condition {
        Condition::any(vec![
            Pattern::new(FactKind::PestPresence).eq("aphids", true).into(),
            Pattern::new(FactKind::PestPresence)
                .eq("whiteflies", true)
                .into(),
        ])
    }

    fn fire(&self, _bindings: &Bindings) -> Result<Vec<Fact>> {
        let treatment = Recommendation::new(
            RecommendationCategory::Treatment,
            "Vectors detected: control aphids/whiteflies using IPM (neem/biocontrol/soft \
             insecticides); use reflective mulches or yellow sticky traps",
        );

        let diagnosis = Diagnosis {
            disease: "High vector presence - risk of viral spread".into(),
            confidence: 0.7,
            notes: None,
        };

        Ok(vec![treatment.to_fact(), diagnosis.to_fact()])
    }
}
