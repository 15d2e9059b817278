use super::{Rule, DIAGNOSIS_SALIENCE};
use crate::error::Result;
use crate::logic::{Bindings, Condition, Pattern};
use crate::models::{Diagnosis, Fact, FactKind, Recommendation, RecommendationCategory};

/// Insect damage from larval feeding
///
/// Wilting with caterpillars present suggests stem or root boring, or heavy
/// defoliation.
///
/// Match conditions:
/// - Symptoms: wilting true
/// - PestPresence: caterpillars true
pub struct InsectDamageRule;

impl Rule for InsectDamageRule {
    fn id(&self) -> &'static str {
        "insect_damage_wilt"
    }

    fn name(&self) -> &'static str {
        "Insect Damage (Larval Feeding)"
    }

    fn salience(&self) -> i32 {
        DIAGNOSIS_SALIENCE
    }

    fn condition(&self) -> Condition {
        Condition::all(vec![
            Pattern::new(FactKind::Symptoms).eq("wilting", true).into(),
            Pattern::new(FactKind::PestPresence)
                .eq("caterpillars", true)
                .into(),
        ])
    }

    fn fire(&self, _bindings: &Bindings) -> Result<Vec<Fact>> {
        let diagnosis = Diagnosis {
            disease: "Insect damage (larval feeding)".into(),
            confidence: 0.75,
            notes: Some(
                "Wilting with caterpillars suggests stem/root boring or heavy defoliation".into(),
            ),
        };

        let treatment = Recommendation::new(
            RecommendationCategory::Treatment,
            "Inspect for larvae; use biological control (Bt) or targeted insecticide; \
             remove affected parts",
        );

        Ok(vec![diagnosis.to_fact(), treatment.to_fact()])
    }
}
