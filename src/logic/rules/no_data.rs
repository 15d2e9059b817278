use super::{Rule, FALLBACK_SALIENCE};
use crate::error::Result;
use crate::logic::{Bindings, Condition, Pattern};
use crate::models::{Fact, FactKind, Recommendation, RecommendationCategory};

/// Fallback when nothing was concluded
///
/// Fires only when working memory holds neither a Diagnosis nor a
/// Recommendation. Lowest salience so every other rule gets its turn first.
pub struct NoDataRule;

impl Rule for NoDataRule {
    fn id(&self) -> &'static str {
        "no_data"
    }

    fn name(&self) -> &'static str {
        "Insufficient Data"
    }

    fn salience(&self) -> i32 {
        FALLBACK_SALIENCE
    }

    fn condition(&self) -> Condition {
        Condition::all(vec![
            Condition::not(Pattern::new(FactKind::Diagnosis)),
            Condition::not(Pattern::new(FactKind::Recommendation)),
        ])
    }

    fn fire(&self, _bindings: &Bindings) -> Result<Vec<Fact>> {
        let rec = Recommendation::new(
            RecommendationCategory::General,
            "Insufficient symptom/lab data to provide a targeted recommendation. \
             Collect more info: detailed symptoms, lab NPK, recent weather.",
        );
        Ok(vec![rec.to_fact()])
    }
}
