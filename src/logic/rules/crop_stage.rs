use super::{binding_error, Rule, ADVICE_SALIENCE};
use crate::config::NpkThresholds;
use crate::error::Result;
use crate::logic::calculations::{interpret_npk, NutrientLevel};
use crate::logic::{Bindings, Condition, Pattern};
use crate::models::{CropStage, Fact, FactKind, Recommendation, RecommendationCategory};

/// Stage-specific nutrient advice
///
/// Vegetative growth is nitrogen hungry; flowering and fruiting lean on
/// potassium. Advice is only asserted when the stage's key nutrient is low.
///
/// Match conditions:
/// - Crop: name and stage present
/// - Lab: N, P and K present
pub struct CropStageRule {
    pub thresholds: NpkThresholds,
}

impl Rule for CropStageRule {
    fn id(&self) -> &'static str {
        "crop_stage_specific"
    }

    fn name(&self) -> &'static str {
        "Crop Stage Nutrient Advice"
    }

    fn salience(&self) -> i32 {
        ADVICE_SALIENCE
    }

    fn condition(&self) -> Condition {
        Condition::all(vec![
            Pattern::new(FactKind::Crop)
                .bind("name", "name")
                .bind("stage", "stage")
                .into(),
            Pattern::new(FactKind::Lab)
                .bind("N", "n")
                .bind("P", "p")
                .bind("K", "k")
                .into(),
        ])
    }

    fn fire(&self, bindings: &Bindings) -> Result<Vec<Fact>> {
        let stage = bindings
            .text("stage")
            .map_err(|e| binding_error(self, "stage", e))?;
        let n = bindings.number("n").map_err(|e| binding_error(self, "n", e))?;
        let p = bindings.number("p").map_err(|e| binding_error(self, "p", e))?;
        let k = bindings.number("k").map_err(|e| binding_error(self, "k", e))?;

        // Unrecognised stages get no stage advice
        let Some(stage) = CropStage::from_str(stage) else {
            return Ok(Vec::new());
        };

        let levels = interpret_npk(n, p, k, &self.thresholds);
        let mut advice: Vec<String> = Vec::new();

        if stage == CropStage::Vegetative && levels.nitrogen == NutrientLevel::Low {
            advice.push("Increase nitrogen to support vegetative growth (split applications)".into());
        }
        if stage.needs_potassium() && levels.potassium == NutrientLevel::Low {
            advice.push("Increase potassium to support flowering/fruition".into());
        }

        if advice.is_empty() {
            return Ok(Vec::new());
        }

        let rec = Recommendation::with_items(RecommendationCategory::StageAdvice, advice);
        Ok(vec![rec.to_fact()])
    }
}
