use super::{binding_error, Rule, ADVICE_SALIENCE};
use crate::config::PhThresholds;
use crate::error::Result;
use crate::logic::{Bindings, Comparison, Condition, Guard, Pattern};
use crate::models::{Fact, FactKind, Recommendation, RecommendationCategory};

/// Extreme soil pH
///
/// Acidic soil gets a liming suggestion, alkaline soil an acidifying one.
/// Readings exactly on a threshold are treated as normal.
///
/// Match conditions:
/// - Soil: ph present
/// - ph strictly below `acidic_below` or strictly above `alkaline_above`
pub struct SoilPhRule {
    pub thresholds: PhThresholds,
}

impl Rule for SoilPhRule {
    fn id(&self) -> &'static str {
        "soil_ph_issue"
    }

    fn name(&self) -> &'static str {
        "Soil pH Issue"
    }

    fn salience(&self) -> i32 {
        ADVICE_SALIENCE
    }

    fn condition(&self) -> Condition {
        Condition::all(vec![
            Pattern::new(FactKind::Soil).bind("ph", "ph").into(),
            Condition::test(Guard::compare(
                "ph",
                Comparison::Outside {
                    low: self.thresholds.acidic_below,
                    high: self.thresholds.alkaline_above,
                },
            )),
        ])
    }

    fn fire(&self, bindings: &Bindings) -> Result<Vec<Fact>> {
        let ph = bindings
            .number("ph")
            .map_err(|e| binding_error(self, "ph", e))?;

        let note = if ph < self.thresholds.acidic_below {
            format!("Soil is acidic (pH={:.2}). Consider liming to raise pH.", ph)
        } else {
            format!(
                "Soil is alkaline (pH={:.2}). Consider sulfur or acidifying amendments.",
                ph
            )
        };

        let rec = Recommendation::new(RecommendationCategory::SoilPh, note);
        Ok(vec![rec.to_fact()])
    }
}
