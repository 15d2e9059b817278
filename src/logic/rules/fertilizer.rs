use super::{binding_error, Rule, ADVICE_SALIENCE};
use crate::config::NpkThresholds;
use crate::error::Result;
use crate::logic::calculations::{interpret_npk, NutrientLevel};
use crate::logic::{Bindings, Condition, Pattern};
use crate::models::{Fact, FactKind, Recommendation, RecommendationCategory};

/// Fertilizer recommendation from lab NPK
///
/// Each nutrient that reads low gets its own fertilizer suggestion. When
/// nothing is low the advice is to keep the current balance.
///
/// Match conditions:
/// - Lab: N, P and K all present
pub struct FertilizerRule {
    pub thresholds: NpkThresholds,
}

impl Rule for FertilizerRule {
    fn id(&self) -> &'static str {
        "fertilizer_npk_evaluation"
    }

    fn name(&self) -> &'static str {
        "Fertilizer NPK Evaluation"
    }

    fn salience(&self) -> i32 {
        ADVICE_SALIENCE
    }

    fn condition(&self) -> Condition {
        Pattern::new(FactKind::Lab)
            .bind("N", "n")
            .bind("P", "p")
            .bind("K", "k")
            .into()
    }

    fn fire(&self, bindings: &Bindings) -> Result<Vec<Fact>> {
        let n = bindings.number("n").map_err(|e| binding_error(self, "n", e))?;
        let p = bindings.number("p").map_err(|e| binding_error(self, "p", e))?;
        let k = bindings.number("k").map_err(|e| binding_error(self, "k", e))?;

        let levels = interpret_npk(n, p, k, &self.thresholds);
        let mut recs: Vec<String> = Vec::new();

        if levels.nitrogen == NutrientLevel::Low {
            recs.push("Apply nitrogen fertilizer (e.g., Urea or CAN) - consider split dosing".into());
        }
        if levels.phosphorus == NutrientLevel::Low {
            recs.push(
                "Apply phosphorus fertilizer (e.g., Single Super Phosphate) at planting or as recommended"
                    .into(),
            );
        }
        if levels.potassium == NutrientLevel::Low {
            recs.push(
                "Apply potassium fertilizer (e.g., MOP) to boost fruiting/stress tolerance".into(),
            );
        }
        if recs.is_empty() {
            recs.push(
                "Soil NPK levels are adequate; maintain balanced fertilization and monitor".into(),
            );
        }

        let rec = Recommendation::with_items(RecommendationCategory::Fertilizer, recs);
        Ok(vec![rec.to_fact()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn fire(n: f64, p: f64, k: f64) -> Vec<String> {
        let rule = FertilizerRule {
            thresholds: NpkThresholds::default(),
        };
        let mut b = Bindings::new();
        b.unify("n", &Value::Float(n));
        b.unify("p", &Value::Float(p));
        b.unify("k", &Value::Float(k));
        let facts = rule.fire(&b).unwrap();
        assert_eq!(facts.len(), 1);
        Recommendation::from_fact(&facts[0]).remove(0).items
    }

    #[test]
    fn low_nutrients_each_get_a_suggestion() {
        let items = fire(30.0, 40.0, 45.0);
        assert_eq!(items.len(), 3);
        assert!(items[0].starts_with("Apply nitrogen"));
        assert!(items[1].starts_with("Apply phosphorus"));
        assert!(items[2].starts_with("Apply potassium"));
    }

    #[test]
    fn only_potassium_low() {
        let items = fire(120.0, 200.0, 10.0);
        assert_eq!(items.len(), 1);
        assert!(items[0].contains("MOP"));
    }

    #[test]
    fn adequate_levels() {
        let items = fire(50.0, 150.0, 300.0);
        assert_eq!(
            items,
            vec!["Soil NPK levels are adequate; maintain balanced fertilization and monitor"]
        );
    }

    #[test]
    fn text_binding_is_a_binding_error() {
        let rule = FertilizerRule {
            thresholds: NpkThresholds::default(),
        };
        let mut b = Bindings::new();
        b.unify("n", &Value::Text("lots".into()));
        b.unify("p", &Value::Float(1.0));
        b.unify("k", &Value::Float(1.0));
        let err = rule.fire(&b).unwrap_err();
        assert!(matches!(err, crate::error::AgriSenseError::Binding { .. }));
    }
}
