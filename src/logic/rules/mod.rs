pub mod blight;
pub mod crop_stage;
pub mod engine;
pub mod fertilizer;
pub mod insect_damage;
pub mod nitrogen_deficiency;
pub mod no_data;
pub mod powdery_mildew;
pub mod soil_ph;
pub mod vector_warning;
pub mod viral_mosaic;

pub use engine::{EngineState, Firing, RulesEngine};

use crate::config::Thresholds;
use crate::error::{AgriSenseError, Result};
use crate::logic::{Bindings, Condition};
use crate::models::Fact;

/// Diagnosis rules run ahead of advice so treatment and fertilizer output
/// sits after the diagnoses in the firing trace.
pub const DIAGNOSIS_SALIENCE: i32 = 20;
pub const ADVICE_SALIENCE: i32 = 10;
/// Below everything, so the fallback only sees a fact base nothing else touched.
pub const FALLBACK_SALIENCE: i32 = -100;

/// Trait for agronomic rules
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Priority on the agenda, higher fires first
    fn salience(&self) -> i32 {
        0
    }

    /// Left-hand side, built once when the engine is constructed
    fn condition(&self) -> Condition;

    /// Facts to assert for one satisfying binding
    fn fire(&self, bindings: &Bindings) -> Result<Vec<Fact>>;
}

pub(crate) fn binding_error(rule: &dyn Rule, var: &str, reason: String) -> AgriSenseError {
    AgriSenseError::Binding {
        rule: rule.id().to_string(),
        var: var.to_string(),
        reason,
    }
}

/// The standard catalog, in declaration order.
pub fn catalog(thresholds: &Thresholds) -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(powdery_mildew::PowderyMildewRule),
        Box::new(blight::BlightRule {
            humidity_above: thresholds.blight_humidity_above,
        }),
        Box::new(viral_mosaic::ViralMosaicRule),
        Box::new(insect_damage::InsectDamageRule),
        Box::new(nitrogen_deficiency::NitrogenDeficiencyRule {
            nitrogen_below: thresholds.nitrogen_deficiency_below,
        }),
        Box::new(fertilizer::FertilizerRule {
            thresholds: thresholds.npk,
        }),
        Box::new(crop_stage::CropStageRule {
            thresholds: thresholds.npk,
        }),
        Box::new(soil_ph::SoilPhRule {
            thresholds: thresholds.ph,
        }),
        Box::new(vector_warning::VectorWarningRule),
        Box::new(no_data::NoDataRule),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{
        Diagnosis, FactId, FactKind, Observation, Recommendation, RecommendationCategory,
    };

    fn engine() -> RulesEngine {
        RulesEngine::from_config(&Config::default()).unwrap()
    }

    fn run_with(facts: Vec<Fact>) -> RulesEngine {
        let mut e = engine();
        for fact in facts {
            e.declare(fact).unwrap();
        }
        e.run().unwrap();
        e
    }

    fn fired(e: &RulesEngine) -> Vec<&'static str> {
        e.firing_log().iter().map(|f| f.rule_id).collect()
    }

    fn recommendations(e: &RulesEngine, category: RecommendationCategory) -> Vec<String> {
        e.facts_of_kind(FactKind::Recommendation)
            .into_iter()
            .flat_map(Recommendation::from_fact)
            .filter(|r| r.category == category)
            .flat_map(|r| r.items)
            .collect()
    }

    fn diseases(e: &RulesEngine) -> Vec<String> {
        e.facts_of_kind(FactKind::Diagnosis)
            .into_iter()
            .filter_map(Diagnosis::from_fact)
            .map(|d| d.disease)
            .collect()
    }

    fn pests(aphids: bool, whiteflies: bool) -> Fact {
        Fact::new(FactKind::PestPresence)
            .with("aphids", aphids)
            .with("whiteflies", whiteflies)
    }

    fn soil_ph(ph: f64) -> Fact {
        Fact::new(FactKind::Soil).with("ph", ph)
    }

    #[test]
    fn catalog_order_and_salience() {
        let e = engine();
        let ids: Vec<&str> = e.rules().iter().map(|(id, _, _)| *id).collect();
        assert_eq!(
            ids,
            vec![
                "powdery_mildew",
                "blight_like",
                "viral_mosaic",
                "insect_damage_wilt",
                "nitrogen_deficiency_symptom",
                "fertilizer_npk_evaluation",
                "crop_stage_specific",
                "soil_ph_issue",
                "vector_warning",
                "no_data",
            ]
        );
        let (_, _, fallback) = e.rules()[9];
        assert_eq!(fallback, FALLBACK_SALIENCE);
    }

    #[test]
    fn empty_fact_base_fires_only_the_fallback() {
        let e = run_with(Vec::new());
        assert_eq!(fired(&e), vec!["no_data"]);
        let general = recommendations(&e, RecommendationCategory::General);
        assert_eq!(general.len(), 1);
        assert!(general[0].starts_with("Insufficient symptom/lab data"));
    }

    #[test]
    fn existing_diagnosis_suppresses_the_fallback() {
        let diag = Diagnosis {
            disease: "Known issue".into(),
            confidence: 0.5,
            notes: None,
        };
        let e = run_with(vec![diag.to_fact()]);
        assert!(fired(&e).is_empty());
        assert!(e.facts_of_kind(FactKind::Recommendation).is_empty());
    }

    #[test]
    fn existing_recommendation_suppresses_the_fallback() {
        let rec = Recommendation::new(RecommendationCategory::General, "Already advised");
        let e = run_with(vec![rec.to_fact()]);
        assert!(fired(&e).is_empty());
        assert!(e.facts_of_kind(FactKind::Diagnosis).is_empty());
        assert_eq!(
            recommendations(&e, RecommendationCategory::General),
            vec!["Already advised"]
        );
    }

    #[test]
    fn lab_and_crop_join() {
        let e = run_with(vec![
            Fact::new(FactKind::Lab)
                .with("N", 30)
                .with("P", 40)
                .with("K", 45),
            Fact::new(FactKind::Crop)
                .with("name", "tomato")
                .with("stage", "flowering"),
        ]);

        assert_eq!(
            fired(&e),
            vec!["fertilizer_npk_evaluation", "crop_stage_specific"]
        );

        let fert = recommendations(&e, RecommendationCategory::Fertilizer);
        assert_eq!(fert.len(), 3);
        assert!(fert[0].contains("nitrogen"));
        assert!(fert[1].contains("phosphorus"));
        assert!(fert[2].contains("potassium"));

        assert_eq!(
            recommendations(&e, RecommendationCategory::StageAdvice),
            vec!["Increase potassium to support flowering/fruition"]
        );
        assert!(diseases(&e).is_empty());
    }

    #[test]
    fn ph_guard_boundaries() {
        let e = run_with(vec![soil_ph(5.5)]);
        assert!(recommendations(&e, RecommendationCategory::SoilPh).is_empty());

        let e = run_with(vec![soil_ph(7.8)]);
        assert!(recommendations(&e, RecommendationCategory::SoilPh).is_empty());

        let e = run_with(vec![soil_ph(5.49)]);
        let notes = recommendations(&e, RecommendationCategory::SoilPh);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].starts_with("Soil is acidic (pH=5.49)"));

        let e = run_with(vec![soil_ph(7.81)]);
        let notes = recommendations(&e, RecommendationCategory::SoilPh);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].starts_with("Soil is alkaline (pH=7.81)"));
    }

    #[test]
    fn rerun_after_quiescence_fires_nothing() {
        let mut e = run_with(Observation::demo().to_facts());
        let before = e.firing_log().len();
        let facts = e.fact_count();

        assert_eq!(e.run().unwrap(), 0);
        assert_eq!(e.firing_log().len(), before);
        assert_eq!(e.fact_count(), facts);
    }

    #[test]
    fn either_vector_fires_the_warning_once() {
        for (aphids, whiteflies) in [(true, false), (false, true), (true, true)] {
            let e = run_with(vec![pests(aphids, whiteflies)]);
            let count = fired(&e).iter().filter(|id| **id == "vector_warning").count();
            assert_eq!(count, 1, "aphids={aphids} whiteflies={whiteflies}");
            assert_eq!(
                diseases(&e),
                vec!["High vector presence - risk of viral spread"]
            );
        }

        let e = run_with(vec![pests(false, false)]);
        assert_eq!(fired(&e), vec!["no_data"]);
    }

    #[test]
    fn two_pest_reports_fire_the_warning_once_each() {
        let mut e = engine();
        let aphids = e.declare(pests(true, false)).unwrap();
        let whiteflies = e.declare(pests(false, true)).unwrap();
        e.run().unwrap();

        let supports: Vec<Vec<FactId>> = e
            .firing_log()
            .iter()
            .filter(|f| f.rule_id == "vector_warning")
            .map(|f| f.support.clone())
            .collect();
        assert_eq!(supports, vec![vec![whiteflies], vec![aphids]]);
        assert_eq!(diseases(&e).len(), 2);
        assert!(!fired(&e).contains(&"no_data"));
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let mut e = engine();
        let mut runs = Vec::new();

        for _ in 0..3 {
            e.reset();
            for fact in Observation::demo().to_facts() {
                e.declare(fact).unwrap();
            }
            e.run().unwrap();
            let outputs: Vec<Fact> = e
                .facts_of_kind(FactKind::Diagnosis)
                .into_iter()
                .chain(e.facts_of_kind(FactKind::Recommendation))
                .cloned()
                .collect();
            runs.push((e.firing_log().to_vec(), outputs));
        }

        assert_eq!(runs[0], runs[1]);
        assert_eq!(runs[1], runs[2]);
    }

    #[test]
    fn demo_scenario() {
        let e = run_with(Observation::demo().to_facts());

        assert_eq!(
            fired(&e),
            vec![
                "powdery_mildew",
                "fertilizer_npk_evaluation",
                "crop_stage_specific",
            ]
        );
        assert_eq!(diseases(&e), vec!["Powdery Mildew"]);
        assert_eq!(recommendations(&e, RecommendationCategory::Treatment).len(), 1);
        assert_eq!(recommendations(&e, RecommendationCategory::Fertilizer).len(), 3);
        assert!(recommendations(&e, RecommendationCategory::SoilPh).is_empty());
    }

    #[test]
    fn blight_needs_humid_weather() {
        let symptoms = || {
            Fact::new(FactKind::Symptoms)
                .with("leaf_spots", true)
                .with("stem_lesions", true)
        };
        let weather = |humidity: i64| Fact::new(FactKind::Weather).with("humidity", humidity);

        let e = run_with(vec![symptoms(), weather(75)]);
        assert!(!fired(&e).contains(&"blight_like"));

        let e = run_with(vec![symptoms(), weather(76)]);
        assert!(fired(&e).contains(&"blight_like"));
    }

    #[test]
    fn absent_symptom_is_not_false() {
        // wilting missing entirely: the insect rule must not match
        let e = run_with(vec![
            Fact::new(FactKind::Symptoms).with("yellowing", false),
            Fact::new(FactKind::PestPresence).with("caterpillars", true),
        ]);
        assert!(!fired(&e).contains(&"insect_damage_wilt"));
    }

    #[test]
    fn nitrogen_deficiency_from_yellowing_and_low_n() {
        let e = run_with(vec![
            Fact::new(FactKind::Symptoms).with("yellowing", true),
            Fact::new(FactKind::Lab)
                .with("N", 20.0)
                .with("P", 200.0)
                .with("K", 200.0),
        ]);
        assert_eq!(diseases(&e), vec!["Nutrient deficiency - Nitrogen"]);
    }

    #[test]
    fn thresholds_come_from_config() {
        let mut config = Config::default();
        config.thresholds.ph.acidic_below = 6.5;
        let mut e = RulesEngine::from_config(&config).unwrap();
        e.declare(soil_ph(6.3)).unwrap();
        e.run().unwrap();
        assert_eq!(recommendations(&e, RecommendationCategory::SoilPh).len(), 1);
    }
}
