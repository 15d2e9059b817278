use crate::config::NpkThresholds;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NutrientLevel {
    Low,
    Medium,
    High,
}

impl NutrientLevel {
    /// Classify a lab reading (ppm) into a qualitative band
    pub fn classify(ppm: f64, thresholds: &NpkThresholds) -> Self {
        if ppm < thresholds.low_below {
            NutrientLevel::Low
        } else if ppm < thresholds.medium_below {
            NutrientLevel::Medium
        } else {
            NutrientLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientLevel::Low => "low",
            NutrientLevel::Medium => "medium",
            NutrientLevel::High => "high",
        }
    }
}

impl std::fmt::Display for NutrientLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Qualitative N, P and K levels from one lab report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpkLevels {
    pub nitrogen: NutrientLevel,
    pub phosphorus: NutrientLevel,
    pub potassium: NutrientLevel,
}

pub fn interpret_npk(n: f64, p: f64, k: f64, thresholds: &NpkThresholds) -> NpkLevels {
    NpkLevels {
        nitrogen: NutrientLevel::classify(n, thresholds),
        phosphorus: NutrientLevel::classify(p, thresholds),
        potassium: NutrientLevel::classify(k, thresholds),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges() {
        let t = NpkThresholds::default();
        assert_eq!(NutrientLevel::classify(49.9, &t), NutrientLevel::Low);
        assert_eq!(NutrientLevel::classify(50.0, &t), NutrientLevel::Medium);
        assert_eq!(NutrientLevel::classify(149.9, &t), NutrientLevel::Medium);
        assert_eq!(NutrientLevel::classify(150.0, &t), NutrientLevel::High);
    }

    #[test]
    fn reference_lab_is_low_across_the_board() {
        let levels = interpret_npk(30.0, 40.0, 45.0, &NpkThresholds::default());
        assert_eq!(levels.nitrogen, NutrientLevel::Low);
        assert_eq!(levels.phosphorus, NutrientLevel::Low);
        assert_eq!(levels.potassium, NutrientLevel::Low);
    }

    #[test]
    fn custom_thresholds_shift_the_bands() {
        let t = NpkThresholds {
            low_below: 20.0,
            medium_below: 40.0,
        };
        let levels = interpret_npk(30.0, 10.0, 45.0, &t);
        assert_eq!(levels.nitrogen, NutrientLevel::Medium);
        assert_eq!(levels.phosphorus, NutrientLevel::Low);
        assert_eq!(levels.potassium, NutrientLevel::High);
    }
}
