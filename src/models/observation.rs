use super::fact::{Fact, FactKind};
use crate::error::{AgriSenseError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CropStage {
    Vegetative,
    Flowering,
    Fruiting,
}

impl CropStage {
    pub const ALL: [CropStage; 3] = [
        CropStage::Vegetative,
        CropStage::Flowering,
        CropStage::Fruiting,
    ];

    /// Value carried by the `stage` attribute of a Crop fact.
    pub fn as_str(&self) -> &'static str {
        match self {
            CropStage::Vegetative => "vegetative",
            CropStage::Flowering => "flowering",
            CropStage::Fruiting => "fruiting",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "vegetative" | "veg" => Some(CropStage::Vegetative),
            "flowering" | "bloom" => Some(CropStage::Flowering),
            "fruiting" | "fruit" => Some(CropStage::Fruiting),
            _ => None,
        }
    }

    pub fn needs_potassium(&self) -> bool {
        matches!(self, CropStage::Flowering | CropStage::Fruiting)
    }
}

impl std::fmt::Display for CropStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilType {
    Loam,
    Clay,
    Sandy,
}

impl SoilType {
    pub const ALL: [SoilType; 3] = [SoilType::Loam, SoilType::Clay, SoilType::Sandy];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilType::Loam => "loam",
            SoilType::Clay => "clay",
            SoilType::Sandy => "sandy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "loam" => Some(SoilType::Loam),
            "clay" => Some(SoilType::Clay),
            "sandy" | "sand" => Some(SoilType::Sandy),
            _ => None,
        }
    }
}

impl std::fmt::Display for SoilType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoilMoisture {
    Low,
    Adequate,
    High,
}

impl SoilMoisture {
    pub const ALL: [SoilMoisture; 3] = [
        SoilMoisture::Low,
        SoilMoisture::Adequate,
        SoilMoisture::High,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoilMoisture::Low => "low",
            SoilMoisture::Adequate => "adequate",
            SoilMoisture::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" | "dry" => Some(SoilMoisture::Low),
            "adequate" | "ok" => Some(SoilMoisture::Adequate),
            "high" | "wet" => Some(SoilMoisture::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for SoilMoisture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropObservation {
    pub name: String,
    pub stage: CropStage,
}

impl CropObservation {
    pub fn to_fact(&self) -> Fact {
        Fact::new(FactKind::Crop)
            .with("name", self.name.to_lowercase())
            .with("stage", self.stage.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilObservation {
    #[serde(rename = "type", default)]
    pub soil_type: Option<SoilType>,
    #[serde(default)]
    pub moisture: Option<SoilMoisture>,
    #[serde(default)]
    pub ph: Option<f64>,
}

impl SoilObservation {
    pub fn to_fact(&self) -> Fact {
        Fact::new(FactKind::Soil)
            .with_opt("type", self.soil_type.map(|t| t.as_str()))
            .with_opt("moisture", self.moisture.map(|m| m.as_str()))
            .with_opt("ph", self.ph)
    }
}

/// Soil lab results. Nutrient levels in ppm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabReport {
    #[serde(rename = "N", alias = "n", default)]
    pub nitrogen: Option<f64>,
    #[serde(rename = "P", alias = "p", default)]
    pub phosphorus: Option<f64>,
    #[serde(rename = "K", alias = "k", default)]
    pub potassium: Option<f64>,
    #[serde(default)]
    pub ph: Option<f64>,
}

impl LabReport {
    pub fn to_fact(&self) -> Fact {
        Fact::new(FactKind::Lab)
            .with_opt("N", self.nitrogen)
            .with_opt("P", self.phosphorus)
            .with_opt("K", self.potassium)
            .with_opt("ph", self.ph)
    }
}

/// Visible symptoms. Unanswered questions stay absent rather than false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymptomReport {
    pub leaf_spots: Option<bool>,
    pub yellowing: Option<bool>,
    pub wilting: Option<bool>,
    pub stem_lesions: Option<bool>,
    pub mosaic: Option<bool>,
    pub powdery_white: Option<bool>,
    pub black_sooty: Option<bool>,
}

impl SymptomReport {
    pub fn to_fact(&self) -> Fact {
        Fact::new(FactKind::Symptoms)
            .with_opt("leaf_spots", self.leaf_spots)
            .with_opt("yellowing", self.yellowing)
            .with_opt("wilting", self.wilting)
            .with_opt("stem_lesions", self.stem_lesions)
            .with_opt("mosaic", self.mosaic)
            .with_opt("powdery_white", self.powdery_white)
            .with_opt("black_sooty", self.black_sooty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherReading {
    /// Air temperature in °C
    pub temp: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    pub recent_rain_days: Option<i64>,
}

impl WeatherReading {
    pub fn to_fact(&self) -> Fact {
        Fact::new(FactKind::Weather)
            .with_opt("temp", self.temp)
            .with_opt("humidity", self.humidity)
            .with_opt("recent_rain_days", self.recent_rain_days)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PestReport {
    pub aphids: Option<bool>,
    pub mites: Option<bool>,
    pub caterpillars: Option<bool>,
    pub whiteflies: Option<bool>,
}

impl PestReport {
    pub fn to_fact(&self) -> Fact {
        Fact::new(FactKind::PestPresence)
            .with_opt("aphids", self.aphids)
            .with_opt("mites", self.mites)
            .with_opt("caterpillars", self.caterpillars)
            .with_opt("whiteflies", self.whiteflies)
    }
}

/// Everything an operator reports about one field, as read from a form or file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Observation {
    pub crop: Option<CropObservation>,
    pub soil: Option<SoilObservation>,
    pub lab: Option<LabReport>,
    pub symptoms: Option<SymptomReport>,
    pub weather: Option<WeatherReading>,
    #[serde(alias = "pest_presence")]
    pub pests: Option<PestReport>,
}

impl Observation {
    /// Tomato in flower with powdery white leaf spots, humid weather and low NPK.
    pub fn demo() -> Self {
        Self {
            crop: Some(CropObservation {
                name: "tomato".into(),
                stage: CropStage::Flowering,
            }),
            soil: Some(SoilObservation {
                soil_type: Some(SoilType::Loam),
                moisture: Some(SoilMoisture::Adequate),
                ph: Some(6.3),
            }),
            lab: Some(LabReport {
                nitrogen: Some(30.0),
                phosphorus: Some(40.0),
                potassium: Some(45.0),
                ph: Some(6.3),
            }),
            symptoms: Some(SymptomReport {
                leaf_spots: Some(true),
                powdery_white: Some(true),
                yellowing: Some(false),
                wilting: Some(false),
                ..Default::default()
            }),
            weather: Some(WeatherReading {
                temp: Some(22.0),
                humidity: Some(85.0),
                recent_rain_days: Some(5),
            }),
            pests: Some(PestReport {
                aphids: Some(false),
                whiteflies: Some(false),
                caterpillars: Some(false),
                mites: None,
            }),
        }
    }

    /// Load from a YAML or JSON file, chosen by extension (YAML otherwise).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AgriSenseError::InvalidData(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn is_empty(&self) -> bool {
        self.to_facts().is_empty()
    }

    /// Facts to declare, in the order a form collects them.
    pub fn to_facts(&self) -> Vec<Fact> {
        let mut facts = Vec::new();
        if let Some(crop) = &self.crop {
            facts.push(crop.to_fact());
        }
        if let Some(soil) = &self.soil {
            facts.push(soil.to_fact());
        }
        if let Some(lab) = &self.lab {
            facts.push(lab.to_fact());
        }
        if let Some(symptoms) = &self.symptoms {
            facts.push(symptoms.to_fact());
        }
        if let Some(weather) = &self.weather {
            facts.push(weather.to_fact());
        }
        if let Some(pests) = &self.pests {
            facts.push(pests.to_fact());
        }
        facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    #[test]
    fn crop_stage_from_str_valid() {
        assert_eq!(CropStage::from_str("Flowering"), Some(CropStage::Flowering));
        assert_eq!(CropStage::from_str(" veg "), Some(CropStage::Vegetative));
        assert_eq!(CropStage::from_str("fruit"), Some(CropStage::Fruiting));
        assert_eq!(CropStage::from_str("dormant"), None);
    }

    #[test]
    fn potassium_stages() {
        assert!(!CropStage::Vegetative.needs_potassium());
        assert!(CropStage::Flowering.needs_potassium());
        assert!(CropStage::Fruiting.needs_potassium());
    }

    #[test]
    fn soil_enums_round_trip_their_keys() {
        for t in SoilType::ALL {
            assert_eq!(SoilType::from_str(t.as_str()), Some(t));
        }
        for m in SoilMoisture::ALL {
            assert_eq!(SoilMoisture::from_str(m.as_str()), Some(m));
        }
    }

    #[test]
    fn demo_produces_six_valid_facts() {
        let facts = Observation::demo().to_facts();
        assert_eq!(facts.len(), 6);
        for fact in &facts {
            assert!(fact.validate().is_ok(), "{} should validate", fact);
        }
    }

    #[test]
    fn unanswered_symptoms_stay_absent() {
        let fact = SymptomReport {
            mosaic: Some(true),
            ..Default::default()
        }
        .to_fact();
        assert_eq!(fact.get("mosaic"), Some(&Value::Bool(true)));
        assert!(fact.get("leaf_spots").is_none());
        assert_eq!(fact.attributes().len(), 1);
    }

    #[test]
    fn crop_name_is_normalised() {
        let fact = CropObservation {
            name: "Tomato".into(),
            stage: CropStage::Fruiting,
        }
        .to_fact();
        assert_eq!(fact.get("name"), Some(&Value::from("tomato")));
        assert_eq!(fact.get("stage"), Some(&Value::from("fruiting")));
    }

    #[test]
    fn yaml_uses_wire_attribute_names() {
        let yaml = r#"
crop:
  name: maize
  stage: vegetative
soil:
  type: clay
  ph: 5.2
lab:
  N: 20
  P: 60
  K: 160
pest_presence:
  aphids: true
"#;
        let obs = Observation::from_yaml_str(yaml).unwrap();
        assert_eq!(obs.soil.as_ref().unwrap().soil_type, Some(SoilType::Clay));
        assert_eq!(obs.lab.as_ref().unwrap().nitrogen, Some(20.0));
        assert_eq!(obs.pests.as_ref().unwrap().aphids, Some(true));
        assert!(obs.weather.is_none());
        assert_eq!(obs.to_facts().len(), 4);
    }

    #[test]
    fn json_is_accepted() {
        let json = r#"{"weather": {"temp": 30.5, "humidity": 90, "recent_rain_days": 2}}"#;
        let obs = Observation::from_json_str(json).unwrap();
        let facts = obs.to_facts();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].get("recent_rain_days"), Some(&Value::Int(2)));
    }

    #[test]
    fn unknown_stage_is_an_error() {
        let yaml = "crop:\n  name: rice\n  stage: sleeping\n";
        assert!(Observation::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn empty_observation_has_no_facts() {
        assert!(Observation::default().is_empty());
    }
}
