//! Terminal form for entering one set of field observations.

use agrisense::error::{AgriSenseError, Result};
use agrisense::models::{
    CropObservation, CropStage, LabReport, Observation, PestReport, SoilMoisture,
    SoilObservation, SoilType, SymptomReport, WeatherReading,
};
use dialoguer::{Input, MultiSelect, Select};

const SYMPTOMS: [&str; 7] = [
    "Leaf spots",
    "Yellowing",
    "Wilting",
    "Stem lesions",
    "Mosaic pattern",
    "Powdery white growth",
    "Black sooty mould",
];

const PESTS: [&str; 4] = ["Aphids", "Mites", "Caterpillars", "Whiteflies"];

fn input_error(e: dialoguer::Error) -> AgriSenseError {
    AgriSenseError::InvalidData(format!("Input error: {}", e))
}

/// Blank input means "not measured"; the attribute stays absent.
fn optional_number(prompt: &str) -> Result<Option<f64>> {
    let raw: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .validate_with(|s: &String| -> std::result::Result<(), String> {
            if s.trim().is_empty() || s.trim().parse::<f64>().is_ok() {
                Ok(())
            } else {
                Err("Enter a number or leave blank".into())
            }
        })
        .interact_text()
        .map_err(input_error)?;

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| AgriSenseError::InvalidData(format!("Bad number '{}': {}", raw, e)))
}

fn select<T: Copy + std::fmt::Display>(prompt: &str, options: &[T], default: usize) -> Result<T> {
    let labels: Vec<String> = options.iter().map(|o| o.to_string()).collect();
    let index = Select::new()
        .with_prompt(prompt)
        .items(&labels[..])
        .default(default)
        .interact()
        .map_err(input_error)?;
    Ok(options[index])
}

fn checked(prompt: &str, items: &[&str]) -> Result<Vec<bool>> {
    let picked = MultiSelect::new()
        .with_prompt(prompt)
        .items(items)
        .interact()
        .map_err(input_error)?;
    Ok((0..items.len()).map(|i| picked.contains(&i)).collect())
}

pub fn collect_observation() -> Result<Observation> {
    println!();
    println!("Crop");
    let name: String = Input::new()
        .with_prompt("  Crop name")
        .default("tomato".into())
        .interact_text()
        .map_err(input_error)?;
    let stage = select("  Growth stage", &CropStage::ALL, 1)?;

    println!();
    println!("Soil");
    let soil_type = select("  Soil type", &SoilType::ALL, 0)?;
    let moisture = select("  Moisture", &SoilMoisture::ALL, 1)?;
    let soil_ph = optional_number("  Soil pH (blank if unknown)")?;

    println!();
    println!("Lab report (ppm, leave blank if not tested)");
    let nitrogen = optional_number("  N")?;
    let phosphorus = optional_number("  P")?;
    let potassium = optional_number("  K")?;

    println!();
    println!("Weather");
    let temp = optional_number("  Temperature (°C)")?;
    let humidity = optional_number("  Relative humidity (%)")?;
    let rain_days = optional_number("  Recent rain days")?;

    println!();
    let s = checked("Visible symptoms (space to toggle)", &SYMPTOMS)?;
    let p = checked("Pests present (space to toggle)", &PESTS)?;

    let lab = if nitrogen.is_some() || phosphorus.is_some() || potassium.is_some() {
        Some(LabReport {
            nitrogen,
            phosphorus,
            potassium,
            ph: None,
        })
    } else {
        None
    };

    Ok(Observation {
        crop: Some(CropObservation { name, stage }),
        soil: Some(SoilObservation {
            soil_type: Some(soil_type),
            moisture: Some(moisture),
            ph: soil_ph,
        }),
        lab,
        symptoms: Some(SymptomReport {
            leaf_spots: Some(s[0]),
            yellowing: Some(s[1]),
            wilting: Some(s[2]),
            stem_lesions: Some(s[3]),
            mosaic: Some(s[4]),
            powdery_white: Some(s[5]),
            black_sooty: Some(s[6]),
        }),
        weather: Some(WeatherReading {
            temp,
            humidity,
            recent_rain_days: rain_days.map(|d| d.round() as i64),
        }),
        pests: Some(PestReport {
            aphids: Some(p[0]),
            mites: Some(p[1]),
            caterpillars: Some(p[2]),
            whiteflies: Some(p[3]),
        }),
    })
}
