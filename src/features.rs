//! Categorical encoding and feature-vector assembly.
//!
//! The order of `FEATURE_NAMES` is the column order the scaler and
//! classifier were fitted on. Changing it silently breaks every prediction.

use crate::error::PredictError;
use crate::types::FloodInput;

pub const FEATURE_COUNT: usize = 10;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "station",
    "rainfall",
    "river_discharge",
    "water_level",
    "temperature",
    "humidity",
    "soil_type",
    "elevation",
    "latitude",
    "longitude",
];

/// Label codes as produced by the training-time label encoder.
pub const SOIL_TYPES: [(&str, u8); 3] = [("Clay", 0), ("Sandy", 1), ("Loam", 2)];

pub const STATIONS: [(&str, u8); 3] = [("Station1", 0), ("Station2", 1), ("Station3", 2)];

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Upper-case the first character and lower-case the rest ("cLAY" -> "Clay").
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn lookup(table: &[(&str, u8)], key: &str) -> Option<u8> {
    table.iter().find(|(label, _)| *label == key).map(|(_, code)| *code)
}

/// Renders the allowed labels the way existing clients already parse them:
/// `['Clay', 'Sandy', 'Loam']`.
pub fn allowed_list(table: &[(&str, u8)]) -> String {
    let quoted: Vec<String> = table.iter().map(|(label, _)| format!("'{}'", label)).collect();
    format!("[{}]", quoted.join(", "))
}

pub fn encode_soil_type(raw: &str) -> Result<u8, PredictError> {
    lookup(&SOIL_TYPES, &capitalize(raw)).ok_or_else(|| PredictError::InvalidSoilType(raw.to_string()))
}

pub fn encode_station(raw: &str) -> Result<u8, PredictError> {
    lookup(&STATIONS, raw).ok_or_else(|| PredictError::InvalidStation(raw.to_string()))
}

/// Validate the categorical fields and lay the request out in fitted order.
pub fn build_features(input: &FloodInput) -> Result<FeatureVector, PredictError> {
    // soil is checked before station so a request with both wrong reports soil
    let soil = encode_soil_type(&input.soil_type)?;
    let station = encode_station(&input.station)?;

    Ok([
        f64::from(station),
        input.rainfall,
        input.river_discharge,
        input.water_level,
        input.temperature,
        input.humidity,
        f64::from(soil),
        input.elevation,
        input.latitude,
        input.longitude,
    ])
}

/// Guard against drift between this encoder and the loaded scaler.
pub fn check_dimension(features: &[f64], expected: usize) -> Result<(), PredictError> {
    if features.len() != expected {
        return Err(PredictError::FeatureMismatch {
            expected,
            got: features.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(station: &str, soil: &str) -> FloodInput {
        FloodInput {
            station: station.to_string(),
            rainfall: 120.5,
            river_discharge: 300.2,
            water_level: 5.6,
            temperature: 28.1,
            humidity: 80.0,
            soil_type: soil.to_string(),
            elevation: 15.0,
            latitude: 19.07,
            longitude: 72.87,
        }
    }

    #[test]
    fn test_reference_vector_order() {
        let v = build_features(&sample("Station1", "Loam")).unwrap();
        assert_eq!(v, [0.0, 120.5, 300.2, 5.6, 28.1, 80.0, 2.0, 15.0, 19.07, 72.87]);
    }

    #[test]
    fn test_every_allowed_combination_builds() {
        for (station, s_code) in STATIONS {
            for (soil, soil_code) in SOIL_TYPES {
                for variant in [soil.to_string(), soil.to_lowercase(), soil.to_uppercase()] {
                    let v = build_features(&sample(station, &variant)).unwrap();
                    assert_eq!(v.len(), FEATURE_COUNT);
                    assert_eq!(v[0], f64::from(s_code));
                    assert_eq!(v[6], f64::from(soil_code));
                }
            }
        }
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("clay"), "Clay");
        assert_eq!(capitalize("cLAY"), "Clay");
        assert_eq!(capitalize("SANDY"), "Sandy");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_unknown_soil_is_rejected() {
        let err = build_features(&sample("Station1", "Rocky")).unwrap_err();
        assert_eq!(err, PredictError::InvalidSoilType("Rocky".to_string()));
        assert_eq!(
            err.to_string(),
            "Invalid soil type: Rocky. Allowed: ['Clay', 'Sandy', 'Loam']"
        );
    }

    #[test]
    fn test_station_match_is_case_sensitive() {
        let err = build_features(&sample("station1", "Clay")).unwrap_err();
        assert_eq!(err, PredictError::InvalidStation("station1".to_string()));

        let err = build_features(&sample("Station9", "Clay")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid station: Station9. Allowed: ['Station1', 'Station2', 'Station3']"
        );
    }

    #[test]
    fn test_soil_reported_before_station() {
        let err = build_features(&sample("Station9", "Rocky")).unwrap_err();
        assert!(matches!(err, PredictError::InvalidSoilType(_)));
    }

    #[test]
    fn test_dimension_guard() {
        let v = build_features(&sample("Station2", "Sandy")).unwrap();
        assert!(check_dimension(&v, FEATURE_COUNT).is_ok());
        let err = check_dimension(&v, 9).unwrap_err();
        assert_eq!(err.to_string(), "Feature mismatch: expected 9, got 10");
    }
}
