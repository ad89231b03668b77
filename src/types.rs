use serde::{Deserialize, Serialize};

/// Companion frontend that consumes this API.
pub const FRONTEND_URL: &str = "https://floodshield-phi.vercel.app";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FloodInput {
    pub station: String,          // "Station1" | "Station2" | "Station3", exact match
    pub rainfall: f64,            // mm
    pub river_discharge: f64,     // m^3/s
    pub water_level: f64,         // m
    pub temperature: f64,         // degC
    pub humidity: f64,            // %
    pub soil_type: String,        // "Clay" | "Sandy" | "Loam", any casing
    pub elevation: f64,           // m
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionOut {
    pub prediction: u8,
    pub result: String,
    pub frontend_linked: String,
    pub note: String,
}

impl PredictionOut {
    pub fn from_label(label: u8) -> Self {
        let result = if label == 1 {
            "🌊 Flood Likely"
        } else {
            "☀️ No Flood Risk"
        };
        Self {
            prediction: label,
            result: result.to_string(),
            frontend_linked: FRONTEND_URL.to_string(),
            note: "Backend connected successfully with frontend.".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServiceInfo {
    pub message: String,
    pub author: String,
    pub status: String,
    pub frontend: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            message: "✅ Flood Prediction Backend is Running Successfully!".to_string(),
            author: "Gaurav Kumbhare".to_string(),
            status: "active".to_string(),
            frontend: FRONTEND_URL.to_string(),
        }
    }
}

/// Body of every failed request; clients look for the `error` key.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}
