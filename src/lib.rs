//! FloodShield: serves a pre-fitted flood classifier over HTTP.
//!
//! `POST /predict` encodes a request's station and soil type, lays the
//! measurements out in the order the artifacts were fitted on, scales the
//! row and returns the classifier's 0/1 label. `GET /` is a static info page.

pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod server;
pub mod types;

pub use config::ServiceConfig;
pub use error::PredictError;
pub use model::{Artifacts, Classifier, Scaler};
pub use server::{router, AppState};
pub use types::{FloodInput, PredictionOut, ServiceInfo};
