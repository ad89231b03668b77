use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::model::{MODEL_FILE, SCALER_FILE};

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub model_dir: PathBuf,
    pub log_features: bool,
}

impl ServiceConfig {
    /// Read from the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = get("FLOODSHIELD_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = match get("PORT") {
            Some(p) => p.trim().parse().with_context(|| format!("PORT is not a valid port: {:?}", p))?,
            None => 8000,
        };
        let model_dir = get("FLOODSHIELD_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(resolve_model_dir);
        let log_features = matches!(
            get("FLOODSHIELD_LOG_FEATURES").as_deref().map(str::trim),
            Some("1") | Some("true")
        );

        Ok(Self {
            host,
            port,
            model_dir,
            log_features,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(MODEL_FILE)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.model_dir.join(SCALER_FILE)
    }
}

fn resolve_model_dir() -> PathBuf {
    let mut exe_dir = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
    exe_dir.pop();
    model_dir_near(&exe_dir)
}

/// Prefer `model/` next to the executable, then `./model`.
fn model_dir_near(exe_dir: &Path) -> PathBuf {
    let candidates = [exe_dir.join("model"), PathBuf::from("model")];

    for c in candidates {
        if c.is_dir() {
            return c;
        }
    }

    // Fallback; loading will fail and the service runs without artifacts
    PathBuf::from("model")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cfg(pairs: &[(&str, &str)]) -> Result<ServiceConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = cfg(&[]).unwrap();
        assert_eq!(c.port, 8000);
        assert_eq!(c.addr().unwrap().to_string(), "0.0.0.0:8000");
        assert!(!c.log_features);
        assert!(c.model_path().ends_with("model/flood_model.json"));
        assert!(c.scaler_path().ends_with("model/scaler.json"));
    }

    #[test]
    fn test_install_dir_wins_over_working_dir() {
        let install = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(install.path().join("model")).unwrap();
        assert_eq!(model_dir_near(install.path()), install.path().join("model"));

        // nothing next to the binary: fall back to ./model
        let bare = tempfile::TempDir::new().unwrap();
        assert_eq!(model_dir_near(bare.path()), PathBuf::from("model"));
    }

    #[test]
    fn test_overrides() {
        let c = cfg(&[
            ("FLOODSHIELD_HOST", "127.0.0.1"),
            ("PORT", "9001"),
            ("FLOODSHIELD_MODEL_DIR", "/srv/artifacts"),
            ("FLOODSHIELD_LOG_FEATURES", "1"),
        ])
        .unwrap();
        assert_eq!(c.addr().unwrap().to_string(), "127.0.0.1:9001");
        assert_eq!(c.model_path(), PathBuf::from("/srv/artifacts/flood_model.json"));
        assert!(c.log_features);
    }

    #[test]
    fn test_bad_port_is_an_error() {
        assert!(cfg(&[("PORT", "eighty")]).is_err());
        assert!(cfg(&[("PORT", "70000")]).is_err());
    }
}
