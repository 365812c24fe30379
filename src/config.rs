use std::{path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::classifier::{Range, Thresholds};

pub const CONFIG_FILE: &str = "./enviro_config.json";
pub const CONFIG_ENV: &str = "ENVIROTRACK_CONFIG";
pub const DB_FILE: &str = "./envirotrack.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub meta: Meta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub temperature_calibration_offset: f64,
    pub poll_seconds: u64,
    pub db_path: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            temperature_calibration_offset: -1.5,
            poll_seconds: 10,
            db_path: DB_FILE.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, anyhow::Error> {
        let config: Config = serde_json::from_str(text).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let t = &self.thresholds;
        check_range("temperature", &t.temperature)?;
        check_range("humidity", &t.humidity)?;
        check_range("pressure", &t.pressure)?;
        check_range("orientation.pitch", &t.orientation.pitch)?;
        check_range("orientation.roll", &t.orientation.roll)?;
        check_range("orientation.yaw", &t.orientation.yaw)?;

        if self.meta.poll_seconds == 0 {
            anyhow::bail!("meta.poll_seconds must be greater than zero");
        }
        if !self.meta.temperature_calibration_offset.is_finite() {
            anyhow::bail!("meta.temperature_calibration_offset must be a finite number");
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.meta.poll_seconds)
    }
}

fn check_range(name: &str, range: &Range) -> Result<(), anyhow::Error> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min >= range.max {
        anyhow::bail!(
            "Invalid range for '{name}': min < max required, got min {} and max {}",
            range.min,
            range.max
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    const FULL: &str = r#"
    {
        "temperature": { "min": 18.0, "max": 30.0 },
        "humidity": { "min": 30, "max": 60 },
        "pressure": { "min": 980.0, "max": 1030.0 },
        "orientation": {
            "pitch": { "min": -10.0, "max": 10.0 },
            "roll": { "min": -10.0, "max": 10.0 },
            "yaw": { "min": 0.0, "max": 360.0 }
        },
        "meta": {
            "temperature_calibration_offset": -2.0,
            "poll_seconds": 5,
            "db_path": "/tmp/test.db"
        }
    }
    "#;

    #[test]
    fn test_parse_full() {
        let config = Config::parse(FULL).unwrap();
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.meta.temperature_calibration_offset, -2.0);
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.meta.db_path, "/tmp/test.db");
    }

    #[test]
    fn test_meta_defaults() {
        let text = r#"
        {
            "temperature": { "min": 18.0, "max": 30.0 },
            "humidity": { "min": 30.0, "max": 60.0 },
            "pressure": { "min": 980.0, "max": 1030.0 },
            "orientation": {
                "pitch": { "min": -10.0, "max": 10.0 },
                "roll": { "min": -10.0, "max": 10.0 },
                "yaw": { "min": 0.0, "max": 360.0 }
            },
            "meta": { "poll_seconds": 30 }
        }
        "#;
        let config = Config::parse(text).unwrap();
        assert_eq!(config.meta.poll_seconds, 30);
        assert_eq!(config.meta.temperature_calibration_offset, -1.5);
        assert_eq!(config.meta.db_path, DB_FILE);
    }

    #[test]
    fn test_missing_section() {
        let text = r#"
        {
            "temperature": { "min": 18.0, "max": 30.0 },
            "humidity": { "min": 30.0, "max": 60.0 },
            "pressure": { "min": 980.0, "max": 1030.0 }
        }
        "#;
        assert!(Config::parse(text).is_err());
    }

    #[test]
    fn test_inverted_range() {
        let text = FULL.replace(
            r#""humidity": { "min": 30, "max": 60 }"#,
            r#""humidity": { "min": 60, "max": 30 }"#,
        );
        let err = Config::parse(&text).unwrap_err();
        assert!(err.to_string().contains("humidity"));
    }

    #[test]
    fn test_zero_poll_seconds() {
        let text = FULL.replace(r#""poll_seconds": 5"#, r#""poll_seconds": 0"#);
        assert!(Config::parse(&text).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.meta.poll_seconds, 5);
    }

    #[test]
    fn test_load_failures_name_the_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("enviro_config.json");
        let err = Config::load(&missing).unwrap_err();
        assert!(err.to_string().contains("enviro_config.json"));

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid config file"));
    }

    #[test]
    fn test_shipped_config() {
        let config = Config::parse(include_str!("../enviro_config.json")).unwrap();
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.meta.db_path, DB_FILE);
    }
}
