//! Audit configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use sharesweep_common::{Error, Result};

use crate::job::DEFAULT_PAGE_SIZE;
use crate::scheduler::DailySchedule;

/// Largest page size the activity API accepts.
const MAX_PAGE_SIZE: u32 = 100;

/// Settings for the resident audit process.
///
/// Every field has a default, so a config file only lists overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// OAuth2 client secrets downloaded from the cloud console.
    pub client_secrets_path: PathBuf,
    /// Where the authorized token is persisted.
    pub token_path: PathBuf,
    /// Maximum activities fetched per run.
    pub page_size: u32,
    /// Daily firing time, local time zone.
    pub schedule: DailySchedule,
    /// Loopback port for the authorization redirect (0 = any free port).
    pub redirect_port: u16,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            client_secrets_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            page_size: DEFAULT_PAGE_SIZE,
            schedule: DailySchedule::default(),
            redirect_port: 0,
        }
    }
}

impl AuditConfig {
    /// Per-user config file location, `<config dir>/sharesweep/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sharesweep").join("config.json"))
    }

    /// Parse a JSON config document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Load `explicit` if given, else the per-user file when it exists,
    /// else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        self.schedule.time()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuditConfig::default();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.schedule, DailySchedule::new(12, 0).unwrap());
        assert_eq!(config.token_path, PathBuf::from("token.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AuditConfig::from_json(r#"{"schedule": {"hour": 8, "minute": 30}}"#).unwrap();
        assert_eq!(config.schedule, DailySchedule::new(8, 30).unwrap());
        assert_eq!(config.page_size, 10);
        assert_eq!(config.client_secrets_path, PathBuf::from("credentials.json"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AuditConfig::from_json(r#"{"page_size": 0}"#).is_err());
        assert!(AuditConfig::from_json(r#"{"page_size": 500}"#).is_err());
        assert!(AuditConfig::from_json(r#"{"schedule": {"hour": 25, "minute": 0}}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"token_path": "/var/lib/sharesweep/token.json"}"#).unwrap();

        let config = AuditConfig::resolve(Some(&path)).unwrap();
        assert_eq!(
            config.token_path,
            PathBuf::from("/var/lib/sharesweep/token.json")
        );
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = AuditConfig::resolve(Some(&dir.path().join("absent.json")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
