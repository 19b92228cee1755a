use crate::daykey::{is_valid_offset, DEFAULT_UTC_OFFSET_HOURS};
use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/challenges.json";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),

    #[error("TRACKER_UTC_OFFSET_HOURS must be a whole hour between -12 and 14, got {0:?}")]
    InvalidOffset(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub utc_offset_hours: i32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let data_path = lookup("APP_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        let utc_offset_hours = match lookup("TRACKER_UTC_OFFSET_HOURS") {
            Some(raw) => raw
                .trim()
                .parse()
                .ok()
                .filter(|offset| is_valid_offset(*offset))
                .ok_or(ConfigError::InvalidOffset(raw))?,
            None => DEFAULT_UTC_OFFSET_HOURS,
        };

        Ok(Self {
            port,
            data_path,
            utc_offset_hours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/challenges.json"));
        assert_eq!(config.utc_offset_hours, 9);
    }

    #[test]
    fn values_are_read_from_environment() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "3002"),
            ("APP_DATA_PATH", "/tmp/tracker.json"),
            ("TRACKER_UTC_OFFSET_HOURS", "-5"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3002);
        assert_eq!(config.data_path, PathBuf::from("/tmp/tracker.json"));
        assert_eq!(config.utc_offset_hours, -5);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert_eq!(
            Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err(),
            ConfigError::InvalidPort("eighty".into())
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("TRACKER_UTC_OFFSET_HOURS", "20")])).unwrap_err(),
            ConfigError::InvalidOffset("20".into())
        );
    }
}
