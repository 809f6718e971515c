use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::Error;

/// Mailcast configuration settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name announced in EHLO
    pub helo_name: String,

    /// Timeout for each SMTP command
    pub smtp_timeout_secs: u64,

    /// Refuse to hand off a message unless STARTTLS succeeds. Relays on
    /// port 465 always use wrapped TLS.
    pub require_tls: bool,

    /// How often a paused or throttled worker re-checks its control flags
    pub poll_interval_millis: u64,

    /// Length of the "minute" rate-limit unit
    pub minute_millis: u64,

    /// Length of the "hour" rate-limit unit
    pub hour_millis: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            helo_name: "localhost".to_string(),
            smtp_timeout_secs: 60,
            require_tls: true,
            poll_interval_millis: 100,
            minute_millis: 60 * 1000,
            hour_millis: 60 * 60 * 1000,
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Config, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let contents = fs::read_to_string(path)?;
        Config::from_toml_str(&contents)
    }

    pub fn is_valid(&self) -> bool {
        self.poll_interval_millis > 0 && self.minute_millis > 0 && self.hour_millis > 0
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_millis)
    }

    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("helo_name = \"mx.example.org\"\nminute_millis = 50\n")
            .unwrap();
        assert_eq!(config.helo_name, "mx.example.org");
        assert_eq!(config.minute_millis, 50);
        assert_eq!(config.hour_millis, 3_600_000);
        assert!(config.require_tls);
        assert!(config.is_valid());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("mailcast-config-{}.toml", uuid::Uuid::new_v4().to_simple()));
        fs::write(&path, "helo_name = \"relay.example.net\"\nrequire_tls = false\nhour_millis = 500\n").unwrap();

        let config = Config::load(&path);
        let _ = fs::remove_file(&path);
        let config = config.unwrap();
        assert_eq!(config.helo_name, "relay.example.net");
        assert!(!config.require_tls);
        assert_eq!(config.hour_millis, 500);
        assert_eq!(config.poll_interval_millis, 100);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("mailcast-absent-{}.toml", uuid::Uuid::new_v4().to_simple()));
        assert!(matches!(Config::load(&path), Err(Error::Io(_))));
    }

    #[test]
    fn test_zero_poll_interval_is_invalid() {
        let config = Config::from_toml_str("poll_interval_millis = 0").unwrap();
        assert!(!config.is_valid());
    }
}
