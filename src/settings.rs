//! Layered settings: built-in defaults, an optional TOML file, then
//! `NETPULSE_*` environment variables.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use netpulse_sdk::{FileStore, DEFAULT_GROUP_ID};
use serde::Deserialize;

use crate::duration;

/// Environment variable prefix for overrides, e.g. `NETPULSE_INTERVAL=500ms`.
pub const ENV_PREFIX: &str = "NETPULSE";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Namespace shared by the sampler and its readers.
    pub group_id: String,

    /// Directory holding the namespaces.
    pub store_dir: PathBuf,

    /// Sampling period.
    #[serde(deserialize_with = "duration::deserialize")]
    pub interval: Duration,

    /// Link-state poll period. Zero disables the watcher.
    #[serde(deserialize_with = "duration::deserialize")]
    pub link_poll: Duration,

    /// Age after which a published record is ignored. Zero disables the check.
    #[serde(deserialize_with = "duration::deserialize")]
    pub stale_after: Duration,

    /// Include cumulative totals in the text report.
    pub show_totals: bool,
}

impl Settings {
    /// Load settings, reading `path` if given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, ENV_PREFIX)
    }

    pub(crate) fn load_from(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("group_id", DEFAULT_GROUP_ID)?
            .set_default("store_dir", default_store_dir().to_string_lossy().to_string())?
            .set_default("interval", "1s")?
            .set_default("link_poll", "2s")?
            .set_default("stale_after", "2m")?
            .set_default("show_totals", true)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix(env_prefix))
            .build()
            .context("failed to load settings")?
            .try_deserialize()
            .context("invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the sampler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            bail!("interval must be greater than zero");
        }
        Ok(())
    }

    /// The shared store these settings address.
    pub fn store(&self) -> Arc<FileStore> {
        Arc::new(FileStore::new(&self.store_dir, self.group_id.clone()))
    }
}

fn default_store_dir() -> PathBuf {
    std::env::temp_dir().join("netpulse")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::load_from(None, "NETPULSE_TEST_DEFAULTS").unwrap();

        assert_eq!(settings.group_id, DEFAULT_GROUP_ID);
        assert_eq!(settings.store_dir, default_store_dir());
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.link_poll, Duration::from_secs(2));
        assert_eq!(settings.stale_after, Duration::from_secs(120));
        assert!(settings.show_totals);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
group_id = "group.example.widget"
store_dir = "/var/tmp/np"
interval = "500ms"
stale_after = "0s"
show_totals = false
"#
        )
        .unwrap();

        let settings = Settings::load_from(Some(file.path()), "NETPULSE_TEST_FILE").unwrap();

        assert_eq!(settings.group_id, "group.example.widget");
        assert_eq!(settings.store_dir, PathBuf::from("/var/tmp/np"));
        assert_eq!(settings.interval, Duration::from_millis(500));
        assert_eq!(settings.link_poll, Duration::from_secs(2));
        assert_eq!(settings.stale_after, Duration::ZERO);
        assert!(!settings.show_totals);
        assert!(settings.store().entry_path("networkStats").starts_with("/var/tmp/np/group.example.widget"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
group_id = "group.from.file"
interval = "5s"
link_poll = "10s"
"#
        )
        .unwrap();
        std::env::set_var("NETPULSE_TEST_ENV_INTERVAL", "15m");
        std::env::set_var("NETPULSE_TEST_ENV_GROUP_ID", "group.from.env");

        let settings = Settings::load_from(Some(file.path()), "NETPULSE_TEST_ENV").unwrap();

        assert_eq!(settings.interval, Duration::from_secs(900));
        assert_eq!(settings.group_id, "group.from.env");
        // Keys the environment leaves alone still come from the file
        assert_eq!(settings.link_poll, Duration::from_secs(10));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"interval = "0s""#).unwrap();

        let err = Settings::load_from(Some(file.path()), "NETPULSE_TEST_ZERO_FILE").unwrap_err();
        assert!(err.to_string().contains("interval must be greater than zero"));

        std::env::set_var("NETPULSE_TEST_ZERO_ENV_INTERVAL", "0ms");
        assert!(Settings::load_from(None, "NETPULSE_TEST_ZERO_ENV").is_err());
    }

    #[test]
    fn validate_catches_overridden_interval() {
        let mut settings = Settings::load_from(None, "NETPULSE_TEST_VALIDATE").unwrap();
        assert!(settings.validate().is_ok());

        settings.interval = Duration::ZERO;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, r#"interval = "often""#).unwrap();

        let err = Settings::load_from(Some(file.path()), "NETPULSE_TEST_INVALID").unwrap_err();
        assert!(format!("{:#}", err).contains("invalid settings"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load_from(
            Some(Path::new("/nonexistent/netpulse.toml")),
            "NETPULSE_TEST_MISSING",
        );
        assert!(result.is_err());
    }
}
