//! YAML configuration for a backup run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{Endpoint, ValidationError};

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "backup-config.yml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub device: DeviceSettings,
    #[serde(default)]
    pub export: ExportSettings,
    #[serde(default)]
    pub backup: BackupSettings,
}

#[derive(Clone, Deserialize)]
pub struct DeviceSettings {
    /// `host[:port]` of the TR-064 endpoint, e.g. `192.168.178.1:49000`.
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, Default, Deserialize)]
pub struct ExportSettings {
    /// Encrypts the configuration and asset exports.
    #[serde(default)]
    pub password: String,
    #[serde(default, rename = "phone_books")]
    pub phonebooks: bool,
    #[serde(default, rename = "phone_assets")]
    pub assets: bool,
    #[serde(default, rename = "phone_barringlist")]
    pub barring_list: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackupSettings {
    #[serde(default = "default_target_path")]
    pub target_path: PathBuf,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            target_path: default_target_path(),
        }
    }
}

fn default_target_path() -> PathBuf {
    PathBuf::from(".")
}

impl Settings {
    /// Read and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(content)?;
        if settings.device.host.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "device.host",
            }
            .into());
        }
        Ok(settings)
    }
}

impl DeviceSettings {
    /// Control endpoint URL, `http://<host>`.
    pub fn url(&self) -> String {
        format!("http://{}", self.host.trim())
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.url(), &self.username, &self.password)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl fmt::Debug for DeviceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSettings")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for ExportSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportSettings")
            .field("password", &"<redacted>")
            .field("phonebooks", &self.phonebooks)
            .field("assets", &self.assets)
            .field("barring_list", &self.barring_list)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const FULL: &str = r#"
device:
  host: "192.168.178.1:49000"
  username: "backup"
  password: "device-secret"
export:
  password: "export-secret"
  phone_books: true
  phone_assets: false
  phone_barringlist: true
backup:
  target_path: "/srv/backups"
"#;

    #[test]
    fn parses_full_config() {
        let settings = Settings::from_yaml(FULL).unwrap();
        assert_eq!(settings.device.url(), "http://192.168.178.1:49000");
        assert_eq!(settings.device.username, "backup");
        assert_eq!(settings.export.password, "export-secret");
        assert!(settings.export.phonebooks);
        assert!(!settings.export.assets);
        assert!(settings.export.barring_list);
        assert_eq!(settings.backup.target_path, PathBuf::from("/srv/backups"));
        assert_eq!(settings.device.timeout(), None);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let settings = Settings::from_yaml("device:\n  host: fritz.box\n").unwrap();
        assert!(!settings.export.phonebooks);
        assert!(!settings.export.assets);
        assert!(!settings.export.barring_list);
        assert_eq!(settings.backup.target_path, PathBuf::from("."));
    }

    #[test]
    fn empty_host_is_rejected() {
        let err = Settings::from_yaml("device:\n  host: \"  \"\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(ValidationError::Empty {
                field: "device.host"
            })
        ));
    }

    #[test]
    fn missing_device_section_is_a_parse_error() {
        assert!(matches!(
            Settings::from_yaml("export:\n  phone_books: true\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn timeout_is_read_in_seconds() {
        let settings =
            Settings::from_yaml("device:\n  host: fritz.box\n  timeout_secs: 30\n").unwrap();
        assert_eq!(settings.device.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn debug_output_redacts_passwords() {
        let settings = Settings::from_yaml(FULL).unwrap();
        let debug = format!("{settings:?}");
        assert!(!debug.contains("device-secret"));
        assert!(!debug.contains("export-secret"));
    }

    #[test]
    fn load_reads_file_and_reports_missing_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.device.host, "192.168.178.1:49000");

        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
