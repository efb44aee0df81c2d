use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Connection settings for a Sonic instance.
///
/// ```toml
/// address = "localhost"
/// port = 1491
/// connection_timeout = 30
/// password = "SecretPassword"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SonicConfig {
    pub address: String,
    pub port: u16,
    /// Seconds.
    pub connection_timeout: u64,
    pub password: String,
}

impl Default for SonicConfig {
    fn default() -> Self {
        Self {
            address: "localhost".to_string(),
            port: 1491,
            connection_timeout: 30,
            password: "SecretPassword".to_string(),
        }
    }
}

impl SonicConfig {
    /// Resolve the configuration from, in order of priority:
    /// 1. An explicit file path
    /// 2. The file named by the SONIC_SCOUT_CONFIG environment variable
    /// 3. The XDG config file (~/.config/sonic-scout/config.toml), if present
    /// 4. Built-in defaults
    ///
    /// SONIC_ADDRESS, SONIC_PORT and SONIC_PASSWORD then override single
    /// fields.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        Self::resolve_with(explicit, |key| std::env::var(key).ok())
    }

    fn resolve_with(
        explicit: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let path = if let Some(path) = explicit {
            Some(path.to_path_buf())
        } else if let Some(val) = lookup("SONIC_SCOUT_CONFIG") {
            Some(PathBuf::from(val))
        } else {
            xdg::BaseDirectories::with_prefix("sonic-scout")
                .find_config_file("config.toml")
        };

        let mut config = match path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(address) = lookup("SONIC_ADDRESS") {
            self.address = address;
        }
        if let Some(port) = lookup("SONIC_PORT") {
            self.port = port.parse().map_err(|_| {
                Error::Config(format!("SONIC_PORT is not a port: {port}"))
            })?;
        }
        if let Some(password) = lookup("SONIC_PASSWORD") {
            self.password = password;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(Error::Config("address must be non-empty".into()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must be greater than zero".into()));
        }
        if self.connection_timeout == 0 {
            return Err(Error::Config(
                "connection_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_a_stock_sonic() {
        let config = SonicConfig::default();
        assert_eq!(config.socket_addr(), "localhost:1491");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.password, "SecretPassword");
    }

    #[test]
    fn load_partial_file_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "address = \"sonic.internal\"\nport = 1500\n")
            .unwrap();

        let config = SonicConfig::load(&path).unwrap();
        assert_eq!(config.address, "sonic.internal");
        assert_eq!(config.port, 1500);
        assert_eq!(config.connection_timeout, 30);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "hostname = \"typo\"\n").unwrap();

        let err = SonicConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "connection_timeout = 0\n").unwrap();

        let err = SonicConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err =
            SonicConfig::load(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn env_overrides_single_fields() {
        let env = HashMap::from([
            ("SONIC_PORT", "2000".to_string()),
            ("SONIC_PASSWORD", "hunter2".to_string()),
        ]);
        let mut config = SonicConfig::default();
        config
            .apply_overrides(|key| env.get(key).cloned())
            .unwrap();

        assert_eq!(config.address, "localhost");
        assert_eq!(config.port, 2000);
        assert_eq!(config.password, "hunter2");
    }

    fn write_config(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn resolve_reads_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(tmp.path(), "config.toml", "port = 1600\n");

        let config = SonicConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.port, 1600);
    }

    #[test]
    fn explicit_path_beats_env_var() {
        let tmp = tempfile::tempdir().unwrap();
        let explicit =
            write_config(tmp.path(), "explicit.toml", "address = \"a\"\n");
        let from_env =
            write_config(tmp.path(), "env.toml", "address = \"b\"\n");
        let env = HashMap::from([(
            "SONIC_SCOUT_CONFIG",
            from_env.display().to_string(),
        )]);

        let config =
            SonicConfig::resolve_with(Some(&explicit), |key| env.get(key).cloned())
                .unwrap();
        assert_eq!(config.address, "a");
    }

    #[test]
    fn env_var_names_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(tmp.path(), "env.toml", "port = 1700\n");
        let env =
            HashMap::from([("SONIC_SCOUT_CONFIG", path.display().to_string())]);

        let config =
            SonicConfig::resolve_with(None, |key| env.get(key).cloned()).unwrap();
        assert_eq!(config.port, 1700);
    }

    #[test]
    fn resolve_applies_overrides_after_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(
            tmp.path(),
            "config.toml",
            "address = \"from-file\"\nport = 1800\n",
        );
        let env = HashMap::from([("SONIC_PORT", "1900".to_string())]);

        let config =
            SonicConfig::resolve_with(Some(&path), |key| env.get(key).cloned())
                .unwrap();
        assert_eq!(config.address, "from-file");
        assert_eq!(config.port, 1900);
    }

    #[test]
    fn resolve_validates_overridden_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(tmp.path(), "config.toml", "");
        let env = HashMap::from([("SONIC_ADDRESS", " ".to_string())]);

        let err =
            SonicConfig::resolve_with(Some(&path), |key| env.get(key).cloned())
                .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = SonicConfig::default();
        let err = config
            .apply_overrides(|key| {
                (key == "SONIC_PORT").then(|| "not-a-port".to_string())
            })
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
