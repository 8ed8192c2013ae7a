//! Process-wide configuration: the operator UI bind address, the logging
//! filter, and where station descriptors are loaded from. Per-station
//! settings live in [`crate::domain::StationDescriptor`] instead.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::infrastructure::descriptor_loader::default_config_dir;
use crate::infrastructure::InfraError;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_operator_ui_addr")]
    pub operator_ui_addr: SocketAddr,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_config_dir")]
    pub station_descriptor_dir: PathBuf,
    #[serde(default = "default_central_system_url")]
    pub central_system_url: String,
    #[serde(default = "default_diagnostics_log_root")]
    pub diagnostics_log_root: PathBuf,
}

fn default_operator_ui_addr() -> SocketAddr {
    "127.0.0.1:9000".parse().expect("valid default socket addr")
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_central_system_url() -> String {
    "ws://127.0.0.1:8080".to_string()
}

fn default_diagnostics_log_root() -> PathBuf {
    PathBuf::from("./logs")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            operator_ui_addr: default_operator_ui_addr(),
            log_filter: default_log_filter(),
            station_descriptor_dir: default_config_dir(),
            central_system_url: default_central_system_url(),
            diagnostics_log_root: default_diagnostics_log_root(),
        }
    }
}

impl AppConfig {
    /// Loads `path` if it exists, falling back to [`AppConfig::default`]
    /// when no config file was given.
    pub async fn load(path: Option<PathBuf>) -> Result<Self, InfraError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = tokio::fs::read_to_string(&path).await?;
        toml::from_str(&contents).map_err(|e| InfraError::Config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_path_falls_back_to_defaults() {
        let config = AppConfig::load(None).await.unwrap();
        assert_eq!(config.log_filter, "info");
    }
}
