//! Loads station descriptors from TOML files on disk, one file per station.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::StationDescriptor;
use crate::infrastructure::errors::InfraError;

/// Where station descriptors come from. A trait so tests can substitute an
/// in-memory source instead of touching the filesystem.
#[async_trait]
pub trait DescriptorSource: Send + Sync {
    async fn load_all(&self) -> Result<Vec<StationDescriptor>, InfraError>;
}

/// Reads every `*.toml` file directly under a configured directory.
pub struct TomlDescriptorLoader {
    dir: PathBuf,
}

impl TomlDescriptorLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DescriptorSource for TomlDescriptorLoader {
    async fn load_all(&self) -> Result<Vec<StationDescriptor>, InfraError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || load_descriptors_blocking(&dir))
            .await
            .map_err(|e| InfraError::Config(e.to_string()))?
    }
}

fn load_descriptors_blocking(dir: &Path) -> Result<Vec<StationDescriptor>, InfraError> {
    let mut descriptors = Vec::new();
    let entries = std::fs::read_dir(dir)?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        descriptors.push(load_one(&path)?);
    }
    Ok(descriptors)
}

fn load_one(path: &Path) -> Result<StationDescriptor, InfraError> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents).map_err(|e| InfraError::Config(format!("{}: {e}", path.display())))
}

/// The default station-descriptor directory under the user's config dir,
/// used when no `--config-dir` flag is supplied.
pub fn default_config_dir() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocpp-station-sim")
        .join("stations")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_directory_surfaces_as_infra_error() {
        let loader = TomlDescriptorLoader::new("/nonexistent/does-not-exist");
        let result = loader.load_all().await;
        assert!(result.is_err());
    }
}
