//! # Profile
//!
//! Persisted CLI defaults, stored as JSON in the platform config directory. Command-line
//! flags always take precedence over the profile.
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroU64;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Profile {
    pub base_url: Option<String>,
    pub page_size: Option<NonZeroU64>,
    /// Comma-separated collection ids every listing is restricted to.
    pub model_ids: Option<String>,
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "gridsource", "gridsource")
            .context("Could not determine config directory")?;

        Self::at(proj_dirs.config_dir().join("profile.json"))
    }

    /// A manager for the profile file at `config_path`.
    pub fn at(config_path: PathBuf) -> Result<Self> {
        if let Some(dir) = config_path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Could not create {}", dir.display()))?;
        }

        Ok(Self { config_path })
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<Profile> {
        if !self.config_path.exists() {
            return Ok(Profile::default());
        }
        let content = fs::read_to_string(&self.config_path)?;
        let profile = serde_json::from_str(&content)
            .with_context(|| format!("Malformed profile at {}", self.config_path.display()))?;
        Ok(profile)
    }

    pub fn save(&self, profile: &Profile) -> Result<()> {
        let content = serde_json::to_string_pretty(profile)?;
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    pub fn update(&self, change: impl FnOnce(&mut Profile)) -> Result<Profile> {
        let mut profile = self.load()?;
        change(&mut profile);
        self.save(&profile)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(name: &str) -> ConfigManager {
        let path = std::env::temp_dir()
            .join(format!("gridsource-test-{}-{name}", std::process::id()))
            .join("profile.json");
        let _ = fs::remove_file(&path);
        ConfigManager::at(path).unwrap()
    }

    #[test]
    fn test_missing_file_loads_default_profile() {
        let manager = manager("missing");

        assert_eq!(manager.load().unwrap(), Profile::default());
    }

    #[test]
    fn test_update_persists_changes() {
        let manager = manager("update");

        manager
            .update(|profile| profile.model_ids = Some("model_a".to_string()))
            .unwrap();
        manager
            .update(|profile| profile.page_size = NonZeroU64::new(20))
            .unwrap();

        let profile = manager.load().unwrap();
        assert_eq!(profile.model_ids.as_deref(), Some("model_a"));
        assert_eq!(profile.page_size, NonZeroU64::new(20));
        assert_eq!(profile.base_url, None);
    }

    #[test]
    fn test_malformed_profile_is_an_error() {
        let manager = manager("malformed");
        fs::write(manager.path(), "{ not json").unwrap();

        assert!(manager.load().is_err());
    }
}
