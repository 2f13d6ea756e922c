use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use trackrepo_core::config::{
    TrackrepoConfig, load_config, resolve_config_path, resolve_settings_path,
};
use trackrepo_core::remote::GithubChecker;
use trackrepo_core::store::TomlSettingsStore;

use crate::App;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_path: PathBuf,
    pub settings_path: PathBuf,
}

impl AppPaths {
    pub fn resolve() -> Result<Self> {
        Ok(Self {
            config_path: resolve_config_path().context("failed to resolve config path")?,
            settings_path: resolve_settings_path()
                .context("failed to resolve repository settings path")?,
        })
    }
}

impl App {
    /// Builds the production app: GitHub checker configured from
    /// `config.toml` and the TOML settings store.
    pub fn from_paths(paths: &AppPaths) -> Result<Self> {
        let config = load_config(&paths.config_path).map_err(|error| {
            anyhow!(
                "invalid config at {}: {error}\nFix the config and retry.",
                paths.config_path.display()
            )
        })?;

        Self::from_config(&config, paths.settings_path.clone())
    }

    pub fn from_config(config: &TrackrepoConfig, settings_path: PathBuf) -> Result<Self> {
        let checker = GithubChecker::new(&config.github)
            .with_context(|| format!("failed to set up GitHub client for {}", config.github.api_url))?;
        let store = TomlSettingsStore::new(settings_path);

        Ok(Self::new(Arc::new(checker), Arc::new(store)))
    }
}

#[cfg(test)]
mod tests {
    use trackrepo_core::settings::RepositorySettings;

    use super::*;

    #[test]
    fn from_paths_tolerates_missing_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths {
            config_path: dir.path().join("config.toml"),
            settings_path: dir.path().join("repository.toml"),
        };

        let app = App::from_paths(&paths).expect("app");
        assert_eq!(
            app.load_settings().expect("settings"),
            RepositorySettings::defaults()
        );
    }

    #[test]
    fn from_paths_reports_invalid_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths {
            config_path: dir.path().join("config.toml"),
            settings_path: dir.path().join("repository.toml"),
        };
        std::fs::write(&paths.config_path, "[github]\ntimeout_secs = 0\n").expect("write");

        let error = App::from_paths(&paths).err().expect("should fail");
        assert!(error.to_string().contains("invalid config at"));
        assert!(error.to_string().contains("timeout_secs"));
    }
}
