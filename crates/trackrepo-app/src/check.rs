use anyhow::{Context, Result};
use trackrepo_core::persister::SettingsPersister;
use trackrepo_core::settings::RepositorySettings;
use trackrepo_core::store::StoredSettings;
use trackrepo_core::validator::{RepositoryValidator, ValidationResult};

use crate::App;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub settings: RepositorySettings,
    pub result: ValidationResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub result: ValidationResult,
    pub committed: Option<StoredSettings>,
}

impl App {
    /// Validates `settings` without touching the store.
    pub fn check(&self, settings: RepositorySettings) -> Result<CheckReport> {
        let result = RepositoryValidator::new(self.checker.as_ref())
            .validate(&settings)
            .context("repository settings are incomplete")?;

        Ok(CheckReport { settings, result })
    }

    /// Validates `settings` and commits them when the remote confirms the
    /// branch. Failed validations leave the store untouched.
    pub fn apply(&self, settings: RepositorySettings) -> Result<ApplyReport> {
        let result = RepositoryValidator::new(self.checker.as_ref())
            .validate(&settings)
            .context("repository settings are incomplete")?;

        let Some(validated) = result.validated().cloned() else {
            return Ok(ApplyReport {
                result,
                committed: None,
            });
        };

        let committed = SettingsPersister::new(self.store.as_ref())
            .commit(validated)
            .context("failed to save repository settings")?;

        Ok(ApplyReport {
            result,
            committed: Some(committed),
        })
    }
}
