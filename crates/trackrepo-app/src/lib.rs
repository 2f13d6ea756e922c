mod check;
pub mod dialog;
mod runtime;

use std::sync::Arc;

use anyhow::{Context, Result};
use trackrepo_core::persister::SettingsPersister;
use trackrepo_core::remote::RepositoryChecker;
use trackrepo_core::settings::RepositorySettings;
use trackrepo_core::store::{SettingsStore, StoredSettings};

pub use check::{ApplyReport, CheckReport};
pub use runtime::AppPaths;

pub struct App {
    checker: Arc<dyn RepositoryChecker>,
    store: Arc<dyn SettingsStore>,
}

impl App {
    pub fn new(checker: Arc<dyn RepositoryChecker>, store: Arc<dyn SettingsStore>) -> Self {
        Self { checker, store }
    }

    pub fn load_settings(&self) -> Result<RepositorySettings> {
        SettingsPersister::new(self.store.as_ref())
            .load()
            .context("failed to load repository settings")
    }

    pub fn load_record(&self) -> Result<Option<StoredSettings>> {
        SettingsPersister::new(self.store.as_ref())
            .load_record()
            .context("failed to load repository settings")
    }

    pub fn open_dialog(&self) -> Result<dialog::DialogController> {
        let initial = self.load_settings()?;
        Ok(dialog::DialogController::new(
            initial,
            Arc::clone(&self.checker),
            Arc::clone(&self.store),
        ))
    }
}
