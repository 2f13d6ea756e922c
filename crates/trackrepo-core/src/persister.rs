use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::info;

use crate::settings::RepositorySettings;
use crate::store::{SettingsStore, StoreError, StoredSettings};
use crate::validator::ValidatedSettings;

pub struct SettingsPersister<'a> {
    store: &'a dyn SettingsStore,
}

impl<'a> SettingsPersister<'a> {
    pub fn new(store: &'a dyn SettingsStore) -> Self {
        Self { store }
    }

    /// Settings a session starts from: the committed record, or the default
    /// repository when nothing was ever committed.
    pub fn load(&self) -> Result<RepositorySettings, StoreError> {
        Ok(self
            .store
            .load()?
            .map(|record| record.settings)
            .unwrap_or_default())
    }

    pub fn load_record(&self) -> Result<Option<StoredSettings>, StoreError> {
        self.store.load()
    }

    /// Writes mode and all three fields as one record.
    pub fn commit(&self, validated: ValidatedSettings) -> Result<StoredSettings, StoreError> {
        let validated_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(StoreError::Timestamp)?;
        let record = StoredSettings {
            settings: validated.into_settings(),
            validated_at: Some(validated_at),
        };

        self.store.write(&record)?;
        info!(
            mode = record.settings.mode.as_str(),
            repository = %record.settings.slug(),
            "repository settings committed"
        );
        Ok(record)
    }
}
