use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::settings::{ConfigMode, RepositorySettings, SettingsError};

const STORE_VERSION: i64 = 1;

/// A committed settings record as it is kept by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSettings {
    pub settings: RepositorySettings,
    pub validated_at: Option<String>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read repository settings at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse repository settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to write repository settings at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize repository settings: {0}")]
    Serialize(#[source] toml::ser::Error),
    #[error("failed to timestamp repository settings: {0}")]
    Timestamp(#[source] time::error::Format),
    #[error("invalid repository settings schema in {path}: {message}")]
    InvalidSchema { path: PathBuf, message: String },
}

/// Durable home of the committed repository settings.
///
/// `write` must be all-or-nothing: after it returns, readers observe either
/// the complete new record or the previous one.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSettings>, StoreError>;
    fn write(&self, record: &StoredSettings) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SettingsFile {
    version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validated_at: Option<String>,
    repository: RepositorySection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RepositorySection {
    mode: String,
    username: String,
    repository: String,
    branch: String,
}

impl SettingsFile {
    fn from_record(record: &StoredSettings) -> Self {
        let settings = &record.settings;
        Self {
            version: STORE_VERSION,
            validated_at: record.validated_at.clone(),
            repository: RepositorySection {
                mode: settings.mode.as_str().to_string(),
                username: settings.username.clone(),
                repository: settings.repository_name.clone(),
                branch: settings.branch_name.clone(),
            },
        }
    }

    fn into_record(self, path: &Path) -> Result<StoredSettings, StoreError> {
        if self.version != STORE_VERSION {
            return Err(schema_error(
                path,
                format!(
                    "unsupported version (expected {STORE_VERSION}, found {})",
                    self.version
                ),
            ));
        }

        let mode: ConfigMode = self
            .repository
            .mode
            .parse()
            .map_err(|error: SettingsError| schema_error(path, error.to_string()))?;

        let settings = match mode {
            ConfigMode::Default => RepositorySettings::defaults(),
            ConfigMode::Custom => RepositorySettings::custom(
                self.repository.username,
                self.repository.repository,
                self.repository.branch,
            ),
        };

        if let Some(field) = settings.missing_field() {
            return Err(schema_error(
                path,
                format!("custom repository has an empty {field}"),
            ));
        }

        if let Some(stamp) = self.validated_at.as_deref()
            && OffsetDateTime::parse(stamp, &Rfc3339).is_err()
        {
            return Err(schema_error(
                path,
                format!("validated_at '{stamp}' is not an RFC 3339 timestamp"),
            ));
        }

        Ok(StoredSettings {
            settings,
            validated_at: self.validated_at,
        })
    }
}

/// Settings kept in a TOML file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<Option<StoredSettings>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;

        let parsed: SettingsFile = toml::from_str(&raw).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        parsed.into_record(&self.path).map(Some)
    }

    fn write(&self, record: &StoredSettings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let serialized = toml::to_string(&SettingsFile::from_record(record))
            .map_err(StoreError::Serialize)?;
        let temp_path = self.path.with_extension("toml.tmp");

        let written = File::create(&temp_path).and_then(|mut file| {
            file.write_all(serialized.as_bytes())?;
            file.sync_all()
        });
        if let Err(source) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Write {
                path: temp_path,
                source,
            });
        }

        if let Err(source) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StoreError::Write {
                path: self.path.clone(),
                source,
            });
        }

        Ok(())
    }
}

fn schema_error(path: &Path, message: String) -> StoreError {
    StoreError::InvalidSchema {
        path: path.to_path_buf(),
        message,
    }
}
