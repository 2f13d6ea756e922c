use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_GITHUB_USERNAME: &str = "labexp";
pub const DEFAULT_REPOSITORY_NAME: &str = "osmtracker-android-layouts";
pub const DEFAULT_BRANCH_NAME: &str = "master";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigMode {
    Default,
    Custom,
}

impl ConfigMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Default => "Default repository",
            Self::Custom => "Custom repository",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Default => Self::Custom,
            Self::Custom => Self::Default,
        }
    }
}

impl fmt::Display for ConfigMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigMode {
    type Err = SettingsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "custom" => Ok(Self::Custom),
            _ => Err(SettingsError::InvalidArgument {
                message: format!("unknown configuration mode '{value}' (expected default or custom)"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingsField {
    Username,
    RepositoryName,
    BranchName,
}

pub const SETTINGS_FIELDS: [SettingsField; 3] = [
    SettingsField::Username,
    SettingsField::RepositoryName,
    SettingsField::BranchName,
];

impl SettingsField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::RepositoryName => "repository",
            Self::BranchName => "branch",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Username => "GitHub username",
            Self::RepositoryName => "Repository name",
            Self::BranchName => "Branch name",
        }
    }
}

impl fmt::Display for SettingsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{} is required for a custom repository", .field.label())]
    FieldRequired { field: SettingsField },
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

/// Backup repository selection as edited by a settings session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySettings {
    pub mode: ConfigMode,
    pub username: String,
    pub repository_name: String,
    pub branch_name: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self::defaults()
    }
}

impl RepositorySettings {
    pub fn defaults() -> Self {
        Self {
            mode: ConfigMode::Default,
            username: DEFAULT_GITHUB_USERNAME.to_string(),
            repository_name: DEFAULT_REPOSITORY_NAME.to_string(),
            branch_name: DEFAULT_BRANCH_NAME.to_string(),
        }
    }

    pub fn custom(
        username: impl Into<String>,
        repository_name: impl Into<String>,
        branch_name: impl Into<String>,
    ) -> Self {
        Self {
            mode: ConfigMode::Custom,
            username: username.into(),
            repository_name: repository_name.into(),
            branch_name: branch_name.into(),
        }
    }

    pub fn field(&self, field: SettingsField) -> &str {
        match field {
            SettingsField::Username => &self.username,
            SettingsField::RepositoryName => &self.repository_name,
            SettingsField::BranchName => &self.branch_name,
        }
    }

    pub(crate) fn field_mut(&mut self, field: SettingsField) -> &mut String {
        match field {
            SettingsField::Username => &mut self.username,
            SettingsField::RepositoryName => &mut self.repository_name,
            SettingsField::BranchName => &mut self.branch_name,
        }
    }

    /// Returns the first empty field of a custom selection.
    ///
    /// Default selections never report a missing field: their values are
    /// fixed.
    pub fn missing_field(&self) -> Option<SettingsField> {
        if self.mode == ConfigMode::Default {
            return None;
        }

        SETTINGS_FIELDS
            .into_iter()
            .find(|field| self.field(*field).trim().is_empty())
    }

    pub fn ensure_complete(&self) -> Result<(), SettingsError> {
        match self.missing_field() {
            Some(field) => Err(SettingsError::FieldRequired { field }),
            None => Ok(()),
        }
    }

    /// Copy with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            mode: self.mode,
            username: self.username.trim().to_string(),
            repository_name: self.repository_name.trim().to_string(),
            branch_name: self.branch_name.trim().to_string(),
        }
    }

    pub fn slug(&self) -> String {
        format!(
            "{}/{}@{}",
            self.username, self.repository_name, self.branch_name
        )
    }
}
