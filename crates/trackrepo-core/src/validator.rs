use std::fmt;

use tracing::debug;

use crate::remote::{NetworkOutcome, RepositoryChecker};
use crate::settings::{ConfigMode, RepositorySettings, SettingsError};

pub const VALID_SERVER_MESSAGE: &str = "GitHub repository settings are valid";
pub const INVALID_SERVER_MESSAGE: &str =
    "Invalid GitHub repository settings: the repository or branch does not exist";
pub const NETWORK_ERROR_MESSAGE: &str = "Could not reach GitHub to verify the repository";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    InvalidBranch,
    NetworkError,
}

impl ValidationOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::InvalidBranch => "invalid branch",
            Self::NetworkError => "network error",
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings that passed validation. Only the validator can produce one, and
/// it is the only thing the persister accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSettings {
    settings: RepositorySettings,
    head_sha: Option<String>,
}

impl ValidatedSettings {
    pub fn settings(&self) -> &RepositorySettings {
        &self.settings
    }

    /// Commit sha the branch pointed at during validation, when it was
    /// checked remotely.
    pub fn head_sha(&self) -> Option<&str> {
        self.head_sha.as_deref()
    }

    pub fn into_settings(self) -> RepositorySettings {
        self.settings
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    outcome: ValidationOutcome,
    message: String,
    validated: Option<ValidatedSettings>,
}

impl ValidationResult {
    fn valid(settings: RepositorySettings, head_sha: Option<String>) -> Self {
        Self {
            outcome: ValidationOutcome::Valid,
            message: VALID_SERVER_MESSAGE.to_string(),
            validated: Some(ValidatedSettings { settings, head_sha }),
        }
    }

    fn invalid_branch() -> Self {
        Self {
            outcome: ValidationOutcome::InvalidBranch,
            message: INVALID_SERVER_MESSAGE.to_string(),
            validated: None,
        }
    }

    fn network_error(reason: &str) -> Self {
        Self {
            outcome: ValidationOutcome::NetworkError,
            message: format!("{NETWORK_ERROR_MESSAGE} ({reason})"),
            validated: None,
        }
    }

    pub fn outcome(&self) -> ValidationOutcome {
        self.outcome
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_valid(&self) -> bool {
        self.outcome == ValidationOutcome::Valid
    }

    pub fn validated(&self) -> Option<&ValidatedSettings> {
        self.validated.as_ref()
    }

    pub fn into_validated(self) -> Option<ValidatedSettings> {
        self.validated
    }
}

pub struct RepositoryValidator<'a> {
    checker: &'a dyn RepositoryChecker,
}

impl<'a> RepositoryValidator<'a> {
    pub fn new(checker: &'a dyn RepositoryChecker) -> Self {
        Self { checker }
    }

    /// Runs one validation attempt.
    ///
    /// The default repository is accepted without a network call. Custom
    /// settings with an empty field fail with [`SettingsError::FieldRequired`]
    /// before the checker is consulted.
    pub fn validate(
        &self,
        settings: &RepositorySettings,
    ) -> Result<ValidationResult, SettingsError> {
        if settings.mode == ConfigMode::Default {
            debug!("default repository selected; skipping remote check");
            return Ok(ValidationResult::valid(RepositorySettings::defaults(), None));
        }

        settings.ensure_complete()?;
        let candidate = settings.trimmed();

        let outcome = self.checker.check(
            &candidate.username,
            &candidate.repository_name,
            &candidate.branch_name,
        );

        Ok(match outcome {
            NetworkOutcome::BranchExists { head_sha } => {
                ValidationResult::valid(candidate, head_sha)
            }
            NetworkOutcome::BranchMissing => ValidationResult::invalid_branch(),
            NetworkOutcome::TransportFailure { reason } => {
                ValidationResult::network_error(&reason)
            }
        })
    }
}
