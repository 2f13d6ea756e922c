use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use trackrepo_core::mode::{ConfigModeController, ToggleState};
use trackrepo_core::persister::SettingsPersister;
use trackrepo_core::remote::RepositoryChecker;
use trackrepo_core::settings::{ConfigMode, RepositorySettings, SettingsError, SettingsField};
use trackrepo_core::store::SettingsStore;
use trackrepo_core::validator::{
    RepositoryValidator, VALID_SERVER_MESSAGE, ValidationOutcome, ValidationResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Open(ConfigMode),
    Validating,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogIntent {
    ToggleMode(ConfigMode),
    EditField(SettingsField, String),
    Save,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    SettingsValid,
    InvalidServer,
    NetworkError,
    FieldRequired(SettingsField),
    SaveFailed,
}

/// What the UI shows after a save attempt, and whether the dialog stays up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
    pub keep_open: bool,
}

impl Feedback {
    fn new(kind: FeedbackKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            keep_open: kind != FeedbackKind::SettingsValid,
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == FeedbackKind::SettingsValid
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("the repository settings dialog is already closed")]
    SessionClosed,
    #[error("a repository check is already running")]
    ValidationInFlight,
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

struct ValidationReport {
    token: u64,
    result: Result<ValidationResult, SettingsError>,
}

struct PendingValidation {
    token: u64,
    receiver: Receiver<ValidationReport>,
    cancelled: Arc<AtomicBool>,
}

/// One settings dialog session.
///
/// All state transitions happen on the thread that owns the controller. The
/// remote check runs on a worker thread and hands its single result back
/// through a channel that is drained by [`DialogController::poll`] or
/// [`DialogController::wait`].
pub struct DialogController {
    checker: Arc<dyn RepositoryChecker>,
    store: Arc<dyn SettingsStore>,
    modes: ConfigModeController,
    state: DialogState,
    pending: Option<PendingValidation>,
    next_token: u64,
    last_feedback: Option<Feedback>,
}

impl DialogController {
    pub fn new(
        initial: RepositorySettings,
        checker: Arc<dyn RepositoryChecker>,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        let modes = ConfigModeController::new(initial);
        let state = DialogState::Open(modes.mode());

        Self {
            checker,
            store,
            modes,
            state,
            pending: None,
            next_token: 0,
            last_feedback: None,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == DialogState::Closed
    }

    pub fn is_validating(&self) -> bool {
        self.state == DialogState::Validating
    }

    pub fn settings(&self) -> &RepositorySettings {
        self.modes.settings()
    }

    pub fn toggle_state(&self) -> ToggleState {
        self.modes.toggle_state()
    }

    pub fn last_feedback(&self) -> Option<&Feedback> {
        self.last_feedback.as_ref()
    }

    pub fn handle(&mut self, intent: DialogIntent) -> Result<Option<Feedback>, DialogError> {
        if self.state == DialogState::Closed {
            return Err(DialogError::SessionClosed);
        }

        match intent {
            DialogIntent::Cancel => {
                self.cancel_pending();
                self.transition(DialogState::Closed);
                Ok(None)
            }
            _ if self.state == DialogState::Validating => Err(DialogError::ValidationInFlight),
            DialogIntent::ToggleMode(mode) => {
                let toggle = self.modes.set_mode(mode);
                self.transition(DialogState::Open(toggle.mode));
                Ok(None)
            }
            DialogIntent::EditField(field, value) => {
                self.modes.edit_field(field, &value)?;
                Ok(None)
            }
            DialogIntent::Save => Ok(self.begin_save()),
        }
    }

    pub fn toggle_mode(&mut self, mode: ConfigMode) -> Result<ToggleState, DialogError> {
        self.handle(DialogIntent::ToggleMode(mode))?;
        Ok(self.toggle_state())
    }

    pub fn edit_field(
        &mut self,
        field: SettingsField,
        value: impl Into<String>,
    ) -> Result<(), DialogError> {
        self.handle(DialogIntent::EditField(field, value.into()))
            .map(|_| ())
    }

    /// Saves the edited settings. `Ok(None)` means a background check is now running.
    pub fn save(&mut self) -> Result<Option<Feedback>, DialogError> {
        self.handle(DialogIntent::Save)
    }

    fn begin_save(&mut self) -> Option<Feedback> {
        let settings = self.modes.settings().clone();
        if let Some(field) = settings.missing_field() {
            let error = SettingsError::FieldRequired { field };
            return Some(self.emit(Feedback::new(
                FeedbackKind::FieldRequired(field),
                error.to_string(),
            )));
        }

        if settings.mode == ConfigMode::Default {
            let result = RepositoryValidator::new(self.checker.as_ref()).validate(&settings);
            return Some(self.apply(result));
        }

        self.spawn_validation(settings);
        None
    }

    pub fn cancel(&mut self) {
        if self.state != DialogState::Closed {
            self.cancel_pending();
            self.transition(DialogState::Closed);
        }
    }

    /// Applies a finished validation, if any, without blocking.
    pub fn poll(&mut self) -> Option<Feedback> {
        let pending = self.pending.as_ref()?;
        match pending.receiver.try_recv() {
            Ok(report) => self.finish(report),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(self.worker_lost()),
        }
    }

    /// Blocks up to `timeout` for the running validation to finish.
    pub fn wait(&mut self, timeout: Duration) -> Option<Feedback> {
        let pending = self.pending.as_ref()?;
        match pending.receiver.recv_timeout(timeout) {
            Ok(report) => self.finish(report),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.worker_lost()),
        }
    }

    fn spawn_validation(&mut self, settings: RepositorySettings) {
        self.next_token += 1;
        let token = self.next_token;
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = Arc::clone(&cancelled);
        let checker = Arc::clone(&self.checker);

        std::thread::spawn(move || {
            let result = RepositoryValidator::new(checker.as_ref()).validate(&settings);
            if worker_cancelled.load(Ordering::SeqCst) {
                debug!(token, "dropping result of cancelled repository check");
                return;
            }
            let _ = sender.send(ValidationReport { token, result });
        });

        self.pending = Some(PendingValidation {
            token,
            receiver,
            cancelled,
        });
        self.transition(DialogState::Validating);
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancelled.store(true, Ordering::SeqCst);
            debug!(token = pending.token, "cancelled repository check");
        }
    }

    fn finish(&mut self, report: ValidationReport) -> Option<Feedback> {
        let current = self.pending.as_ref().map(|pending| pending.token);
        if current != Some(report.token) || self.state != DialogState::Validating {
            debug!(token = report.token, "ignoring stale repository check result");
            return None;
        }

        self.pending = None;
        Some(self.apply(report.result))
    }

    fn worker_lost(&mut self) -> Feedback {
        warn!("repository check worker stopped without reporting a result");
        self.pending = None;
        self.transition(DialogState::Open(self.modes.mode()));
        self.emit(Feedback::new(
            FeedbackKind::NetworkError,
            "The repository check stopped unexpectedly; try saving again",
        ))
    }

    fn apply(&mut self, result: Result<ValidationResult, SettingsError>) -> Feedback {
        let reopen = DialogState::Open(self.modes.mode());

        let result = match result {
            Ok(result) => result,
            Err(error) => {
                let kind = match error {
                    SettingsError::FieldRequired { field } => FeedbackKind::FieldRequired(field),
                    SettingsError::InvalidArgument { .. } => FeedbackKind::SaveFailed,
                };
                self.transition(reopen);
                return self.emit(Feedback::new(kind, error.to_string()));
            }
        };

        match result.outcome() {
            ValidationOutcome::Valid => {
                let Some(validated) = result.into_validated() else {
                    self.transition(reopen);
                    return self.emit(Feedback::new(
                        FeedbackKind::SaveFailed,
                        "validation did not produce settings to save",
                    ));
                };

                match SettingsPersister::new(self.store.as_ref()).commit(validated) {
                    Ok(_) => {
                        self.transition(DialogState::Closed);
                        self.emit(Feedback::new(
                            FeedbackKind::SettingsValid,
                            VALID_SERVER_MESSAGE,
                        ))
                    }
                    Err(error) => {
                        warn!(%error, "failed to commit repository settings");
                        self.transition(reopen);
                        self.emit(Feedback::new(
                            FeedbackKind::SaveFailed,
                            format!("Could not save repository settings: {error}"),
                        ))
                    }
                }
            }
            ValidationOutcome::InvalidBranch => {
                self.transition(reopen);
                self.emit(Feedback::new(FeedbackKind::InvalidServer, result.message()))
            }
            ValidationOutcome::NetworkError => {
                self.transition(reopen);
                self.emit(Feedback::new(FeedbackKind::NetworkError, result.message()))
            }
        }
    }

    fn emit(&mut self, feedback: Feedback) -> Feedback {
        self.last_feedback = Some(feedback.clone());
        feedback
    }

    fn transition(&mut self, next: DialogState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "dialog transition");
            self.state = next;
        }
    }
}

impl Drop for DialogController {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_keeps_dialog_open_unless_valid() {
        assert!(!Feedback::new(FeedbackKind::SettingsValid, "ok").keep_open);
        assert!(Feedback::new(FeedbackKind::InvalidServer, "bad").keep_open);
        assert!(Feedback::new(FeedbackKind::NetworkError, "offline").keep_open);
        assert!(
            Feedback::new(
                FeedbackKind::FieldRequired(SettingsField::BranchName),
                "missing"
            )
            .keep_open
        );
    }
}
