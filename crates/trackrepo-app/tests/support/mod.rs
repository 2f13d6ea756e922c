#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use trackrepo_app::App;
use trackrepo_core::remote::{NetworkOutcome, RepositoryChecker};
use trackrepo_core::settings::RepositorySettings;
use trackrepo_core::store::{SettingsStore, StoreError, StoredSettings, TomlSettingsStore};

pub const WAIT: Duration = Duration::from_secs(5);

pub type CheckCall = (String, String, String);

#[derive(Default)]
pub struct ScriptedChecker {
    outcomes: Mutex<VecDeque<NetworkOutcome>>,
    calls: Mutex<Vec<CheckCall>>,
}

impl ScriptedChecker {
    pub fn new(outcomes: Vec<NetworkOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<CheckCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

impl RepositoryChecker for ScriptedChecker {
    fn check(&self, username: &str, repository: &str, branch: &str) -> NetworkOutcome {
        self.calls.lock().expect("calls lock").push((
            username.to_string(),
            repository.to_string(),
            branch.to_string(),
        ));
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .pop_front()
            .unwrap_or_else(|| NetworkOutcome::TransportFailure {
                reason: "missing scripted outcome".to_string(),
            })
    }
}

/// Checker whose worker dies before it can report.
pub struct PanickingChecker;

impl RepositoryChecker for PanickingChecker {
    fn check(&self, _username: &str, _repository: &str, _branch: &str) -> NetworkOutcome {
        panic!("checker crashed");
    }
}

/// Checker that blocks every call until the test releases it.
pub struct GatedChecker {
    outcome: NetworkOutcome,
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

pub struct Gate {
    pub started: Receiver<()>,
    pub release: Sender<()>,
}

impl Gate {
    pub fn wait_started(&self) {
        self.started
            .recv_timeout(WAIT)
            .expect("checker should have been called");
    }

    pub fn open(&self) {
        self.release.send(()).expect("release gated checker");
    }
}

impl GatedChecker {
    pub fn new(outcome: NetworkOutcome) -> (Arc<Self>, Gate) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let checker = Arc::new(Self {
            outcome,
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        });
        (
            checker,
            Gate {
                started: started_rx,
                release: release_tx,
            },
        )
    }
}

impl RepositoryChecker for GatedChecker {
    fn check(&self, _username: &str, _repository: &str, _branch: &str) -> NetworkOutcome {
        let _ = self.started.lock().expect("started lock").send(());
        let _ = self
            .release
            .lock()
            .expect("release lock")
            .recv_timeout(WAIT);
        self.outcome.clone()
    }
}

/// Store whose writes always fail.
#[derive(Default)]
pub struct ReadOnlyStore {
    pub record: Option<StoredSettings>,
}

impl SettingsStore for ReadOnlyStore {
    fn load(&self) -> Result<Option<StoredSettings>, StoreError> {
        Ok(self.record.clone())
    }

    fn write(&self, _record: &StoredSettings) -> Result<(), StoreError> {
        Err(StoreError::Write {
            path: PathBuf::from("/read-only/repository.toml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

pub struct TempStore {
    pub dir: tempfile::TempDir,
    pub store: Arc<TomlSettingsStore>,
}

impl TempStore {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(TomlSettingsStore::new(dir.path().join("repository.toml")));
        Self { dir, store }
    }

    pub fn with(settings: RepositorySettings) -> Self {
        let temp = Self::empty();
        temp.store
            .write(&StoredSettings {
                settings,
                validated_at: Some("2026-01-01T00:00:00Z".to_string()),
            })
            .expect("seed store");
        temp
    }

    pub fn settings(&self) -> Option<RepositorySettings> {
        self.store
            .load()
            .expect("load store")
            .map(|record| record.settings)
    }

    pub fn raw(&self) -> Result<String> {
        Ok(std::fs::read_to_string(self.store.path())?)
    }
}

pub fn app_with(checker: Arc<dyn RepositoryChecker>, store: &TempStore) -> App {
    App::new(checker, store.store.clone())
}

pub fn exists() -> NetworkOutcome {
    NetworkOutcome::BranchExists {
        head_sha: Some("0123abcd".to_string()),
    }
}
