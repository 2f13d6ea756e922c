use std::collections::VecDeque;
use std::sync::Mutex;

use crate::remote::{NetworkOutcome, RepositoryChecker};

pub type CheckCall = (String, String, String);

#[derive(Default)]
pub struct ScriptedChecker {
    outcomes: Mutex<VecDeque<NetworkOutcome>>,
    calls: Mutex<Vec<CheckCall>>,
}

impl ScriptedChecker {
    pub fn new(outcomes: Vec<NetworkOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
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
