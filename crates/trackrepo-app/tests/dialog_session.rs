mod support;

use std::sync::Arc;
use std::time::Duration;

use support::{
    GatedChecker, PanickingChecker, ReadOnlyStore, ScriptedChecker, TempStore, WAIT, app_with,
    exists,
};
use trackrepo_app::App;
use trackrepo_app::dialog::{
    DialogController, DialogError, DialogIntent, DialogState, FeedbackKind,
};
use trackrepo_core::remote::NetworkOutcome;
use trackrepo_core::settings::{
    ConfigMode, DEFAULT_BRANCH_NAME, DEFAULT_GITHUB_USERNAME, DEFAULT_REPOSITORY_NAME,
    RepositorySettings, SettingsField,
};

fn fill_custom(dialog: &mut DialogController, user: &str, repo: &str, branch: &str) {
    dialog
        .toggle_mode(ConfigMode::Custom)
        .expect("toggle to custom");
    dialog
        .edit_field(SettingsField::Username, user)
        .expect("edit username");
    dialog
        .edit_field(SettingsField::RepositoryName, repo)
        .expect("edit repository");
    dialog
        .edit_field(SettingsField::BranchName, branch)
        .expect("edit branch");
}

#[test]
fn opens_in_persisted_mode() {
    let store = TempStore::with(RepositorySettings::custom("me", "layouts", "dev"));
    let app = app_with(ScriptedChecker::new(vec![]), &store);

    let dialog = app.open_dialog().expect("open dialog");
    assert_eq!(dialog.state(), DialogState::Open(ConfigMode::Custom));
    assert_eq!(dialog.settings().slug(), "me/layouts@dev");
    assert!(dialog.toggle_state().fields_enabled);
}

#[test]
fn toggle_behaviour_matches_selected_mode() {
    let store = TempStore::empty();
    let app = app_with(ScriptedChecker::new(vec![]), &store);
    let mut dialog = app.open_dialog().expect("open dialog");

    let state = dialog.toggle_mode(ConfigMode::Default).expect("default");
    assert!(state.default_selector.checked && !state.default_selector.enabled);
    assert!(!state.custom_selector.checked && state.custom_selector.enabled);
    assert!(!state.fields_enabled);
    assert_eq!(dialog.settings().username, DEFAULT_GITHUB_USERNAME);
    assert_eq!(dialog.settings().repository_name, DEFAULT_REPOSITORY_NAME);
    assert_eq!(dialog.settings().branch_name, DEFAULT_BRANCH_NAME);

    let state = dialog.toggle_mode(ConfigMode::Custom).expect("custom");
    assert!(state.custom_selector.checked && !state.custom_selector.enabled);
    assert!(!state.default_selector.checked && state.default_selector.enabled);
    assert!(state.fields_enabled);
    assert_eq!(dialog.state(), DialogState::Open(ConfigMode::Custom));
}

#[test]
fn valid_custom_repository_is_committed_and_closes() {
    let store = TempStore::empty();
    let checker = ScriptedChecker::new(vec![exists()]);
    let app = app_with(checker.clone(), &store);
    let mut dialog = app.open_dialog().expect("open dialog");

    fill_custom(&mut dialog, "valid_user", "valid_repo", "master");
    assert_eq!(dialog.handle(DialogIntent::Save), Ok(None));
    assert_eq!(dialog.state(), DialogState::Validating);

    let feedback = dialog.wait(WAIT).expect("validation finished");
    assert_eq!(feedback.kind, FeedbackKind::SettingsValid);
    assert!(!feedback.keep_open);
    assert!(dialog.is_closed());
    assert_eq!(
        store.settings(),
        Some(RepositorySettings::custom("valid_user", "valid_repo", "master"))
    );
    assert_eq!(
        checker.calls(),
        vec![(
            "valid_user".to_string(),
            "valid_repo".to_string(),
            "master".to_string()
        )]
    );
}

#[test]
fn invalid_branch_keeps_dialog_open_and_store_untouched() {
    let store = TempStore::with(RepositorySettings::defaults());
    let before = store.raw().expect("raw store");
    let app = app_with(ScriptedChecker::new(vec![NetworkOutcome::BranchMissing]), &store);
    let mut dialog = app.open_dialog().expect("open dialog");

    fill_custom(&mut dialog, "valid_user", "valid_repo", "NONE");
    dialog.handle(DialogIntent::Save).expect("save");
    let feedback = dialog.wait(WAIT).expect("validation finished");

    assert_eq!(feedback.kind, FeedbackKind::InvalidServer);
    assert!(feedback.keep_open);
    assert_eq!(dialog.state(), DialogState::Open(ConfigMode::Custom));
    assert_eq!(dialog.settings().slug(), "valid_user/valid_repo@NONE");
    assert_eq!(store.raw().expect("raw store"), before);
}

#[test]
fn network_error_is_reported_distinctly() {
    let store = TempStore::empty();
    let app = app_with(
        ScriptedChecker::new(vec![
            NetworkOutcome::TransportFailure {
                reason: "request timed out".to_string(),
            },
            NetworkOutcome::BranchMissing,
        ]),
        &store,
    );
    let mut dialog = app.open_dialog().expect("open dialog");
    fill_custom(&mut dialog, "valid_user", "valid_repo", "master");

    dialog.handle(DialogIntent::Save).expect("save");
    let network = dialog.wait(WAIT).expect("first attempt");
    dialog.handle(DialogIntent::Save).expect("retry");
    let invalid = dialog.wait(WAIT).expect("second attempt");

    assert_eq!(network.kind, FeedbackKind::NetworkError);
    assert_eq!(invalid.kind, FeedbackKind::InvalidServer);
    assert_ne!(network.message, invalid.message);
    assert!(network.message.contains("request timed out"));
    assert_eq!(dialog.state(), DialogState::Open(ConfigMode::Custom));
    assert_eq!(store.settings(), None);
}

#[test]
fn empty_field_blocks_save_before_any_remote_call() {
    let store = TempStore::empty();
    let checker = ScriptedChecker::new(vec![exists()]);
    let app = app_with(checker.clone(), &store);
    let mut dialog = app.open_dialog().expect("open dialog");
    fill_custom(&mut dialog, "valid_user", "valid_repo", "  ");

    let feedback = dialog
        .handle(DialogIntent::Save)
        .expect("save")
        .expect("inline feedback");

    assert_eq!(
        feedback.kind,
        FeedbackKind::FieldRequired(SettingsField::BranchName)
    );
    assert!(feedback.keep_open);
    assert_eq!(dialog.state(), DialogState::Open(ConfigMode::Custom));
    assert_eq!(dialog.poll(), None);
    assert_eq!(checker.call_count(), 0);
}

#[test]
fn default_save_commits_without_remote_call() {
    let store = TempStore::with(RepositorySettings::custom("me", "layouts", "dev"));
    let checker = ScriptedChecker::new(vec![]);
    let app = app_with(checker.clone(), &store);
    let mut dialog = app.open_dialog().expect("open dialog");

    dialog.toggle_mode(ConfigMode::Default).expect("default");
    let feedback = dialog
        .handle(DialogIntent::Save)
        .expect("save")
        .expect("immediate feedback");

    assert_eq!(feedback.kind, FeedbackKind::SettingsValid);
    assert!(dialog.is_closed());
    assert_eq!(checker.call_count(), 0);
    assert_eq!(store.settings(), Some(RepositorySettings::defaults()));
}

#[test]
fn second_save_while_validating_is_rejected() {
    let store = TempStore::empty();
    let (checker, gate) = GatedChecker::new(exists());
    let app = app_with(checker, &store);
    let mut dialog = app.open_dialog().expect("open dialog");
    fill_custom(&mut dialog, "valid_user", "valid_repo", "master");

    dialog.handle(DialogIntent::Save).expect("save");
    gate.wait_started();

    assert_eq!(
        dialog.handle(DialogIntent::Save),
        Err(DialogError::ValidationInFlight)
    );
    assert_eq!(
        dialog.handle(DialogIntent::ToggleMode(ConfigMode::Default)),
        Err(DialogError::ValidationInFlight)
    );
    assert_eq!(dialog.poll(), None);

    gate.open();
    let feedback = dialog.wait(WAIT).expect("validation finished");
    assert!(feedback.is_success());
    assert!(dialog.is_closed());
}

#[test]
fn cancel_while_validating_discards_late_result() {
    let store = TempStore::empty();
    let (checker, gate) = GatedChecker::new(exists());
    let app = app_with(checker, &store);
    let mut dialog = app.open_dialog().expect("open dialog");
    fill_custom(&mut dialog, "valid_user", "valid_repo", "master");

    dialog.handle(DialogIntent::Save).expect("save");
    gate.wait_started();
    dialog.handle(DialogIntent::Cancel).expect("cancel");
    assert!(dialog.is_closed());

    gate.open();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(dialog.poll(), None);
    assert_eq!(dialog.wait(Duration::from_millis(100)), None);
    assert!(dialog.is_closed());
    assert_eq!(store.settings(), None);
    assert_eq!(
        dialog.handle(DialogIntent::Save),
        Err(DialogError::SessionClosed)
    );
}

#[test]
fn save_is_rejected_while_validating_and_after_cancel() {
    let store = TempStore::empty();
    let (checker, gate) = GatedChecker::new(exists());
    let app = app_with(checker, &store);
    let mut dialog = app.open_dialog().expect("open dialog");
    fill_custom(&mut dialog, "valid_user", "valid_repo", "master");

    assert_eq!(dialog.save(), Ok(None));
    gate.wait_started();
    assert_eq!(dialog.save(), Err(DialogError::ValidationInFlight));

    dialog.cancel();
    assert_eq!(dialog.save(), Err(DialogError::SessionClosed));

    gate.open();
    assert_eq!(dialog.wait(Duration::from_millis(100)), None);
    assert_eq!(store.settings(), None);
}

#[test]
fn worker_that_dies_is_reported_as_network_error() {
    let store = TempStore::empty();
    let app = app_with(Arc::new(PanickingChecker), &store);
    let mut dialog = app.open_dialog().expect("open dialog");
    fill_custom(&mut dialog, "valid_user", "valid_repo", "master");

    assert_eq!(dialog.handle(DialogIntent::Save), Ok(None));
    let feedback = dialog.wait(WAIT).expect("lost worker is reported");

    assert_eq!(feedback.kind, FeedbackKind::NetworkError);
    assert!(feedback.keep_open);
    assert_eq!(dialog.state(), DialogState::Open(ConfigMode::Custom));
    assert_eq!(dialog.settings().slug(), "valid_user/valid_repo@master");
    assert_eq!(store.settings(), None);
}

#[test]
fn late_result_does_not_reach_a_new_session() {
    let store = TempStore::empty();
    let (checker, gate) = GatedChecker::new(exists());
    let app = app_with(checker, &store);

    let mut first = app.open_dialog().expect("first dialog");
    fill_custom(&mut first, "valid_user", "valid_repo", "master");
    first.handle(DialogIntent::Save).expect("save");
    gate.wait_started();
    first.cancel();

    let mut second = app.open_dialog().expect("second dialog");
    gate.open();
    std::thread::sleep(Duration::from_millis(100));

    assert_eq!(second.poll(), None);
    assert_eq!(second.state(), DialogState::Open(ConfigMode::Default));
    assert_eq!(store.settings(), None);
}

#[test]
fn cancel_discards_unsaved_edits() {
    let store = TempStore::with(RepositorySettings::custom("me", "layouts", "dev"));
    let app = app_with(ScriptedChecker::new(vec![]), &store);
    let mut dialog = app.open_dialog().expect("open dialog");

    dialog
        .edit_field(SettingsField::BranchName, "feature")
        .expect("edit");
    dialog.handle(DialogIntent::Cancel).expect("cancel");

    assert!(dialog.is_closed());
    assert_eq!(
        store.settings(),
        Some(RepositorySettings::custom("me", "layouts", "dev"))
    );
}

#[test]
fn editing_default_fields_is_an_invalid_argument() {
    let store = TempStore::empty();
    let app = app_with(ScriptedChecker::new(vec![]), &store);
    let mut dialog = app.open_dialog().expect("open dialog");

    let error = dialog
        .edit_field(SettingsField::Username, "someone")
        .expect_err("read-only");
    assert!(matches!(error, DialogError::Settings(_)));
    assert_eq!(dialog.state(), DialogState::Open(ConfigMode::Default));
}

#[test]
fn failed_commit_reopens_dialog() {
    let app = App::new(
        ScriptedChecker::new(vec![exists()]),
        Arc::new(ReadOnlyStore::default()),
    );
    let mut dialog = app.open_dialog().expect("open dialog");
    fill_custom(&mut dialog, "valid_user", "valid_repo", "master");

    dialog.handle(DialogIntent::Save).expect("save");
    let feedback = dialog.wait(WAIT).expect("validation finished");

    assert_eq!(feedback.kind, FeedbackKind::SaveFailed);
    assert!(feedback.message.contains("Could not save repository settings"));
    assert_eq!(dialog.state(), DialogState::Open(ConfigMode::Custom));
    assert_eq!(dialog.last_feedback(), Some(&feedback));
}
