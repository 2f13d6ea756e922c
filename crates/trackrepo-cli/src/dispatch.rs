use anyhow::{Result, anyhow};
use comfy_table::{Cell, ContentArrangement, Table};
use trackrepo_app::App;
use trackrepo_core::settings::{RepositorySettings, SETTINGS_FIELDS};
use trackrepo_core::store::StoredSettings;
use trackrepo_core::validator::ValidationResult;
use trackrepo_tui::DialogExit;

use crate::cli::{CheckArgs, Cli, Command, SetTarget};

pub fn run_with_deps(cli: Cli, app: &App) -> Result<()> {
    match cli.command {
        None => run_dialog_command(app),
        Some(Command::Show) => run_show_command(app),
        Some(Command::Check(args)) => run_check_command(app, args),
        Some(Command::Set { target }) => run_set_command(app, target),
    }
}

fn run_dialog_command(app: &App) -> Result<()> {
    match trackrepo_tui::run_settings_dialog(app)? {
        DialogExit::Saved(feedback) => println!("{}", feedback.message),
        DialogExit::Canceled => println!("Repository settings unchanged."),
    }
    Ok(())
}

fn run_show_command(app: &App) -> Result<()> {
    match app.load_record()? {
        Some(record) => print_settings(&record),
        None => {
            println!("No repository settings saved yet; the default repository is used.");
            print_settings(&StoredSettings {
                settings: RepositorySettings::defaults(),
                validated_at: None,
            });
        }
    }
    Ok(())
}

fn run_check_command(app: &App, args: CheckArgs) -> Result<()> {
    let saved = app.load_settings()?;
    let settings = if args.is_empty() {
        saved
    } else {
        RepositorySettings::custom(
            args.user.unwrap_or(saved.username),
            args.repo.unwrap_or(saved.repository_name),
            args.branch.unwrap_or(saved.branch_name),
        )
    };

    let report = app.check(settings)?;
    report_result(&report.result)?;
    println!("Checked {}", report.settings.slug());
    Ok(())
}

fn run_set_command(app: &App, target: SetTarget) -> Result<()> {
    let settings = match target {
        SetTarget::Default => RepositorySettings::defaults(),
        SetTarget::Custom(args) => RepositorySettings::custom(args.user, args.repo, args.branch),
    };

    let report = app.apply(settings)?;
    report_result(&report.result)?;
    if let Some(record) = &report.committed {
        println!("Saved {}", record.settings.slug());
    }
    Ok(())
}

fn report_result(result: &ValidationResult) -> Result<()> {
    if !result.is_valid() {
        return Err(anyhow!("{}", result.message()));
    }

    println!("{}", result.message());
    if let Some(sha) = result.validated().and_then(|validated| validated.head_sha()) {
        println!("Branch head: {sha}");
    }
    Ok(())
}

fn print_settings(record: &StoredSettings) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Setting", "Value"]);

    table.add_row(vec![
        Cell::new("Mode"),
        Cell::new(record.settings.mode.label()),
    ]);
    for field in SETTINGS_FIELDS {
        table.add_row(vec![
            Cell::new(field.label()),
            Cell::new(record.settings.field(field)),
        ]);
    }
    table.add_row(vec![
        Cell::new("Validated at"),
        Cell::new(record.validated_at.as_deref().unwrap_or("never")),
    ]);

    println!("{table}");
}
