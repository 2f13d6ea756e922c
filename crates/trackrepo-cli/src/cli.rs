use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "trackrepo")]
#[command(bin_name = "trackrepo")]
#[command(version)]
#[command(about = "Choose the GitHub repository that track layouts are downloaded from")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Write a debug log under ~/.config/trackrepo/diagnostics"
    )]
    pub diagnostics: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Show the saved repository settings")]
    Show,
    #[command(about = "Check that a repository branch exists without saving it")]
    Check(CheckArgs),
    #[command(about = "Validate and save repository settings")]
    Set {
        #[command(subcommand)]
        target: SetTarget,
    },
}

/// Overrides for `check`; omitted values come from the saved settings.
#[derive(Debug, Args, Default)]
pub struct CheckArgs {
    #[arg(long, help = "GitHub username owning the repository")]
    pub user: Option<String>,
    #[arg(long, help = "Repository name")]
    pub repo: Option<String>,
    #[arg(long, help = "Branch name")]
    pub branch: Option<String>,
}

impl CheckArgs {
    pub fn is_empty(&self) -> bool {
        self.user.is_none() && self.repo.is_none() && self.branch.is_none()
    }
}

#[derive(Debug, Subcommand)]
pub enum SetTarget {
    #[command(about = "Use the default layouts repository")]
    Default,
    #[command(about = "Use a custom GitHub repository")]
    Custom(CustomArgs),
}

#[derive(Debug, Args)]
pub struct CustomArgs {
    #[arg(long, help = "GitHub username owning the repository")]
    pub user: String,
    #[arg(long, help = "Repository name")]
    pub repo: String,
    #[arg(long, help = "Branch name")]
    pub branch: String,
}
