use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use episode_rename::prompt::{LoopControl, Prompter, wait_for_continue};
use episode_rename::{RunOptions, RunOutcome, Settings, Workflow};

#[derive(Parser)]
#[command(name = "episode-rename")]
#[command(about = "Rename the episodes in a folder to 'Show - S01E01.ext'")]
struct Cli {
    /// Folder holding the media files (asked for when omitted)
    folder: Option<PathBuf>,

    /// Show name to use instead of asking
    #[arg(long)]
    show: Option<String>,

    /// Season number to use instead of asking
    #[arg(long)]
    season: Option<String>,

    /// Number episodes 01, 02, ... in filename order, ignoring numbers in the names
    #[arg(long)]
    renumber: bool,

    /// Rename without asking for confirmation
    #[arg(long, short = 'y')]
    yes: bool,

    /// Show the proposed renames and stop
    #[arg(long)]
    dry_run: bool,

    /// Exit after one run instead of offering another
    #[arg(long)]
    once: bool,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print debug diagnostics to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn first_run_options(&self) -> RunOptions {
        RunOptions {
            folder: self.folder.clone(),
            show_name: self.show.clone(),
            season: self.season.clone(),
            force_renumber: self.renumber.then_some(true),
            assume_yes: self.yes,
            dry_run: self.dry_run,
        }
    }

    // Later runs ask for a new folder and show, keeping only the policy flags.
    fn next_run_options(&self) -> RunOptions {
        RunOptions {
            force_renumber: self.renumber.then_some(true),
            assume_yes: self.yes,
            dry_run: self.dry_run,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    tracing::debug!(?settings, "settings loaded");

    println!("Episode Rename Tool");
    println!("===================");

    let mut options = cli.first_run_options();
    loop {
        let result = {
            let stdin = io::stdin();
            let mut prompter = Prompter::new(stdin.lock(), io::stdout());
            Workflow::new(&mut prompter, &settings, options).run()
        };

        match result {
            Ok(RunOutcome::Applied(summary)) => {
                if summary.failed == 0 {
                    println!("✓ All files processed successfully!");
                } else {
                    println!("⚠ Some files could not be renamed, see above.");
                }
            }
            Ok(RunOutcome::Cancelled) | Ok(RunOutcome::Previewed { .. }) => {}
            Err(e) if e.is_input_closed() => {
                println!();
                break;
            }
            Err(e) if e.is_warning() => println!("⚠ {}", e),
            Err(e) => println!("✗ Error: {}", e),
        }

        if cli.once {
            break;
        }
        match wait_for_continue().context("failed to read from the terminal")? {
            LoopControl::Continue => options = cli.next_run_options(),
            LoopControl::Quit => break,
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();
}
