use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use codeowners_index::OwnershipIndex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::ignore_filter::IgnoreFilter;

mod audit;
mod files;
mod ignore_filter;
mod verify;

#[derive(Parser)]
#[command(version, about = "Audit and verify CODEOWNERS ownership")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Specify CODEOWNERS filename
    #[arg(short = 'c', long, global = true, default_value = "CODEOWNERS")]
    codeowners_filename: String,

    /// Repository root, defaults to the current directory
    #[arg(short = 'C', long, global = true, default_value = ".")]
    root: PathBuf,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the owners for all files
    Audit {
        /// Print unowned files only
        #[arg(short, long)]
        unowned: bool,

        /// Print the owners of every file
        #[arg(short, long)]
        list: bool,

        /// How much should filenames be padded?
        #[arg(short, long, default_value_t = 32)]
        width: usize,

        /// Walk the directory tree instead of asking git for tracked files
        #[arg(long)]
        walk: bool,
    },
    /// Verify users/teams own a specific path
    Verify {
        path: PathBuf,

        #[arg(required = true)]
        users: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    execute(cli, &mut io::stdout().lock(), &mut io::stderr())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "codeowners=debug,codeowners_index=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stdout carries the report, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Run a parsed command line. Reports go to `out`; a fatal error is written
/// to `err` and turns into a failing exit code.
fn execute(cli: Cli, out: &mut impl Write, err: &mut impl Write) -> ExitCode {
    match run(cli, out) {
        Ok(code) => code,
        Err(error) => {
            // Nothing sensible left to do if stderr is gone
            let _ = writeln!(err, "{:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &mut impl Write) -> Result<ExitCode> {
    let index = OwnershipIndex::build(&cli.root, &cli.codeowners_filename)?;

    match cli.command {
        Command::Audit {
            unowned,
            list,
            width,
            walk,
        } => {
            let tracked = if walk {
                files::walk_files(&cli.root)
            } else {
                files::tracked_files(&cli.root)?
            };
            let ignore = IgnoreFilter::load(&cli.root);
            let report = audit::run(&index, &tracked, |path| ignore.is_ignored(path));

            if unowned {
                for entry in report.unowned() {
                    writeln!(out, "{}", entry.path)?;
                }
            } else if list {
                for entry in &report.entries {
                    let owners = if entry.is_owned() {
                        entry.owners.join(" ")
                    } else {
                        "nobody".to_string()
                    };
                    writeln!(out, "{:<width$}    {}", entry.path, owners, width = width)?;
                }
            }
            writeln!(out, "{}", serde_json::to_string(&report.summary())?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Verify { path, users } => {
            let owners = index.owners(&path);
            let verified = verify::verified_owners(owners, &users);
            if verified.is_empty() {
                writeln!(
                    out,
                    "None of the users/teams specified own the path {}",
                    path.display()
                )?;
                return Ok(ExitCode::FAILURE);
            }

            for owner in verified {
                writeln!(out, "{}    {}", path.display(), owner)?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
