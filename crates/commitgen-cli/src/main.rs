//! Commitgen CLI - diff to commit-message translator
//!
//! Provides:
//! - Cloning and processing of git repositories into training pairs
//! - Training of the seq2seq translator
//! - Prediction of a commit message for a diff read from stdin

mod commands;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::{Parser, Subcommand};
use commitgen_core::DataDirs;

use commands::{cmd_clone, cmd_humanify, cmd_predict, cmd_process, cmd_stats, cmd_train};

#[derive(Parser)]
#[command(name = "commitgen")]
#[command(about = "Train and run a diff -> commit message translator", long_about = None)]
#[command(version)]
struct Cli {
    /// Project root holding the data/ and models/ folders
    #[arg(long, default_value = ".")]
    data_root: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clones a git repository into the raw staging area
    Clone {
        /// The path/URL, as accepted by `git clone`
        repo: String,

        /// Optional destination, relative to the project root
        dst: Option<PathBuf>,
    },

    /// Prints the canonical short name of a repository URL
    Humanify {
        /// The path/URL, as accepted by `git clone`
        repo: String,
    },

    /// Processes a staged repository into (message, diff) pairs
    Process {
        /// Staged folder name, absolute repo path, or a URL whose short
        /// name will be used
        repo: String,
    },

    /// Trains the translator against a processed repository
    Train {
        /// Folder name inside the processed area
        repo: String,

        /// Fraction in [0, 1] of commits used for training vs. validation
        cv_split: f64,

        /// Width in characters of the model summary (0 for none)
        #[arg(long, default_value = "0")]
        summary: usize,

        /// Number of training steps per epoch
        #[arg(long, default_value = "1000")]
        steps_per_epoch: usize,

        /// Number of epochs
        #[arg(long, default_value = "100")]
        epochs: usize,

        /// Samples per training step
        #[arg(long, default_value = "64")]
        batch_size: usize,

        /// Materialize the training partition instead of streaming from disk
        #[arg(long)]
        in_memory: bool,
    },

    /// Reads a diff from stdin and prints the predicted commit message
    Predict {
        /// Snapshot name suffix to load (default: most recent snapshot)
        #[arg(long)]
        model: Option<String>,

        /// Maximum number of generated characters
        #[arg(long, default_value = "300")]
        max_len: usize,
    },

    /// Shows statistics for a processed repository
    Stats {
        /// Folder name inside the processed area
        repo: String,
    },
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

fn install_sigint_handler() {
    let handler = handle_sigint as extern "C" fn(libc::c_int);
    unsafe {
        libc::signal(libc::SIGINT, handler as libc::sighandler_t);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configure logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let dirs = DataDirs::new(&cli.data_root);

    match cli.command {
        Commands::Clone { repo, dst } => {
            cmd_clone(&dirs, &repo, dst.as_deref())?;
        }
        Commands::Humanify { repo } => {
            cmd_humanify(&repo);
        }
        Commands::Process { repo } => {
            cmd_process(&dirs, &repo)?;
        }
        Commands::Train {
            repo,
            cv_split,
            summary,
            steps_per_epoch,
            epochs,
            batch_size,
            in_memory,
        } => {
            install_sigint_handler();
            cmd_train(
                &dirs,
                &repo,
                cv_split,
                summary,
                steps_per_epoch,
                epochs,
                batch_size,
                in_memory,
                &INTERRUPTED,
            )?;
        }
        Commands::Predict { model, max_len } => {
            cmd_predict(&dirs, model.as_deref(), max_len)?;
        }
        Commands::Stats { repo } => {
            cmd_stats(&dirs, &repo)?;
        }
    }

    Ok(())
}
