// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bb: the single-user local runner.
//!
//! `bb run` wires the whole build-execution core into one process: an
//! SQLite store under the working directory, the queue service, the
//! work-queue pool, and an in-process runner, then executes the build
//! defined by `.buildbeaver.json`.

mod commands;
mod exit_error;
mod local;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Every long-form flag is also readable from `BB_VAR_<NAME>`.
#[derive(Parser)]
#[command(name = "bb", about = "BuildBeaver local build runner", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the build defined in the working directory.
    Run {
        /// Workflows to run (with their transitive dependencies).
        /// Empty means the whole graph.
        workflows: Vec<String>,

        /// Directory containing the build definition.
        #[arg(long, env = "BB_VAR_WORKDIR", default_value = ".")]
        workdir: PathBuf,

        /// Run every job even when a prior run with the same
        /// fingerprint succeeded.
        #[arg(long, env = "BB_VAR_FORCE")]
        force: bool,

        /// Keep the per-run state directory for inspection.
        #[arg(long, env = "BB_VAR_SKIP_CLEANUP")]
        skip_cleanup: bool,

        /// Verbose logging (repeat for more).
        #[arg(short, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Emit the build result as JSON.
        #[arg(long, env = "BB_VAR_JSON")]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run { workflows, workdir, force, skip_cleanup, verbose, json } => {
            init_tracing(verbose);
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    eprintln!("bb: starting runtime: {err}");
                    std::process::exit(1);
                }
            };
            runtime.block_on(commands::run::execute(commands::run::RunArgs {
                workflows,
                workdir,
                force,
                skip_cleanup,
                json,
            }))
        }
    };
    match result {
        Ok(()) => {}
        Err(err) => {
            if !err.message.is_empty() {
                eprintln!("bb: {err}");
            }
            std::process::exit(err.code);
        }
    }
}
