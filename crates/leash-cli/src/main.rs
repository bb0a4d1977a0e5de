// SPDX-License-Identifier: MIT OR Apache-2.0
#![deny(unsafe_code)]
mod commands;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use commands::LaunchOptions;
use leash_config::{LeashConfig, load_config, validate_config};
use leash_core::shutdown;
use leash_host::copier::forward_bytes;
use leash_host::{AutoProcessKiller, HostError, LaunchBuilder};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "leash", version, about = "Launch and supervise leash child runtimes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an entry point in a child runtime and wait for it.
    Run {
        #[command(flatten)]
        launch: LaunchArgs,

        /// Do not kill the child when leash shuts down.
        #[arg(long)]
        no_kill: bool,
    },

    /// Print the command line that `run` would execute.
    Command {
        #[command(flatten)]
        launch: LaunchArgs,
    },

    /// Print the effective configuration and its warnings.
    Config,

    /// Print the JSON schema of the configuration file.
    Schema,
}

#[derive(Args, Debug)]
struct LaunchArgs {
    /// Runtime executable (defaults to the leash-runtime next to leash).
    #[arg(long)]
    interpreter: Option<PathBuf>,

    /// Classpath for the child, replacing the configured one.
    #[arg(long)]
    classpath: Option<String>,

    /// Append an element to the classpath. Can be repeated.
    #[arg(long = "add-classpath")]
    add_classpath: Vec<String>,

    /// VM argument, e.g. `--vm-arg=-Dmode=batch`. Can be repeated.
    #[arg(long = "vm-arg", allow_hyphen_values = true)]
    vm_args: Vec<String>,

    /// Terminate the child when leash goes away, even if leash is killed.
    #[arg(long)]
    auto_exit: bool,

    /// Working directory for the child.
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Entry point to run.
    entry: String,

    /// Arguments for the entry point.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl From<LaunchArgs> for LaunchOptions {
    fn from(a: LaunchArgs) -> Self {
        Self {
            interpreter: a.interpreter,
            classpath: a.classpath,
            add_classpath: a.add_classpath,
            vm_args: a.vm_args,
            auto_exit: a.auto_exit,
            cwd: a.cwd,
            entry: a.entry,
            args: a.args,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let filter = if cli.debug {
        EnvFilter::new("leash=debug")
    } else {
        EnvFilter::new(format!(
            "leash={}",
            config.log_level.as_deref().unwrap_or("info")
        ))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let _guard = shutdown::guard();
    match cli.command {
        Commands::Run { launch, no_kill } => {
            let builder = prepare(&config, launch)?;
            let kill = config.kill_on_shutdown && !no_kill;
            cmd_run(builder, kill).await.map(ExitCode::from)
        }
        Commands::Command { launch } => {
            let builder = prepare(&config, launch)?;
            println!("{}", builder.command());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            print!("{}", commands::config_report(&config)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schema => {
            println!("{}", commands::schema_json()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn prepare(config: &LeashConfig, launch: LaunchArgs) -> Result<LaunchBuilder> {
    for warning in validate_config(config)? {
        debug!(target: "leash.cli", "config: {warning}");
    }
    commands::launch_builder(config, &launch.into())
}

async fn cmd_run(builder: LaunchBuilder, kill: bool) -> Result<u8> {
    let killer = if kill {
        Some(AutoProcessKiller::new()?)
    } else {
        None
    };
    shutdown::spawn_signal_listener();

    let child = builder
        .start()
        .with_context(|| format!("start {}", builder.get_interpreter().display()))?;
    if let Some(killer) = &killer {
        killer.add(&child);
    }
    info!(target: "leash.cli", pid = child.pid(), command = %builder.command(), "started child");

    let mut copies: Vec<JoinHandle<Result<u64, HostError>>> = Vec::new();
    if let Some(out) = child.take_stdout() {
        copies.push(forward_bytes(out, tokio::io::stdout()));
    }
    if let Some(err) = child.take_stderr() {
        copies.push(forward_bytes(err, tokio::io::stderr()));
    }

    let status = child.wait().await?;
    for copy in copies {
        match copy.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!(target: "leash.cli", error = %e, "output forwarding failed"),
            Err(e) => warn!(target: "leash.cli", error = %e, "output forwarding task failed"),
        }
    }
    info!(target: "leash.cli", %status, "child exited");
    Ok(commands::exit_code(status))
}
