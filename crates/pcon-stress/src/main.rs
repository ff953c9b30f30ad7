mod common;
mod events;
mod fanout;
mod output;
mod ring;

use clap::{Parser, Subcommand};
use common::Runtime;
use pcon_sched::SchedulerConfig;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pcon-stress", about = "Stress test for processor container scheduling")]
struct Cli {
    /// Run members as OS threads or tokio tasks.
    #[arg(long, value_enum, default_value = "threads")]
    runtime: Runtime,

    /// Log a registry dump at debug level after every structural change.
    #[arg(long)]
    trace_registry: bool,

    /// Also write events to `<dir>/<mode>_<timestamp>.jsonl`.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One group, N members taking turns.
    Ring {
        /// Members in the group.
        #[arg(long, default_value = "4")]
        members: usize,
        /// Switches per member.
        #[arg(long, default_value = "1000")]
        rounds: usize,
    },

    /// Many independent groups at once.
    Fanout {
        /// Number of groups.
        #[arg(long, default_value = "8")]
        groups: u64,
        /// Members per group.
        #[arg(long, default_value = "4")]
        members: usize,
        /// Switches per member.
        #[arg(long, default_value = "500")]
        rounds: usize,
    },
}

impl Command {
    fn mode(&self) -> &'static str {
        match self {
            Command::Ring { .. } => "ring",
            Command::Fanout { .. } => "fanout",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let start = Instant::now();

    if let Some(dir) = &cli.output_dir {
        let path = output::jsonl_path(dir, cli.command.mode())?;
        output::open_jsonl(&path)?;
        eprintln!("Writing events to {}", path.display());
    }

    // A stress run ends with every member leaving; without handoff on
    // leave the survivors of the last rotation would never wake.
    let sched = SchedulerConfig::new()
        .wake_on_leave(true)
        .trace_registry(cli.trace_registry);

    eprintln!("pcon-stress v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();

    match cli.command {
        Command::Ring { members, rounds } => {
            anyhow::ensure!(members > 0, "--members must be at least 1");
            ring::run(
                ring::RingConfig {
                    members,
                    rounds,
                    runtime: cli.runtime,
                    sched,
                },
                start,
            )
            .await?;
        }

        Command::Fanout {
            groups,
            members,
            rounds,
        } => {
            anyhow::ensure!(members > 0, "--members must be at least 1");
            fanout::run(
                fanout::FanoutConfig {
                    groups,
                    members,
                    rounds,
                    runtime: cli.runtime,
                    sched,
                },
                start,
            )
            .await?;
        }
    }

    Ok(())
}
