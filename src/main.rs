// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use depth_mapping::config::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "depth-mapping")]
#[command(about = "Depth and color coordinate mapping viewer")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/depth-mapping/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Replay a captured 16-bit depth PNG instead of the configured source
    #[arg(long, global = true, requires = "replay_color")]
    replay_depth: Option<PathBuf>,

    /// Color image paired with --replay-depth
    #[arg(long, global = true, requires = "replay_depth")]
    replay_color: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal viewer (default)
    View,

    /// Print source, frame sizes and calibration
    Info,

    /// Map frames without a UI and print each outcome
    Stream {
        /// Mapping mode (1-5, same as the viewer keys)
        #[arg(short, long)]
        mode: Option<usize>,

        /// Stop after this many frames (0 = until Ctrl+C)
        #[arg(short, long, default_value = "0")]
        frames: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=depth_mapping=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let (Some(depth), Some(color)) = (cli.replay_depth, cli.replay_color) {
        config = config.with_replay(depth, color);
    }

    match cli.command {
        Some(Commands::Info) => cli::show_info(&config),
        Some(Commands::Stream { mode, frames }) => cli::stream(&config, mode, frames),
        Some(Commands::View) | None => depth_mapping::terminal::run(&config),
    }
}
