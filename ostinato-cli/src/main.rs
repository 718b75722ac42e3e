//! # Ostinato CLI
//!
//! Host binary for the varispeed looper engine: offline renders through a
//! timed command script, or a live monitor on the default output device with
//! stdin control.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod live;
mod render;
mod script;

use config::CliConfig;

#[derive(Parser, Debug)]
#[command(name = "ostinato")]
#[command(about = "Varispeed audio looper - record, overdub, window and bend loops")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "ostinato.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Render a WAV file through a timed command script
    Render {
        /// Input WAV fed to the record inlet
        #[arg(short, long)]
        input: PathBuf,

        /// Output WAV of the looper's playback
        #[arg(short, long)]
        output: PathBuf,

        /// Command script ("<seconds> <command> [args]" per line)
        #[arg(short, long)]
        script: PathBuf,
    },
    /// Stream the loop to the default output device, commands from stdin
    Live {
        /// Input WAV cycled into the record inlet
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ostinato=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let args = Args::parse();
    let config = CliConfig::load(&args.config)?;
    info!(
        channels = config.engine.channels,
        vector = config.vector_size,
        "starting ostinato"
    );

    match args.command {
        CliCommand::Render { input, output, script } => {
            render::run(&config, &input, &output, &script)
        }
        CliCommand::Live { input } => live::run(&config, &input),
    }
}
