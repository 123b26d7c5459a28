//! Deixis CLI — pointing-gesture inference and signal analysis.
//!
//! Usage:
//!   deixis infer [OPTIONS]                 Run the model over a frame sequence
//!   deixis analyze [LOG]                   Summarize and plot a record log
//!   deixis inspect-checkpoint <FILE>       Show how a checkpoint binds

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use deixis_common::config::{LoggingConfig, DEFAULT_LOG_PATH, DEFAULT_TLENGTH};

mod commands;

#[derive(Parser)]
#[command(
    name = "deixis",
    about = "Pointing-gesture inference over video clips and analysis of the resulting signal",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Append diagnostics to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pointing model over every clip of a frame sequence
    Infer {
        /// JSON settings file; flags below override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory of decoded frames
        #[arg(short, long)]
        movie: Option<PathBuf>,

        /// Hand to analyze: l or r
        #[arg(short, long)]
        side: Option<String>,

        /// Checkpoint file
        #[arg(long)]
        ckpt: Option<PathBuf>,

        /// Frames per clip
        #[arg(long)]
        tlength: Option<usize>,

        /// Start-index step between clips
        #[arg(long)]
        stride: Option<usize>,

        /// Compute device: cpu, cuda or cuda:N
        #[arg(long)]
        device: Option<String>,

        /// Write records to this file instead of stdout
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Summarize a record log and plot the probability signal
    Analyze {
        /// Record log produced by `deixis infer`
        #[arg(default_value = DEFAULT_LOG_PATH)]
        log: PathBuf,

        /// Directory for the plots
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Skip rendering plots
        #[arg(long)]
        no_plots: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a checkpoint into the reference network and report the binding
    InspectCheckpoint {
        /// Checkpoint file
        path: PathBuf,

        /// Frames per clip the network is built for
        #[arg(long, default_value_t = DEFAULT_TLENGTH)]
        tlength: usize,

        /// Hidden layer width
        #[arg(long, default_value = "64")]
        hidden_size: usize,

        /// Channels per pixel
        #[arg(long, default_value = "3")]
        channels: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn logging_config(&self) -> LoggingConfig {
        let level = if self.verbose { "debug" } else { "info" };
        LoggingConfig {
            level: level.to_string(),
            json: self.json_logs,
            file: self.log_file.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    deixis_common::logging::init_logging(&cli.logging_config());

    match cli.command {
        Commands::Infer {
            config,
            movie,
            side,
            ckpt,
            tlength,
            stride,
            device,
            log,
        } => commands::infer::run(commands::infer::InferArgs {
            config,
            movie,
            side,
            checkpoint: ckpt,
            tlength,
            stride,
            device,
            log,
        }),
        Commands::Analyze {
            log,
            output_dir,
            no_plots,
            json,
        } => commands::analyze::run(log, output_dir, no_plots, json),
        Commands::InspectCheckpoint {
            path,
            tlength,
            hidden_size,
            channels,
            json,
        } => commands::inspect_checkpoint::run(path, tlength, hidden_size, channels, json),
    }
}
