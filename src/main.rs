// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use skincam::backends::camera::FacingMode;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "skincam")]
#[command(about = "Webcam capture client for the SkinCam skin-analysis service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List {
        /// Use the synthetic frame source instead of real hardware
        #[arg(long)]
        synthetic: bool,
    },

    /// Capture a photo (countdown, snapshot, save)
    Capture {
        /// Facing mode to prefer (front or rear)
        #[arg(short, long)]
        facing: Option<FacingMode>,

        /// Countdown seconds before the snapshot (default from config)
        #[arg(short, long)]
        countdown: Option<u8>,

        /// Use the synthetic frame source instead of real hardware
        #[arg(long)]
        synthetic: bool,

        /// Output directory (default: ~/Pictures/SkinCam)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Upload the capture for analysis afterwards
        #[arg(short, long)]
        analyze: bool,
    },

    /// Analyze an image file
    Analyze {
        /// Image file to analyze
        image: PathBuf,
    },

    /// Compare a before/after image pair
    Compare {
        /// The earlier image
        before: PathBuf,
        /// The later image
        after: PathBuf,
    },

    /// Show past analysis reports
    History,

    /// Download the PDF report for an analysis
    Pdf {
        /// Report id from a previous analysis
        report_id: String,

        /// Directory to save the PDF into (default: current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the PDF after downloading
        #[arg(long)]
        open: bool,
    },

    /// Ask the skincare chatbot a question
    Chat {
        /// The message to send
        message: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=skincam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List { synthetic } => cli::list_devices(synthetic),
        Commands::Capture {
            facing,
            countdown,
            synthetic,
            output,
            analyze,
        } => cli::capture(facing, countdown, synthetic, output, analyze),
        Commands::Analyze { image } => cli::analyze(image),
        Commands::Compare { before, after } => cli::compare(before, after),
        Commands::History => cli::history(),
        Commands::Pdf {
            report_id,
            output,
            open,
        } => cli::download_pdf(report_id, output, open),
        Commands::Chat { message } => cli::chat(message),
    }
}
