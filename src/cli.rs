use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "ritcher-player",
    version,
    about = "Build stitched playback URLs and replay engine event scripts"
)]
pub struct Cli {
    /// Log at debug level (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a fresh session id and the playlist URL for the stitcher
    Url(UrlArgs),
    /// Drive a playback session from a scripted engine and print each status change
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
pub struct UrlArgs {
    #[arg(long)]
    pub stitcher_url: String,
    #[arg(long)]
    pub origin_url: Option<String>,
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// JSON list of {afterMs, event, data} steps
    #[arg(long)]
    pub script: PathBuf,
    /// Settings file (camelCase JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub stitcher_url: Option<String>,
    #[arg(long)]
    pub origin_url: Option<String>,
    /// Pretend the runtime has no adaptive engine
    #[arg(long)]
    pub native: bool,
    /// Press play as soon as the controls are enabled
    #[arg(long)]
    pub autoplay: bool,
    #[arg(long, default_value_t = 30_000)]
    pub duration_ms: u64,
}
