use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive frames and present the latest one each tick.
    Listen(ListenArgs),
    /// Send files (or a literal string) as frames.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to listen on.
    #[arg(long, env = "FRAMECAST_BIND", default_value = "0.0.0.0")]
    pub bind: std::net::IpAddr,
    /// Port to listen on.
    #[arg(long, short = 'p', env = "FRAMECAST_PORT", default_value_t = framecast_transport::DEFAULT_PORT)]
    pub port: u16,
    /// Expected frame width, passed to the presenter.
    #[arg(long, env = "FRAMECAST_WIDTH", default_value_t = 640)]
    pub width: u32,
    /// Expected frame height, passed to the presenter.
    #[arg(long, env = "FRAMECAST_HEIGHT", default_value_t = 360)]
    pub height: u32,
    /// Consumer tick interval (e.g. 16ms, 1s).
    #[arg(long, default_value = "16ms")]
    pub tick: String,
    /// Write the latest frame's bytes to this file on every tick that has one.
    #[arg(long, value_name = "PATH")]
    pub save: Option<PathBuf>,
    /// Exit after presenting N frames.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Receiver address (HOST:PORT).
    pub addr: String,
    /// Files to send, one frame each, in order.
    #[arg(required_unless_present = "data", conflicts_with = "data")]
    pub files: Vec<PathBuf>,
    /// Send this string as a single frame instead of files.
    #[arg(long)]
    pub data: Option<String>,
    /// Send the whole sequence this many times.
    #[arg(long, default_value_t = 1)]
    pub repeat: u32,
    /// Pause between frames (e.g. 33ms).
    #[arg(long, default_value = "33ms")]
    pub interval: String,
    /// Give up on a send the receiver stops draining after this long (0 waits forever).
    #[arg(long, default_value = "3s")]
    pub timeout: String,
    /// Extra connection attempts, two seconds apart, while the receiver is not up yet.
    #[arg(long, default_value_t = 0)]
    pub connect_retries: u32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `150ms`, `2s`, or a bare number of milliseconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
