//! CLI for the hlsdl segment downloader.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hlsdl_core::config::{self, HlsdlConfig};
use hlsdl_core::downloader::DownloadOptions;
use hlsdl_core::fetch::ClientConfig;
use std::path::PathBuf;

use commands::run_down;

/// Top-level CLI for hlsdl.
#[derive(Debug, Parser)]
#[command(name = "hlsdl")]
#[command(about = "hlsdl: concurrent HLS segment downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every segment of an HLS playlist and merge them into one file.
    Down(DownArgs),
}

#[derive(Debug, Args)]
pub struct DownArgs {
    /// Playlist URL (media or master .m3u8).
    #[arg(short = 'i', long = "input", value_name = "URL")]
    pub input: String,

    /// Output directory.
    #[arg(short = 'o', long = "output", default_value = "./")]
    pub output: PathBuf,

    /// Output file name.
    #[arg(short = 'n', long = "name", default_value = "main.mp4")]
    pub name: String,

    /// Number of concurrent segment workers (config default: 8).
    #[arg(short = 't', long = "thread", value_name = "N")]
    pub threads: Option<usize>,

    /// Merge with ffmpeg when it is on PATH.
    #[arg(long, conflicts_with = "no_ffmpeg")]
    pub use_ffmpeg: bool,

    /// Always merge by direct concatenation.
    #[arg(long)]
    pub no_ffmpeg: bool,

    /// Origin header sent with every request.
    #[arg(long)]
    pub origin: Option<String>,

    /// Referer header sent with every request.
    #[arg(long)]
    pub referer: Option<String>,

    /// Cookie header sent with every request.
    #[arg(long)]
    pub cookie: Option<String>,

    /// Fixed User-Agent (default rotates through common browsers).
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Give up on a segment after N attempts (default: retry until it succeeds).
    #[arg(long, value_name = "N")]
    pub max_attempts: Option<u32>,
}

impl DownArgs {
    /// Playlist URL with surrounding whitespace removed; names the work directory too.
    pub fn manifest_url(&self) -> &str {
        self.input.trim()
    }

    /// HTTP client settings: config values with flag overrides.
    pub fn client_config(&self, cfg: &HlsdlConfig) -> ClientConfig {
        let mut client = cfg.client_config();
        client.origin = self.origin.clone();
        client.referer = self.referer.clone();
        client.cookie = self.cookie.clone();
        if self.user_agent.is_some() {
            client.user_agent = self.user_agent.clone();
        }
        client
    }

    pub fn download_options(&self, cfg: &HlsdlConfig) -> DownloadOptions {
        let mut retry = cfg.retry_policy();
        if let Some(n) = self.max_attempts {
            retry.max_attempts = Some(n).filter(|&n| n > 0);
        }
        let use_external_muxer = if self.no_ffmpeg {
            false
        } else {
            self.use_ffmpeg || cfg.use_external_muxer
        };
        DownloadOptions {
            output_dir: self.output.clone(),
            filename: self.name.clone(),
            threads: self.threads.unwrap_or(cfg.threads).max(1),
            use_external_muxer,
            retry,
        }
    }
}

/// How a command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Complete,
    /// Output written, but some segments are missing from it.
    Degraded,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Complete => 0,
            RunStatus::Degraded => 2,
        }
    }
}

impl CliCommand {
    pub fn run_from_args() -> Result<RunStatus> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Down(args) => run_down(&args, &cfg),
        }
    }
}

#[cfg(test)]
mod tests;
