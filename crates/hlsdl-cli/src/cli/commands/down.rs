//! `hlsdl down -i <url>` – download and merge one playlist.

use crate::cli::{DownArgs, RunStatus};
use anyhow::{Context, Result};
use hlsdl_core::config::HlsdlConfig;
use hlsdl_core::downloader::{DownloadReport, Downloader, ProgressEvent};
use hlsdl_core::fetch::{CurlFetcher, Fetcher};
use hlsdl_core::playlist;
use std::sync::{mpsc, Arc};
use std::thread;

pub fn run_down(args: &DownArgs, cfg: &HlsdlConfig) -> Result<RunStatus> {
    let manifest_url = args.manifest_url();
    let fetcher: Arc<dyn Fetcher> = Arc::new(CurlFetcher::new(args.client_config(cfg)));
    let source = playlist::load(fetcher.as_ref(), manifest_url)
        .with_context(|| format!("load playlist {}", manifest_url))?;

    let downloader = Downloader::new(manifest_url, source, fetcher, args.download_options(cfg))?;
    println!("[info] {} segments", downloader.segment_count());

    let (tx, rx) = mpsc::channel::<ProgressEvent>();
    let printer = thread::spawn(move || {
        for event in rx {
            println!("[download {:6.2}%] {}", event.fraction() * 100.0, event.uri);
        }
    });
    let report = downloader.run(Some(tx));
    if printer.join().is_err() {
        tracing::warn!("progress printer panicked");
    }
    let report = report?;

    print_summary(&report);
    Ok(if report.is_complete() {
        RunStatus::Complete
    } else {
        RunStatus::Degraded
    })
}

fn print_summary(report: &DownloadReport) {
    let merge = &report.merge;
    if merge.missing > 0 {
        println!("[warning] {} files missing", merge.missing);
    }
    if merge.failed > 0 {
        println!("[warning] {} files failed to merge", merge.failed);
    }
    println!("[output] {}", merge.output.display());
}
