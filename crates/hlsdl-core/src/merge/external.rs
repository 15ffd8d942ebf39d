//! Delegation to an external muxing tool (ffmpeg's concat demuxer).

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// An external program that turns the concat list into the final artifact.
/// Treated as opaque: it either produces `output` or fails.
pub trait ExternalMuxer: Send + Sync {
    /// Human-readable tool name for logs.
    fn name(&self) -> &str;
    /// Whether the tool can be found in this environment.
    fn is_available(&self) -> bool;
    /// Produce `output` from the list file at `file_list`.
    fn mux(&self, file_list: &Path, output: &Path) -> Result<()>;
}

/// `ffmpeg -y -f concat -safe 0 -i <list> -c copy <output>`, located on `PATH`.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    program: String,
}

impl Default for FfmpegMuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegMuxer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn locate(&self) -> Option<PathBuf> {
        find_on_path(&self.program)
    }
}

impl ExternalMuxer for FfmpegMuxer {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        self.locate().is_some()
    }

    fn mux(&self, file_list: &Path, output: &Path) -> Result<()> {
        let program = self
            .locate()
            .with_context(|| format!("`{}` not found on PATH", self.program))?;
        tracing::info!("found `{}` at {}", self.program, program.display());

        let status = Command::new(&program)
            .arg("-y")
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(file_list)
            .args(["-c", "copy"])
            .arg(output)
            .status()
            .with_context(|| format!("spawn {}", program.display()))?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

/// Resolve `program` like a shell would: a path with a separator is used as-is,
/// otherwise each `PATH` entry is tried.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .flat_map(|dir| executable_names(program).into_iter().map(move |n| dir.join(n)))
        .find(|p| is_executable(p))
}

#[cfg(windows)]
fn executable_names(program: &str) -> Vec<String> {
    vec![format!("{}.exe", program), program.to_string()]
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> Vec<String> {
    vec![program.to_string()]
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
