//! External LaTeX compiler invocation.
//!
//! The compiler is a black box: it gets a fixed number of passes, each
//! bounded by a timeout. Any spawn error, non-zero exit, timeout, or missing
//! PDF is a failure for that unit only.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running compiler is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs a LaTeX compiler over generated decks.
#[derive(Debug, Clone)]
pub struct Compiler {
    program: String,
    passes: u32,
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl Compiler {
    /// Create a compiler that runs `program` once with a 60 second timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            passes: 1,
            timeout: Duration::from_secs(60),
            working_dir: None,
        }
    }

    /// Run the compiler this many times (references settle on later passes).
    pub fn with_passes(mut self, passes: u32) -> Self {
        self.passes = passes.max(1);
        self
    }

    /// Time limit for each pass.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory the compiler runs in; relative graphics paths resolve here.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Compile `tex` into `output_dir`, returning the produced PDF path.
    pub fn compile(&self, tex: &Path, output_dir: &Path) -> Result<PathBuf> {
        let stem = tex
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Deck path has no file name")?;

        for pass in 1..=self.passes {
            log::debug!("{} pass {}/{} on {}", self.program, pass, self.passes, tex.display());
            if let Err(e) = self.run_pass(tex, output_dir) {
                let log_path = output_dir.join(format!("{}.log", stem));
                return match first_log_error(&log_path) {
                    Some(line) => Err(e.context(line)),
                    None => Err(e),
                };
            }
        }

        let pdf = output_dir.join(format!("{}.pdf", stem));
        if !pdf.exists() {
            bail!("PDF not found after compilation: {}", pdf.display());
        }
        Ok(pdf)
    }

    fn run_pass(&self, tex: &Path, output_dir: &Path) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .arg("-interaction=nonstopmode")
            .arg("-output-directory")
            .arg(output_dir)
            .arg(tex)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program))?;
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("Failed to wait for {}", self.program))?
            {
                if status.success() {
                    return Ok(());
                }
                bail!("{} exited with {}", self.program, status);
            }

            if Instant::now() >= deadline {
                // Best effort: the child may exit between the poll and the kill.
                let _ = child.kill();
                let _ = child.wait();
                bail!("Compilation timeout after {}s", self.timeout.as_secs());
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// First `! ...` error line of a TeX log, if the log exists.
fn first_log_error(log_path: &Path) -> Option<String> {
    let bytes = fs::read(log_path).ok()?;
    String::from_utf8_lossy(&bytes)
        .lines()
        .find(|line| line.starts_with("! "))
        .map(|line| line.trim().to_string())
}
