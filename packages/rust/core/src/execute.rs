//! Run a notebook through an external kernel command (`jupyter nbconvert`
//! by default) and parse the executed notebook it prints.
//!
//! The file on disk is never rewritten; the executed copy only lives in memory.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tracing::{debug, info, instrument};

use nbcheck_shared::{ExecuteConfig, NbcheckError, Notebook, Result};

/// Keep at most this many bytes of child stderr in error messages.
const STDERR_TAIL_BYTES: usize = 2048;

/// Spawns the configured command once per notebook.
#[derive(Debug, Clone)]
pub struct Executor {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Executor {
    pub fn new(command: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            args,
            timeout,
        }
    }

    pub fn from_config(config: &ExecuteConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Execute `path` and return the notebook the command wrote to stdout.
    #[instrument(skip(self), fields(command = %self.command))]
    pub async fn execute(&self, path: &Path) -> Result<Notebook> {
        info!(path = %path.display(), "executing notebook");

        let child = tokio::process::Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| NbcheckError::Execution(format!("failed to spawn {}: {e}", self.command)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                NbcheckError::Execution(format!(
                    "{} timed out after {}s",
                    self.command,
                    self.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| NbcheckError::io(path, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NbcheckError::Execution(format!(
                "{} exited with status {}: {}",
                self.command,
                output.status.code().unwrap_or(-1),
                tail(stderr.trim(), STDERR_TAIL_BYTES)
            )));
        }

        debug!(bytes = output.stdout.len(), "kernel run finished");

        let json = String::from_utf8(output.stdout)
            .map_err(|e| NbcheckError::parse(path, format!("executed notebook is not UTF-8: {e}")))?;
        Notebook::from_json(path, &json)
    }
}

/// Last `max` bytes of `s`, moved forward to a char boundary.
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
