//! Runs configured external steps with a per-attempt timeout.

use std::io;
use std::path::{
    Path,
    PathBuf,
};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::{
    ExternalStep,
    PipelineConfig,
};

#[derive(Error, Debug)]
pub enum ExternalCallError {
    #[error("Failed to start '{step}': {source}")]
    Spawn {
        step: String,
        #[source]
        source: io::Error,
    },

    #[error("'{step}' exited with status {}", .code.map_or_else(|| "unknown".to_string(), |code| code.to_string()))]
    Failed { step: String, code: Option<i32> },

    #[error("'{step}' timed out after {timeout_secs}s ({attempts} attempt(s))")]
    TimedOut { step: String, timeout_secs: u64, attempts: u32 },

    /// A stage needs a step the configuration does not define.
    #[error("No '{0}' step is configured in the pipeline section")]
    NotConfigured(String),
}

/// Sequential runner for external steps.
#[derive(Debug, Clone)]
pub struct StepRunner {
    /// Directory step working directories are resolved against.
    root: PathBuf,
    /// Limit for a single attempt.
    timeout: Duration,
    /// Extra attempts after a timeout.
    retries: u32,
}

impl StepRunner {
    #[must_use]
    pub fn new(root: &Path, config: &PipelineConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            timeout: Duration::from_secs(config.timeout_secs),
            retries: config.retries,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs `step` to completion with `env` added to its environment.
    ///
    /// Only a timeout is retried; a non-zero exit fails at once.
    pub async fn run(&self, step: &ExternalStep, env: &[(&str, String)]) -> Result<(), ExternalCallError> {
        let name = step.display_name();
        let attempts = self.retries.saturating_add(1);

        for attempt in 1..=attempts {
            tracing::info!(step = name, attempt, "Running external step");
            let mut child = self.command(step, env).spawn().map_err(|source| ExternalCallError::Spawn {
                step: name.to_string(),
                source,
            })?;

            match timeout(self.timeout, child.wait()).await {
                Ok(Ok(status)) if status.success() => {
                    tracing::debug!(step = name, "External step finished");
                    return Ok(());
                }
                Ok(Ok(status)) => {
                    return Err(ExternalCallError::Failed { step: name.to_string(), code: status.code() });
                }
                Ok(Err(source)) => {
                    return Err(ExternalCallError::Spawn { step: name.to_string(), source });
                }
                Err(_) => {
                    tracing::warn!(step = name, attempt, attempts, "External step timed out");
                    if let Err(error) = child.kill().await {
                        tracing::debug!(step = name, %error, "Failed to kill timed out step");
                    }
                }
            }
        }

        Err(ExternalCallError::TimedOut {
            step: name.to_string(),
            timeout_secs: self.timeout.as_secs(),
            attempts,
        })
    }

    /// The command for one attempt, run from the step's working directory.
    fn command(&self, step: &ExternalStep, env: &[(&str, String)]) -> Command {
        let cwd = step.cwd.as_ref().map_or_else(|| self.root.clone(), |cwd| self.root.join(cwd));
        let mut command = Command::new(&step.program);
        command
            .args(&step.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        for (key, value) in env {
            command.env(key, value);
        }
        command
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use tempfile::TempDir;

    use super::*;

    fn shell(script: &str) -> ExternalStep {
        ExternalStep {
            name: Some("script".to_string()),
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            cwd: None,
        }
    }

    fn runner(root: &Path, retries: u32) -> StepRunner {
        StepRunner::new(root, &PipelineConfig { retries, ..PipelineConfig::default() })
    }

    #[tokio::test]
    async fn run_succeeds_and_passes_env() {
        let temp = TempDir::new().unwrap();
        let step = shell("printf '%s' \"$LINGO_VALUE\" > out.txt");

        runner(temp.path(), 0).run(&step, &[("LINGO_VALUE", "hello".to_string())]).await.unwrap();

        assert_eq!(std::fs::read_to_string(temp.path().join("out.txt")).unwrap(), "hello");
    }

    #[tokio::test]
    async fn run_uses_step_cwd() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("tool")).unwrap();
        let step = ExternalStep { cwd: Some("tool".to_string()), ..shell("touch marker") };

        runner(temp.path(), 0).run(&step, &[]).await.unwrap();

        assert!(temp.path().join("tool/marker").exists());
    }

    #[tokio::test]
    async fn non_zero_exit_is_not_retried() {
        let temp = TempDir::new().unwrap();
        let step = shell("echo x >> attempts.log; exit 3");

        let result = runner(temp.path(), 2).run(&step, &[]).await;

        assert!(matches!(result, Err(ExternalCallError::Failed { code: Some(3), .. })));
        let log = std::fs::read_to_string(temp.path().join("attempts.log")).unwrap();
        assert_eq!(log.lines().count(), 1);
    }

    #[tokio::test]
    async fn timeout_is_retried_then_fails() {
        let temp = TempDir::new().unwrap();
        let step = shell("echo x >> attempts.log; sleep 5");

        let result = runner(temp.path(), 1)
            .with_timeout(Duration::from_secs(1))
            .run(&step, &[])
            .await;

        assert!(matches!(result, Err(ExternalCallError::TimedOut { attempts: 2, .. })));
        let log = std::fs::read_to_string(temp.path().join("attempts.log")).unwrap();
        assert_eq!(log.lines().count(), 2);
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let temp = TempDir::new().unwrap();
        let step = ExternalStep {
            name: None,
            program: "lingo-sync-no-such-program".to_string(),
            args: Vec::new(),
            cwd: None,
        };

        let error = runner(temp.path(), 0).run(&step, &[]).await.unwrap_err();

        assert_that!(error.to_string(), contains_substring("Failed to start 'lingo-sync-no-such-program'"));
    }
}
