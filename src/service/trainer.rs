//! External training procedure
//!
//! Training itself lives outside this service. A trainer only has to leave a
//! fresh artifact at the configured model path and report success.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training command is empty")]
    EmptyCommand,

    #[error("failed to start training command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("cannot resolve model path: {0}")]
    ModelPath(std::io::Error),

    #[error("training exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

#[async_trait]
pub trait Trainer: Send + Sync {
    async fn train(&self) -> Result<(), TrainError>;

    fn describe(&self) -> String;
}

/// Environment variable telling the training script where to write the model
pub const MODEL_PATH_ENV: &str = "MODEL_PATH";

/// Runs the training script as a child process
#[derive(Debug, Clone)]
pub struct CommandTrainer {
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
    model_path: Option<PathBuf>,
}

impl CommandTrainer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            workdir: None,
            model_path: None,
        }
    }

    /// Split a whitespace-separated command line into program and args
    pub fn from_command_line(line: &str) -> Result<Self, TrainError> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(TrainError::EmptyCommand)?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn with_workdir(mut self, workdir: Option<PathBuf>) -> Self {
        self.workdir = workdir;
        self
    }

    /// Artifact location handed to the child as `MODEL_PATH`.
    /// Relative paths are resolved against the service's working directory,
    /// so a separate `workdir` does not move the artifact.
    pub fn with_model_path(mut self, path: &Path) -> Result<Self, TrainError> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_err(TrainError::ModelPath)?.join(path)
        };
        self.model_path = Some(path);
        Ok(self)
    }
}

#[async_trait]
impl Trainer for CommandTrainer {
    async fn train(&self) -> Result<(), TrainError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Aborting the reload task must not leave the trainer running
            .kill_on_drop(true);

        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }
        if let Some(path) = &self.model_path {
            cmd.env(MODEL_PATH_ENV, path);
        }

        tracing::info!("Starting training: {}", self.describe());
        let output = cmd.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TrainError::Failed {
                status: output.status.to_string(),
                stderr: stderr.trim().chars().take(2000).collect(),
            });
        }

        tracing::debug!(
            "Training output: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
