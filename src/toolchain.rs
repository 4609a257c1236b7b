use std::{path::Path, process::Command};
use tracing::{debug, info};
use crate::error::RepositoryError;

/// The external project manager, as far as provisioning needs it.
pub trait Toolchain: Send + Sync {
    /// Materialize a virtual environment inside `dir`.
    fn create_environment(&self, dir: &Path) -> Result<String, RepositoryError>;

    /// Interpreter version provisioned for `dir`, if it can be determined.
    fn interpreter_version(&self, dir: &Path) -> Option<String>;
}

/// Shells out to the `uv` binary.
#[derive(Debug, Clone)]
pub struct UvCli {
    program: String,
}

impl UvCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<String, RepositoryError> {
        let command = format!("{} {}", self.program, args.join(" "));
        debug!(%command, dir = %dir.display(), "running tool");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| RepositoryError::ToolFailure {
                command: command.clone(),
                output: e.to_string(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(RepositoryError::ToolFailure {
                command,
                output: combined.trim().to_string(),
            });
        }

        Ok(combined)
    }
}

impl Toolchain for UvCli {
    fn create_environment(&self, dir: &Path) -> Result<String, RepositoryError> {
        let output = self.run(dir, &["venv"])?;
        info!(dir = %dir.display(), "environment created");
        Ok(output)
    }

    fn interpreter_version(&self, dir: &Path) -> Option<String> {
        self.run(dir, &["run", "--no-project", "python", "--version"])
            .ok()
            .and_then(|output| parse_version(&output))
    }
}

/// Second whitespace-separated token, e.g. `Python 3.12.0` -> `3.12.0`.
pub fn parse_version(output: &str) -> Option<String> {
    output.split_whitespace().nth(1).map(str::to_string)
}
