use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use chrono::{DateTime, Local};
use tracing::{debug, info, warn};
use crate::{
    error::RepositoryError,
    project::{Project, UNKNOWN_VERSION},
    toolchain::Toolchain,
    utils,
};

pub const PYTHON_VERSION_FILE: &str = ".python-version";
pub const PYPROJECT_FILE: &str = "pyproject.toml";
pub const VENV_DIR: &str = ".venv";
pub const LOCK_FILE: &str = "uv.lock";
pub const FALLBACK_PYTHON_VERSION: &str = "3.12";

const HELLO_PY: &str = r#"def main():
    print("Hello, world!")

if __name__ == "__main__":
    main()
"#;

/// Finds uv projects below one parent directory and provisions new ones.
#[derive(Clone)]
pub struct ProjectRepository {
    root: PathBuf,
    toolchain: Arc<dyn Toolchain>,
}

impl ProjectRepository {
    pub fn new(root: impl Into<PathBuf>, toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            root: root.into(),
            toolchain,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Same toolchain, different parent directory.
    pub fn with_root(&self, root: impl Into<PathBuf>) -> Self {
        Self::new(root, Arc::clone(&self.toolchain))
    }

    /// Immediate children of the root that look like uv projects, in
    /// directory-listing order.
    pub fn scan(&self) -> Result<Vec<Project>, RepositoryError> {
        let is_dir = fs::metadata(&self.root).map(|m| m.is_dir()).unwrap_or(false);
        if !is_dir {
            return Err(RepositoryError::RootNotFound(self.root.clone()));
        }

        let entries = fs::read_dir(&self.root)
            .map_err(|_| RepositoryError::RootNotFound(self.root.clone()))?;

        let mut projects = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }

            if let Some(project) = Self::analyze_project(&entry.path()) {
                projects.push(project);
            }
        }

        debug!(root = %self.root.display(), count = projects.len(), "scan finished");
        Ok(projects)
    }

    fn analyze_project(project_dir: &Path) -> Option<Project> {
        let version_file = project_dir.join(PYTHON_VERSION_FILE);
        let has_version_file = version_file.exists();
        let has_pyproject = project_dir.join(PYPROJECT_FILE).exists();
        let has_venv = project_dir.join(VENV_DIR).exists();
        let has_lock = project_dir.join(LOCK_FILE).exists();

        if !(has_version_file || has_pyproject || (has_venv && has_lock)) {
            return None;
        }

        let python_version = if has_version_file {
            Self::read_python_version(&version_file)
        } else {
            UNKNOWN_VERSION.to_string()
        };

        let last_modified = fs::metadata(project_dir)
            .and_then(|m| m.modified())
            .map(DateTime::<Local>::from)
            .ok();

        Some(Project {
            name: project_dir
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
            path: project_dir.to_path_buf(),
            python_version,
            size: utils::calculate_dir_size(project_dir),
            last_modified,
            has_venv,
            has_lock,
        })
    }

    fn read_python_version(path: &Path) -> String {
        fs::read_to_string(path)
            .ok()
            .map(|content| content.trim().to_string())
            .filter(|version| !version.is_empty())
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }

    /// Provision `root/name` and rescan. Each step aborts the rest on failure;
    /// nothing is rolled back.
    pub fn create(&self, name: &str) -> Result<(Vec<Project>, String), RepositoryError> {
        let name = validate_name(name)?;
        let project_dir = self.root.join(&name);

        if project_dir.exists() {
            return Err(RepositoryError::AlreadyExists(name));
        }

        info!(project = %name, path = %project_dir.display(), "creating project");

        fs::create_dir_all(&project_dir)
            .map_err(|e| RepositoryError::io("could not create project directory", e))?;

        self.toolchain.create_environment(&project_dir)?;

        write_file(&project_dir, PYPROJECT_FILE, &pyproject_template(&name))?;

        let python_version = self
            .toolchain
            .interpreter_version(&project_dir)
            .unwrap_or_else(|| {
                warn!(project = %name, "could not detect python version, using fallback");
                FALLBACK_PYTHON_VERSION.to_string()
            });
        write_file(&project_dir, PYTHON_VERSION_FILE, &python_version)?;

        write_file(
            &project_dir,
            "README.md",
            &format!("# {}\n\nA new Python project created with TUV.\n", name),
        )?;
        write_file(&project_dir, "hello.py", HELLO_PY)?;

        let projects = self.scan()?;
        Ok((projects, name))
    }
}

/// Trimmed project name, rejected if it could escape the parent directory.
pub fn validate_name(name: &str) -> Result<String, RepositoryError> {
    let name = name.trim();
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');

    if invalid {
        return Err(RepositoryError::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}

fn write_file(dir: &Path, file: &str, content: &str) -> Result<(), RepositoryError> {
    fs::write(dir.join(file), content)
        .map_err(|e| RepositoryError::io(format!("could not write {}", file), e))
}

fn pyproject_template(name: &str) -> String {
    format!(
        r#"[project]
name = "{}"
version = "0.1.0"
description = "A new Python project"
readme = "README.md"
requires-python = ">=3.8"
license = {{text = "MIT"}}

[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"
"#,
        name
    )
}
