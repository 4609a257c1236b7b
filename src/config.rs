use std::{
    fs, io,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::{error::ConfigError, utils};

pub const DEFAULT_TOOL: &str = "uv";
const WRITE_PROBE: &str = ".tuv_write_test";

/// Persisted settings. Owned by the session, never shared globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_parent_directory")]
    pub parent_directory: PathBuf,

    /// Program used to provision environments.
    #[serde(default = "default_tool")]
    pub tool: String,

    #[serde(skip)]
    location: PathBuf,
}

fn default_parent_directory() -> PathBuf {
    default_root().unwrap_or_default()
}

fn default_tool() -> String {
    DEFAULT_TOOL.to_string()
}

/// `~/projects`
pub fn default_root() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join("projects"))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// `~/.config/tuv/config.toml`
pub fn default_location() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".config").join("tuv").join("config.toml"))
        .ok_or(ConfigError::NoHomeDirectory)
}

impl Config {
    pub fn with_defaults(location: PathBuf) -> Self {
        Self {
            parent_directory: default_parent_directory(),
            tool: default_tool(),
            location,
        }
    }

    /// Load the settings file. The flag is true when neither it nor a legacy
    /// `config.yaml` beside it exists, in which case nothing is written until
    /// the first save.
    pub fn load(location: &Path) -> Result<(Self, bool), ConfigError> {
        let content = match fs::read_to_string(location) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if let Some(config) = Self::load_legacy(location)? {
                    return Ok((config, false));
                }
                info!(path = %location.display(), "no configuration yet, starting first run setup");
                return Ok((Self::with_defaults(location.to_path_buf()), true));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: location.to_path_buf(),
                    source,
                })
            }
        };

        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: location.to_path_buf(),
            source,
        })?;
        config.location = location.to_path_buf();

        Ok((config, false))
    }

    /// Settings written by earlier releases as YAML. They are carried over
    /// as-is and land in `location` on the next save.
    fn load_legacy(location: &Path) -> Result<Option<Self>, ConfigError> {
        let legacy = location.with_extension("yaml");
        let content = match fs::read_to_string(&legacy) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ConfigError::Read { path: legacy, source }),
        };

        let mut config: Config =
            serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::LegacyParse {
                path: legacy.clone(),
                source,
            })?;
        config.location = location.to_path_buf();

        info!(path = %legacy.display(), "using legacy configuration");
        Ok(Some(config))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.location.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write(e.to_string()))?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Write(e.to_string()))?;
        fs::write(&self.location, content).map_err(|e| ConfigError::Write(e.to_string()))?;

        info!(path = %self.location.display(), "configuration saved");
        Ok(())
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Validate `input` as the parent directory and persist it. The stored
    /// value only changes once the file has been written.
    pub fn adopt_parent_directory(&mut self, input: &str) -> Result<PathBuf, ConfigError> {
        let root = utils::expand_home(input)?;
        self.adopt_path(&root)
    }

    pub fn adopt_path(&mut self, root: &Path) -> Result<PathBuf, ConfigError> {
        let root = prepare_dir(root)?;

        let mut updated = self.clone();
        updated.parent_directory = root.clone();
        updated.save()?;

        *self = updated;
        Ok(root)
    }
}

/// Create `root` if missing and probe it for writability.
pub fn prepare_dir(root: &Path) -> Result<PathBuf, ConfigError> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(root).map_err(ConfigError::CreateDir)?;
            fs::metadata(root).map_err(ConfigError::Access)?
        }
        Err(err) => return Err(ConfigError::Access(err)),
    };

    if !metadata.is_dir() {
        return Err(ConfigError::NotADirectory);
    }

    let probe = root.join(WRITE_PROBE);
    fs::write(&probe, b"test").map_err(ConfigError::NotWritable)?;
    if let Err(err) = fs::remove_file(&probe) {
        warn!(path = %probe.display(), %err, "could not remove write probe");
    }

    Ok(root.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_first_run() {
        let temp_dir = tempdir().unwrap();
        let location = temp_dir.path().join("tuv").join("config.toml");

        let (config, first_run) = Config::load(&location).unwrap();

        assert!(first_run);
        assert_eq!(config.tool, DEFAULT_TOOL);
        assert!(!location.exists());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = tempdir().unwrap();
        let location = temp_dir.path().join("tuv").join("config.toml");

        let mut config = Config::with_defaults(location.clone());
        config.parent_directory = temp_dir.path().join("code");
        config.save().unwrap();

        let (loaded, first_run) = Config::load(&location).unwrap();
        assert!(!first_run);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let temp_dir = tempdir().unwrap();
        let location = temp_dir.path().join("config.toml");
        fs::write(&location, "parent_directory = \"/srv/py\"\n").unwrap();

        let (config, _) = Config::load(&location).unwrap();
        assert_eq!(config.parent_directory, PathBuf::from("/srv/py"));
        assert_eq!(config.tool, DEFAULT_TOOL);
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let location = temp_dir.path().join("config.toml");
        fs::write(&location, "parent_directory = [").unwrap();

        assert!(matches!(Config::load(&location), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_legacy_yaml_is_read_when_toml_is_missing() {
        let temp_dir = tempdir().unwrap();
        let location = temp_dir.path().join("config.toml");
        fs::write(temp_dir.path().join("config.yaml"), "parent_directory: /srv/legacy\n").unwrap();

        let (mut config, first_run) = Config::load(&location).unwrap();
        assert!(!first_run);
        assert_eq!(config.parent_directory, PathBuf::from("/srv/legacy"));
        assert_eq!(config.tool, DEFAULT_TOOL);
        assert_eq!(config.location(), location.as_path());

        config.save().unwrap();
        let (reloaded, _) = Config::load(&location).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_toml_wins_over_legacy_yaml() {
        let temp_dir = tempdir().unwrap();
        let location = temp_dir.path().join("config.toml");
        fs::write(&location, "parent_directory = \"/srv/new\"\n").unwrap();
        fs::write(temp_dir.path().join("config.yaml"), "parent_directory: /srv/legacy\n").unwrap();

        let (config, _) = Config::load(&location).unwrap();
        assert_eq!(config.parent_directory, PathBuf::from("/srv/new"));
    }

    #[test]
    fn test_broken_legacy_yaml_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let location = temp_dir.path().join("config.toml");
        fs::write(temp_dir.path().join("config.yaml"), "parent_directory: [").unwrap();

        assert!(matches!(Config::load(&location), Err(ConfigError::LegacyParse { .. })));
    }

    #[test]
    fn test_prepare_dir_creates_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let target = temp_dir.path().join("a").join("b");

        let root = prepare_dir(&target).unwrap();

        assert_eq!(root, target);
        assert!(target.is_dir());
        assert!(!target.join(WRITE_PROBE).exists());
    }

    #[test]
    fn test_prepare_dir_rejects_regular_file() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("notes.txt");
        fs::write(&file, "x").unwrap();

        assert!(matches!(prepare_dir(&file), Err(ConfigError::NotADirectory)));
    }

    #[test]
    fn test_adopt_keeps_old_value_on_failure() {
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("notes.txt");
        fs::write(&file, "x").unwrap();

        let mut config = Config::with_defaults(temp_dir.path().join("config.toml"));
        let before = config.parent_directory.clone();

        assert!(config.adopt_parent_directory(file.to_str().unwrap()).is_err());
        assert_eq!(config.parent_directory, before);
        assert!(!config.location().exists());
    }
}
