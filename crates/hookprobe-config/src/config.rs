use crate::toolkit::ToolkitTables;
use crate::venv_paths::{self, VenvPathError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding an explicit config file path
pub const CONFIG_ENV: &str = "HOOKPROBE_CONFIG";

/// Child queries are killed after this many seconds unless configured otherwise
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// File name patterns of platform shared libraries
pub const DEFAULT_BINARY_PATTERNS: &[&str] = &["*.so", "*.dll", "*.dylib"];

const KEYS: &[&str] = &[
    "python",
    "venv-path",
    "search-paths",
    "script-dir",
    "timeout-secs",
    "binary-patterns",
    "qmake",
];

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
    NoHomeDir,
    UnknownKey(String),
    InvalidValue { key: String, value: String },
    PythonNotFound(String),
    Venv(VenvPathError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse config: {}", e),
            ConfigError::Serialize(e) => write!(f, "Failed to serialize config: {}", e),
            ConfigError::NoHomeDir => write!(f, "Could not determine home directory"),
            ConfigError::UnknownKey(key) => {
                write!(f, "Unknown config key '{}' (expected one of: {})", key, KEYS.join(", "))
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value '{}' for config key '{}'", value, key)
            }
            ConfigError::PythonNotFound(msg) => write!(f, "Python interpreter not found: {}", msg),
            ConfigError::Venv(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

impl From<VenvPathError> for ConfigError {
    fn from(e: VenvPathError) -> Self {
        ConfigError::Venv(e)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Interpreter used for child queries (path or command name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python: Option<String>,
    /// Virtual environment whose interpreter is used when `python` is unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venv_path: Option<String>,
    /// Extra module search path entries for every child query
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<String>,
    /// Directory of helper scripts the engine may run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qmake: Option<String>,
    #[serde(default, skip_serializing_if = "ToolkitTables::is_default")]
    pub toolkit: ToolkitTables,
}

impl Config {
    /// Location of the config file
    ///
    /// `HOOKPROBE_CONFIG` wins when set and non-empty; otherwise the
    /// platform config directory.
    pub fn path() -> Result<PathBuf, ConfigError> {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let default = dirs::home_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join(".config")
            .join("hookprobe")
            .join("hookprobe.toml");

        #[cfg(target_os = "windows")]
        let default = dirs::config_dir()
            .ok_or(ConfigError::NoHomeDir)?
            .join("hookprobe")
            .join("hookprobe.toml");

        Ok(default)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "python" => self.python.clone(),
            "venv-path" => self.venv_path.clone(),
            "search-paths" => {
                if self.search_paths.is_empty() {
                    None
                } else {
                    Some(self.search_paths.join(","))
                }
            }
            "script-dir" => self.script_dir.clone(),
            "timeout-secs" => self.timeout_secs.map(|t| t.to_string()),
            "binary-patterns" => self.binary_patterns.as_ref().map(|p| p.join(",")),
            "qmake" => self.qmake.clone(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Set a key from its string form; list keys take comma-separated values
    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigError> {
        match key {
            "python" => self.python = Some(value),
            "venv-path" => {
                if !venv_paths::is_venv(Path::new(value.trim())) {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value,
                    });
                }
                self.venv_path = Some(value.trim().to_string());
            }
            "search-paths" => self.search_paths = split_list(&value),
            "script-dir" => self.script_dir = Some(value),
            "timeout-secs" => {
                let secs = value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                })?;
                self.timeout_secs = Some(secs);
            }
            "binary-patterns" => {
                let patterns = split_list(&value);
                if patterns.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value,
                    });
                }
                self.binary_patterns = Some(patterns);
            }
            "qmake" => self.qmake = Some(value),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.python.is_none()
            && self.venv_path.is_none()
            && self.search_paths.is_empty()
            && self.script_dir.is_none()
            && self.timeout_secs.is_none()
            && self.binary_patterns.is_none()
            && self.qmake.is_none()
            && self.toolkit.is_default()
    }

    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| match self.get(key) {
                Ok(Some(value)) => Some((*key, value)),
                _ => None,
            })
            .collect()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn binary_patterns(&self) -> Vec<String> {
        self.binary_patterns.clone().unwrap_or_else(|| {
            DEFAULT_BINARY_PATTERNS
                .iter()
                .map(|p| (*p).to_string())
                .collect()
        })
    }

    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.search_paths.iter().map(PathBuf::from).collect()
    }

    /// Pick the interpreter for child queries
    ///
    /// Order: explicit `python` (a path, or a command looked up on PATH),
    /// the venv's interpreter, then `python3`/`python` on PATH.
    pub fn resolve_python(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref python) = self.python {
            let as_path = Path::new(python);
            if as_path.components().count() > 1 {
                if as_path.is_file() {
                    return Ok(as_path.to_path_buf());
                }
                return Err(ConfigError::PythonNotFound(python.clone()));
            }
            return which::which(python)
                .map_err(|e| ConfigError::PythonNotFound(format!("{}: {}", python, e)));
        }

        if let Some(ref venv) = self.venv_path {
            return Ok(venv_paths::resolve_python_exe(Path::new(venv))?);
        }

        ["python3", "python"]
            .iter()
            .find_map(|cmd| which::which(cmd).ok())
            .ok_or_else(|| {
                ConfigError::PythonNotFound(
                    "no `python3` or `python` on PATH; set `python` or `venv-path`".to_string(),
                )
            })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.is_empty());
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.binary_patterns(), vec!["*.so", "*.dll", "*.dylib"]);
    }

    #[test]
    fn test_set_and_get_list_keys() {
        let mut config = Config::default();
        assert!(config
            .set("search-paths", "/opt/a, /opt/b,".to_string())
            .is_ok());
        assert_eq!(config.search_paths(), vec![PathBuf::from("/opt/a"), PathBuf::from("/opt/b")]);
        assert!(config.get("search-paths").is_ok_and(|v| v.as_deref() == Some("/opt/a,/opt/b")));

        assert!(config.set("binary-patterns", "*.so,*.pyd".to_string()).is_ok());
        assert_eq!(config.binary_patterns(), vec!["*.so", "*.pyd"]);
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("timeout-secs", "soon".to_string()),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("binary-patterns", " , ".to_string()),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("colour", "blue".to_string()),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join("nested").join("hookprobe.toml");

        let mut config = Config::default();
        let _ = config.set("python", "/usr/bin/python3".to_string());
        let _ = config.set("timeout-secs", "30".to_string());
        assert!(config.save_to(&path).is_ok());

        let loaded = Config::load_from(&path);
        assert!(loaded.is_ok_and(|c| c == config));
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let loaded = Config::load_from(Path::new("/tmp/hookprobe_missing_config_12345.toml"));
        assert!(loaded.is_ok_and(|c| c.is_empty()));
    }

    #[test]
    fn test_values_iter_lists_only_set_keys() {
        let mut config = Config::default();
        let _ = config.set("qmake", "/usr/bin/qmake".to_string());
        let values = config.values_iter();
        assert_eq!(values, vec![("qmake", "/usr/bin/qmake".to_string())]);
    }

    #[test]
    fn test_resolve_python_missing_explicit_path() {
        let config = Config {
            python: Some("/tmp/hookprobe_missing/bin/python3".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_python(),
            Err(ConfigError::PythonNotFound(_))
        ));
    }

    #[test]
    fn test_resolve_python_from_venv() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let bin_dir = temp_dir.path().join(venv_paths::PYTHON_BIN_DIR);
        let _ = fs::create_dir_all(&bin_dir);
        #[cfg(not(windows))]
        let exe = bin_dir.join("python3");
        #[cfg(windows)]
        let exe = bin_dir.join("python.exe");
        let _ = fs::write(&exe, "");

        let config = Config {
            venv_path: Some(temp_dir.path().to_string_lossy().to_string()),
            ..Default::default()
        };
        assert!(config.resolve_python().is_ok_and(|p| p == exe));
    }

    #[test]
    fn test_set_venv_path_requires_venv() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let mut config = Config::default();
        let plain = temp_dir.path().to_string_lossy().to_string();
        assert!(matches!(
            config.set("venv-path", plain.clone()),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(config.venv_path.is_none());

        let _ = fs::write(temp_dir.path().join(venv_paths::PYVENV_CFG), "home = /usr/bin\n");
        assert!(config.set("venv-path", plain.clone()).is_ok());
        assert_eq!(config.venv_path, Some(plain));
    }
}
