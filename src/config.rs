use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::SyncError;
use crate::sync::SyncOptions;

/// Configuration defaults that can be saved to a file.  Command-line
/// arguments are merged on top, so the file only needs the values the user
/// wants to stop repeating.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub like: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_duplicates: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<bool>,
}

impl Config {
    /// Create a new empty config
    pub fn new() -> Self {
        Config::default()
    }

    /// Get the config file path (~/.config/tracksync/defaults.toml)
    pub fn get_config_path() -> Result<PathBuf, SyncError> {
        let home = std::env::var("HOME")
            .map_err(|_| SyncError::Config("HOME environment variable not set".to_string()))?;

        let config_dir = Path::new(&home).join(".config").join("tracksync");
        Ok(config_dir.join("defaults.toml"))
    }

    /// Load config from file; a missing file is an empty config.
    pub fn load() -> Result<Self, SyncError> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| SyncError::Config(format!("{}: {e}", config_path.display())))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<(), SyncError> {
        let config_path = Self::get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_string =
            toml::to_string_pretty(self).map_err(|e| SyncError::Config(e.to_string()))?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    /// Merge this config with another, preferring values from other
    pub fn merge(&mut self, other: &Config) {
        if other.file.is_some() {
            self.file = other.file.clone();
        }
        if other.playlist.is_some() {
            self.playlist = other.playlist.clone();
        }
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir.clone();
        }
        if other.token.is_some() {
            self.token = other.token.clone();
        }
        if other.like.is_some() {
            self.like = other.like;
        }
        if other.clear.is_some() {
            self.clear = other.clear;
        }
        if other.forward.is_some() {
            self.forward = other.forward;
        }
        if other.keep_duplicates.is_some() {
            self.keep_duplicates = other.keep_duplicates;
        }
        if other.interactive.is_some() {
            self.interactive = other.interactive;
        }
        if other.resume.is_some() {
            self.resume = other.resume;
        }
    }
}

/// Fully resolved settings for one run, defaults applied.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: PathBuf,
    pub playlist: String,
    pub cache_dir: PathBuf,
    pub token: Option<String>,
    pub like: bool,
    pub clear: bool,
    pub forward: bool,
    pub keep_duplicates: bool,
    pub interactive: bool,
    pub resume: bool,
}

impl RunOptions {
    /// Resolve a merged config into run options.  The source file is the
    /// only setting with no default.
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let source = config
            .file
            .as_ref()
            .ok_or_else(|| SyncError::Config("no source file given (--file)".to_string()))?;

        Ok(RunOptions {
            source: PathBuf::from(source),
            playlist: config
                .playlist
                .clone()
                .unwrap_or_else(|| "VK2YA".to_string()),
            cache_dir: PathBuf::from(config.cache_dir.as_deref().unwrap_or(".")),
            token: config.token.clone(),
            like: config.like.unwrap_or(false),
            clear: config.clear.unwrap_or(false),
            forward: config.forward.unwrap_or(false),
            keep_duplicates: config.keep_duplicates.unwrap_or(false),
            interactive: config.interactive.unwrap_or(false),
            resume: config.resume.unwrap_or(false),
        })
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            like: self.like,
            forward: self.forward,
            keep_duplicates: self.keep_duplicates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            playlist: Some("from-file".to_string()),
            like: Some(false),
            ..Default::default()
        };
        let cli = Config {
            playlist: Some("from-cli".to_string()),
            resume: Some(true),
            ..Default::default()
        };
        base.merge(&cli);

        assert_eq!(base.playlist.as_deref(), Some("from-cli"));
        assert_eq!(base.like, Some(false));
        assert_eq!(base.resume, Some(true));
    }

    #[test]
    fn test_run_options_defaults() {
        let config = Config {
            file: Some("tracks.csv".to_string()),
            ..Default::default()
        };
        let options = RunOptions::from_config(&config).unwrap();

        assert_eq!(options.playlist, "VK2YA");
        assert_eq!(options.cache_dir, PathBuf::from("."));
        assert!(!options.like && !options.clear && !options.resume);
    }

    #[test]
    fn test_run_options_require_source() {
        assert!(matches!(
            RunOptions::from_config(&Config::default()),
            Err(SyncError::Config(_))
        ));
    }
}
