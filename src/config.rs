use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::warn;
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "roosty_notifier";

/// The only thing we remember between runs is which sound was picked.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_path: Option<PathBuf>,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// missing or broken config files just give the defaults
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let config = match fs::read_to_string(path) {
            Ok(config) => config,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!("couldn't read config file {}: {e}", path.display());
                return Self::default();
            }
        };
        toml::from_str(&config).unwrap_or_else(|e| {
            warn!("couldn't parse config file {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let config = toml::to_string(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, config)
    }

    /// the configured sound, or the built in chime
    #[must_use]
    pub fn sound(&self) -> PathBuf {
        self.sound_path
            .clone()
            .unwrap_or_else(Self::default_chime_path)
    }

    #[must_use]
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("", "", APP_NAME).map_or_else(
            || PathBuf::from("config.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }

    #[must_use]
    pub fn sounds_path() -> PathBuf {
        directories::ProjectDirs::from("", "", APP_NAME).map_or_else(
            || PathBuf::from("sounds"),
            |dirs| dirs.data_dir().join("sounds"),
        )
    }

    #[must_use]
    pub fn default_chime_path() -> PathBuf {
        Self::sounds_path().join("default_chime.wav")
    }

    #[must_use]
    pub fn is_config_present(path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml"));
        assert_eq!(config, Config::new());
        assert_eq!(config.sound(), Config::default_chime_path());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "sound_path = [not toml").unwrap();
        assert_eq!(Config::load(&path), Config::default());

        fs::write(&path, "sound_path = 7").unwrap();
        assert_eq!(Config::load(&path), Config::default());
    }

    #[test]
    fn sound_path_survives_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            sound_path: Some(PathBuf::from("/music/bell.mp3")),
        };
        config.save(&path).unwrap();
        assert!(Config::is_config_present(&path));
        let loaded = Config::load(&path);
        assert_eq!(loaded, config);
        assert_eq!(loaded.sound(), PathBuf::from("/music/bell.mp3"));
    }

    #[test]
    fn file_holds_a_single_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config {
            sound_path: Some(PathBuf::from("bell.wav")),
        }
        .save(&path)
        .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap().trim(),
            r#"sound_path = "bell.wav""#
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "sound_path = \"a.wav\"\ntheme = \"Dark\"\n").unwrap();
        assert_eq!(Config::load(&path).sound(), PathBuf::from("a.wav"));
    }
}
