//! Host configuration.
//!
//! Settings for running the player on a desktop: where the music lives, where
//! the colour configuration endpoint listens, the debounce window and the log
//! file. Stored in the user's config directory (typically
//! ~/.config/wavdeck/config.toml) next to the file that stands in for the
//! device's persistent byte region.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::net::IpAddr;
use std::path::PathBuf;

use crate::constants::{DEBOUNCE_MS, LONG_PRESS_MS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_music_root")]
    pub music_root: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_log_file")]
    pub log_file: String,
    #[serde(default)]
    pub speaker: bool,
}

fn default_music_root() -> String {
    "~/Music".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_debounce_ms() -> u64 {
    DEBOUNCE_MS
}

fn default_log_file() -> String {
    "/tmp/wavdeck.log".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_music_root())
    }
}

impl Config {
    pub fn new(music_root: String) -> Self {
        Self {
            music_root,
            bind_address: default_bind_address(),
            port: default_port(),
            debounce_ms: default_debounce_ms(),
            log_file: default_log_file(),
            speaker: false,
        }
    }

    pub fn config_dir() -> Result<PathBuf, Box<dyn Error>> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join("wavdeck")
        } else {
            dirs::config_dir()
                .ok_or("Unable to find config directory")?
                .join("wavdeck")
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// File holding the persisted byte region (indicator colours)
    pub fn eeprom_path() -> Result<PathBuf, Box<dyn Error>> {
        Ok(Self::config_dir()?.join("eeprom.bin"))
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            // Return default config instead of error
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, Box<dyn Error>> {
        Ok(Self::config_path()?.exists())
    }

    /// Music root with `~` expanded
    pub fn music_root_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.music_root).as_ref())
    }

    pub fn log_file_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).as_ref())
    }

    /// Problems that would keep `play` from working as configured
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let root = self.music_root_path();
        if !root.is_dir() {
            problems.push(format!(
                "music_root {} is not a directory (the player will show NO CARD)",
                root.display()
            ));
        }
        if self.bind_address.parse::<IpAddr>().is_err() {
            problems.push(format!(
                "bind_address '{}' is not an IP address",
                self.bind_address
            ));
        }
        if self.port == 0 {
            problems.push("port 0 would pick a random port for the colour form".to_string());
        }
        if self.debounce_ms >= LONG_PRESS_MS {
            problems.push(format!(
                "debounce_ms {} swallows long presses ({LONG_PRESS_MS} ms)",
                self.debounce_ms
            ));
        }
        problems
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        match key {
            "music_root" => self.music_root = value.to_string(),
            "bind_address" => self.bind_address = value.to_string(),
            "port" => {
                self.port = value
                    .parse::<u16>()
                    .map_err(|_| "Value must be a port number (0-65535)")?;
            }
            "debounce_ms" => {
                self.debounce_ms = value
                    .parse::<u64>()
                    .map_err(|_| "Value must be a whole number of milliseconds")?;
            }
            "log_file" => self.log_file = value.to_string(),
            "speaker" => {
                self.speaker = value
                    .parse::<bool>()
                    .map_err(|_| "Value must be 'true' or 'false'")?;
            }
            _ => return Err(format!("Unknown configuration key: {key}").into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Use a mutex to ensure tests that modify environment variables don't run concurrently
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_config_default() {
        let config: Config = Default::default();
        assert_eq!(config.music_root, "~/Music");
        assert_eq!(config.port, 8080);
        assert_eq!(config.debounce_ms, DEBOUNCE_MS);
        assert!(!config.speaker);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("music_root = \"/media/card\"\nport = 9000\n").unwrap();
        assert_eq!(config.music_root, "/media/card");
        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.log_file, "/tmp/wavdeck.log");
    }

    #[test]
    fn test_music_root_expands_tilde() {
        let config = Config::new("~/Music".to_string());
        let path = config.music_root_path();
        assert!(!path.to_string_lossy().starts_with('~'));
        assert!(path.ends_with("Music"));
    }

    #[test]
    fn test_problems() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::new(temp.path().to_string_lossy().to_string());
        assert!(config.problems().is_empty());

        config.music_root = temp.path().join("absent").to_string_lossy().to_string();
        config.bind_address = "localhost:80".to_string();
        config.port = 0;
        config.debounce_ms = LONG_PRESS_MS;
        let problems = config.problems();
        assert_eq!(problems.len(), 4);
        assert!(problems[0].contains("NO CARD"));
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();

        config.set_value("music_root", "/media/card").unwrap();
        assert_eq!(config.music_root, "/media/card");

        config.set_value("port", "9090").unwrap();
        assert_eq!(config.port, 9090);
        assert!(config.set_value("port", "99999").is_err());

        config.set_value("debounce_ms", "250").unwrap();
        assert_eq!(config.debounce_ms, 250);

        config.set_value("speaker", "true").unwrap();
        assert!(config.speaker);
        assert!(config.set_value("speaker", "loud").is_err());

        // Test unknown key
        let result = config.set_value("unknown_key", "value");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let mut config = Config::new("/media/card".to_string());
        config.port = 9000;
        config.save().unwrap();

        // The path should be under temp_dir/wavdeck/config.toml
        let config_path = Config::config_path().unwrap();
        assert!(config_path.exists());
        assert!(config_path.starts_with(temp_dir.path().join("wavdeck")));
        assert_eq!(
            Config::eeprom_path().unwrap(),
            temp_dir.path().join("wavdeck").join("eeprom.bin")
        );

        let loaded = Config::load().unwrap();
        assert_eq!(loaded.music_root, "/media/card");
        assert_eq!(loaded.port, 9000);

        // Clean up - restore original value if it existed
        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }

    #[test]
    fn test_config_exists() {
        let _guard = ENV_MUTEX.lock().unwrap();

        let temp_dir = TempDir::new().unwrap();
        let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        }

        let expected_path = temp_dir.path().join("wavdeck").join("config.toml");
        assert!(!Config::exists().unwrap());

        Config::default().save().unwrap();

        assert!(expected_path.exists());
        assert!(Config::exists().unwrap());

        // Clean up - restore original value if it existed
        unsafe {
            if let Some(original) = original_xdg {
                std::env::set_var("XDG_CONFIG_HOME", original);
            } else {
                std::env::remove_var("XDG_CONFIG_HOME");
            }
        }
    }
}
