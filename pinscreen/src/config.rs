//! Configuration for the pinscreen binary.
//!
//! Values are resolved in order: built-in defaults, then the JSON config
//! file, then environment variables. Command-line flags are applied on top
//! by the binary.
//!
//! # Config File
//!
//! `<config dir>/pinscreen/config.json` unless a path is given explicitly.
//! A missing default file is skipped; a missing explicit file is an error.
//!
//! ```json
//! {
//!   "pin_length": 4,
//!   "reset_policy": "keep",
//!   "layout": [["1", "2", "3"], ["4", "5", "6"], ["7", "8", "9"], [null, "0", "back"]]
//! }
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PINSCREEN_PIN_LENGTH` | 5 | PIN length and indicator slot count |
//! | `PINSCREEN_KEY_VIBRATION` | true | Haptic pulse on key press |
//! | `PINSCREEN_SHAKE_VIBRATION` | true | Haptic pulse when the indicator shakes |
//! | `PINSCREEN_RESET_POLICY` | `clear-on-settle` | `clear-on-settle` or `keep` |
//! | `PINSCREEN_TAGLINE` | `Enter your PIN` | Header text |
//! | `PINSCREEN_FOOTER` | - | Footer text below the keyboard |
//! | `PINSCREEN_EXPECTED_PIN` | first digits of `1234567890` | PIN accepted by the demo |
//! | `PINSCREEN_ERROR_MESSAGE` | `Wrong PIN` | Banner text for a rejected PIN |
//! | `PINSCREEN_TICK_RATE_MS` | 16 | Animation frame interval |
//! | `PINSCREEN_LOG_FILE` | - | Write logs to this file while the UI runs |

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::DEFAULT_PIN_LENGTH;
use crate::keyboard::{KeyboardLayout, LayoutError};
use crate::screen::ScreenOptions;
use crate::types::ResetPolicy;

/// Default header text.
pub const DEFAULT_TAGLINE: &str = "Enter your PIN";

/// Default banner text for a rejected PIN.
pub const DEFAULT_ERROR_MESSAGE: &str = "Wrong PIN";

/// Default animation frame interval in milliseconds.
pub const DEFAULT_TICK_RATE_MS: u64 = 16;

/// Directory name under the platform config dir.
const CONFIG_DIR_NAME: &str = "pinscreen";

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.json";

/// Digits the default demo PIN is cut from.
const DEMO_PIN_DIGITS: &str = "1234567890";

/// Errors that can occur while resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A setting has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// The config file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for this schema.
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Failed to determine the platform config directory.
    #[error("failed to determine config directory")]
    NoConfigDirectory,
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// PIN length; also the number of indicator slots.
    pub pin_length: usize,

    /// Haptic pulse on every key press.
    pub key_vibration: bool,

    /// Haptic pulse when a shake starts.
    pub shake_vibration: bool,

    /// Buffer handling when a lockout ends.
    pub reset_policy: ResetPolicy,

    /// Header text above the indicator.
    pub tagline: String,

    /// Footer text; `None` hides the footer.
    pub footer: Option<String>,

    /// PIN the demo verifier accepts. `None` uses the first `pin_length`
    /// digits of `1234567890`.
    pub expected_pin: Option<String>,

    /// Banner text shown for a wrong PIN.
    pub error_message: String,

    /// Animation frame interval in milliseconds.
    pub tick_rate_ms: u64,

    /// Keyboard grid; `null` cells are blank and `"back"` is backspace.
    /// `None` uses the numeric pad.
    pub layout: Option<Vec<Vec<Option<String>>>>,

    /// Log file used while the screen owns the terminal.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pin_length: DEFAULT_PIN_LENGTH,
            key_vibration: true,
            shake_vibration: true,
            reset_policy: ResetPolicy::default(),
            tagline: DEFAULT_TAGLINE.to_string(),
            footer: None,
            expected_pin: None,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            layout: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Resolves defaults, the config file and the environment.
    ///
    /// With `path = None` the default location is tried and silently
    /// skipped when absent.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or parsed, an
    /// environment variable holds an invalid value, or the result fails
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Ok(path) if path.is_file() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the environment only.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pinscreen::config::Config;
    ///
    /// std::env::set_var("PINSCREEN_PIN_LENGTH", "4");
    /// let config = Config::from_env().unwrap();
    /// assert_eq!(config.pin_length, 4);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `<config dir>/pinscreen/config.json`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::NoConfigDirectory)?;
        Ok(base_dirs
            .config_dir()
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Overrides fields from `PINSCREEN_*` variables.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = env::var("PINSCREEN_PIN_LENGTH") {
            self.pin_length = parse_positive("PINSCREEN_PIN_LENGTH", &val)? as usize;
        }
        if let Ok(val) = env::var("PINSCREEN_KEY_VIBRATION") {
            self.key_vibration = parse_bool("PINSCREEN_KEY_VIBRATION", &val)?;
        }
        if let Ok(val) = env::var("PINSCREEN_SHAKE_VIBRATION") {
            self.shake_vibration = parse_bool("PINSCREEN_SHAKE_VIBRATION", &val)?;
        }
        if let Ok(val) = env::var("PINSCREEN_RESET_POLICY") {
            self.reset_policy = val
                .parse()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "PINSCREEN_RESET_POLICY".to_string(),
                    message,
                })?;
        }
        if let Ok(val) = env::var("PINSCREEN_TAGLINE") {
            self.tagline = val;
        }
        if let Ok(val) = env::var("PINSCREEN_FOOTER") {
            self.footer = Some(val).filter(|s| !s.is_empty());
        }
        if let Ok(val) = env::var("PINSCREEN_EXPECTED_PIN") {
            self.expected_pin = Some(val);
        }
        if let Ok(val) = env::var("PINSCREEN_ERROR_MESSAGE") {
            self.error_message = val;
        }
        if let Ok(val) = env::var("PINSCREEN_TICK_RATE_MS") {
            self.tick_rate_ms = parse_positive("PINSCREEN_TICK_RATE_MS", &val)?;
        }
        if let Ok(val) = env::var("PINSCREEN_LOG_FILE") {
            self.log_file = Some(PathBuf::from(val)).filter(|p| !p.as_os_str().is_empty());
        }
        Ok(())
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pin_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pin_length".to_string(),
                message: "PIN length must be greater than 0".to_string(),
            });
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "tick_rate_ms".to_string(),
                message: "tick rate must be greater than 0".to_string(),
            });
        }
        if let Some(pin) = &self.expected_pin {
            let length = pin.chars().count();
            if length != self.pin_length {
                return Err(ConfigError::InvalidValue {
                    key: "expected_pin".to_string(),
                    message: format!(
                        "expected PIN has {length} characters but pin_length is {}",
                        self.pin_length
                    ),
                });
            }
        }
        if let Some(grid) = &self.layout {
            KeyboardLayout::from_grid(grid).map_err(|err| layout_error("layout", err))?;
        }
        Ok(())
    }

    /// Keyboard layout from `layout`, or the numeric pad.
    pub fn keyboard_layout(&self) -> Result<KeyboardLayout, LayoutError> {
        match &self.layout {
            Some(grid) => KeyboardLayout::from_grid(grid),
            None => Ok(KeyboardLayout::numeric()),
        }
    }

    /// Coordinator options derived from this configuration.
    pub fn screen_options(&self) -> ScreenOptions {
        ScreenOptions {
            max_length: self.pin_length,
            key_vibration: self.key_vibration,
            reset_policy: self.reset_policy,
        }
    }

    /// The PIN the demo verifier accepts.
    pub fn demo_pin(&self) -> String {
        match &self.expected_pin {
            Some(pin) => pin.clone(),
            None => DEMO_PIN_DIGITS.chars().cycle().take(self.pin_length).collect(),
        }
    }

    /// Frame interval as a [`Duration`].
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

fn layout_error(key: &str, err: LayoutError) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: err.to_string(),
    }
}

fn parse_positive(key: &str, val: &str) -> Result<u64, ConfigError> {
    let n = val
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected positive integer, got '{val}'"),
        })?;
    if n == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "value must be greater than 0".to_string(),
        });
    }
    Ok(n)
}

fn parse_bool(key: &str, val: &str) -> Result<bool, ConfigError> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected true or false, got '{val}'"),
        }),
    }
}
