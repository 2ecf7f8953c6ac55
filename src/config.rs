//! Session configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What to do with X11 mouse coordinates outside the single-byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum X11Overflow {
    /// Pin the coordinate to the largest encodable value.
    #[default]
    Clamp,
    /// Turn the whole report into an `ERROR` event.
    Reject,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Columns to assume when the terminal size cannot be queried
    pub fallback_width: u16,
    /// Rows to assume when the terminal size cannot be queried
    pub fallback_height: u16,
    /// Enable mouse tracking when the session starts
    pub mouse: bool,
    /// Policy for X11 coordinates beyond 223
    pub x11_overflow: X11Overflow,
    /// Rows at the top of a popup that act as its drag handle
    pub popup_header_rows: u16,
    /// Longest SGR field section accepted before the frame is malformed
    pub max_sgr_len: usize,
    /// Write the mouse-disable sequence from a panic hook
    pub restore_on_panic: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_width: 80,
            fallback_height: 24,
            mouse: true,
            x11_overflow: X11Overflow::Clamp,
            popup_header_rows: 1,
            max_sgr_len: 32,
            restore_on_panic: true,
        }
    }
}

impl Config {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.fallback_width, 80);
        assert_eq!(config.fallback_height, 24);
        assert_eq!(config.x11_overflow, X11Overflow::Clamp);
        assert_eq!(config.popup_header_rows, 1);
    }

    #[test]
    fn test_partial_json() {
        let config = Config::from_json(r#"{"x11_overflow":"reject","mouse":false}"#).unwrap();
        assert_eq!(config.x11_overflow, X11Overflow::Reject);
        assert!(!config.mouse);
        assert_eq!(config.max_sgr_len, 32);
    }

    #[test]
    fn test_bad_json() {
        assert!(Config::from_json("{not json").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
