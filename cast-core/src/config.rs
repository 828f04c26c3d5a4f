//! Stream configuration: logical frame size, capture rate, stereo wait.
//! File: ~/.config/cubecast/config.toml or /etc/cubecast/config.toml.
//! Env overrides: CUBECAST_WIDTH, CUBECAST_HEIGHT, CUBECAST_CAPTURE_FPS,
//! CUBECAST_STEREO_WAIT_MS.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Logical stream width in pixels (default 1280). Stereo sessions
    /// allocate at double this width, side by side.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Logical stream height in pixels (default 720).
    #[serde(default = "default_height")]
    pub height: u32,
    /// Mono capture rate cap in frames per second (default 60).
    #[serde(default = "default_capture_fps")]
    pub capture_fps: u32,
    /// How long to wait for a client's stereo-rendering message before the
    /// stream starts in mono (default 5000 ms).
    #[serde(default = "default_stereo_wait_ms")]
    pub stereo_wait_ms: u64,
}

fn default_width() -> u32 {
    1280
}
fn default_height() -> u32 {
    720
}
fn default_capture_fps() -> u32 {
    60
}
fn default_stereo_wait_ms() -> u64 {
    5000
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            capture_fps: default_capture_fps(),
            stereo_wait_ms: default_stereo_wait_ms(),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> StreamConfig {
    let mut c = load_file().unwrap_or_else(StreamConfig::default);
    if let Ok(s) = std::env::var("CUBECAST_WIDTH") {
        if let Ok(v) = s.parse::<u32>() {
            c.width = v;
        }
    }
    if let Ok(s) = std::env::var("CUBECAST_HEIGHT") {
        if let Ok(v) = s.parse::<u32>() {
            c.height = v;
        }
    }
    if let Ok(s) = std::env::var("CUBECAST_CAPTURE_FPS") {
        if let Ok(v) = s.parse::<u32>() {
            c.capture_fps = v;
        }
    }
    if let Ok(s) = std::env::var("CUBECAST_STEREO_WAIT_MS") {
        if let Ok(v) = s.parse::<u64>() {
            c.stereo_wait_ms = v;
        }
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/cubecast/config.toml"));
    }
    out.push(PathBuf::from("/etc/cubecast/config.toml"));
    out
}

fn load_file() -> Option<StreamConfig> {
    for p in config_paths() {
        if p.exists() {
            if let Ok(s) = std::fs::read_to_string(&p) {
                if let Ok(c) = toml::from_str::<StreamConfig>(&s) {
                    return Some(c);
                }
            }
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = StreamConfig::default();
        assert_eq!(c.width, 1280);
        assert_eq!(c.height, 720);
        assert_eq!(c.capture_fps, 60);
        assert_eq!(c.stereo_wait_ms, 5000);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: StreamConfig = toml::from_str("width = 1920\nheight = 1080\n").unwrap();
        assert_eq!(c.width, 1920);
        assert_eq!(c.height, 1080);
        assert_eq!(c.capture_fps, 60);
        assert_eq!(c.stereo_wait_ms, 5000);
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(toml::from_str::<StreamConfig>("bitrate = 4000\n").is_err());
    }
}
