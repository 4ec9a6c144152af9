//! Server configuration loaded from YAML; every key has a default so the
//! server runs with no config file at all.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Directory holding uploaded videos.
    #[serde(default = "default_video_directory")]
    pub video_directory: PathBuf,
    /// Directory holding uploaded images.
    #[serde(default = "default_image_directory")]
    pub image_directory: PathBuf,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Slideshow playlist artifact; overwritten on every screensaver start.
    #[serde(default = "default_playlist_path")]
    pub playlist_path: PathBuf,
    /// Seconds each slideshow image stays on screen.
    #[serde(default = "default_image_duration")]
    pub image_duration_secs: u32,
    /// Explicit player executable, overriding platform resolution.
    #[serde(default)]
    pub player_command: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_directory: default_video_directory(),
            image_directory: default_image_directory(),
            bind_address: default_bind_address(),
            port: default_port(),
            playlist_path: default_playlist_path(),
            image_duration_secs: default_image_duration(),
            player_command: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let cfg: Config = serde_yaml::from_slice(&data)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        Ok(cfg)
    }

    /// Absolutize the media directories so containment checks compare
    /// against a stable absolute root.
    #[must_use]
    pub fn absolutized(mut self) -> Self {
        self.video_directory = paths::lexical_absolute(&self.video_directory);
        self.image_directory = paths::lexical_absolute(&self.image_directory);
        self.playlist_path = paths::lexical_absolute(&self.playlist_path);
        self
    }
}

fn default_video_directory() -> PathBuf {
    PathBuf::from("videos")
}

fn default_image_directory() -> PathBuf {
    PathBuf::from("images")
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_playlist_path() -> PathBuf {
    std::env::temp_dir().join("slideshow.m3u")
}

fn default_image_duration() -> u32 {
    5
}
