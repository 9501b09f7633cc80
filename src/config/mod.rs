use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::lyrics::{ParseOptions, WriteOptions};

pub mod defaults;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub lyrics: LyricsConfig,
    pub output: OutputConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsConfig {
    /// `auto`, `lrc`, `ass` or `srt`
    pub default_format: String,
    /// Lines parsed between two yields of the async parsers
    pub chunk_size: usize,
    /// Merge LRC lines that share a start time into one event
    pub merge_duplicate_start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Format used by `convert` when `--to` is not given
    pub target_format: String,
    /// Seconds the last SRT/ASS cue stays visible
    pub trailing_duration: f64,
    pub pretty_json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub context_before: usize,
    pub context_after: usize,
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            default_format: "auto".to_string(),
            chunk_size: 100,
            merge_duplicate_start: true,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            target_format: "lrc".to_string(),
            trailing_duration: 5.0,
            pretty_json: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            context_before: 2,
            context_after: 2,
        }
    }
}

impl LyricsConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            chunk_size: self.chunk_size.max(1),
            merge_duplicate_start: self.merge_duplicate_start,
        }
    }
}

impl OutputConfig {
    pub fn write_options(&self) -> WriteOptions {
        let trailing = if self.trailing_duration.is_finite() && self.trailing_duration >= 0.0 {
            self.trailing_duration
        } else {
            WriteOptions::default().trailing_duration
        };
        WriteOptions {
            trailing_duration: trailing,
        }
    }
}

pub fn save(cfg: &Config, override_path: Option<&Path>) -> anyhow::Result<()> {
    let path = resolve_path(override_path)?;
    write_config(cfg, &path)
}

fn write_config(cfg: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    let raw = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, raw).with_context(|| format!("write {}", path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from("dev", "lyricist", "lyricist")
        .context("ProjectDirs unavailable")?;
    Ok(proj.config_dir().join("config.toml"))
}

pub fn resolve_path(override_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match override_path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

pub fn load(override_path: Option<&Path>) -> anyhow::Result<Config> {
    let path = resolve_path(override_path)?;

    if !path.exists() {
        let cfg = defaults::defaults();
        write_config(&cfg, &path).context("write default config")?;
        tracing::debug!(path = %path.display(), "created default config");
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    from_toml(&raw).with_context(|| format!("parse {}", path.display()))
}

pub fn from_toml(raw: &str) -> anyhow::Result<Config> {
    let cfg = toml::from_str::<Config>(raw)?;
    Ok(cfg)
}
