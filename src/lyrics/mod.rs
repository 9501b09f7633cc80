//! Lyrics parsing and serialization
//!
//! This module provides:
//! - Format detection for LRC, SRT and ASS text
//! - Synchronous parsers producing plain timed lines
//! - Chunked async parsers producing karaoke/bilingual events (LRC, ASS)
//! - Serializers back to each format
//! - Playback position lookups

pub mod ass;
pub mod cursor;
pub mod detect;
pub mod lrc;
pub mod srt;
pub mod timecode;
pub mod types;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use detect::detect_format;
pub use types::{KaraokeMarker, LyricEvent, LyricLine, ParsedLyrics};

/// A supported lyrics file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LyricsFormat {
    Lrc,
    Ass,
    Srt,
}

impl LyricsFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            LyricsFormat::Lrc => "lrc",
            LyricsFormat::Ass => "ass",
            LyricsFormat::Srt => "srt",
        }
    }
}

impl fmt::Display for LyricsFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LyricsFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lrc" => Ok(LyricsFormat::Lrc),
            "ass" | "ssa" => Ok(LyricsFormat::Ass),
            "srt" => Ok(LyricsFormat::Srt),
            other => anyhow::bail!("unsupported lyrics format: {other:?}"),
        }
    }
}

/// Which format to parse as: a fixed one, or detect from the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
    #[default]
    Auto,
    Exact(LyricsFormat),
}

impl FormatHint {
    pub fn resolve(self, content: &str) -> LyricsFormat {
        match self {
            FormatHint::Auto => detect_format(content),
            FormatHint::Exact(format) => format,
        }
    }
}

impl From<LyricsFormat> for FormatHint {
    fn from(format: LyricsFormat) -> Self {
        FormatHint::Exact(format)
    }
}

impl FromStr for FormatHint {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(FormatHint::Auto)
        } else {
            s.parse().map(FormatHint::Exact)
        }
    }
}

/// Tuning for the chunked parsers.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// Lines handled between two yields to the runtime
    pub chunk_size: usize,
    /// Merge LRC lines whose first timestamp is identical into one event
    pub merge_duplicate_start: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            chunk_size: 100,
            merge_duplicate_start: true,
        }
    }
}

/// Tuning for the serializers.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    /// How long the last SRT/ASS cue stays on screen, in seconds
    pub trailing_duration: f64,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            trailing_duration: 5.0,
        }
    }
}

/// Strip a BOM; whitespace-only content counts as no content.
fn prepare(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    (!content.trim().is_empty()).then_some(content)
}

/// Parse lyrics into plain timed lines, sorted by time.
pub fn parse(content: &str, hint: FormatHint) -> Vec<LyricLine> {
    let Some(content) = prepare(content) else {
        return Vec::new();
    };
    match hint.resolve(content) {
        LyricsFormat::Lrc => lrc::parse(content),
        LyricsFormat::Ass => ass::parse(content),
        LyricsFormat::Srt => srt::parse(content),
    }
}

/// Parse lyrics with the rich parsers where one exists (LRC, ASS).
/// Other formats come back as plain lines.
pub async fn parse_async(content: &str, hint: FormatHint) -> ParsedLyrics {
    parse_async_with(content, hint, &ParseOptions::default()).await
}

pub async fn parse_async_with(
    content: &str,
    hint: FormatHint,
    opts: &ParseOptions,
) -> ParsedLyrics {
    let Some(content) = prepare(content) else {
        return ParsedLyrics::Events(Vec::new());
    };
    match hint.resolve(content) {
        LyricsFormat::Lrc => ParsedLyrics::Events(lrc::parse_chunked(content, opts).await),
        LyricsFormat::Ass => ParsedLyrics::Events(ass::parse_chunked(content, opts).await),
        LyricsFormat::Srt => ParsedLyrics::Lines(srt::parse(content)),
    }
}

/// Serialize lines to the given format.
pub fn stringify(lines: &[LyricLine], format: LyricsFormat) -> String {
    stringify_with(lines, format, &WriteOptions::default())
}

pub fn stringify_with(lines: &[LyricLine], format: LyricsFormat, opts: &WriteOptions) -> String {
    if lines.is_empty() {
        return String::new();
    }
    match format {
        LyricsFormat::Lrc => lrc::stringify(lines),
        LyricsFormat::Ass => ass::stringify(lines, opts),
        LyricsFormat::Srt => srt::stringify(lines, opts),
    }
}

/// Resolve a format name coming from config or the command line.
fn named_hint(name: &str) -> Option<FormatHint> {
    match name.parse() {
        Ok(hint) => Some(hint),
        Err(e) => {
            tracing::warn!(format = name, "{e}");
            None
        }
    }
}

/// [`parse`] with a format name (`auto`, `lrc`, `ass`, `srt`).
/// An unknown name is logged and yields no lines.
pub fn parse_named(content: &str, format: &str) -> Vec<LyricLine> {
    if prepare(content).is_none() {
        return Vec::new();
    }
    match named_hint(format) {
        Some(hint) => parse(content, hint),
        None => Vec::new(),
    }
}

/// [`parse_async_with`] with a format name. An unknown name is logged and
/// yields no events.
pub async fn parse_async_named(content: &str, format: &str, opts: &ParseOptions) -> ParsedLyrics {
    if prepare(content).is_none() {
        return ParsedLyrics::Events(Vec::new());
    }
    match named_hint(format) {
        Some(hint) => parse_async_with(content, hint, opts).await,
        None => ParsedLyrics::Events(Vec::new()),
    }
}

/// [`stringify_with`] with a format name. An unknown name is logged and
/// yields an empty string.
pub fn stringify_named(lines: &[LyricLine], format: &str, opts: &WriteOptions) -> String {
    if lines.is_empty() {
        return String::new();
    }
    match format.parse::<LyricsFormat>() {
        Ok(format) => stringify_with(lines, format, opts),
        Err(e) => {
            tracing::warn!(format, "{e}");
            String::new()
        }
    }
}
