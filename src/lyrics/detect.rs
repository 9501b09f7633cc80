use once_cell::sync::Lazy;
use regex::Regex;

use super::LyricsFormat;

const ASS_MARKERS: [&str; 3] = ["[Script Info]", "[V4+ Styles]", "[Events]"];

/// An index line directly followed by a `start --> end` range.
static SRT_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\d+[ \t]*\r?\n\d{2}:\d{2}:\d{2},\d{3}[ \t]*-->[ \t]*\d{2}:\d{2}:\d{2},\d{3}")
        .expect("valid SRT header regex")
});

/// Classify raw lyric text. Never fails; plain text counts as LRC.
pub fn detect_format(content: &str) -> LyricsFormat {
    if ASS_MARKERS.iter().any(|m| content.contains(m)) {
        LyricsFormat::Ass
    } else if SRT_HEADER_RE.is_match(content) {
        LyricsFormat::Srt
    } else {
        LyricsFormat::Lrc
    }
}
