use serde::{Deserialize, Serialize};

/// A single timed line of lyrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Seconds from the start of the track
    pub time: f64,
    /// Display text, already stripped of format markup
    pub text: String,
}

impl LyricLine {
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            time,
            text: text.into(),
        }
    }
}

/// One highlighted span inside a karaoke line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaraokeWord {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// An extra timestamp found on an LRC line after the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaraokeTiming {
    pub time: f64,
    /// 1-based index among the extra timestamps
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineTimings {
    pub timings: Vec<KaraokeTiming>,
    pub full_text: String,
}

/// Karaoke information attached to a [`LyricEvent`].
///
/// The ASS engine reports a plain flag while the LRC engine reports the
/// extra timestamps of the line. Consumers read either shape, so both are
/// kept as-is and serialized untagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KaraokeMarker {
    Flag(bool),
    Timings(LineTimings),
}

/// Rich lyric entry produced by the chunked parsers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricEvent {
    pub time: f64,
    /// Primary text first, translation second (if any)
    pub texts: Vec<String>,
    pub karaoke: Option<KaraokeMarker>,
    pub words: Vec<KaraokeWord>,
}

impl LyricEvent {
    pub fn new(time: f64) -> Self {
        Self {
            time,
            texts: Vec::new(),
            karaoke: None,
            words: Vec::new(),
        }
    }

    pub fn primary(&self) -> Option<&str> {
        self.texts.first().map(String::as_str)
    }

    pub fn translation(&self) -> Option<&str> {
        self.texts.get(1).map(String::as_str)
    }

    pub fn has_karaoke(&self) -> bool {
        match &self.karaoke {
            Some(KaraokeMarker::Flag(on)) => *on,
            Some(KaraokeMarker::Timings(_)) => true,
            None => false,
        }
    }
}

/// Result of an async parse: rich events for LRC/ASS, plain lines otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedLyrics {
    Events(Vec<LyricEvent>),
    Lines(Vec<LyricLine>),
}

impl ParsedLyrics {
    pub fn len(&self) -> usize {
        match self {
            ParsedLyrics::Events(events) => events.len(),
            ParsedLyrics::Lines(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten to plain lines, keeping only the primary text of each event.
    pub fn into_lines(self) -> Vec<LyricLine> {
        match self {
            ParsedLyrics::Lines(lines) => lines,
            ParsedLyrics::Events(events) => events
                .into_iter()
                .filter_map(|e| {
                    let time = e.time;
                    e.texts.into_iter().next().map(|t| LyricLine::new(time, t))
                })
                .collect(),
        }
    }
}

/// Stable sort by time; ties keep encounter order.
pub(crate) fn sort_lines(lines: &mut [LyricLine]) {
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
}

pub(crate) fn sort_events(events: &mut [LyricEvent]) {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));
}
