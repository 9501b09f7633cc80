//! Advanced SubStation Alpha engine.
//!
//! Only the `[Events]` section matters for lyrics. The chunked parser also
//! understands the bilingual layout where the original line uses style `orig`
//! and its translation uses style `ts`, both with the same start/end, plus
//! `{\k}` / `{\kf}` karaoke tags on the original.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::timecode;
use super::types::{KaraokeMarker, KaraokeWord, LyricEvent, LyricLine, sort_events, sort_lines};
use super::{ParseOptions, WriteOptions};

static OVERRIDE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]*\}").expect("valid override tag regex"));

static KARAOKE_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\\kf?(\d+)\}([^{]*)").expect("valid karaoke tag regex")
});

const ORIGINAL_STYLE: &str = "orig";
const TRANSLATION_STYLE: &str = "ts";

/// Nine fields plus the text of a v4+ `Dialogue:` line.
const MIN_DIALOGUE_PARTS: usize = 10;

const HEADER: &str = "[Script Info]
ScriptType: v4.00+
WrapStyle: 0
PlayResX: 1920
PlayResY: 1080

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,1,2,10,10,30,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// Column layout taken from an `[Events]` `Format:` line.
#[derive(Debug, Clone, Copy)]
struct Columns {
    count: usize,
    start: usize,
    text: usize,
}

impl Columns {
    fn from_format(header: &str) -> Option<Self> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let start = names.iter().position(|n| *n == "Start")?;
        let text = names.iter().position(|n| *n == "Text")?;
        Some(Self {
            count: names.len(),
            start,
            text,
        })
    }
}

/// Drop override tags and turn hard line breaks into newlines.
fn clean_text(raw: &str) -> String {
    OVERRIDE_TAG_RE
        .replace_all(raw, "")
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .trim()
        .to_string()
}

/// Parse the `[Events]` section into plain lines.
pub fn parse(content: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    let mut in_events = false;
    let mut columns: Option<Columns> = None;
    let mut skipped = 0usize;

    for raw in content.lines() {
        let line = raw.trim();

        if line == "[Events]" {
            in_events = true;
            continue;
        }
        if line.starts_with('[') {
            in_events = false;
            continue;
        }
        if !in_events {
            continue;
        }

        if let Some(header) = line.strip_prefix("Format:") {
            columns = Columns::from_format(header);
            continue;
        }

        let Some(body) = line.strip_prefix("Dialogue:") else {
            continue;
        };
        let Some(cols) = columns else {
            skipped += 1;
            continue;
        };

        let parts: Vec<&str> = body.split(',').collect();
        if parts.len() < cols.count {
            skipped += 1;
            continue;
        }

        let time = timecode::parse_ass_time(parts[cols.start]);
        let text = clean_text(&parts[cols.text..].join(","));
        match time {
            Some(time) if !text.is_empty() => lines.push(LyricLine::new(time, text)),
            _ => skipped += 1,
        }
    }

    sort_lines(&mut lines);
    tracing::debug!(lines = lines.len(), skipped, "parsed ASS");
    lines
}

/// Dialogues sharing the same start and end.
#[derive(Debug)]
struct Group {
    start: f64,
    orig: Option<String>,
    ts: Option<String>,
}

/// Parse every `Dialogue:` line into bilingual karaoke events, yielding to
/// the runtime between chunks.
pub async fn parse_chunked(content: &str, opts: &ParseOptions) -> Vec<LyricEvent> {
    let lines: Vec<&str> = content.lines().collect();
    let mut groups: Vec<Group> = Vec::new();
    let mut by_key: HashMap<(String, String), usize> = HashMap::new();
    let mut skipped = 0usize;

    for (n, chunk) in lines.chunks(opts.chunk_size.max(1)).enumerate() {
        if n > 0 {
            tokio::task::yield_now().await;
        }

        for raw in chunk {
            let line = raw.trim_start();
            if !line.starts_with("Dialogue:") {
                continue;
            }

            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < MIN_DIALOGUE_PARTS {
                skipped += 1;
                continue;
            }
            let (Some(start), Some(end)) =
                (timecode::ass_seconds(parts[1]), timecode::ass_seconds(parts[2]))
            else {
                skipped += 1;
                continue;
            };
            let style = parts[3].trim();
            let text = parts[9..].join(",");

            let key = (format!("{start:.3}"), format!("{end:.3}"));
            let idx = *by_key.entry(key).or_insert_with(|| {
                groups.push(Group {
                    start,
                    orig: None,
                    ts: None,
                });
                groups.len() - 1
            });

            let group = &mut groups[idx];
            match style {
                ORIGINAL_STYLE => group.orig = Some(text),
                TRANSLATION_STYLE => group.ts = Some(text),
                _ => {}
            }
        }
    }

    let mut events: Vec<LyricEvent> = groups
        .into_iter()
        .filter_map(|g| {
            let words = g
                .orig
                .as_deref()
                .map(|orig| karaoke_words(orig, g.start))
                .unwrap_or_default();
            if g.orig.is_none() && g.ts.is_none() {
                return None;
            }
            // index 0 is always the original, even when only a translation exists
            let mut texts = vec![clean_text(g.orig.as_deref().unwrap_or_default())];
            texts.extend(g.ts.as_deref().map(clean_text));
            Some(LyricEvent {
                time: g.start,
                texts,
                karaoke: Some(KaraokeMarker::Flag(!words.is_empty())),
                words,
            })
        })
        .collect();

    sort_events(&mut events);
    tracing::debug!(events = events.len(), skipped, "parsed ASS events");
    events
}

/// Lay `{\k<cs>}` words end to end starting at `start`.
pub fn karaoke_words(text: &str, start: f64) -> Vec<KaraokeWord> {
    let mut cursor = start;
    KARAOKE_TAG_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let cs: u64 = caps[1].parse().ok()?;
            let begin = cursor;
            cursor += cs as f64 * 0.01;
            Some(KaraokeWord {
                text: caps[2].to_string(),
                start: begin,
                end: cursor,
            })
        })
        .collect()
}

/// Serialize as a minimal v4+ script with one `Default` style.
///
/// Each dialogue ends where the next one starts; the last one lasts
/// `opts.trailing_duration` seconds.
pub fn stringify(lines: &[LyricLine], opts: &WriteOptions) -> String {
    let mut out = String::from(HEADER);
    for (i, line) in lines.iter().enumerate() {
        let end = lines
            .get(i + 1)
            .map_or(line.time + opts.trailing_duration, |next| next.time);
        out.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            timecode::format_ass(line.time),
            timecode::format_ass(end),
            line.text.replace('\n', "\\N"),
        ));
    }
    out
}
