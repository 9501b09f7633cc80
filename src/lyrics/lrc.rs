//! LRC format engine
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [ti:Song]
//! [00:12.34] Hello world
//! [00:15.00][01:15.00] Repeated chorus
//! [00:20.00]Wor[00:20.50]d by [00:21.00]word[00:21.80]

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::ParseOptions;
use super::timecode::{self, LrcToken};
use super::types::{
    KaraokeMarker, KaraokeTiming, KaraokeWord, LineTimings, LyricEvent, LyricLine, sort_events,
    sort_lines,
};

/// Single timestamp + text, a little looser than the token grammar
/// (one-digit minutes or seconds, one-digit fractions).
static SINGLE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{1,3}):(\d{1,2})(?:\.(\d{1,3}))?\](.*)$").expect("valid LRC line regex")
});

static ID_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([A-Za-z]{2,6}):(.*)\]$").expect("valid LRC ID tag regex"));

/// Parse LRC text into plain lines, one per leading timestamp.
///
/// Only the run of timestamps at the start of a line counts. Anything after
/// the first piece of text, bracketed times included, is kept as text.
pub fn parse(content: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    let mut skipped = 0usize;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let tokens = timecode::lrc_tokens(line);
        let leading = leading_tokens(&tokens);
        let Some(last) = leading.last() else {
            match parse_single(line) {
                Some(parsed) => lines.push(parsed),
                None => skipped += 1,
            }
            continue;
        };

        // Timestamp-only lines carry nothing to show
        let text = line[last.end..].trim();
        if text.is_empty() {
            skipped += 1;
            continue;
        }

        lines.extend(leading.iter().map(|t| LyricLine::new(t.time, text)));
    }

    sort_lines(&mut lines);
    tracing::debug!(lines = lines.len(), skipped, "parsed LRC");
    lines
}

/// The tokens that open the line back to back.
fn leading_tokens(tokens: &[LrcToken]) -> &[LrcToken] {
    let mut at = 0;
    let count = tokens
        .iter()
        .take_while(|t| {
            let adjacent = t.start == at;
            at = t.end;
            adjacent
        })
        .count();
    &tokens[..count]
}

fn parse_single(line: &str) -> Option<LyricLine> {
    let caps = SINGLE_LINE_RE.captures(line)?;
    let min: u64 = caps[1].parse().ok()?;
    let sec: u64 = caps[2].parse().ok()?;
    let frac = match caps.get(3) {
        Some(m) => {
            let digits = m.as_str();
            let value: u32 = digits.parse().ok()?;
            value as f64 / 10f64.powi(digits.len() as i32)
        }
        None => 0.0,
    };
    let text = caps[4].trim();
    if text.is_empty() {
        return None;
    }
    Some(LyricLine::new((min * 60 + sec) as f64 + frac, text))
}

/// Parse LRC text into rich events, yielding to the runtime between chunks.
///
/// The first timestamp of a line is its start time. Lines sharing a start
/// time are merged into one event with several texts unless
/// `merge_duplicate_start` is off. Extra timestamps become karaoke timings.
/// A last word with no closing timestamp runs until the next event starts.
pub async fn parse_chunked(content: &str, opts: &ParseOptions) -> Vec<LyricEvent> {
    let lines: Vec<&str> = content.lines().collect();
    let mut events: Vec<LyricEvent> = Vec::new();
    let mut by_start: HashMap<u64, usize> = HashMap::new();
    let mut skipped = 0usize;

    for (n, chunk) in lines.chunks(opts.chunk_size.max(1)).enumerate() {
        if n > 0 {
            tokio::task::yield_now().await;
        }

        for raw in chunk {
            let line = raw.trim();
            let tokens = timecode::lrc_tokens(line);
            let Some(first) = tokens.first() else {
                if !line.is_empty() {
                    skipped += 1;
                }
                continue;
            };

            let start = first.time;
            let full_text = timecode::strip_lrc_tokens(line).trim().to_string();

            let idx = if opts.merge_duplicate_start {
                *by_start.entry(start.to_bits()).or_insert_with(|| {
                    events.push(LyricEvent::new(start));
                    events.len() - 1
                })
            } else {
                events.push(LyricEvent::new(start));
                events.len() - 1
            };

            let event = &mut events[idx];
            event.texts.push(full_text.clone());

            if tokens.len() > 1 {
                let timings = tokens[1..]
                    .iter()
                    .enumerate()
                    .map(|(i, t)| KaraokeTiming {
                        time: t.time,
                        position: i + 1,
                    })
                    .collect();
                event.karaoke = Some(KaraokeMarker::Timings(LineTimings {
                    timings,
                    full_text,
                }));
                if event.words.is_empty() {
                    event.words = inline_words(line, &tokens);
                }
            }
        }
    }

    sort_events(&mut events);
    close_trailing_words(&mut events);
    tracing::debug!(events = events.len(), skipped, "parsed LRC events");
    events
}

/// Word spans for enhanced LRC, where timestamps sit between pieces of text.
/// Lines whose timestamps are all leading (repeated lines) have no words.
fn inline_words(line: &str, tokens: &[LrcToken]) -> Vec<KaraokeWord> {
    let interleaved =
        (0..tokens.len() - 1).any(|k| !segment(line, tokens, k).trim().is_empty());
    if !interleaved {
        return Vec::new();
    }

    (0..tokens.len())
        .filter_map(|k| {
            let text = segment(line, tokens, k);
            if text.trim().is_empty() {
                return None;
            }
            let start = tokens[k].time;
            let end = tokens.get(k + 1).map_or(start, |t| t.time).max(start);
            Some(KaraokeWord {
                text: text.to_string(),
                start,
                end,
            })
        })
        .collect()
}

/// Give an open-ended last word the start of the following event as its end.
/// The last event has no such bound and its open word stays zero-length.
fn close_trailing_words(events: &mut [LyricEvent]) {
    for i in 0..events.len().saturating_sub(1) {
        let next = events[i + 1].time;
        if let Some(word) = events[i].words.last_mut() {
            if word.end <= word.start && next > word.start {
                word.end = next;
            }
        }
    }
}

/// Text between token `k` and the next token (or the end of the line).
fn segment<'a>(line: &'a str, tokens: &[LrcToken], k: usize) -> &'a str {
    let from = tokens[k].end;
    let to = tokens.get(k + 1).map_or(line.len(), |t| t.start);
    &line[from..to]
}

/// Serialize lines as `[mm:ss.cc]text`, in the given order.
pub fn stringify(lines: &[LyricLine]) -> String {
    lines
        .iter()
        .map(|l| format!("[{}]{}", timecode::format_lrc(l.time), single_line(&l.text)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// LRC has no multi-line entries.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// ID tags found in the header of an LRC file.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LrcMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub author: Option<String>,
    pub length: Option<String>,
    /// Milliseconds; positive values make lyrics show up sooner
    pub offset_ms: Option<i64>,
    /// Tags without a dedicated field, in file order
    pub other: Vec<(String, String)>,
}

impl LrcMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Read ID tags like `[ti:Title]` or `[offset:+250]`.
pub fn parse_metadata(content: &str) -> LrcMetadata {
    let mut meta = LrcMetadata::default();

    for line in content.lines() {
        let Some(caps) = ID_TAG_RE.captures(line.trim()) else {
            continue;
        };
        let value = caps[2].trim().to_string();
        match caps[1].to_ascii_lowercase().as_str() {
            "ti" => meta.title = Some(value),
            "ar" => meta.artist = Some(value),
            "al" => meta.album = Some(value),
            "by" => meta.author = Some(value),
            "length" => meta.length = Some(value),
            "offset" => match value.parse::<i64>() {
                Ok(ms) => meta.offset_ms = Some(ms),
                Err(_) => tracing::debug!(%value, "ignoring bad LRC offset"),
            },
            _ => meta.other.push((caps[1].to_string(), value)),
        }
    }

    meta
}

/// Shift line times by an LRC `offset` (milliseconds), clamping at zero.
pub fn apply_offset(lines: &mut [LyricLine], offset_ms: i64) {
    let shift = offset_ms as f64 / 1000.0;
    for line in lines.iter_mut() {
        line.time = (line.time - shift).max(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::cursor;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_basic() {
        let parsed = parse("[00:01.00]First line\n[00:05.50]Second line");
        assert_eq!(
            parsed,
            vec![
                LyricLine::new(1.0, "First line"),
                LyricLine::new(5.5, "Second line"),
            ]
        );
    }

    #[test]
    fn test_parse_repeated_line() {
        let parsed = parse("[00:01.00][00:10.00]Repeated line");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], LyricLine::new(1.0, "Repeated line"));
        assert_eq!(parsed[1], LyricLine::new(10.0, "Repeated line"));
    }

    #[test]
    fn test_parse_keeps_inline_times_as_text() {
        let parsed = parse("[00:01.00]Hel[00:01.50]lo");
        assert_eq!(parsed, vec![LyricLine::new(1.0, "Hel[00:01.50]lo")]);

        let parsed = parse("[00:05.00]Meet me at [12:30] tonight");
        assert_eq!(parsed, vec![LyricLine::new(5.0, "Meet me at [12:30] tonight")]);

        // a leading run still repeats the line
        let parsed = parse("[00:01.00][00:02.00]x [00:03.00]y");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], LyricLine::new(2.0, "x [00:03.00]y"));
    }

    #[test]
    fn test_parse_oversized_minutes() {
        assert!(parse("[999999999999999999:00]x").is_empty());
    }

    #[test]
    fn test_parse_sorts_and_skips() {
        let lrc = r#"
[ti:Test Song]
[ar:Test Artist]
[00:15.00]Later
[00:12.34]Earlier
[00:13.00]
not a lyric line
"#;
        let parsed = parse(lrc);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].text, "Earlier");
        assert!(close(parsed[0].time, 12.34));
        assert_eq!(parsed[1].text, "Later");
    }

    #[test]
    fn test_parse_output_is_sorted() {
        let lrc = "[00:30.00]c\n[00:10.00][00:40.00]a\n[00:20.00]b\n[00:10.00]a2";
        let parsed = parse(lrc);
        assert!(parsed.windows(2).all(|w| w[0].time <= w[1].time));
        // equal times keep file order
        assert_eq!(parsed[0].text, "a");
        assert_eq!(parsed[1].text, "a2");
    }

    #[test]
    fn test_parse_millisecond_and_colon_forms() {
        let parsed = parse("[00:01.250]ms\n[01:30:00]colon");
        assert!(close(parsed[0].time, 1.25));
        assert_eq!(parsed[1], LyricLine::new(90.0, "colon"));
    }

    #[test]
    fn test_parse_single_digit_fallback() {
        let parsed = parse("[1:02.5]short form");
        assert_eq!(parsed.len(), 1);
        assert!(close(parsed[0].time, 62.5));
        assert_eq!(parsed[0].text, "short form");
    }

    #[test]
    fn test_stringify() {
        let out = stringify(&[LyricLine::new(1.0, "a"), LyricLine::new(65.25, "b")]);
        assert_eq!(out, "[00:01.00]a\n[01:05.25]b");
        assert_eq!(stringify(&[LyricLine::new(2.0, "one\ntwo")]), "[00:02.00]one two");
    }

    #[test]
    fn test_round_trip_within_a_centisecond() {
        let lines = vec![
            LyricLine::new(0.0, "zero"),
            LyricLine::new(1.234, "one"),
            LyricLine::new(61.999, "two"),
            LyricLine::new(3725.5, "long track"),
        ];
        let back = parse(&stringify(&lines));
        assert_eq!(back.len(), lines.len());
        for (a, b) in lines.iter().zip(&back) {
            assert!((a.time - b.time).abs() < 0.01, "{} vs {}", a.time, b.time);
            assert_eq!(a.text, b.text);
        }
    }

    #[tokio::test]
    async fn test_chunked_merges_by_first_timestamp() {
        let lrc = "[00:01.00][00:10.00]Repeated line\n[00:05.00]Middle\n[00:01.00]Same start";
        let events = parse_chunked(lrc, &ParseOptions::default()).await;
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.time, 1.0);
        assert_eq!(first.texts, vec!["Repeated line", "Same start"]);
        match &first.karaoke {
            Some(KaraokeMarker::Timings(t)) => {
                assert_eq!(t.full_text, "Repeated line");
                assert_eq!(
                    t.timings,
                    vec![KaraokeTiming {
                        time: 10.0,
                        position: 1
                    }]
                );
            }
            other => panic!("unexpected karaoke {other:?}"),
        }
        // leading-only timestamps are not word timing
        assert!(first.words.is_empty());

        assert_eq!(events[1].texts, vec!["Middle"]);
        assert!(events[1].karaoke.is_none());
    }

    #[tokio::test]
    async fn test_chunked_without_merging() {
        let opts = ParseOptions {
            merge_duplicate_start: false,
            ..ParseOptions::default()
        };
        let events = parse_chunked("[00:01.00]a\n[00:01.00]b", &opts).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].texts, vec!["a"]);
        assert_eq!(events[1].texts, vec!["b"]);
    }

    #[tokio::test]
    async fn test_chunked_colon_shape() {
        let events = parse_chunked("[01:30:00]x", &ParseOptions::default()).await;
        assert_eq!(events[0].time, 90.0);
    }

    #[tokio::test]
    async fn test_chunked_inline_words() {
        let events =
            parse_chunked("[00:01.00]Hel[00:01.50]lo [00:02.00]there[00:03.00]", &ParseOptions::default())
                .await;
        let words = &events[0].words;
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].text, "Hel");
        assert_eq!((words[0].start, words[0].end), (1.0, 1.5));
        assert_eq!(words[1].text, "lo ");
        assert_eq!((words[2].start, words[2].end), (2.0, 3.0));
        assert!(events[0].has_karaoke());
        assert_eq!(events[0].texts, vec!["Hello there"]);
    }

    #[tokio::test]
    async fn test_chunked_open_last_word_runs_to_next_event() {
        let lrc = "[00:01.00]Hel[00:01.50]lo\n[00:04.00]Next[00:04.50]one";
        let events = parse_chunked(lrc, &ParseOptions::default()).await;
        assert_eq!(events.len(), 2);

        let lo = &events[0].words[1];
        assert_eq!(lo.text, "lo");
        assert_eq!((lo.start, lo.end), (1.5, 4.0));
        assert_eq!(cursor::active_word(&events[0], 2.0), Some(1));

        // nothing follows the last event
        let one = &events[1].words[1];
        assert_eq!((one.start, one.end), (4.5, 4.5));
    }

    #[tokio::test]
    async fn test_chunked_crosses_chunk_boundaries() {
        let lrc: String = (0..250)
            .rev()
            .map(|i| format!("[{:02}:{:02}.00]line {i}\n", i / 60, i % 60))
            .collect();
        let opts = ParseOptions {
            chunk_size: 7,
            ..ParseOptions::default()
        };
        let events = parse_chunked(&lrc, &opts).await;
        assert_eq!(events.len(), 250);
        assert!(events.windows(2).all(|w| w[0].time <= w[1].time));
        assert_eq!(events[0].texts, vec!["line 0"]);
    }

    #[test]
    fn test_metadata() {
        let meta = parse_metadata("[ti:Song]\n[ar: Someone ]\n[offset:+250]\n[re:tool]\n[00:01.00]x");
        assert_eq!(meta.title.as_deref(), Some("Song"));
        assert_eq!(meta.artist.as_deref(), Some("Someone"));
        assert_eq!(meta.offset_ms, Some(250));
        assert_eq!(meta.other, vec![("re".to_string(), "tool".to_string())]);
        assert!(parse_metadata("[00:01.00]x").is_empty());
    }

    #[test]
    fn test_apply_offset() {
        let mut lines = vec![LyricLine::new(0.1, "a"), LyricLine::new(2.0, "b")];
        apply_offset(&mut lines, 500);
        assert_eq!(lines[0].time, 0.0);
        assert!(close(lines[1].time, 1.5));
        apply_offset(&mut lines, -1000);
        assert!(close(lines[1].time, 2.5));
    }
}
