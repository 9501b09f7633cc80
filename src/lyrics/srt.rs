//! SubRip engine
//!
//! 1
//! 00:00:01,000 --> 00:00:04,000
//! First subtitle

use once_cell::sync::Lazy;
use regex::Regex;

use super::WriteOptions;
use super::timecode;
use super::types::{LyricLine, sort_lines};

static BLANK_LINES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").expect("valid block separator regex"));

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}:\d{2}:\d{2},\d{3})\s*-->\s*(\d{2,}:\d{2}:\d{2},\d{3})")
        .expect("valid SRT range regex")
});

pub fn parse(content: &str) -> Vec<LyricLine> {
    let normalized = content.replace("\r\n", "\n");
    let mut lines = Vec::new();
    let mut skipped = 0usize;

    for block in BLANK_LINES_RE.split(normalized.trim()) {
        let rows: Vec<&str> = block
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        if rows.len() < 2 {
            if !rows.is_empty() {
                skipped += 1;
            }
            continue;
        }

        // rows[0] is the cue number, which carries no timing
        let Some(time) = RANGE_RE
            .captures(rows[1])
            .and_then(|caps| timecode::parse_srt_time(&caps[1]))
        else {
            skipped += 1;
            continue;
        };

        let text = rows[2..].join("\n");
        if text.is_empty() {
            skipped += 1;
            continue;
        }
        lines.push(LyricLine::new(time, text));
    }

    sort_lines(&mut lines);
    tracing::debug!(lines = lines.len(), skipped, "parsed SRT");
    lines
}

/// Numbered cues; each ends where the next starts, the last one lasts
/// `opts.trailing_duration` seconds.
pub fn stringify(lines: &[LyricLine], opts: &WriteOptions) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let end = lines
                .get(i + 1)
                .map_or(line.time + opts.trailing_duration, |next| next.time);
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                timecode::format_srt(line.time),
                timecode::format_srt(end),
                line.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_block() {
        let parsed = parse("1\n00:00:01,000 --> 00:00:04,000\nFirst subtitle");
        assert_eq!(parsed, vec![LyricLine::new(1.0, "First subtitle")]);
    }

    #[test]
    fn test_parse_multiline_and_unordered() {
        let srt = "2\r\n00:00:05,500 --> 00:00:07,000\r\nSecond\r\nline two\r\n\r\n\r\n\
                   1\r\n00:00:01,000 --> 00:00:04,000\r\nFirst\r\n";
        let parsed = parse(srt);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].text, "First");
        assert_eq!(parsed[1], LyricLine::new(5.5, "Second\nline two"));
    }

    #[test]
    fn test_parse_skips_bad_blocks() {
        let srt = "1\nnot a time\nText\n\n2\n00:00:02,000 --> 00:00:03,000\n\n3\n00:00:04,000 --> 00:00:05,000\nKept";
        let parsed = parse(srt);
        // block 2 has no text once the blank separator is applied
        assert_eq!(parsed, vec![LyricLine::new(4.0, "Kept")]);
    }

    #[test]
    fn test_stringify() {
        let lines = vec![LyricLine::new(1.0, "a"), LyricLine::new(2.25, "b")];
        let out = stringify(&lines, &WriteOptions::default());
        assert_eq!(
            out,
            "1\n00:00:01,000 --> 00:00:02,250\na\n\n2\n00:00:02,250 --> 00:00:07,250\nb\n"
        );
        assert_eq!(parse(&out), lines);
    }

    #[test]
    fn test_stringify_custom_trailing_duration() {
        let opts = WriteOptions {
            trailing_duration: 2.0,
        };
        let out = stringify(&[LyricLine::new(0.0, "x")], &opts);
        assert!(out.contains("00:00:00,000 --> 00:00:02,000"));
    }
}
