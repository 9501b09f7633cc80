//! Timestamp notations used by the three lyric formats.
//!
//! LRC:  [mm:ss], [mm:ss.cc], [mm:ss.ccc], [mm:ss:cs]
//! SRT:  HH:MM:SS,mmm
//! ASS:  H:MM:SS.cc
//!
//! All values are seconds from the start of the track as `f64`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bracketed LRC timestamp. Group 3 is a `.`-fraction, group 4 the
/// colon-separated unit of the `[mm:ss:cs]` shape, which carries no time.
static LRC_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[(\d{2,}):(\d{2})(?:\.(\d{2,3})|:(\d{2}))?\]").expect("valid LRC tag regex")
});

static SRT_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2,}):(\d{2}):(\d{2}),(\d{3})$").expect("valid SRT time regex"));

static ASS_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})\.(\d{2})$").expect("valid ASS time regex"));

/// A timestamp token found inside an LRC line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LrcToken {
    pub time: f64,
    /// Byte offset of the opening `[`
    pub start: usize,
    /// Byte offset just past the closing `]`
    pub end: usize,
}

/// Every LRC timestamp token in `line`, in order of appearance.
pub fn lrc_tokens(line: &str) -> Vec<LrcToken> {
    LRC_TAG_RE
        .captures_iter(line)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let min: u64 = caps[1].parse().ok()?;
            let sec: u64 = caps[2].parse().ok()?;
            let frac = match caps.get(3) {
                Some(m) => fraction(m.as_str())?,
                None => 0.0,
            };
            Some(LrcToken {
                time: whole_seconds(0, min, sec)? as f64 + frac,
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Remove every LRC timestamp token from `line`.
pub fn strip_lrc_tokens(line: &str) -> String {
    LRC_TAG_RE.replace_all(line, "").into_owned()
}

/// Parse a single bracketed LRC timestamp such as `[01:02.50]`.
pub fn parse_lrc_timestamp(s: &str) -> Option<f64> {
    let s = s.trim();
    let tokens = lrc_tokens(s);
    match tokens.as_slice() {
        [only] if only.start == 0 && only.end == s.len() => Some(only.time),
        _ => None,
    }
}

/// `h:m:s` in seconds, `None` when the digits overflow.
pub(crate) fn whole_seconds(h: u64, m: u64, s: u64) -> Option<u64> {
    h.checked_mul(3600)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

/// Two digits are centiseconds, three are milliseconds.
fn fraction(digits: &str) -> Option<f64> {
    let value: u32 = digits.parse().ok()?;
    match digits.len() {
        2 => Some(value as f64 / 100.0),
        3 => Some(value as f64 / 1000.0),
        _ => None,
    }
}

/// Parse `HH:MM:SS,mmm`.
pub fn parse_srt_time(s: &str) -> Option<f64> {
    let caps = SRT_TIME_RE.captures(s.trim())?;
    let h: u64 = caps[1].parse().ok()?;
    let m: u64 = caps[2].parse().ok()?;
    let sec: u64 = caps[3].parse().ok()?;
    let ms: u64 = caps[4].parse().ok()?;
    Some(whole_seconds(h, m, sec)? as f64 + ms as f64 / 1000.0)
}

/// Parse `H:MM:SS.cc`. Anything else yields `None`.
pub fn parse_ass_time(s: &str) -> Option<f64> {
    let caps = ASS_TIME_RE.captures(s.trim())?;
    let h: u64 = caps[1].parse().ok()?;
    let m: u64 = caps[2].parse().ok()?;
    let sec: u64 = caps[3].parse().ok()?;
    let cs: u64 = caps[4].parse().ok()?;
    Some(whole_seconds(h, m, sec)? as f64 + cs as f64 / 100.0)
}

/// Lenient `h:m:s` reader used by the chunked ASS parser, where the seconds
/// field keeps whatever fraction it carries. Negative fields are rejected.
pub fn ass_seconds(s: &str) -> Option<f64> {
    let mut parts = s.trim().split(':');
    let h: f64 = parts.next()?.trim().parse().ok()?;
    let m: f64 = parts.next()?.trim().parse().ok()?;
    let sec: f64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || h < 0.0 || m < 0.0 || sec < 0.0 {
        return None;
    }
    let total = h * 3600.0 + m * 60.0 + sec;
    total.is_finite().then_some(total)
}

fn non_negative(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// `mm:ss.cc` (without brackets).
pub fn format_lrc(seconds: f64) -> String {
    let cs = (non_negative(seconds) * 100.0).round() as u64;
    let min = cs / 6000;
    let sec = (cs / 100) % 60;
    format!("{:02}:{:02}.{:02}", min, sec, cs % 100)
}

/// `HH:MM:SS,mmm`.
pub fn format_srt(seconds: f64) -> String {
    let ms = (non_negative(seconds) * 1000.0).round() as u64;
    let h = ms / 3_600_000;
    let m = (ms / 60_000) % 60;
    let s = (ms / 1000) % 60;
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms % 1000)
}

/// `H:MM:SS.cc`.
pub fn format_ass(seconds: f64) -> String {
    let cs = (non_negative(seconds) * 100.0).round() as u64;
    let h = cs / 360_000;
    let m = (cs / 6000) % 60;
    let s = (cs / 100) % 60;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs % 100)
}
