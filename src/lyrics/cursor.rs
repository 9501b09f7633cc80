//! Playback position lookups over parsed lyrics.

use std::ops::Range;

use super::types::{LyricEvent, LyricLine};

/// Index of the line being sung at `position` seconds: the last line whose
/// time is not after `position`. `None` before the first line.
///
/// `lines` must be sorted by time, which every parser guarantees.
pub fn active_index(lines: &[LyricLine], position: f64) -> Option<usize> {
    lines.partition_point(|l| l.time <= position).checked_sub(1)
}

/// Same as [`active_index`] for rich events.
pub fn active_event(events: &[LyricEvent], position: f64) -> Option<usize> {
    events.partition_point(|e| e.time <= position).checked_sub(1)
}

/// Index of the karaoke word whose span contains `position`.
pub fn active_word(event: &LyricEvent, position: f64) -> Option<usize> {
    event
        .words
        .iter()
        .position(|w| w.start <= position && position < w.end)
}

/// Lines to display around `current`, clipped to `0..len`.
pub fn context_window(len: usize, current: usize, before: usize, after: usize) -> Range<usize> {
    if len == 0 {
        return 0..0;
    }
    let current = current.min(len - 1);
    let start = current.saturating_sub(before);
    let end = (current + after + 1).min(len);
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::types::KaraokeWord;

    fn lines() -> Vec<LyricLine> {
        vec![
            LyricLine::new(1.0, "a"),
            LyricLine::new(2.0, "b"),
            LyricLine::new(2.0, "b2"),
            LyricLine::new(5.0, "c"),
        ]
    }

    #[test]
    fn test_active_index() {
        let lines = lines();
        assert_eq!(active_index(&lines, 0.5), None);
        assert_eq!(active_index(&lines, 1.0), Some(0));
        assert_eq!(active_index(&lines, 2.5), Some(2));
        assert_eq!(active_index(&lines, 100.0), Some(3));
        assert_eq!(active_index(&[], 3.0), None);
    }

    #[test]
    fn test_active_word() {
        let mut event = LyricEvent::new(1.0);
        event.words = vec![
            KaraokeWord {
                text: "Hel".to_string(),
                start: 1.0,
                end: 1.5,
            },
            KaraokeWord {
                text: "lo".to_string(),
                start: 1.5,
                end: 2.0,
            },
        ];
        assert_eq!(active_word(&event, 0.9), None);
        assert_eq!(active_word(&event, 1.5), Some(1));
        assert_eq!(active_word(&event, 2.0), None);

        let events = vec![event, LyricEvent::new(3.0)];
        assert_eq!(active_event(&events, 2.9), Some(0));
        assert_eq!(active_event(&events, 3.0), Some(1));
    }

    #[test]
    fn test_context_window() {
        assert_eq!(context_window(10, 0, 2, 2), 0..3);
        assert_eq!(context_window(10, 5, 2, 2), 3..8);
        assert_eq!(context_window(10, 9, 2, 2), 7..10);
        assert_eq!(context_window(0, 0, 2, 2), 0..0);
    }
}
