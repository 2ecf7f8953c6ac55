//! Style intervals and the tiling merge.
//!
//! Each screen row carries a list of [`StyleInterval`]s that are sorted,
//! non-overlapping and cover `[0, width)` exactly. A write places a second
//! tiling (of its own length) at an offset; [`merge`] produces the row's
//! new tiling.

use crate::error::{Error, Result};
use crate::types::Style;

/// A style bound to the half-open column range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleInterval {
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

impl StyleInterval {
    pub const fn new(start: usize, end: usize, style: Style) -> Self {
        Self { start, end, style }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    fn shifted(&self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset, self.style)
    }
}

/// Check that `intervals` tile `[0, width)`: sorted, contiguous, non-empty.
///
/// The error reason names the first violation; the row is filled in by the
/// caller.
pub fn check_tiling(intervals: &[StyleInterval], width: usize) -> std::result::Result<(), String> {
    let mut expected = 0;
    for (i, interval) in intervals.iter().enumerate() {
        if interval.start != expected {
            return Err(format!(
                "interval {i} starts at {} but previous ended at {expected}",
                interval.start
            ));
        }
        if interval.is_empty() {
            return Err(format!("interval {i} is empty at {}", interval.start));
        }
        expected = interval.end;
    }
    if expected != width {
        return Err(format!("intervals cover {expected} of {width} columns"));
    }
    Ok(())
}

/// Merge `incoming` (tiling `[0, L)`) into `current` (tiling `[0, width)`)
/// at `offset`.
///
/// Current intervals outside `[offset, offset + L)` are kept, intervals that
/// overlap the window are clipped to whatever survives on either side, and
/// the incoming intervals are shifted by `offset` and inserted as they are.
pub fn merge(
    current: &[StyleInterval],
    incoming: &[StyleInterval],
    offset: usize,
    width: usize,
) -> Result<Vec<StyleInterval>> {
    let tiling = |reason: String| Error::Tiling { row: 0, reason };

    check_tiling(current, width).map_err(|r| tiling(format!("current: {r}")))?;
    let len = incoming.last().map_or(0, |i| i.end);
    check_tiling(incoming, len).map_err(|r| tiling(format!("incoming: {r}")))?;
    if len == 0 {
        return Ok(current.to_vec());
    }
    let window_end = offset + len;
    if window_end > width {
        return Err(tiling(format!(
            "window [{offset}, {window_end}) exceeds width {width}"
        )));
    }

    let mut merged = Vec::with_capacity(current.len() + incoming.len() + 1);
    for cur in current {
        if cur.end <= offset || cur.start >= window_end {
            merged.push(*cur);
            continue;
        }
        match (cur.start < offset, cur.end > window_end) {
            // Straddles both edges: keep both remainders
            (true, true) => {
                merged.push(StyleInterval::new(cur.start, offset, cur.style));
                merged.push(StyleInterval::new(window_end, cur.end, cur.style));
            }
            // Straddles the left edge
            (true, false) => merged.push(StyleInterval::new(cur.start, offset, cur.style)),
            // Straddles the right edge
            (false, true) => merged.push(StyleInterval::new(window_end, cur.end, cur.style)),
            // Fully covered
            (false, false) => {}
        }
    }
    merged.extend(incoming.iter().map(|i| i.shifted(offset)));
    merged.sort_by_key(|i| i.start);

    check_tiling(&merged, width).map_err(|r| tiling(format!("merged: {r}")))?;
    Ok(merged)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    fn red() -> Style {
        Style::new().fg(Color::RED)
    }

    fn blue() -> Style {
        Style::new().fg(Color::BLUE)
    }

    fn blank(width: usize) -> Vec<StyleInterval> {
        vec![StyleInterval::new(0, width, Style::default())]
    }

    #[test]
    fn test_check_tiling() {
        assert!(check_tiling(&blank(10), 10).is_ok());
        assert!(check_tiling(&blank(10), 11).is_err());
        assert!(check_tiling(&[], 0).is_ok());
        let gap = [
            StyleInterval::new(0, 3, red()),
            StyleInterval::new(4, 10, red()),
        ];
        assert!(check_tiling(&gap, 10).is_err());
        let overlap = [
            StyleInterval::new(0, 5, red()),
            StyleInterval::new(4, 10, red()),
        ];
        assert!(check_tiling(&overlap, 10).is_err());
    }

    #[test]
    fn test_merge_inside() {
        let merged = merge(&blank(10), &[StyleInterval::new(0, 2, red())], 3, 10).unwrap();
        assert_eq!(
            merged,
            vec![
                StyleInterval::new(0, 3, Style::default()),
                StyleInterval::new(3, 5, red()),
                StyleInterval::new(5, 10, Style::default()),
            ]
        );
    }

    #[test]
    fn test_merge_at_start_and_end() {
        let at_start = merge(&blank(10), &[StyleInterval::new(0, 4, red())], 0, 10).unwrap();
        assert_eq!(at_start[0], StyleInterval::new(0, 4, red()));
        assert_eq!(at_start[1], StyleInterval::new(4, 10, Style::default()));

        let at_end = merge(&blank(10), &[StyleInterval::new(0, 4, red())], 6, 10).unwrap();
        assert_eq!(at_end[0], StyleInterval::new(0, 6, Style::default()));
        assert_eq!(at_end[1], StyleInterval::new(6, 10, red()));
    }

    #[test]
    fn test_merge_full_cover() {
        let merged = merge(&blank(4), &[StyleInterval::new(0, 4, blue())], 0, 4).unwrap();
        assert_eq!(merged, vec![StyleInterval::new(0, 4, blue())]);
    }

    #[test]
    fn test_merge_straddles_several() {
        let current = vec![
            StyleInterval::new(0, 3, red()),
            StyleInterval::new(3, 5, Style::default()),
            StyleInterval::new(5, 10, red()),
        ];
        let incoming = [
            StyleInterval::new(0, 2, blue()),
            StyleInterval::new(2, 5, Style::default().bold()),
        ];
        let merged = merge(&current, &incoming, 2, 10).unwrap();
        assert_eq!(
            merged,
            vec![
                StyleInterval::new(0, 2, red()),
                StyleInterval::new(2, 4, blue()),
                StyleInterval::new(4, 7, Style::default().bold()),
                StyleInterval::new(7, 10, red()),
            ]
        );
    }

    #[test]
    fn test_merge_empty_incoming() {
        let merged = merge(&blank(5), &[], 2, 5).unwrap();
        assert_eq!(merged, blank(5));
    }

    #[test]
    fn test_merge_rejects_bad_input() {
        let err = merge(&blank(10), &[StyleInterval::new(0, 4, red())], 8, 10);
        assert!(matches!(err, Err(Error::Tiling { .. })));

        let broken = [StyleInterval::new(1, 4, red())];
        assert!(merge(&blank(10), &broken, 0, 10).is_err());
        assert!(merge(&blank(9), &[StyleInterval::new(0, 1, red())], 0, 10).is_err());
    }
}
