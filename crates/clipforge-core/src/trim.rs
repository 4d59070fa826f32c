//! Trim window calculation.
//!
//! Every strategy keeps a fixed guard band away from the head and tail of the
//! source, where intros, outros, and fades usually live.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::variant::TrimStrategy;

/// Seconds skipped at the head and tail of every source.
pub const GUARD_BAND_SECS: f64 = 5.0;

/// Shortest window handed to the encoder. Window times are passed with
/// millisecond precision, so anything shorter would render as `-t 0.000`.
pub const MIN_WINDOW_SECS: f64 = 0.001;

/// The `[start, end)` range extracted from a source, in seconds.
///
/// Always satisfies `0 <= start < end <= total duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClipWindow {
    pub start: f64,
    pub end: f64,
}

impl ClipWindow {
    /// Length of the window in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Compute the clip window for `strategy` over a source of `total` seconds.
///
/// `middle` collapses to the whole usable range when that range is narrower
/// than `clip`, so callers must tolerate a shorter clip in that case.
///
/// # Errors
///
/// Returns [`Error::InvalidWindow`] when the clamped window is shorter than
/// [`MIN_WINDOW_SECS`] or falls outside `[0, total]`.
pub fn compute(total: f64, strategy: TrimStrategy, clip: f64) -> Result<ClipWindow> {
    let (start, end) = match strategy {
        TrimStrategy::Start => {
            let start = GUARD_BAND_SECS;
            (start, (start + clip).min(total))
        }
        TrimStrategy::End => {
            let end = total - GUARD_BAND_SECS;
            ((end - clip).max(0.0), end)
        }
        TrimStrategy::Middle => {
            let usable_start = GUARD_BAND_SECS;
            let usable_end = total - GUARD_BAND_SECS;
            if usable_end - usable_start >= clip {
                let centre = (usable_start + usable_end) / 2.0;
                (centre - clip / 2.0, centre + clip / 2.0)
            } else {
                (usable_start, usable_end)
            }
        }
    };

    let valid = start.is_finite()
        && end.is_finite()
        && start >= 0.0
        && end - start >= MIN_WINDOW_SECS
        && end <= total;
    if !valid {
        return Err(Error::InvalidWindow { start, end, total });
    }

    Ok(ClipWindow { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: f64, end: f64) -> ClipWindow {
        ClipWindow { start, end }
    }

    #[test]
    fn start_strategy_skips_head_guard() {
        assert_eq!(compute(40.0, TrimStrategy::Start, 20.0).unwrap(), window(5.0, 25.0));
    }

    #[test]
    fn end_strategy_skips_tail_guard() {
        assert_eq!(compute(40.0, TrimStrategy::End, 20.0).unwrap(), window(15.0, 35.0));
    }

    #[test]
    fn middle_strategy_centres_in_usable_range() {
        assert_eq!(compute(40.0, TrimStrategy::Middle, 20.0).unwrap(), window(10.0, 30.0));
    }

    #[test]
    fn middle_strategy_collapses_to_usable_range() {
        assert_eq!(compute(12.0, TrimStrategy::Middle, 20.0).unwrap(), window(5.0, 7.0));
    }

    #[test]
    fn start_strategy_clamps_to_total() {
        assert_eq!(compute(15.0, TrimStrategy::Start, 20.0).unwrap(), window(5.0, 15.0));
    }

    #[test]
    fn end_strategy_clamps_at_zero() {
        assert_eq!(compute(15.0, TrimStrategy::End, 20.0).unwrap(), window(0.0, 10.0));
    }

    #[test]
    fn short_sources_are_invalid() {
        for strategy in [TrimStrategy::Start, TrimStrategy::End, TrimStrategy::Middle] {
            let err = compute(4.0, strategy, 20.0).unwrap_err();
            assert!(
                matches!(err, Error::InvalidWindow { .. }),
                "{strategy} should reject a 4s source"
            );
        }
        // Usable range of exactly zero width.
        assert!(compute(10.0, TrimStrategy::Middle, 3.0).is_err());
    }

    #[test]
    fn sub_millisecond_windows_are_invalid() {
        let err = compute(10.0004, TrimStrategy::Middle, 20.0).unwrap_err();
        assert!(matches!(err, Error::InvalidWindow { .. }));
        assert!(compute(15.0004, TrimStrategy::End, 10.0).is_ok());

        let narrow = compute(10.01, TrimStrategy::Middle, 20.0).unwrap();
        assert!(narrow.duration() >= MIN_WINDOW_SECS);
        assert!(narrow.duration() < 0.02);
    }

    #[test]
    fn windows_stay_inside_source() {
        for total_tenths in (101..=3000).step_by(7) {
            let total = f64::from(total_tenths) / 10.0;
            let mut clip = 0.5;
            while clip < total - 10.0 {
                for strategy in [TrimStrategy::Start, TrimStrategy::End, TrimStrategy::Middle] {
                    let w = compute(total, strategy, clip).unwrap();
                    assert!(0.0 <= w.start, "{strategy} {total} {clip}: {w:?}");
                    assert!(w.start < w.end, "{strategy} {total} {clip}: {w:?}");
                    assert!(w.end <= total, "{strategy} {total} {clip}: {w:?}");
                }
                clip += 1.3;
            }
        }
    }

    #[test]
    fn middle_window_is_centred_when_range_fits() {
        for total in [20.0, 31.0, 64.5, 600.0] {
            let clip = 10.0;
            let w = compute(total, TrimStrategy::Middle, clip).unwrap();
            let head = w.start - GUARD_BAND_SECS;
            let tail = (total - GUARD_BAND_SECS) - w.end;
            assert!((head - tail).abs() < 1e-9, "not centred for {total}: {w:?}");
            assert!((w.duration() - clip).abs() < 1e-9);
        }
    }
}
