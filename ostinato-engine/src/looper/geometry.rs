//! Loop geometry
//!
//! Everything that converts between the three user-facing units (phase,
//! samples, milliseconds) and the sample-indexed loop bounds, plus the window
//! selection inside the outer loop. Loops that were originally captured in
//! reverse live at the top of the buffer, so every computation here branches
//! on the capture direction.

use super::engine::LooperEngine;
use crate::control::LoopUnits;
use tracing::warn;

impl LooperEngine {
    /// Apply the `position` message: move the window start phase within the
    /// outer loop and refresh the wrap flag. Ignored while the initial
    /// capture is still determining the loop length.
    pub(crate) fn select_start(&mut self, position: f64) {
        self.sel_start = position.clamp(0.0, 1.0);

        if self.loop_determine {
            return;
        }
        let size = (self.max_loop - self.min_loop) as f64;

        if self.direction_orig < 0 {
            let frames_m1 = self.frames - 1;
            let base = (frames_m1 - self.max_loop) as f64;
            self.start_loop = ((base + self.sel_start * size) as i64)
                .clamp(frames_m1 - self.max_loop, frames_m1);
            self.end_loop = self.start_loop + (self.sel_size * size) as i64;
            if self.end_loop > frames_m1 {
                self.end_loop = (frames_m1 - size as i64) + (self.end_loop - frames_m1);
                self.wrap = true;
            } else {
                self.wrap = false;
            }
        } else {
            self.start_loop = (((self.sel_start * size) as i64) + self.min_loop)
                .clamp(self.min_loop, self.max_loop);
            self.end_loop = self.start_loop + (self.sel_size * size) as i64;
            if self.end_loop > self.max_loop {
                self.end_loop -= size as i64;
                self.wrap = true;
            } else {
                self.wrap = false;
            }
        }
    }

    /// Apply the `window` message: resize the playback window and refresh the
    /// wrap flag.
    pub(crate) fn select_size(&mut self, duration: f64) {
        self.sel_size = duration.clamp(0.0, 1.0);

        if self.loop_determine {
            return;
        }
        let size = (self.max_loop - self.min_loop) as f64;
        self.end_loop = self.start_loop + (self.sel_size * size) as i64;

        if self.direction_orig < 0 {
            let frames_m1 = self.frames - 1;
            if self.end_loop > frames_m1 {
                self.end_loop = (frames_m1 - size as i64) + (self.end_loop - frames_m1);
                self.wrap = true;
            } else {
                self.wrap = false;
            }
        } else if self.end_loop > self.max_loop {
            self.end_loop -= size as i64;
            self.wrap = true;
        } else {
            self.wrap = false;
        }
    }

    /// Apply `setloop` bounds. Both endpoints are normalized to phase,
    /// sorted, clamped, and widened to the minimum loop length (one system
    /// vector, normalized to the buffer) before being committed. A zero-size
    /// request is refused.
    pub(crate) fn apply_loop_points(
        &mut self,
        low_in: Option<f64>,
        high_in: Option<f64>,
        units: LoopUnits,
    ) {
        let frames_m1 = (self.frames - 1) as f64;
        if frames_m1 <= 0.0 {
            warn!("no buffer frames available, ignoring loop points");
            return;
        }
        let frames_ms = frames_m1 / self.bmsr;
        let bvsnorm = self.vsnorm * (self.bsr / self.frames as f64);
        let half = bvsnorm * 0.5;
        self.bvsnorm = bvsnorm;

        let mut low = low_in.unwrap_or(-1.0);
        let mut high = high_in.unwrap_or(-1.0);
        if low < 0.0 {
            low = 0.0;
        }
        match units {
            LoopUnits::Phase => {
                if high < 0.0 {
                    high = 1.0;
                }
            }
            LoopUnits::Samples => {
                if high < 0.0 {
                    high = 1.0;
                } else {
                    high /= frames_m1;
                }
                if low > 0.0 {
                    low /= frames_m1;
                }
            }
            LoopUnits::Milliseconds => {
                if high < 0.0 {
                    high = 1.0;
                } else {
                    high /= frames_ms;
                }
                if low > 0.0 {
                    low /= frames_ms;
                }
            }
        }

        let (mut low, mut high) = (low.min(high), low.max(high));
        if low > 1.0 {
            warn!("loop minimum beyond the buffer, pulling back to one vector before the end");
            low = 1.0 - bvsnorm;
        }
        if high > 1.0 {
            warn!("loop maximum beyond the buffer, clamping to the buffer end");
            high = 1.0;
        }

        if (high - low) < bvsnorm {
            if high - low == 0.0 {
                warn!("loop size cannot be zero, ignoring setloop");
                return;
            }
            warn!("loop size below one vector, widening symmetrically");
            if low - half < 0.0 {
                low = 0.0;
                high = bvsnorm;
            } else if high + half > 1.0 {
                high = 1.0;
                low = 1.0 - bvsnorm;
            } else {
                low -= half;
                high += half;
            }
        }
        let low = low.clamp(0.0, 1.0);
        let high = high.clamp(0.0, 1.0);

        self.min_loop = (low * frames_m1) as i64;
        self.start_loop = self.min_loop;
        self.max_loop = (high * frames_m1) as i64;
        self.end_loop = self.max_loop;

        self.select_size(self.sel_size);
        self.select_start(self.sel_start);
    }

    /// Restore the loop captured by the initial recording (`resetloop`).
    /// The -1 sentinels fall back to the full buffer.
    pub(crate) fn reset_loop(&mut self) {
        let low = (self.initial_low >= 0).then_some(self.initial_low as f64);
        let high = (self.initial_high >= 0).then_some(self.initial_high as f64);
        self.apply_loop_points(low, high, LoopUnits::Samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineParams;

    fn engine_with_frames(frames: i64) -> LooperEngine {
        let mut e = LooperEngine::new(EngineParams::default(), 48000.0, 64).unwrap();
        e.frames = frames;
        e.bsr = 48000.0;
        e.bmsr = 48.0;
        e.min_loop = 0;
        e.start_loop = 0;
        e.max_loop = frames - 1;
        e.end_loop = frames - 1;
        e
    }

    #[test]
    fn test_phase_units_map_directly() {
        let mut e = engine_with_frames(48001);
        e.apply_loop_points(Some(0.25), Some(0.75), LoopUnits::Phase);
        assert_eq!(e.min_loop, 12000);
        assert_eq!(e.max_loop, 36000);
    }

    #[test]
    fn test_sample_units_normalize() {
        let mut e = engine_with_frames(48001);
        e.apply_loop_points(Some(12000.0), Some(36000.0), LoopUnits::Samples);
        assert_eq!(e.min_loop, 12000);
        assert_eq!(e.max_loop, 36000);
    }

    #[test]
    fn test_ms_units_normalize() {
        let mut e = engine_with_frames(48001);
        // 48 samples per ms: 250ms..750ms
        e.apply_loop_points(Some(250.0), Some(750.0), LoopUnits::Milliseconds);
        assert_eq!(e.min_loop, 12000);
        assert_eq!(e.max_loop, 36000);
    }

    #[test]
    fn test_missing_high_defaults_to_full() {
        let mut e = engine_with_frames(48001);
        e.apply_loop_points(Some(0.5), None, LoopUnits::Phase);
        assert_eq!(e.min_loop, 24000);
        assert_eq!(e.max_loop, 48000);
    }

    #[test]
    fn test_descending_bounds_are_sorted() {
        let mut e = engine_with_frames(48001);
        e.apply_loop_points(Some(0.75), Some(0.25), LoopUnits::Phase);
        assert_eq!(e.min_loop, 12000);
        assert_eq!(e.max_loop, 36000);
    }

    #[test]
    fn test_identical_calls_are_idempotent() {
        let mut e = engine_with_frames(48001);
        e.apply_loop_points(Some(0.2), Some(0.8), LoopUnits::Phase);
        let first = e.loop_state();
        e.apply_loop_points(Some(0.2), Some(0.8), LoopUnits::Phase);
        assert_eq!(e.loop_state(), first);
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut e = engine_with_frames(48001);
        let before = e.loop_state();
        e.apply_loop_points(Some(0.5), Some(0.5), LoopUnits::Phase);
        assert_eq!(e.loop_state(), before);
    }

    #[test]
    fn test_tiny_loop_widens_symmetrically() {
        let mut e = engine_with_frames(48001);
        // one vector normalized: 64 / 48001 of the buffer; ask for less
        e.apply_loop_points(Some(0.5), Some(0.50001), LoopUnits::Phase);
        let snap = e.loop_state();
        assert!(snap.max_loop - snap.min_loop >= 60);
        assert!(snap.min_loop < 24000 && snap.max_loop > 24000);
    }

    #[test]
    fn test_window_wraps_past_loop_end() {
        let mut e = engine_with_frames(48001);
        e.select_size(0.5);
        e.select_start(0.75);
        let snap = e.loop_state();
        assert!(snap.wrap);
        assert!(snap.end_loop < snap.start_loop);
    }

    #[test]
    fn test_window_without_wrap() {
        let mut e = engine_with_frames(48001);
        e.select_size(0.25);
        e.select_start(0.5);
        let snap = e.loop_state();
        assert!(!snap.wrap);
        assert_eq!(snap.start_loop, 24000);
        assert_eq!(snap.end_loop, 36000);
    }

    #[test]
    fn test_selection_ignored_during_initial_capture() {
        let mut e = engine_with_frames(48001);
        e.loop_determine = true;
        let before = e.loop_state();
        e.select_start(0.5);
        assert_eq!(e.loop_state(), before);
        // but the phase is remembered for when the loop resolves
        assert_eq!(e.sel_start, 0.5);
    }

    #[test]
    fn test_reverse_window_lives_at_buffer_top() {
        let mut e = engine_with_frames(48001);
        e.direction_orig = -1;
        e.max_loop = 12000;
        e.min_loop = 0;
        e.select_size(0.5);
        e.select_start(0.0);
        let snap = e.loop_state();
        // window occupies [frames-1-max_loop, frames-1]
        assert!(snap.start_loop >= 48000 - 12000);
        assert!(snap.end_loop <= 48000);
    }
}
