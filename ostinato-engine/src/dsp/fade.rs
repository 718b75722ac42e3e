//! Fade envelopes and in-buffer declick ramps
//!
//! Everything here is built on the raised cosine `0.5 * (1 - cos(pi * k/L))`.
//! Two families of operations:
//!
//! - sample-stream envelopes (`ease_record`, `ease_switchramp`) applied to
//!   audio as it passes through the perform loop;
//! - in-buffer stamps (`ease_bufoff`, `ease_bufon`) that rewrite recorded
//!   material around record splice points so edits stay inaudible.
//!
//! The switch-and-ramp correction follows Puckette's technique: the output
//! discontinuity measured at a transition is added back in and decayed to
//! zero over the ramp, shaped by one of seven easing curves.

use serde::Deserialize;
use std::f64::consts::PI;

/// Easing curve applied by the switch-and-ramp declicker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchRampCurve {
    Linear,
    SineIn,
    CubicIn,
    CubicOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
}

impl SwitchRampCurve {
    /// Numeric selector 0..=6, out-of-range values clamp to the last curve.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => SwitchRampCurve::Linear,
            1 => SwitchRampCurve::SineIn,
            2 => SwitchRampCurve::CubicIn,
            3 => SwitchRampCurve::CubicOut,
            4 => SwitchRampCurve::ExpoIn,
            5 => SwitchRampCurve::ExpoOut,
            _ => SwitchRampCurve::ExpoInOut,
        }
    }
}

impl Default for SwitchRampCurve {
    fn default() -> Self {
        SwitchRampCurve::SineIn
    }
}

/// Raised-cosine coefficient for counter `k` over ramp length `ramp`.
#[inline]
fn raised_cosine(k: f64, ramp: f64) -> f64 {
    0.5 * (1.0 - ((k / ramp) * PI).cos())
}

/// Scale a sample by the record/play envelope.
///
/// `fading_out` selects the complement ramp (full level down to silence);
/// otherwise the sample fades in from silence. `counter` runs 0..ramp.
#[inline]
pub fn ease_record(sample: f64, fading_out: bool, ramp: f64, counter: i64) -> f64 {
    if fading_out {
        sample * raised_cosine(ramp - counter as f64, ramp)
    } else {
        sample * raised_cosine(counter as f64, ramp)
    }
}

/// Decaying switch-and-ramp correction for a signed discontinuity `delta`.
///
/// Returns the additive correction at normalized progress `fade` (0 at the
/// transition, 1 when fully decayed).
#[inline]
pub fn ease_switchramp(delta: f64, fade: f64, curve: SwitchRampCurve) -> f64 {
    match curve {
        SwitchRampCurve::Linear => delta * (1.0 - fade),
        SwitchRampCurve::SineIn => delta * (1.0 - (((fade - 1.0) * PI / 2.0).sin() + 1.0)),
        SwitchRampCurve::CubicIn => delta * (1.0 - fade * fade * fade),
        SwitchRampCurve::CubicOut => {
            let t = fade - 1.0;
            delta * (1.0 - (t * t * t + 1.0))
        }
        SwitchRampCurve::ExpoIn => {
            let t = if fade == 0.0 { 0.0 } else { 2f64.powf(10.0 * (fade - 1.0)) };
            delta * (1.0 - t)
        }
        SwitchRampCurve::ExpoOut => {
            let t = if fade == 1.0 { 1.0 } else { 1.0 - 2f64.powf(-10.0 * fade) };
            delta * (1.0 - t)
        }
        SwitchRampCurve::ExpoInOut => {
            if fade > 0.0 && fade < 0.5 {
                delta * (1.0 - 0.5 * 2f64.powf(20.0 * fade - 10.0))
            } else if fade < 1.0 && fade > 0.5 {
                delta * (1.0 - (-0.5 * 2f64.powf(-20.0 * fade + 10.0) + 1.0))
            } else {
                delta
            }
        }
    }
}

/// Multiply one frame of every channel by `gain`, skipping out-of-range
/// positions.
#[inline]
fn apply_fade(pos: i64, frames_m1: i64, buf: &mut [f32], channels: usize, gain: f64) {
    if pos < 0 || pos > frames_m1 {
        return;
    }
    let base = pos as usize * channels;
    for c in 0..channels {
        buf[base + c] = (buf[base + c] as f64 * gain) as f32;
    }
}

/// Stamp a fade-out into the buffer: `ramp` frames starting at `mark`,
/// stepping by `direction`, multiplied by the rising raised cosine (so the
/// sample at `mark` is silenced and energy returns over the ramp).
pub fn ease_bufoff(frames_m1: i64, buf: &mut [f32], channels: usize, mark: i64, direction: i8, ramp: i64) {
    if ramp <= 0 {
        return;
    }
    for i in 0..ramp {
        let pos = mark + direction as i64 * i;
        apply_fade(pos, frames_m1, buf, channels, raised_cosine(i as f64, ramp as f64));
    }
}

/// Stamp the three simultaneous splice ramps used at record-on and
/// boundary-resume points: behind `mark1`, behind `mark2`, and ahead of
/// `mark2`.
pub fn ease_bufon(
    frames_m1: i64,
    buf: &mut [f32],
    channels: usize,
    mark1: i64,
    mark2: i64,
    direction: i8,
    ramp: i64,
) {
    let d = direction as i64;
    for i in 0..ramp {
        let gain = raised_cosine(i as f64, ramp as f64);
        apply_fade((mark1 - d) - d * i, frames_m1, buf, channels, gain);
        apply_fade((mark2 - d) - d * i, frames_m1, buf, channels, gain);
        apply_fade(mark2 + d * i, frames_m1, buf, channels, gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_record_fade_in_endpoints() {
        // At counter 0 the fade-in silences the sample
        assert_eq!(ease_record(1.0, false, 64.0, 0), 0.0);

        // At the end of the ramp it passes through
        let v = ease_record(1.0, false, 64.0, 64);
        assert!((v - 1.0).abs() < 1e-12);

        // Halfway: 0.5
        let v = ease_record(1.0, false, 64.0, 32);
        assert!((v - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ease_record_fade_out_is_complement() {
        for k in 0..=64 {
            let up = ease_record(1.0, false, 64.0, k);
            let down = ease_record(1.0, true, 64.0, 64 - k);
            assert!((up - down).abs() < 1e-12);
        }
    }

    #[test]
    fn test_switchramp_decays_to_zero() {
        for curve in [
            SwitchRampCurve::Linear,
            SwitchRampCurve::SineIn,
            SwitchRampCurve::CubicIn,
            SwitchRampCurve::CubicOut,
            SwitchRampCurve::ExpoIn,
            SwitchRampCurve::ExpoOut,
        ] {
            // Full correction at the transition, none once decayed
            assert!((ease_switchramp(1.0, 0.0, curve) - 1.0).abs() < 1e-9);
            assert!(ease_switchramp(1.0, 1.0, curve).abs() < 1e-9);
        }
    }

    #[test]
    fn test_switchramp_linear_midpoint() {
        assert!((ease_switchramp(2.0, 0.5, SwitchRampCurve::Linear) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bufoff_silences_mark_and_clamps() {
        let mut buf = vec![1.0f32; 8];
        ease_bufoff(7, &mut buf, 1, 2, -1, 4);

        // Mark position multiplied by 0, earlier positions ramp back up
        assert_eq!(buf[2], 0.0);
        assert!(buf[1] > 0.0 && buf[1] < 1.0);

        // Walks off the front of the buffer without touching anything else
        assert_eq!(buf[3], 1.0);
        assert_eq!(buf[7], 1.0);
    }

    #[test]
    fn test_bufon_touches_both_marks() {
        let mut buf = vec![1.0f32; 16];
        ease_bufon(15, &mut buf, 1, 8, 4, 1, 4);

        // Behind each mark the first stamped frame is silenced
        assert_eq!(buf[7], 0.0);
        assert_eq!(buf[3], 0.0);

        // Ahead of mark2 the ramp starts silenced as well
        assert_eq!(buf[4], 0.0);
    }

    #[test]
    fn test_bufoff_zero_ramp_is_noop() {
        let mut buf = vec![1.0f32; 4];
        ease_bufoff(3, &mut buf, 1, 1, 1, 0);
        assert_eq!(buf, vec![1.0f32; 4]);
    }
}
