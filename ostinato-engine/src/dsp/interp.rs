//! Playback sample interpolation
//!
//! Three 4-point interpolators over a fractional phase plus the wrap-around
//! index arithmetic that maps neighbor offsets back into the recorded loop
//! region. Forward loops wrap inside `[0, max_loop]`; loops originally
//! recorded in reverse live at the top of the buffer and wrap inside
//! `[frames-1 - max_loop, frames-1]`.

use serde::Deserialize;

/// Playback interpolation mode selected by the `interp` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpMode {
    /// Two-point linear
    Linear,
    /// Hermite cubic, 4-point 3rd-order
    Cubic,
    /// Catmull-Rom spline, 4-point 3rd-order
    Spline,
}

impl InterpMode {
    /// Numeric selector (0 = linear, 1 = cubic, 2 = spline), out-of-range
    /// values fall back to linear.
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => InterpMode::Cubic,
            2 => InterpMode::Spline,
            _ => InterpMode::Linear,
        }
    }
}

impl Default for InterpMode {
    fn default() -> Self {
        InterpMode::Cubic
    }
}

#[inline]
pub fn linear_interp(f: f64, x: f64, y: f64) -> f64 {
    x + f * (y - x)
}

// Hermite cubic (James McCartney / Alex Harker formulation)
#[inline]
pub fn cubic_interp(f: f64, w: f64, x: f64, y: f64, z: f64) -> f64 {
    (((0.5 * (z - w) + 1.5 * (x - y)) * f + (w - 2.5 * x + y + y - 0.5 * z)) * f
        + (0.5 * (y - w)))
        * f
        + x
}

// Catmull-Rom spline (Paul Breeuwsma / Paul Bourke formulation)
#[inline]
pub fn spline_interp(f: f64, w: f64, x: f64, y: f64, z: f64) -> f64 {
    ((-0.5 * w + 1.5 * x - 1.5 * y + 0.5 * z) * f.powi(3))
        + ((w - 2.5 * x + y + y - 0.5 * z) * f.powi(2))
        + ((-0.5 * w + 0.5 * y) * f)
        + x
}

/// Wrap a neighbor index into the loop region.
///
/// `direction_orig >= 0` wraps between 0 and `max_loop` (inclusive);
/// a reverse-recorded loop wraps between `frames_m1 - max_loop` and
/// `frames_m1`.
#[inline]
pub fn wrap_index(idx: i64, direction_orig: i8, max_loop: i64, frames_m1: i64) -> i64 {
    let wrapped = if direction_orig >= 0 {
        if idx < 0 {
            (max_loop + 1) + idx
        } else if idx > max_loop {
            idx - (max_loop + 1)
        } else {
            idx
        }
    } else {
        let min = frames_m1 - max_loop;
        if idx < min {
            frames_m1 - (min - idx)
        } else if idx > frames_m1 {
            min + (idx - frames_m1)
        } else {
            idx
        }
    };
    // an index more than one span out (head mid-correction at extreme
    // speeds) still must not leave the buffer
    wrapped.clamp(0, frames_m1)
}

/// Four neighbor indices `(i-d, i, i+d, i+2d)` around the integer playhead,
/// each wrapped into the loop region. Wrapping the center as well keeps every
/// buffer access in range even while the head is mid-correction at a loop
/// boundary (a no-op whenever the head is already inside the loop).
#[inline]
pub fn interp_index(
    playhead: i64,
    direction: i8,
    direction_orig: i8,
    max_loop: i64,
    frames_m1: i64,
) -> [i64; 4] {
    let d = direction as i64;
    let i0 = wrap_index(playhead - d, direction_orig, max_loop, frames_m1);
    let i1 = wrap_index(playhead, direction_orig, max_loop, frames_m1);
    let i2 = wrap_index(playhead + d, direction_orig, max_loop, frames_m1);
    let i3 = wrap_index(i2 + d, direction_orig, max_loop, frames_m1);
    [i0, i1, i2, i3]
}

/// Interpolated read at the four neighbor indices for one buffer channel.
///
/// While recording the read path stays linear so it cannot diverge from the
/// overdub-sum path.
#[inline]
pub fn playback_interp(
    frac: f64,
    buf: &[f32],
    idx: &[i64; 4],
    channel: usize,
    buf_channels: usize,
    mode: InterpMode,
    recording: bool,
) -> f64 {
    let at = |i: i64| buf[i as usize * buf_channels + channel] as f64;

    if recording {
        return linear_interp(frac, at(idx[1]), at(idx[2]));
    }
    match mode {
        InterpMode::Cubic => cubic_interp(frac, at(idx[0]), at(idx[1]), at(idx[2]), at(idx[3])),
        InterpMode::Spline => spline_interp(frac, at(idx[0]), at(idx[1]), at(idx[2]), at(idx[3])),
        InterpMode::Linear => linear_interp(frac, at(idx[1]), at(idx[2])),
    }
}
