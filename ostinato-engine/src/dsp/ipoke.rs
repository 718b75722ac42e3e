//! iPoke write interpolation
//!
//! The record head is an integer trailing the fractional playhead. When
//! playback is slower than 1x, several input samples land on the same buffer
//! slot: they are accumulated and committed as their average once the head
//! moves on. When playback is faster than 1x, the gap between the old and new
//! head positions is filled by walking a linear interpolant between the last
//! committed value and the new input.
//!
//! A `record_head` of -1 restarts the scheme: the next write re-anchors the
//! head and the averaging counter.
//!
//! `write_initial` is the variant used while the initial loop is still being
//! captured. If the travel direction has reversed against the direction the
//! capture started in, the gap may cross the wrap point; the short path and
//! the long path around the recorded span are distinguished by comparing the
//! gap against half the span.

/// Channel capacity of the engine (1, 2 or 4 in use).
pub const MAX_CHANNELS: usize = 4;

#[inline]
fn put(buf: &mut [f32], channels: usize, frame: i64, channel: usize, value: f64) {
    buf[frame as usize * channels + channel] = value as f32;
}

/// Walk the interpolant over `(start, end)` exclusive, in the given
/// direction, updating each channel's running value by its slope.
#[inline]
fn fill_range(
    buf: &mut [f32],
    channels: usize,
    nchans: usize,
    start: i64,
    end: i64,
    write_val: &mut [f64; MAX_CHANNELS],
    coeff: &[f64; MAX_CHANNELS],
    direction: i8,
) {
    if direction > 0 {
        let mut i = start;
        while i < end {
            for c in 0..nchans {
                write_val[c] += coeff[c];
                put(buf, channels, i, c, write_val[c]);
            }
            i += 1;
        }
    } else {
        let mut i = start;
        while i > end {
            for c in 0..nchans {
                write_val[c] -= coeff[c];
                put(buf, channels, i, c, write_val[c]);
            }
            i -= 1;
        }
    }
}

/// Commit the pending average (if any) and write the gap between the record
/// head and the playhead. Used whenever a finished loop exists.
#[allow(clippy::too_many_arguments)]
pub fn write_loop(
    buf: &mut [f32],
    channels: usize,
    nchans: usize,
    playhead: i64,
    record_head: &mut i64,
    recin: &[f64; MAX_CHANNELS],
    poke_steps: &mut f64,
    write_val: &mut [f64; MAX_CHANNELS],
    dirty: &mut bool,
) {
    if *record_head < 0 {
        *record_head = playhead;
        *poke_steps = 0.0;
    }

    if *record_head == playhead {
        for c in 0..nchans {
            write_val[c] += recin[c];
        }
        *poke_steps += 1.0;
    } else {
        if *poke_steps > 1.0 {
            // linear averaging for speeds below 1x
            for c in 0..nchans {
                write_val[c] /= *poke_steps;
            }
            *poke_steps = 1.0;
        }
        for c in 0..nchans {
            put(buf, channels, *record_head, c, write_val[c]);
        }

        // linear interpolation for speeds above 1x
        let gap = (playhead - *record_head) as f64;
        let mut coeff = [0.0f64; MAX_CHANNELS];
        for c in 0..nchans {
            coeff[c] = (recin[c] - write_val[c]) / gap;
        }
        if gap > 0.0 {
            fill_range(buf, channels, nchans, *record_head + 1, playhead, write_val, &coeff, 1);
        } else {
            fill_range(buf, channels, nchans, *record_head - 1, playhead, write_val, &coeff, -1);
        }
        for c in 0..nchans {
            write_val[c] = recin[c];
        }
    }
    *record_head = playhead;
    *dirty = true;
}

/// iPoke variant for the initial capture pass.
///
/// While the loop length is still growing, a direction reversal can put the
/// gap across the wrap point at `max_head` (forward captures) or at
/// `frames-1 - max_head` (reverse captures). The caller re-anchors
/// `record_head` to the playhead afterwards.
#[allow(clippy::too_many_arguments)]
pub fn write_initial(
    buf: &mut [f32],
    channels: usize,
    nchans: usize,
    playhead: i64,
    record_head: &mut i64,
    recin: &[f64; MAX_CHANNELS],
    poke_steps: &mut f64,
    write_val: &mut [f64; MAX_CHANNELS],
    direction: i8,
    direction_orig: i8,
    max_head: i64,
    frames: i64,
) {
    if *record_head < 0 {
        *record_head = playhead;
        *poke_steps = 0.0;
    }

    if *record_head == playhead {
        for c in 0..nchans {
            write_val[c] += recin[c];
        }
        *poke_steps += 1.0;
        return;
    }

    if *poke_steps > 1.0 {
        for c in 0..nchans {
            write_val[c] /= *poke_steps;
        }
        *poke_steps = 1.0;
    }
    for c in 0..nchans {
        put(buf, channels, *record_head, c, write_val[c]);
    }

    let mut gap = (playhead - *record_head) as f64;
    let mut coeff = [0.0f64; MAX_CHANNELS];
    let slope = |coeff: &mut [f64; MAX_CHANNELS], write_val: &[f64; MAX_CHANNELS], gap: f64| {
        for c in 0..nchans {
            coeff[c] = (recin[c] - write_val[c]) / gap;
        }
    };

    if direction != direction_orig {
        if direction_orig >= 0 {
            if gap > 0.0 {
                if gap > max_head as f64 * 0.5 {
                    // long path through the wrap at the loop start
                    gap -= max_head as f64;
                    slope(&mut coeff, write_val, gap);
                    fill_range(buf, channels, nchans, *record_head - 1, -1, write_val, &coeff, -1);
                    fill_range(buf, channels, nchans, max_head, playhead, write_val, &coeff, -1);
                } else {
                    slope(&mut coeff, write_val, gap);
                    fill_range(buf, channels, nchans, *record_head + 1, playhead, write_val, &coeff, 1);
                }
            } else if -gap > max_head as f64 * 0.5 {
                // long path through the wrap at max_head
                gap += max_head as f64;
                slope(&mut coeff, write_val, gap);
                fill_range(buf, channels, nchans, *record_head + 1, max_head + 1, write_val, &coeff, 1);
                fill_range(buf, channels, nchans, 0, playhead, write_val, &coeff, 1);
            } else {
                slope(&mut coeff, write_val, gap);
                fill_range(buf, channels, nchans, *record_head - 1, playhead, write_val, &coeff, -1);
            }
        } else {
            let span = (frames - 1 - max_head) as f64;
            if gap > 0.0 {
                if gap > span * 0.5 {
                    gap -= span;
                    slope(&mut coeff, write_val, gap);
                    fill_range(buf, channels, nchans, *record_head - 1, max_head - 1, write_val, &coeff, -1);
                    fill_range(buf, channels, nchans, frames - 1, playhead, write_val, &coeff, -1);
                } else {
                    slope(&mut coeff, write_val, gap);
                    fill_range(buf, channels, nchans, *record_head + 1, playhead, write_val, &coeff, 1);
                }
            } else if -gap > span * 0.5 {
                gap += span;
                slope(&mut coeff, write_val, gap);
                fill_range(buf, channels, nchans, *record_head + 1, frames, write_val, &coeff, 1);
                fill_range(buf, channels, nchans, max_head, playhead, write_val, &coeff, 1);
            } else {
                slope(&mut coeff, write_val, gap);
                fill_range(buf, channels, nchans, *record_head - 1, playhead, write_val, &coeff, -1);
            }
        }
    } else if gap > 0.0 {
        slope(&mut coeff, write_val, gap);
        fill_range(buf, channels, nchans, *record_head + 1, playhead, write_val, &coeff, 1);
    } else {
        slope(&mut coeff, write_val, gap);
        fill_range(buf, channels, nchans, *record_head - 1, playhead, write_val, &coeff, -1);
    }

    for c in 0..nchans {
        write_val[c] = recin[c];
    }
}

/// Commit a pending same-slot average without interpolating a gap.
///
/// Called when recording ends so the last accumulated slot is not dropped on
/// the floor.
pub fn flush_pending(
    buf: &mut [f32],
    channels: usize,
    nchans: usize,
    record_head: i64,
    poke_steps: &mut f64,
    write_val: &mut [f64; MAX_CHANNELS],
) {
    if record_head < 0 || *poke_steps < 1.0 {
        return;
    }
    if *poke_steps > 1.0 {
        for c in 0..nchans {
            write_val[c] /= *poke_steps;
        }
    }
    for c in 0..nchans {
        put(buf, channels, record_head, c, write_val[c]);
    }
    *poke_steps = 1.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> (i64, f64, [f64; MAX_CHANNELS]) {
        (-1, 0.0, [0.0; MAX_CHANNELS])
    }

    fn rec(v: f64) -> [f64; MAX_CHANNELS] {
        [v, 0.0, 0.0, 0.0]
    }

    #[test]
    fn test_unit_speed_commits_previous_slot() {
        let mut buf = vec![0.0f32; 8];
        let (mut head, mut steps, mut wv) = state();
        let mut dirty = false;

        write_loop(&mut buf, 1, 1, 0, &mut head, &rec(10.0), &mut steps, &mut wv, &mut dirty);
        write_loop(&mut buf, 1, 1, 1, &mut head, &rec(11.0), &mut steps, &mut wv, &mut dirty);
        write_loop(&mut buf, 1, 1, 2, &mut head, &rec(12.0), &mut steps, &mut wv, &mut dirty);

        // Slot k is committed once the head reaches k+1
        assert_eq!(buf[0], 10.0);
        assert_eq!(buf[1], 11.0);
        assert_eq!(buf[2], 0.0);
        assert!(dirty);
    }

    #[test]
    fn test_half_speed_averages_colliding_samples() {
        let mut buf = vec![0.0f32; 8];
        let (mut head, mut steps, mut wv) = state();
        let mut dirty = false;

        // Two input samples land on slot 0, then the head moves to 1
        write_loop(&mut buf, 1, 1, 0, &mut head, &rec(4.0), &mut steps, &mut wv, &mut dirty);
        write_loop(&mut buf, 1, 1, 0, &mut head, &rec(6.0), &mut steps, &mut wv, &mut dirty);
        write_loop(&mut buf, 1, 1, 1, &mut head, &rec(7.0), &mut steps, &mut wv, &mut dirty);

        assert_eq!(buf[0], 5.0);
    }

    #[test]
    fn test_double_speed_fills_skipped_slots() {
        let mut buf = vec![0.0f32; 8];
        let (mut head, mut steps, mut wv) = state();
        let mut dirty = false;

        write_loop(&mut buf, 1, 1, 0, &mut head, &rec(0.0), &mut steps, &mut wv, &mut dirty);
        write_loop(&mut buf, 1, 1, 2, &mut head, &rec(2.0), &mut steps, &mut wv, &mut dirty);
        write_loop(&mut buf, 1, 1, 4, &mut head, &rec(4.0), &mut steps, &mut wv, &mut dirty);

        // Skipped slots carry the linear interpolant
        assert_eq!(buf[0], 0.0);
        assert_eq!(buf[1], 1.0);
        assert_eq!(buf[2], 2.0);
        assert_eq!(buf[3], 3.0);
    }

    #[test]
    fn test_reverse_travel_fills_downward() {
        let mut buf = vec![0.0f32; 8];
        let (mut head, mut steps, mut wv) = state();
        let mut dirty = false;

        write_loop(&mut buf, 1, 1, 6, &mut head, &rec(6.0), &mut steps, &mut wv, &mut dirty);
        write_loop(&mut buf, 1, 1, 4, &mut head, &rec(4.0), &mut steps, &mut wv, &mut dirty);

        assert_eq!(buf[6], 6.0);
        assert_eq!(buf[5], 5.0);
    }

    #[test]
    fn test_sentinel_restarts_averaging() {
        let mut buf = vec![0.0f32; 8];
        let (mut head, mut steps, mut wv) = state();
        let mut dirty = false;

        write_loop(&mut buf, 1, 1, 3, &mut head, &rec(1.0), &mut steps, &mut wv, &mut dirty);
        head = -1;
        write_loop(&mut buf, 1, 1, 5, &mut head, &rec(2.0), &mut steps, &mut wv, &mut dirty);

        // Re-anchored at 5: no gap fill back to 3
        assert_eq!(head, 5);
        assert_eq!(buf[4], 0.0);
    }

    #[test]
    fn test_initial_reversal_takes_short_path() {
        let mut buf = vec![0.0f32; 32];
        let (mut head, mut steps, mut wv) = state();

        // Capture started forward, head travelled to 10, now reversing a
        // short distance: the gap is filled directly, not across the wrap.
        write_initial(&mut buf, 1, 1, 10, &mut head, &rec(1.0), &mut steps, &mut wv, 1, 1, 10, 32);
        write_initial(&mut buf, 1, 1, 8, &mut head, &rec(3.0), &mut steps, &mut wv, -1, 1, 10, 32);
        head = 8;

        assert_eq!(buf[10], 1.0);
        assert_ne!(buf[9], 0.0);
        assert_eq!(buf[0], 0.0);
    }

    #[test]
    fn test_initial_reversal_takes_long_path_across_wrap() {
        let mut buf = vec![0.0f32; 32];
        let (mut head, mut steps, mut wv) = state();

        // Head at 1 after a forward capture out to max_head 10; jumping the
        // gap to 9 in reverse is longer than half the span, so the fill runs
        // through the wrap at 0 instead.
        write_initial(&mut buf, 1, 1, 1, &mut head, &rec(1.0), &mut steps, &mut wv, 1, 1, 10, 32);
        write_initial(&mut buf, 1, 1, 9, &mut head, &rec(2.0), &mut steps, &mut wv, -1, 1, 10, 32);

        assert_eq!(buf[1], 1.0);
        assert_ne!(buf[0], 0.0);
        assert_ne!(buf[10], 0.0);
        // the direct path stays untouched
        assert_eq!(buf[5], 0.0);
    }

    #[test]
    fn test_flush_commits_pending_average() {
        let mut buf = vec![0.0f32; 8];
        let (mut head, mut steps, mut wv) = state();
        let mut dirty = false;

        write_loop(&mut buf, 1, 1, 2, &mut head, &rec(4.0), &mut steps, &mut wv, &mut dirty);
        write_loop(&mut buf, 1, 1, 2, &mut head, &rec(6.0), &mut steps, &mut wv, &mut dirty);
        flush_pending(&mut buf, 1, 1, head, &mut steps, &mut wv);

        assert_eq!(buf[2], 5.0);
    }
}
