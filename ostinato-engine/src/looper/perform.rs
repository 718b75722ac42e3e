//! The per-sample perform loop
//!
//! One vector at a time: drain pending commands, take the buffer lock, run
//! the control-state gate, then walk the samples. Within a sample the order
//! is fixed: state gate, head movement, interpolated read, ramp application,
//! emit, iPoke write, fade advancement. Reading before writing is what makes
//! overdub sum the pre-write sample.
//!
//! Two halves mirror the looper's two lives. While `loop_determine` is set
//! the initial capture is still growing the loop: output stays silent, the
//! head tracks its furthest excursion, and hitting a buffer end resolves the
//! loop length. Afterwards the loop-playback half does windowed, wrapped,
//! varispeed reading with the switch-and-ramp declicker and the record/play
//! edge fades.

use super::engine::{LooperEngine, SpeedInput, MIN_LOOP_FRAMES};
use crate::dsp::ipoke::MAX_CHANNELS;
use crate::dsp::{fade, interp, ipoke};

impl LooperEngine {
    /// Render one vector.
    ///
    /// `inputs` and `outputs` carry one slice per engine channel, all the
    /// same length. The sync slice is written only when the engine was built
    /// with `syncout`. Without a bound buffer, or when the buffer lock is
    /// contended, the vector degrades to silence.
    pub fn process_block(
        &mut self,
        inputs: &[&[f32]],
        speed: SpeedInput<'_>,
        outputs: &mut [&mut [f32]],
        mut sync_out: Option<&mut [f32]>,
    ) {
        assert_eq!(inputs.len(), self.ochans, "input channel count mismatch");
        assert_eq!(outputs.len(), self.ochans, "output channel count mismatch");
        let n = match outputs.first() {
            Some(o) => o.len(),
            None => return,
        };
        if n == 0 {
            return;
        }

        // Commands land at the vector boundary, in arrival order.
        self.drain_commands();

        let Some(buffer) = self.buffer.clone() else {
            silence(outputs, sync_out.as_deref_mut());
            return;
        };
        let Some(mut inner) = buffer.try_lock() else {
            // another holder has the buffer; degrade for one vector
            silence(outputs, sync_out.as_deref_mut());
            return;
        };
        if inner.frames() == 0 {
            silence(outputs, sync_out.as_deref_mut());
            return;
        }
        self.sync_geometry(&inner);
        let b = inner.samples_mut();

        self.dirty = self.record || self.record_prev;
        self.dispatch_control_state();

        // per-vector overdub amplitude smoothing
        let ovdb_step = if self.overdub_smooth != self.overdub_target {
            (self.overdub_target - self.overdub_smooth) / n as f64
        } else {
            0.0
        };

        for s in 0..n {
            let sample_speed = speed.at(s);
            let mut recin = [0.0f64; MAX_CHANNELS];
            for (c, input) in inputs.iter().enumerate() {
                recin[c] = input[s] as f64;
            }

            let (osamp, sync) = if self.loop_determine {
                self.initial_sample(b, recin, sample_speed)
            } else {
                self.loop_sample(b, recin, sample_speed)
            };

            for (c, output) in outputs.iter_mut().enumerate() {
                output[s] = osamp[c] as f32;
            }
            if let Some(sync_slice) = sync_out.as_deref_mut() {
                if self.syncout {
                    sync_slice[s] = sync as f32;
                }
            }

            self.overdub_smooth += ovdb_step;
            if self.dirty {
                self.initial_high = self.max_loop;
            }
        }
        drop(inner);

        if self.dirty {
            buffer.mark_dirty();
        }

        // telemetry: one frame on transport start, then on the interval
        if self.go && !self.go_reported {
            self.reporter.prime();
        }
        self.go_reported = self.go;
        if self.go && self.reporter.advance(n as u64, self.ssr) {
            let frame = self.build_report();
            self.reporter.publish(frame);
        }
    }

    // ---- loop-playback half ----

    fn loop_sample(
        &mut self,
        b: &mut [f32],
        recin: [f64; MAX_CHANNELS],
        speed: f64,
    ) -> ([f64; MAX_CHANNELS], f64) {
        let direction = sign(speed);
        self.direction_edge(b, direction);
        self.record_edge(b, direction, speed);

        let mut osamp = [0.0f64; MAX_CHANNELS];

        if self.go {
            if self.trig_init {
                self.loop_resolve_or_jump(b, direction);
                self.record_head = -1;
                self.trig_init = false;
                if self.record && self.rec_end_mark == 0 {
                    self.record_fade = 0;
                    self.rec_flag = 0;
                }
            } else {
                let size = self.max_loop - self.min_loop;
                self.loop_boundary(b, speed, direction, size);
                if self.jump_flag {
                    let inside = if self.wrap {
                        self.playhead < self.end_loop as f64
                            || self.playhead > self.start_loop as f64
                    } else {
                        self.playhead < self.end_loop as f64
                            && self.playhead > self.start_loop as f64
                    };
                    if inside {
                        self.jump_flag = false;
                    }
                }
            }

            let playhead_i = self.playhead.trunc() as i64;
            let frac = if direction > 0 {
                self.playhead - playhead_i as f64
            } else if direction < 0 {
                1.0 - (self.playhead - playhead_i as f64)
            } else {
                0.0
            };
            let idx = interp::interp_index(
                playhead_i,
                direction,
                self.direction_orig,
                self.max_loop,
                self.frames - 1,
            );
            for c in 0..self.ochans {
                if c < self.bchans {
                    osamp[c] =
                        interp::playback_interp(frac, b, &idx, c, self.bchans, self.interp, self.record);
                } else {
                    osamp[c] = osamp[0];
                }
            }

            if self.global_ramp > 0 {
                // switch-and-ramp: add the decaying transition discontinuity
                if self.snr_fade < 1.0 {
                    if self.snr_fade == 0.0 {
                        for c in 0..self.ochans {
                            self.o_dif[c] = self.o_prev[c] - osamp[c];
                        }
                    }
                    for c in 0..self.ochans {
                        osamp[c] += fade::ease_switchramp(self.o_dif[c], self.snr_fade, self.snr_curve);
                    }
                    self.snr_fade = (self.snr_fade + 1.0 / self.snr_ramp as f64).min(1.0);
                }

                if self.play_fade < self.global_ramp {
                    for c in 0..self.ochans {
                        osamp[c] = fade::ease_record(
                            osamp[c],
                            self.play_flag > 0,
                            self.global_ramp as f64,
                            self.play_fade,
                        );
                    }
                    self.play_fade += 1;
                    if self.play_fade >= self.global_ramp {
                        self.playfade_complete();
                    }
                }
            } else {
                self.playfade_complete();
            }
        }

        for c in 0..self.ochans {
            self.o_prev[c] = osamp[c];
        }
        let sync = self.sync_phase();

        if self.record {
            let playhead_i = self.playhead.trunc() as i64;
            let write_at = interp::wrap_index(
                playhead_i,
                self.direction_orig,
                self.max_loop,
                self.frames - 1,
            );
            let shaped = self.shape_record_input(b, recin, write_at);
            ipoke::write_loop(
                b,
                self.bchans,
                self.nchans,
                write_at,
                &mut self.record_head,
                &shaped,
                &mut self.poke_steps,
                &mut self.write_val,
                &mut self.dirty,
            );
        }
        self.recfade_advance();
        self.direction_prev = direction;

        (osamp, sync)
    }

    // ---- initial capture half ----

    fn initial_sample(
        &mut self,
        b: &mut [f32],
        recin: [f64; MAX_CHANNELS],
        speed: f64,
    ) -> ([f64; MAX_CHANNELS], f64) {
        let direction = sign(speed);
        self.direction_edge(b, direction);
        self.record_edge(b, direction, speed);

        if self.go {
            if self.trig_init {
                if self.jump_flag {
                    self.initial_jump(b, direction);
                } else if self.append {
                    self.initial_append_start(b, direction);
                    if !self.record {
                        self.initial_boundary(b, speed, direction);
                    }
                } else {
                    // capture begins: the whole buffer is in play and the
                    // travel direction fixes the loop coordinate system
                    self.direction_orig = direction;
                    self.min_loop = 0;
                    self.max_loop = self.frames - 1;
                    self.playhead = if direction >= 0 {
                        self.min_loop as f64
                    } else {
                        self.max_loop as f64
                    };
                    self.maxhead = self.playhead;
                    self.alternate = true;
                    self.record_head = -1;
                    self.snr_fade = 0.0;
                    self.trig_init = false;
                }
            } else {
                self.initial_boundary(b, speed, direction);
            }

            // play-fade bookkeeping while capturing: output is silent, but a
            // scheduled fade still decides how the capture ends
            if self.global_ramp > 0 {
                if self.play_fade < self.global_ramp {
                    self.play_fade += 1;
                    if self.play_flag > 0 && self.play_fade >= self.global_ramp {
                        if self.play_flag == 2 {
                            self.rec_end_mark = 4;
                            self.go = true;
                        }
                        self.play_flag = 0;
                        match self.rec_end_mark {
                            0 | 1 => self.go = false,
                            2 | 3 => {
                                self.go = true;
                                self.play_fade = 0;
                            }
                            4 => self.rec_end_mark = 0,
                            _ => {}
                        }
                    }
                }
            } else if self.play_flag > 0 {
                if self.play_flag == 2 {
                    self.rec_end_mark = 4;
                    self.go = true;
                }
                self.play_flag = 0;
                match self.rec_end_mark {
                    0 | 1 => self.go = false,
                    2 | 3 => self.go = true,
                    4 => self.rec_end_mark = 0,
                    _ => {}
                }
            }
        }

        let osamp = [0.0f64; MAX_CHANNELS];
        for c in 0..self.ochans {
            self.o_prev[c] = 0.0;
        }
        let sync = self.sync_phase();

        if self.record {
            let playhead_i = self.playhead.trunc() as i64;
            let shaped = self.shape_record_input(b, recin, playhead_i);
            ipoke::write_initial(
                b,
                self.bchans,
                self.nchans,
                playhead_i,
                &mut self.record_head,
                &shaped,
                &mut self.poke_steps,
                &mut self.write_val,
                direction,
                self.direction_orig,
                self.maxhead as i64,
                self.frames,
            );
            if self.global_ramp > 0 {
                if self.record_fade < self.global_ramp {
                    self.record_fade += 1;
                    if self.rec_flag > 0 && self.record_fade >= self.global_ramp {
                        self.recfade_complete_initial();
                        self.rec_flag = 0;
                    }
                }
            } else if self.rec_flag > 0 {
                self.recfade_complete_initial();
                self.rec_flag = 0;
            }
            self.record_head = playhead_i;
            self.dirty = true;
        }
        self.direction_prev = direction;

        (osamp, sync)
    }

    // ---- shared per-sample steps ----

    /// Declick when the travel direction flips mid-recording.
    fn direction_edge(&mut self, b: &mut [f32], direction: i8) {
        if self.direction_prev == direction {
            return;
        }
        if self.record && self.global_ramp > 0 {
            fade::ease_bufoff(
                self.frames - 1,
                b,
                self.bchans,
                self.record_head,
                -direction,
                self.global_ramp,
            );
            self.record_fade = 0;
            self.rec_flag = 0;
            self.record_head = -1;
        }
        self.snr_fade = 0.0;
    }

    /// Record on/off edges: de-energize splice points and restart iPoke.
    fn record_edge(&mut self, b: &mut [f32], direction: i8, speed: f64) {
        if !self.record && self.record_prev {
            // the trailing averaged slot would otherwise be dropped
            ipoke::flush_pending(
                b,
                self.bchans,
                self.nchans,
                self.record_head,
                &mut self.poke_steps,
                &mut self.write_val,
            );
            if self.global_ramp > 0 {
                fade::ease_bufoff(
                    self.frames - 1,
                    b,
                    self.bchans,
                    self.record_head,
                    direction,
                    self.global_ramp,
                );
            }
            self.record_head = -1;
            self.dirty = true;
        } else if self.record && !self.record_prev {
            self.record_fade = 0;
            self.rec_flag = 0;
            if speed < 1.0 {
                self.snr_fade = 0.0;
            }
            if self.global_ramp > 0 {
                fade::ease_bufoff(
                    self.frames - 1,
                    b,
                    self.bchans,
                    self.playhead as i64,
                    -direction,
                    self.global_ramp,
                );
            }
        }
        self.record_prev = self.record;
    }

    /// Sum the overdub contribution and shape the input by the record fade.
    fn shape_record_input(
        &self,
        b: &[f32],
        recin: [f64; MAX_CHANNELS],
        frame: i64,
    ) -> [f64; MAX_CHANNELS] {
        let mut shaped = [0.0f64; MAX_CHANNELS];
        let fading = self.record_fade < self.global_ramp && self.global_ramp > 0;
        for c in 0..self.nchans {
            let old = b[frame as usize * self.bchans + c] as f64;
            let summed = recin[c] + old * self.overdub_smooth;
            shaped[c] = if fading {
                fade::ease_record(summed, self.rec_flag > 0, self.global_ramp as f64, self.record_fade)
            } else {
                summed
            };
        }
        shaped
    }

    /// Consume a trigger: either resolve a finished recording into new loop
    /// bounds, or land the head for a jump / (re)start inside the window.
    fn loop_resolve_or_jump(&mut self, b: &mut [f32], direction: i8) {
        let frames_m1 = self.frames - 1;
        if self.rec_end_mark != 0 {
            if self.direction_orig >= 0 {
                self.max_loop = (self.maxhead as i64).max(MIN_LOOP_FRAMES).min(frames_m1);
                let size = (self.max_loop - self.min_loop) as f64;
                self.start_loop = (self.min_loop as f64 + self.sel_start * size) as i64;
                self.playhead = self.start_loop as f64;
                self.end_loop = (self.start_loop as f64 + self.sel_size * size) as i64;
                if self.end_loop > self.max_loop {
                    self.end_loop -= size as i64 + 1;
                    self.wrap = true;
                } else {
                    self.wrap = false;
                }
                if direction < 0 && self.global_ramp > 0 {
                    fade::ease_bufon(
                        frames_m1,
                        b,
                        self.bchans,
                        self.playhead as i64,
                        self.record_head,
                        direction,
                        self.global_ramp,
                    );
                }
            } else {
                self.max_loop = (frames_m1 - self.maxhead as i64)
                    .max(MIN_LOOP_FRAMES)
                    .min(frames_m1);
                let size = (self.max_loop - self.min_loop) as f64;
                self.start_loop = (frames_m1 as f64 - size + self.sel_start * size) as i64;
                if self.end_loop > frames_m1 {
                    self.end_loop = (frames_m1 - size as i64) + (self.end_loop - self.frames);
                    self.wrap = true;
                } else {
                    self.wrap = false;
                }
                self.playhead = self.end_loop as f64;
                if direction > 0 && self.global_ramp > 0 {
                    fade::ease_bufon(
                        frames_m1,
                        b,
                        self.bchans,
                        self.playhead as i64,
                        self.record_head,
                        direction,
                        self.global_ramp,
                    );
                }
            }
            if self.global_ramp > 0 {
                fade::ease_bufoff(
                    frames_m1,
                    b,
                    self.bchans,
                    self.maxhead as i64,
                    -direction,
                    self.global_ramp,
                );
            }
            self.snr_fade = 0.0;
            self.append = false;
            self.alternate = false;
            self.rec_end_mark = 0;
        } else {
            let size = (self.max_loop - self.min_loop) as f64;
            if self.jump_flag {
                self.playhead = if self.direction_orig >= 0 {
                    self.jumphead * size + self.min_loop as f64
                } else {
                    (frames_m1 - self.max_loop) as f64 + self.jumphead * size
                };
            } else {
                self.playhead = if direction < 0 {
                    self.end_loop as f64
                } else {
                    self.start_loop as f64
                };
            }
            if self.record && self.global_ramp > 0 {
                fade::ease_bufon(
                    frames_m1,
                    b,
                    self.bchans,
                    self.playhead as i64,
                    self.record_head,
                    direction,
                    self.global_ramp,
                );
            }
            self.snr_fade = 0.0;
        }
    }

    /// Restart iPoke and stamp the appropriate splice fades after a boundary
    /// correction moved the head.
    fn cut_record(&mut self, b: &mut [f32], direction: i8, use_ease_on: bool, ease_pos: i64) {
        self.snr_fade = 0.0;
        if !self.record {
            return;
        }
        if self.global_ramp > 0 {
            if use_ease_on {
                fade::ease_bufon(
                    self.frames - 1,
                    b,
                    self.bchans,
                    self.playhead as i64,
                    self.record_head,
                    direction,
                    self.global_ramp,
                );
            } else {
                fade::ease_bufoff(
                    self.frames - 1,
                    b,
                    self.bchans,
                    ease_pos,
                    -direction,
                    self.global_ramp,
                );
            }
            self.record_fade = 0;
        }
        self.rec_flag = 0;
        self.record_head = -1;
    }

    /// Advance the head by the rate-scaled speed and fold it back into the
    /// window per `(direction_orig, wrap, jump)` coordinates.
    fn loop_boundary(&mut self, b: &mut [f32], speed: f64, direction: i8, size: i64) {
        let mut advance = speed * self.srscale;
        if self.record {
            // bound the iPoke fill slope while recording
            let limit = size as f64 / 1024.0;
            if advance.abs() > limit {
                advance = limit * direction as f64;
            }
        }
        self.playhead += advance;

        let frames_m1 = (self.frames - 1) as f64;
        let size_f = size as f64;

        if self.jump_flag {
            if self.direction_orig >= 0 {
                if self.playhead > self.max_loop as f64 {
                    self.playhead -= size_f;
                    self.cut_record(b, direction, true, 0);
                } else if self.playhead < 0.0 {
                    self.playhead += self.max_loop as f64;
                    self.cut_record(b, direction, true, 0);
                }
            } else if self.playhead > frames_m1 {
                self.playhead = (frames_m1 - size_f) + (self.playhead - frames_m1);
                self.cut_record(b, direction, true, 0);
            } else if self.playhead < frames_m1 - self.max_loop as f64 {
                self.playhead = frames_m1 - ((frames_m1 - size_f) - self.playhead);
                self.cut_record(b, direction, true, 0);
            }
        } else if self.wrap {
            if self.playhead > self.end_loop as f64 && self.playhead < self.start_loop as f64 {
                self.playhead = if direction >= 0 {
                    self.start_loop as f64
                } else {
                    self.end_loop as f64
                };
                self.cut_record(b, direction, true, 0);
            } else if self.direction_orig >= 0 {
                if self.playhead > self.max_loop as f64 {
                    self.playhead -= size_f;
                    self.cut_record(b, direction, false, self.max_loop);
                } else if self.playhead < 0.0 {
                    // kept as the original computes it even though it lands
                    // past the loop end; the next boundary pass folds the
                    // head back in
                    // TODO: revisit against a reference recording before
                    // changing the formula
                    self.playhead = (self.max_loop + size) as f64;
                    self.cut_record(b, direction, false, self.min_loop);
                }
            } else {
                let reverse_min = frames_m1 - self.max_loop as f64;
                if self.playhead < reverse_min {
                    self.playhead = frames_m1 - ((frames_m1 - size_f) - self.playhead);
                    self.cut_record(b, direction, false, self.frames - 1 - self.max_loop);
                } else if self.playhead > frames_m1 {
                    self.playhead = (frames_m1 - size_f) + (self.playhead - frames_m1);
                    self.cut_record(b, direction, false, self.frames - 1);
                }
            }
        } else if self.playhead > self.end_loop as f64 || self.playhead < self.start_loop as f64 {
            self.playhead = if direction >= 0 {
                self.start_loop as f64
            } else {
                self.end_loop as f64
            };
            self.cut_record(b, direction, true, 0);
        }
    }

    /// Jump while the initial capture is still open: phase maps onto the
    /// span the head has covered so far.
    fn initial_jump(&mut self, b: &mut [f32], direction: i8) {
        if !self.jump_flag {
            return;
        }
        let frames_m1 = (self.frames - 1) as f64;
        self.playhead = if self.direction_orig >= 0 {
            self.jumphead * self.maxhead
        } else {
            frames_m1 - ((frames_m1 - self.maxhead) * self.jumphead)
        };
        self.jump_flag = false;
        self.snr_fade = 0.0;
        if self.record {
            if self.global_ramp > 0 {
                fade::ease_bufon(
                    self.frames - 1,
                    b,
                    self.bchans,
                    self.playhead as i64,
                    self.record_head,
                    direction,
                    self.global_ramp,
                );
                self.record_fade = 0;
            }
            self.rec_flag = 0;
            self.record_head = -1;
        }
        self.trig_init = false;
    }

    /// First sample of an armed append: pick up where the captured material
    /// ends (recording) or at the loop origin (playing behind the append).
    fn initial_append_start(&mut self, b: &mut [f32], direction: i8) {
        self.snr_fade = 0.0;
        self.trig_init = false;
        if self.record {
            self.playhead = self.maxhead;
            if self.global_ramp > 0 {
                fade::ease_bufon(
                    self.frames - 1,
                    b,
                    self.bchans,
                    self.playhead as i64,
                    self.record_head,
                    direction,
                    self.global_ramp,
                );
                self.record_fade = 0;
            }
            self.alternate = true;
            self.rec_flag = 0;
            self.record_head = -1;
        } else {
            self.playhead = if self.direction_orig >= 0 {
                0.0
            } else {
                (self.frames - 1) as f64
            };
            if self.global_ramp > 0 {
                fade::ease_bufon(
                    self.frames - 1,
                    b,
                    self.bchans,
                    self.playhead as i64,
                    self.record_head,
                    direction,
                    self.global_ramp,
                );
            }
        }
    }

    /// Head advancement during initial capture: buffer ends terminate the
    /// capture (or wrap it, when appending or after a reversal) and the
    /// furthest excursion is tracked as the eventual loop length.
    fn initial_boundary(&mut self, b: &mut [f32], speed: f64, direction: i8) {
        let size = self.max_loop - self.min_loop;
        let mut advance = speed * self.srscale;
        if self.record {
            let limit = size as f64 / 1024.0;
            if advance.abs() > limit {
                advance = limit * direction as f64;
            }
        }
        self.playhead += advance;
        let frames_m1 = (self.frames - 1) as f64;

        if direction == self.direction_orig {
            if self.playhead > frames_m1 {
                self.playhead = 0.0;
                ipoke::flush_pending(
                    b,
                    self.bchans,
                    self.nchans,
                    self.record_head,
                    &mut self.poke_steps,
                    &mut self.write_val,
                );
                self.record = self.append;
                if self.record && self.global_ramp > 0 {
                    fade::ease_bufoff(
                        self.frames - 1,
                        b,
                        self.bchans,
                        self.frames - 1,
                        -direction,
                        self.global_ramp,
                    );
                    self.record_head = -1;
                    self.rec_flag = 0;
                    self.record_fade = 0;
                }
                self.rec_end_mark = 1;
                self.trig_init = true;
                self.loop_determine = false;
                self.alternate = false;
                self.maxhead = frames_m1;
            } else if self.playhead < 0.0 {
                self.playhead = frames_m1;
                ipoke::flush_pending(
                    b,
                    self.bchans,
                    self.nchans,
                    self.record_head,
                    &mut self.poke_steps,
                    &mut self.write_val,
                );
                self.record = self.append;
                if self.record && self.global_ramp > 0 {
                    fade::ease_bufoff(
                        self.frames - 1,
                        b,
                        self.bchans,
                        self.min_loop,
                        -direction,
                        self.global_ramp,
                    );
                    self.record_head = -1;
                    self.rec_flag = 0;
                    self.record_fade = 0;
                }
                self.rec_end_mark = 1;
                self.trig_init = true;
                self.loop_determine = false;
                self.alternate = false;
                self.maxhead = 0.0;
            } else if (self.direction_orig >= 0 && self.maxhead < self.playhead)
                || (self.direction_orig < 0 && self.maxhead > self.playhead)
            {
                self.maxhead = self.playhead;
            }
        } else if direction < 0 {
            // reversal while the capture is open wraps over the span so far
            if self.playhead < 0.0 {
                self.playhead += self.maxhead;
                if self.global_ramp > 0 {
                    fade::ease_bufoff(
                        self.frames - 1,
                        b,
                        self.bchans,
                        self.min_loop,
                        -direction,
                        self.global_ramp,
                    );
                    self.record_head = -1;
                    self.rec_flag = 0;
                    self.record_fade = 0;
                }
            }
        } else if self.playhead > frames_m1 {
            self.playhead = self.maxhead + (self.playhead - frames_m1);
            if self.global_ramp > 0 {
                fade::ease_bufoff(
                    self.frames - 1,
                    b,
                    self.bchans,
                    self.frames - 1,
                    -direction,
                    self.global_ramp,
                );
                self.record_head = -1;
                self.rec_flag = 0;
                self.record_fade = 0;
            }
        }
    }
}

#[inline]
fn sign(speed: f64) -> i8 {
    if speed > 0.0 {
        1
    } else if speed < 0.0 {
        -1
    } else {
        0
    }
}

fn silence(outputs: &mut [&mut [f32]], sync_out: Option<&mut [f32]>) {
    for output in outputs.iter_mut() {
        output.fill(0.0);
    }
    if let Some(sync_slice) = sync_out {
        sync_slice.fill(0.0);
    }
}
