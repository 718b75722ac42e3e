//! Control state machine
//!
//! Control messages do not act on the looper directly. Each one selects a
//! `ControlState`, and the perform loop consumes that state exactly once at
//! the top of the next vector, arming fade counters and the small fade-flag
//! codes the per-sample hot path dispatches on. The fade flags in turn decide
//! what happens when a fade runs out: stop the transport, re-trigger, jump,
//! enter or leave recording.

use super::engine::LooperEngine;

/// Pending control-state transition, consumed once per vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    /// Start recording the initial loop
    RecInitial,
    /// Record toggle while the alternate path is armed (into overdub)
    RecAlt,
    /// Regular record off
    RecOff,
    /// Play while the alternate path is armed (out of overdub)
    PlayAlt,
    /// Regular play on
    PlayOn,
    /// Stop while the alternate path is armed
    StopAlt,
    /// Regular stop
    StopReg,
    /// Jump to the stored phase
    Jump,
    /// Arm an append
    Append,
    /// Append straight into recording
    AppendSpecial,
    /// Regular record on over an existing loop
    RecOn,
}

impl LooperEngine {
    /// Consume the pending control state, arming flags and fade counters.
    pub(crate) fn dispatch_control_state(&mut self) {
        match self.control {
            ControlState::Idle => return,
            ControlState::RecInitial => {
                self.record = true;
                self.go = true;
                self.trig_init = true;
                self.loop_determine = true;
                self.record_fade = 0;
                self.rec_flag = 0;
                self.play_fade = 0;
                self.play_flag = 0;
            }
            ControlState::RecAlt => {
                self.rec_end_mark = 3;
                self.record = true;
                self.rec_flag = 1;
                self.play_flag = 1;
                self.play_fade = 0;
                self.record_fade = 0;
            }
            ControlState::RecOff => {
                self.rec_flag = 1;
                self.play_flag = 3;
                self.play_fade = 0;
                self.record_fade = 0;
            }
            ControlState::PlayAlt => {
                self.rec_end_mark = 2;
                self.rec_flag = 1;
                self.play_flag = 1;
                self.play_fade = 0;
                self.record_fade = 0;
            }
            ControlState::PlayOn => {
                self.trig_init = true;
            }
            ControlState::StopAlt => {
                self.play_fade = 0;
                self.record_fade = 0;
                self.rec_end_mark = 1;
                self.play_flag = 1;
                self.rec_flag = 1;
            }
            ControlState::StopReg => {
                if self.record {
                    self.record_fade = 0;
                    self.rec_flag = 1;
                }
                self.play_fade = 0;
                self.play_flag = 1;
            }
            ControlState::Jump => {
                if self.record {
                    self.record_fade = 0;
                    self.rec_flag = 2;
                }
                self.play_fade = 0;
                self.play_flag = 2;
            }
            ControlState::Append => {
                self.play_flag = 4;
                self.play_fade = 0;
            }
            ControlState::AppendSpecial => {
                self.record = true;
                self.loop_determine = true;
                self.alternate = true;
                self.snr_fade = 0.0;
                self.record_fade = 0;
                self.rec_flag = 0;
            }
            ControlState::RecOn => {
                self.play_flag = 3;
                self.rec_flag = 5;
                self.record_fade = 0;
                self.play_fade = 0;
            }
        }
        self.control = ControlState::Idle;
    }

    /// Play-fade completion dispatch for the loop-playback half.
    pub(crate) fn playfade_complete(&mut self) {
        match self.play_flag {
            0 => {}
            1 => {
                // stop: transport halts once the fade-out lands
                self.play_flag = 0;
                self.go = false;
            }
            2 => {
                if !self.record {
                    self.trig_init = true;
                    self.jump_flag = true;
                }
                self.play_flag = 0;
                self.play_fade = 0;
            }
            3 => {
                self.play_flag = 0;
                self.play_fade = 0;
            }
            4 => {
                // append: restart the growth pass behind the existing loop
                self.go = true;
                self.trig_init = true;
                self.loop_determine = true;
                self.snr_fade = 0.0;
                self.play_fade = 0;
                self.play_flag = 0;
            }
            _ => self.play_flag = 0,
        }
    }

    /// Record-fade advancement and completion for the loop-playback half.
    pub(crate) fn recfade_advance(&mut self) {
        if self.global_ramp > 0 {
            if self.record_fade < self.global_ramp {
                self.record_fade += 1;
                if self.rec_flag > 0 && self.record_fade >= self.global_ramp {
                    self.recfade_complete();
                }
            }
        } else if self.rec_flag > 0 {
            self.recfade_complete();
        }
    }

    fn recfade_complete(&mut self) {
        match self.rec_flag {
            2 => {
                self.trig_init = true;
                self.jump_flag = true;
                self.record_fade = 0;
            }
            5 => self.record = true,
            _ => self.record = false,
        }
        self.rec_flag = 0;
    }

    /// Record-fade completion during initial capture: resolves why the fade
    /// was scheduled through `rec_end_mark`.
    pub(crate) fn recfade_complete_initial(&mut self) {
        if self.rec_flag == 2 {
            self.rec_end_mark = 4;
            self.trig_init = true;
            self.jump_flag = true;
            self.record_fade = 0;
        } else if self.rec_flag == 5 {
            self.record = true;
        }

        match self.rec_end_mark {
            0 => self.record = false,
            1 => {
                // freeze the loop length from the furthest head excursion,
                // then exit initial capture like mark 2
                self.max_loop = if self.direction_orig < 0 {
                    (self.frames - 1) - self.maxhead as i64
                } else {
                    self.maxhead as i64
                };
                self.record = false;
                self.loop_determine = false;
                self.trig_init = true;
            }
            2 => {
                self.record = false;
                self.loop_determine = false;
                self.trig_init = true;
            }
            3 => {
                self.record = true;
                self.trig_init = true;
                self.record_fade = 0;
                self.loop_determine = false;
            }
            4 => self.rec_end_mark = 0,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineParams;

    fn engine() -> LooperEngine {
        LooperEngine::new(EngineParams::default(), 48000.0, 64).unwrap()
    }

    #[test]
    fn test_rec_initial_arms_everything() {
        let mut e = engine();
        e.control = ControlState::RecInitial;
        e.dispatch_control_state();

        assert!(e.record && e.go && e.trig_init && e.loop_determine);
        assert_eq!(e.record_fade, 0);
        assert_eq!(e.play_fade, 0);
        assert_eq!(e.rec_flag, 0);
        assert_eq!(e.play_flag, 0);
        assert_eq!(e.control, ControlState::Idle);
    }

    #[test]
    fn test_rec_off_arms_fade_flags() {
        let mut e = engine();
        e.control = ControlState::RecOff;
        e.dispatch_control_state();

        assert_eq!(e.rec_flag, 1);
        assert_eq!(e.play_flag, 3);
        assert_eq!(e.play_fade, 0);
        assert_eq!(e.record_fade, 0);
    }

    #[test]
    fn test_stop_regular_only_fades_record_when_recording() {
        let mut e = engine();
        e.record_fade = 99;
        e.control = ControlState::StopReg;
        e.dispatch_control_state();
        assert_eq!(e.rec_flag, 0);
        assert_eq!(e.record_fade, 99);
        assert_eq!(e.play_flag, 1);

        let mut e = engine();
        e.record = true;
        e.control = ControlState::StopReg;
        e.dispatch_control_state();
        assert_eq!(e.rec_flag, 1);
        assert_eq!(e.record_fade, 0);
    }

    #[test]
    fn test_jump_dispatch() {
        let mut e = engine();
        e.record = true;
        e.control = ControlState::Jump;
        e.dispatch_control_state();
        assert_eq!(e.rec_flag, 2);
        assert_eq!(e.play_flag, 2);
    }

    #[test]
    fn test_playfade_stop_halts_transport() {
        let mut e = engine();
        e.go = true;
        e.play_flag = 1;
        e.playfade_complete();
        assert!(!e.go);
        assert_eq!(e.play_flag, 0);
    }

    #[test]
    fn test_playfade_jump_arms_trigger_unless_recording() {
        let mut e = engine();
        e.play_flag = 2;
        e.playfade_complete();
        assert!(e.trig_init && e.jump_flag);
        assert_eq!(e.play_flag, 0);

        let mut e = engine();
        e.record = true;
        e.play_flag = 2;
        e.playfade_complete();
        assert!(!e.trig_init && !e.jump_flag);
    }

    #[test]
    fn test_playfade_append_enters_growth() {
        let mut e = engine();
        e.play_flag = 4;
        e.playfade_complete();
        assert!(e.go && e.trig_init && e.loop_determine);
        assert_eq!(e.snr_fade, 0.0);
    }

    #[test]
    fn test_recfade_codes() {
        // code 2: arm a jump
        let mut e = engine();
        e.global_ramp = 0;
        e.rec_flag = 2;
        e.recfade_advance();
        assert!(e.trig_init && e.jump_flag);
        assert_eq!(e.rec_flag, 0);

        // code 5: recording turns on
        let mut e = engine();
        e.global_ramp = 0;
        e.rec_flag = 5;
        e.recfade_advance();
        assert!(e.record);

        // anything else: recording turns off
        let mut e = engine();
        e.global_ramp = 0;
        e.record = true;
        e.rec_flag = 1;
        e.recfade_advance();
        assert!(!e.record);
    }

    #[test]
    fn test_initial_completion_freezes_loop_from_maxhead() {
        let mut e = engine();
        e.frames = 100_000;
        e.maxhead = 44100.0;
        e.loop_determine = true;
        e.rec_end_mark = 1;
        e.rec_flag = 1;
        e.recfade_complete_initial();

        assert_eq!(e.max_loop, 44100);
        assert!(!e.record && !e.loop_determine);
        assert!(e.trig_init);
    }

    #[test]
    fn test_initial_completion_mark3_keeps_recording() {
        let mut e = engine();
        e.loop_determine = true;
        e.rec_end_mark = 3;
        e.rec_flag = 1;
        e.recfade_complete_initial();

        assert!(e.record && e.trig_init);
        assert!(!e.loop_determine);
    }
}
