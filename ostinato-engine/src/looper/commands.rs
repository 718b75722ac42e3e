//! Command application
//!
//! Pure state mutation: each command picks the next `ControlState` (and the
//! handful of flags that gate it) for the perform loop to consume at the top
//! of the vector. Nothing here touches audio directly except the buffer
//! clear that precedes an initial recording.

use super::engine::LooperEngine;
use super::state::ControlState;
use crate::config::MAX_RAMP;
use crate::control::{Command, LoopUnits};
use crate::telemetry::HumanState;
use tracing::{debug, warn};

impl LooperEngine {
    pub(crate) fn apply_command(&mut self, command: Command) {
        match command {
            Command::Play => self.cmd_play(),
            Command::Record => self.cmd_record(),
            Command::Stop => self.cmd_stop(),
            Command::Append => self.cmd_append(),
            Command::Jump(phase) => self.cmd_jump(phase),
            Command::Overdub(amp) => self.overdub_target = amp.clamp(0.0, 1.0),
            Command::Position(phase) => self.select_start(phase),
            Command::Window(phase) => self.select_size(phase),
            Command::SetLoop { low, high, units } => {
                self.apply_loop_points(low, high, units.unwrap_or(LoopUnits::Milliseconds));
            }
            Command::ResetLoop => self.reset_loop(),
            Command::SetBuffer { buffer, low, high, units } => {
                match self.bind_buffer(buffer) {
                    Ok(()) => {
                        if low.is_some() || high.is_some() || units.is_some() {
                            self.apply_loop_points(
                                low,
                                high,
                                units.unwrap_or(LoopUnits::Milliseconds),
                            );
                        }
                    }
                    // keep the previous binding on a bad buffer
                    Err(e) => warn!("ignoring buffer rebind: {}", e),
                }
            }
            Command::Ramp(samples) => self.global_ramp = samples.clamp(0, MAX_RAMP),
            Command::SnRamp(samples) => self.snr_ramp = samples.clamp(0, MAX_RAMP),
            Command::SnrCurve(curve) => self.snr_curve = curve,
            Command::Interp(mode) => self.interp = mode,
            Command::Report(ms) => self.reporter.set_interval(ms),
        }
    }

    fn cmd_play(&mut self) {
        if !self.go && self.append {
            self.control = ControlState::Append;
            self.snr_fade = 0.0;
        } else if self.record || self.append {
            self.control = if self.alternate {
                ControlState::PlayAlt
            } else {
                ControlState::RecOff
            };
        } else {
            self.control = ControlState::PlayOn;
        }
        self.go = true;
        self.human = HumanState::Play;
        self.stop_allowed = true;
    }

    fn cmd_record(&mut self) {
        self.stop_allowed = true;
        let (control, human);

        if self.record {
            if self.alternate {
                control = ControlState::RecAlt;
                human = HumanState::Overdub;
            } else {
                control = ControlState::RecOff;
                human = if self.human == HumanState::Overdub {
                    HumanState::Play
                } else {
                    HumanState::Record
                };
            }
        } else if self.append {
            if self.go {
                if self.alternate {
                    control = ControlState::RecAlt;
                    human = HumanState::Overdub;
                } else {
                    control = ControlState::AppendSpecial;
                    human = HumanState::Append;
                }
            } else {
                control = ControlState::RecInitial;
                human = HumanState::Initial;
            }
        } else if !self.go {
            // first recording: wipe the buffer and capture a fresh loop
            self.record_init = true;
            if let Some(buffer) = &self.buffer {
                if let Some(mut inner) = buffer.try_lock() {
                    inner.clear();
                    buffer.mark_dirty();
                } else {
                    debug!("buffer busy, initial recording starts without a clear");
                }
            }
            control = ControlState::RecInitial;
            human = HumanState::Initial;
        } else {
            control = ControlState::RecOn;
            human = HumanState::Overdub;
        }

        self.go = true;
        self.control = control;
        self.human = human;
    }

    fn cmd_stop(&mut self) {
        if !self.primed || !self.stop_allowed {
            warn!("stop ignored: transport already stopped");
            return;
        }
        self.control = if self.alternate {
            ControlState::StopAlt
        } else {
            ControlState::StopReg
        };
        self.append = false;
        self.human = HumanState::Stop;
        self.stop_allowed = false;
    }

    fn cmd_append(&mut self) {
        if !self.record_init {
            warn!("append ignored: no loop has been recorded yet");
            return;
        }
        if self.append || self.loop_determine {
            warn!("append ignored: already appending or still capturing the initial loop");
            return;
        }
        self.append = true;
        self.max_loop = self.frames - 1;
        self.control = ControlState::Append;
        self.human = HumanState::Append;
        self.stop_allowed = true;
    }

    fn cmd_jump(&mut self, phase: f64) {
        if !self.primed || (self.loop_determine && !self.record) {
            warn!("jump ignored during initial loop capture");
            return;
        }
        self.control = ControlState::Jump;
        self.jumphead = phase.clamp(0.0, 1.0);
        self.stop_allowed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineParams;

    fn engine() -> LooperEngine {
        let mut e = LooperEngine::new(EngineParams::default(), 48000.0, 64).unwrap();
        e.primed = true;
        e.frames = 48000;
        e
    }

    #[test]
    fn test_play_from_idle() {
        let mut e = engine();
        e.apply_command(Command::Play);
        assert_eq!(e.control, ControlState::PlayOn);
        assert!(e.go);
        assert_eq!(e.human, HumanState::Play);
    }

    #[test]
    fn test_play_while_recording_turns_record_off() {
        let mut e = engine();
        e.record = true;
        e.apply_command(Command::Play);
        assert_eq!(e.control, ControlState::RecOff);
    }

    #[test]
    fn test_first_record_is_initial() {
        let mut e = engine();
        e.apply_command(Command::Record);
        assert_eq!(e.control, ControlState::RecInitial);
        assert_eq!(e.human, HumanState::Initial);
        assert!(e.record_init && e.go);
    }

    #[test]
    fn test_record_toggle_into_overdub() {
        let mut e = engine();
        e.record = true;
        e.alternate = true;
        e.apply_command(Command::Record);
        assert_eq!(e.control, ControlState::RecAlt);
        assert_eq!(e.human, HumanState::Overdub);
    }

    #[test]
    fn test_record_over_running_loop_is_overdub() {
        let mut e = engine();
        e.go = true;
        e.apply_command(Command::Record);
        assert_eq!(e.control, ControlState::RecOn);
        assert_eq!(e.human, HumanState::Overdub);
    }

    #[test]
    fn test_stop_only_honored_once() {
        let mut e = engine();
        e.apply_command(Command::Play);
        e.apply_command(Command::Stop);
        assert_eq!(e.control, ControlState::StopReg);
        assert_eq!(e.human, HumanState::Stop);

        // second stop is refused: the control state set by a later command
        // would otherwise clobber fade flags
        e.control = ControlState::Idle;
        e.apply_command(Command::Stop);
        assert_eq!(e.control, ControlState::Idle);
    }

    #[test]
    fn test_append_requires_recorded_loop() {
        let mut e = engine();
        e.apply_command(Command::Append);
        assert!(!e.append);

        e.record_init = true;
        e.apply_command(Command::Append);
        assert!(e.append);
        assert_eq!(e.max_loop, e.frames - 1);
        assert_eq!(e.control, ControlState::Append);
    }

    #[test]
    fn test_append_refused_during_initial_capture() {
        let mut e = engine();
        e.record_init = true;
        e.loop_determine = true;
        e.apply_command(Command::Append);
        assert!(!e.append);
    }

    #[test]
    fn test_jump_refused_during_initial_capture() {
        let mut e = engine();
        e.loop_determine = true;
        e.apply_command(Command::Jump(0.5));
        assert_eq!(e.control, ControlState::Idle);

        e.loop_determine = false;
        e.apply_command(Command::Jump(1.5));
        assert_eq!(e.control, ControlState::Jump);
        assert_eq!(e.jumphead, 1.0);
    }

    #[test]
    fn test_overdub_clamps() {
        let mut e = engine();
        e.apply_command(Command::Overdub(2.5));
        assert_eq!(e.overdub_target, 1.0);
        e.apply_command(Command::Overdub(-1.0));
        assert_eq!(e.overdub_target, 0.0);
    }

    #[test]
    fn test_ramp_clamps() {
        let mut e = engine();
        e.apply_command(Command::Ramp(100_000));
        assert_eq!(e.global_ramp, MAX_RAMP);
        e.apply_command(Command::Ramp(-1));
        assert_eq!(e.global_ramp, 0);
    }
}
