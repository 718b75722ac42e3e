//! Engine state and the vector-level entry point
//!
//! `LooperEngine` owns every piece of looper state: heads, loop bounds, fade
//! counters, transport flags and per-channel envelope followers. The audio
//! thread drives it through `process_block`; the control thread talks to it
//! only through the SPSC command ring obtained from `take_controls`.

use crate::buffer::{BufferInner, SharedSampleBuffer};
use crate::config::EngineParams;
use crate::control::{command_queue, CommandReceiver, CommandSender};
use crate::dsp::fade::SwitchRampCurve;
use crate::dsp::interp::InterpMode;
use crate::dsp::ipoke::MAX_CHANNELS;
use crate::error::{BufferError, EngineError};
use crate::telemetry::{HumanState, Reporter, ReportFrame};
use std::sync::Arc;
use tracing::debug;

use super::state::ControlState;

/// Hard minimum length of a resolved initial loop, in samples.
pub(crate) const MIN_LOOP_FRAMES: i64 = 4096;

/// Capacity of the control-to-audio command ring.
const COMMAND_QUEUE_CAPACITY: usize = 64;

/// Per-vector speed input: a signal or a held scalar.
#[derive(Debug, Clone, Copy)]
pub enum SpeedInput<'a> {
    Signal(&'a [f32]),
    Scalar(f64),
}

impl SpeedInput<'_> {
    #[inline]
    pub(crate) fn at(&self, index: usize) -> f64 {
        match self {
            SpeedInput::Signal(s) => s[index] as f64,
            SpeedInput::Scalar(v) => *v,
        }
    }
}

/// Read-only view of the loop region for hosts and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSnapshot {
    pub min_loop: i64,
    pub max_loop: i64,
    pub start_loop: i64,
    pub end_loop: i64,
    pub wrap: bool,
}

/// The varispeed looper core.
pub struct LooperEngine {
    // buffer binding
    pub(crate) buffer: Option<Arc<SharedSampleBuffer>>,
    pub(crate) frames: i64,
    pub(crate) bchans: usize,
    pub(crate) nchans: usize,
    pub(crate) ochans: usize,
    pub(crate) bsr: f64,
    pub(crate) bmsr: f64,
    pub(crate) ssr: f64,
    pub(crate) srscale: f64,
    pub(crate) vsnorm: f64,
    pub(crate) bvsnorm: f64,

    // heads and window selection
    pub(crate) playhead: f64,
    pub(crate) maxhead: f64,
    pub(crate) jumphead: f64,
    pub(crate) record_head: i64,
    pub(crate) sel_start: f64,
    pub(crate) sel_size: f64,

    // per-channel envelope state
    pub(crate) o_prev: [f64; MAX_CHANNELS],
    pub(crate) o_dif: [f64; MAX_CHANNELS],
    pub(crate) write_val: [f64; MAX_CHANNELS],
    pub(crate) poke_steps: f64,
    pub(crate) overdub_target: f64,
    pub(crate) overdub_smooth: f64,
    pub(crate) interp: InterpMode,

    // loop bounds, in samples
    pub(crate) min_loop: i64,
    pub(crate) max_loop: i64,
    pub(crate) start_loop: i64,
    pub(crate) end_loop: i64,
    pub(crate) initial_low: i64,
    pub(crate) initial_high: i64,

    // fades
    pub(crate) record_fade: i64,
    pub(crate) play_fade: i64,
    pub(crate) global_ramp: i64,
    pub(crate) snr_ramp: i64,
    pub(crate) snr_fade: f64,
    pub(crate) snr_curve: SwitchRampCurve,
    pub(crate) play_flag: u8,
    pub(crate) rec_flag: u8,

    // transport state
    pub(crate) control: ControlState,
    pub(crate) human: HumanState,
    pub(crate) rec_end_mark: u8,
    pub(crate) direction_orig: i8,
    pub(crate) direction_prev: i8,
    pub(crate) stop_allowed: bool,
    pub(crate) go: bool,
    pub(crate) record: bool,
    pub(crate) record_prev: bool,
    pub(crate) loop_determine: bool,
    pub(crate) alternate: bool,
    pub(crate) append: bool,
    pub(crate) trig_init: bool,
    pub(crate) wrap: bool,
    pub(crate) jump_flag: bool,
    pub(crate) record_init: bool,
    pub(crate) primed: bool,
    pub(crate) dirty: bool,

    pub(crate) syncout: bool,
    pub(crate) reporter: Reporter,
    pub(crate) go_reported: bool,
    commands: CommandReceiver,
    sender: Option<CommandSender>,
}

impl LooperEngine {
    /// Build an engine for the given system sample rate and vector size.
    ///
    /// A buffer must be bound with [`bind_buffer`](Self::bind_buffer) before
    /// the engine produces anything but silence.
    pub fn new(
        params: EngineParams,
        sample_rate: f64,
        vector_size: usize,
    ) -> Result<Self, EngineError> {
        let params = params.validated()?;
        let (sender, receiver) = command_queue(COMMAND_QUEUE_CAPACITY);
        let vsnorm = vector_size as f64 / sample_rate;

        Ok(Self {
            buffer: None,
            frames: 0,
            bchans: params.channels,
            nchans: params.channels,
            ochans: params.channels,
            bsr: sample_rate,
            bmsr: sample_rate * 0.001,
            ssr: sample_rate,
            srscale: 1.0,
            vsnorm,
            bvsnorm: 0.0,

            playhead: 0.0,
            maxhead: 0.0,
            jumphead: 0.0,
            record_head: -1,
            sel_start: 0.0,
            sel_size: 1.0,

            o_prev: [0.0; MAX_CHANNELS],
            o_dif: [0.0; MAX_CHANNELS],
            write_val: [0.0; MAX_CHANNELS],
            poke_steps: 0.0,
            overdub_target: 1.0,
            overdub_smooth: 1.0,
            interp: params.interp,

            min_loop: 0,
            max_loop: 0,
            start_loop: 0,
            end_loop: 0,
            initial_low: -1,
            initial_high: -1,

            record_fade: params.ramp + 1,
            play_fade: params.ramp + 1,
            global_ramp: params.ramp,
            snr_ramp: params.snramp,
            snr_fade: 0.0,
            snr_curve: params.snr_curve,
            play_flag: 0,
            rec_flag: 0,

            control: ControlState::Idle,
            human: HumanState::Stop,
            rec_end_mark: 0,
            direction_orig: 0,
            direction_prev: 0,
            stop_allowed: false,
            go: false,
            record: false,
            record_prev: false,
            loop_determine: false,
            alternate: false,
            append: false,
            trig_init: false,
            wrap: false,
            jump_flag: false,
            record_init: false,
            primed: false,
            dirty: false,

            syncout: params.syncout,
            reporter: Reporter::new(params.report_ms),
            go_reported: false,
            commands: receiver,
            sender: Some(sender),
        })
    }

    /// Hand out the control-thread half of the command ring. Available once.
    pub fn take_controls(&mut self) -> Option<CommandSender> {
        self.sender.take()
    }

    /// Bind (or rebind) the shared sample buffer and reset loop geometry to
    /// cover it entirely.
    pub fn bind_buffer(&mut self, buffer: Arc<SharedSampleBuffer>) -> Result<(), BufferError> {
        {
            let inner = buffer.lock();
            if inner.frames() == 0 {
                return Err(BufferError::ZeroLength);
            }
            self.adopt_geometry(&inner);
        }
        self.buffer = Some(buffer);
        self.direction_orig = 0;
        self.playhead = 0.0;
        self.maxhead = 0.0;
        self.record_head = -1;
        self.sel_start = 0.0;
        self.sel_size = 1.0;
        self.wrap = false;
        self.primed = true;
        debug!(
            frames = self.frames,
            channels = self.bchans,
            "buffer bound, loop reset to full range"
        );
        Ok(())
    }

    /// Cache buffer properties and reset loop bounds to the full range.
    pub(crate) fn adopt_geometry(&mut self, inner: &BufferInner) {
        self.frames = inner.frames() as i64;
        self.bchans = inner.channels();
        self.nchans = self.bchans.min(self.ochans);
        self.bsr = inner.sample_rate();
        self.bmsr = inner.ms_rate();
        self.srscale = self.bsr / self.ssr;
        self.bvsnorm = self.vsnorm * (self.bsr / self.frames as f64);
        self.min_loop = 0;
        self.start_loop = 0;
        self.max_loop = self.frames - 1;
        self.end_loop = self.frames - 1;
    }

    /// Detect a host-side resize or format change at a vector boundary and
    /// re-derive the loop geometry, mirroring the original modified-buffer
    /// notification path.
    pub(crate) fn sync_geometry(&mut self, inner: &BufferInner) {
        if self.frames != inner.frames() as i64
            || self.bchans != inner.channels()
            || self.bmsr != inner.ms_rate()
        {
            debug!(
                frames = inner.frames(),
                channels = inner.channels(),
                "buffer layout changed, resetting loop geometry"
            );
            self.adopt_geometry(inner);
            self.select_size(self.sel_size);
            self.select_start(self.sel_start);
        }
    }

    /// Normalized phase of the playhead within the loop coordinate system.
    pub(crate) fn sync_phase(&self) -> f64 {
        let size = (self.max_loop - self.min_loop) as f64;
        if size <= 0.0 {
            return 0.0;
        }
        if self.direction_orig >= 0 {
            (self.playhead - self.min_loop as f64) / size
        } else {
            (self.playhead - (self.frames as f64 - size)) / size
        }
    }

    /// Pull the pending telemetry frame, if one became due this vector.
    pub fn take_report(&mut self) -> Option<ReportFrame> {
        self.reporter.take()
    }

    pub(crate) fn build_report(&self) -> ReportFrame {
        let frames_m1 = self.frames - 1;
        let size = (self.max_loop - self.min_loop).max(1) as f64;
        let reversed = self.direction_orig < 0;
        let position = if reversed {
            (self.playhead - (frames_m1 as f64 - size)) / size
        } else {
            (self.playhead - self.min_loop as f64) / size
        };
        let start = if reversed { frames_m1 as f64 - size } else { self.min_loop as f64 };
        let end = if reversed { frames_m1 as f64 } else { self.max_loop as f64 };
        ReportFrame {
            position: position.clamp(0.0, 1.0),
            go: self.go,
            record: self.record,
            start_ms: start / self.bmsr,
            end_ms: end / self.bmsr,
            window_ms: self.sel_size * size / self.bmsr,
            state: self.human,
        }
    }

    pub(crate) fn drain_commands(&mut self) {
        while let Some(command) = self.commands.pop() {
            self.apply_command(command);
        }
    }

    // ---- host/test accessors ----

    /// Fractional playhead position in samples.
    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    /// Current loop region.
    pub fn loop_state(&self) -> LoopSnapshot {
        LoopSnapshot {
            min_loop: self.min_loop,
            max_loop: self.max_loop,
            start_loop: self.start_loop,
            end_loop: self.end_loop,
            wrap: self.wrap,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.go
    }

    pub fn is_recording(&self) -> bool {
        self.record
    }

    pub fn human_state(&self) -> HumanState {
        self.human
    }

    pub fn channels(&self) -> usize {
        self.ochans
    }

    /// True while the initial capture pass is still determining loop length.
    pub fn in_initial_loop(&self) -> bool {
        self.loop_determine
    }
}
