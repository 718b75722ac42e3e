//! Control messages and the lock-free delivery queue
//!
//! Commands originate on a control thread (UI, scheduler, stdin, script) and
//! cross to the audio thread through a single-producer single-consumer ring.
//! The engine drains the ring at the start of each vector, so commands take
//! effect at vector boundaries, never mid-sample, and always in arrival
//! order.

use crate::buffer::SharedSampleBuffer;
use crate::dsp::fade::SwitchRampCurve;
use crate::dsp::interp::InterpMode;
use crate::error::CommandError;
use ringbuf::{traits::*, HeapRb};
use std::sync::Arc;
use tracing::warn;

/// Units accepted by `setloop` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopUnits {
    /// Normalized 0..1 position within the buffer
    Phase,
    /// Absolute sample frames
    Samples,
    /// Milliseconds at the buffer sample rate
    Milliseconds,
}

impl LoopUnits {
    /// Parse a unit token. Unknown tokens fall back to milliseconds with a
    /// warning, matching the permissive message grammar.
    pub fn parse(token: &str) -> Self {
        match token {
            "phase" | "PHASE" | "ph" => LoopUnits::Phase,
            "samples" | "SAMPLES" | "samps" => LoopUnits::Samples,
            "ms" | "MS" | "milliseconds" => LoopUnits::Milliseconds,
            other => {
                warn!("unknown loop unit '{}', assuming milliseconds", other);
                LoopUnits::Milliseconds
            }
        }
    }
}

/// A control message, pre-parsed and ready to apply at a vector boundary.
#[derive(Debug, Clone)]
pub enum Command {
    /// Start (or resume) playback
    Play,
    /// Toggle recording: initial capture, overdub in/out, or record-off
    Record,
    /// Stop transport (honored once per stop)
    Stop,
    /// Arm an append onto the existing loop
    Append,
    /// Jump to a phase within the loop window
    Jump(f64),
    /// Overdub amplitude 0..1
    Overdub(f64),
    /// Window start phase 0..1
    Position(f64),
    /// Window size phase 0..1
    Window(f64),
    /// Set the outer loop bounds
    SetLoop {
        low: Option<f64>,
        high: Option<f64>,
        units: Option<LoopUnits>,
    },
    /// Restore the loop captured by the initial recording
    ResetLoop,
    /// Rebind the shared buffer, optionally with new loop bounds
    SetBuffer {
        buffer: Arc<SharedSampleBuffer>,
        low: Option<f64>,
        high: Option<f64>,
        units: Option<LoopUnits>,
    },
    /// Global fade length in samples, clipped to 0..=2048
    Ramp(i64),
    /// Switch-and-ramp length in samples, clipped to 0..=2048
    SnRamp(i64),
    /// Switch-and-ramp easing curve
    SnrCurve(SwitchRampCurve),
    /// Playback interpolation mode
    Interp(InterpMode),
    /// Telemetry interval in milliseconds (0 disables)
    Report(i64),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Record => "record",
            Command::Stop => "stop",
            Command::Append => "append",
            Command::Jump(_) => "jump",
            Command::Overdub(_) => "overdub",
            Command::Position(_) => "position",
            Command::Window(_) => "window",
            Command::SetLoop { .. } => "setloop",
            Command::ResetLoop => "resetloop",
            Command::SetBuffer { .. } => "set",
            Command::Ramp(_) => "ramp",
            Command::SnRamp(_) => "snramp",
            Command::SnrCurve(_) => "snrcurv",
            Command::Interp(_) => "interp",
            Command::Report(_) => "report",
        }
    }
}

/// Control-thread half of the command ring.
pub struct CommandSender {
    producer: ringbuf::HeapProd<Command>,
}

impl CommandSender {
    /// Post a command for the next vector. A full ring drops the command and
    /// reports it; the engine never blocks on the consumer side.
    pub fn send(&mut self, command: Command) -> Result<(), CommandError> {
        let name = command.name();
        self.producer.try_push(command).map_err(|_| {
            warn!("command queue full, dropping '{}'", name);
            CommandError::QueueFull(name)
        })
    }
}

/// Audio-thread half of the command ring.
pub(crate) struct CommandReceiver {
    consumer: ringbuf::HeapCons<Command>,
}

impl CommandReceiver {
    pub(crate) fn pop(&mut self) -> Option<Command> {
        self.consumer.try_pop()
    }
}

/// Build the SPSC command ring.
pub(crate) fn command_queue(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (producer, consumer) = HeapRb::new(capacity).split();
    (CommandSender { producer }, CommandReceiver { consumer })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_arrive_in_order() {
        let (mut tx, mut rx) = command_queue(8);
        tx.send(Command::Play).unwrap();
        tx.send(Command::Stop).unwrap();

        assert!(matches!(rx.pop(), Some(Command::Play)));
        assert!(matches!(rx.pop(), Some(Command::Stop)));
        assert!(rx.pop().is_none());
    }

    #[test]
    fn test_full_queue_reports_drop() {
        let (mut tx, _rx) = command_queue(2);
        tx.send(Command::Play).unwrap();
        tx.send(Command::Play).unwrap();
        let err = tx.send(Command::Stop);
        assert!(matches!(err, Err(CommandError::QueueFull("stop"))));
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!(LoopUnits::parse("phase"), LoopUnits::Phase);
        assert_eq!(LoopUnits::parse("samps"), LoopUnits::Samples);
        assert_eq!(LoopUnits::parse("ms"), LoopUnits::Milliseconds);
        assert_eq!(LoopUnits::parse("bogus"), LoopUnits::Milliseconds);
    }
}
