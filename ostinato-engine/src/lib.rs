//! # Ostinato looper engine
//!
//! A varispeed audio looper core: records into a shared sample buffer and
//! plays it back at arbitrary (negative, fractional) speeds through a
//! windowed loop region, with overdub, append, jump, reversal and live loop
//! bound changes, all declicked.
//!
//! The engine is synchronous and real-time safe: `process_block` never
//! allocates or blocks. Control messages cross from the host thread over a
//! lock-free SPSC ring and land at vector boundaries.
//!
//! ```no_run
//! use ostinato_engine::{Command, EngineParams, LooperEngine, SharedSampleBuffer, SpeedInput};
//! use std::sync::Arc;
//!
//! let mut engine = LooperEngine::new(EngineParams::default(), 48000.0, 64).unwrap();
//! let buffer = Arc::new(SharedSampleBuffer::new(48000 * 8, 1, 48000.0).unwrap());
//! engine.bind_buffer(buffer).unwrap();
//! let mut controls = engine.take_controls().unwrap();
//!
//! controls.send(Command::Record).unwrap();
//! let input = [0.0f32; 64];
//! let mut output = [0.0f32; 64];
//! engine.process_block(&[&input[..]], SpeedInput::Scalar(1.0), &mut [&mut output[..]], None);
//! ```

pub mod buffer;
pub mod config;
pub mod control;
pub mod dsp;
pub mod error;
pub mod looper;
pub mod telemetry;

pub use buffer::SharedSampleBuffer;
pub use config::EngineParams;
pub use control::{Command, CommandSender, LoopUnits};
pub use dsp::fade::SwitchRampCurve;
pub use dsp::interp::InterpMode;
pub use error::{BufferError, CommandError, EngineError, Result};
pub use looper::{LoopSnapshot, LooperEngine, SpeedInput};
pub use telemetry::{HumanState, ReportFrame};
