//! Live monitor
//!
//! Streams the looper to the default output device. A worker thread renders
//! engine vectors into a lock-free ring of interleaved samples; the cpal
//! callback drains it without ever taking a lock, counting underruns the
//! same way it would in a production output stage. Control lines arrive on
//! stdin (`record`, `play`, `speed -1`, ...; `quit` exits).

use crate::config::CliConfig;
use crate::render::load_wav;
use crate::script::{parse_action, Action};
use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ostinato_engine::{LooperEngine, SharedSampleBuffer, SpeedInput};
use ringbuf::{traits::*, HeapRb};
use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// ~170ms of slack at 48kHz, mono
const RING_FRAMES: usize = 8192;

pub fn run(config: &CliConfig, input: &Path) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no default audio output device"))?;
    let supported = device
        .default_output_config()
        .context("querying default output config")?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        bail!(
            "unsupported output sample format {:?}",
            supported.sample_format()
        );
    }
    let stream_config: cpal::StreamConfig = supported.config();
    let sr = stream_config.sample_rate.0 as f64;
    let device_channels = stream_config.channels as usize;
    info!(
        device = %device.name().unwrap_or_else(|_| "unknown".into()),
        sample_rate = sr,
        channels = device_channels,
        "opening output stream"
    );

    let engine_channels = config.engine.channels;
    let source = load_wav(input, engine_channels)?;

    let loop_frames = (config.loop_seconds * sr) as usize;
    let buffer = Arc::new(SharedSampleBuffer::new(loop_frames, engine_channels, sr)?);
    let mut engine = LooperEngine::new(config.engine.clone(), sr, config.vector_size)?;
    engine.bind_buffer(buffer)?;
    let mut controls = engine
        .take_controls()
        .expect("controls are available on a fresh engine");

    let ring = HeapRb::<f32>::new(RING_FRAMES * engine_channels);
    let (mut producer, mut consumer) = ring.split();

    let running = Arc::new(AtomicBool::new(true));
    let speed_bits = Arc::new(AtomicU64::new(1.0f64.to_bits()));
    let underruns = Arc::new(AtomicU64::new(0));

    // audio callback: drain the ring, silence on underrun
    let callback_underruns = Arc::clone(&underruns);
    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(device_channels) {
                // only consume whole frames so channels cannot slip
                if consumer.occupied_len() < engine_channels {
                    let count = callback_underruns.fetch_add(1, Ordering::Relaxed) + 1;
                    if count % 1000 == 0 {
                        warn!("output ring underrun (total: {})", count);
                    }
                    frame.fill(0.0);
                    continue;
                }
                let mut engine_frame = [0.0f32; 4];
                for slot in engine_frame.iter_mut().take(engine_channels) {
                    *slot = consumer.try_pop().unwrap_or(0.0);
                }
                for (c, slot) in frame.iter_mut().enumerate() {
                    *slot = engine_frame[c.min(engine_channels - 1)];
                }
            }
        },
        |err| error!("output stream error: {}", err),
        None,
    )?;
    stream.play().context("starting output stream")?;

    // worker: render vectors whenever the ring has room
    let worker_running = Arc::clone(&running);
    let worker_speed = Arc::clone(&speed_bits);
    let vector = config.vector_size;
    let worker = std::thread::spawn(move || {
        let mut inputs: Vec<Vec<f32>> = vec![vec![0.0; vector]; engine_channels];
        let mut outputs: Vec<Vec<f32>> = vec![vec![0.0; vector]; engine_channels];
        let mut frame = 0usize;

        while worker_running.load(Ordering::Relaxed) {
            if producer.vacant_len() < vector * engine_channels {
                std::thread::sleep(Duration::from_millis(2));
                continue;
            }

            // cycle the source file as the record input
            for (c, channel) in inputs.iter_mut().enumerate() {
                for (k, slot) in channel.iter_mut().enumerate() {
                    *slot = if source.frames == 0 {
                        0.0
                    } else {
                        source.channels[c][(frame + k) % source.frames]
                    };
                }
            }
            frame = (frame + vector) % source.frames.max(1);

            let speed = f64::from_bits(worker_speed.load(Ordering::Relaxed));
            {
                let input_refs: Vec<&[f32]> = inputs.iter().map(|ch| ch.as_slice()).collect();
                let mut output_refs: Vec<&mut [f32]> =
                    outputs.iter_mut().map(|ch| ch.as_mut_slice()).collect();
                engine.process_block(
                    &input_refs,
                    SpeedInput::Scalar(speed),
                    &mut output_refs,
                    None,
                );
            }

            for k in 0..vector {
                for channel in outputs.iter() {
                    let _ = producer.try_push(channel[k]);
                }
            }

            if let Some(report) = engine.take_report() {
                if let Ok(line) = serde_json::to_string(&report) {
                    info!(target: "ostinato::report", "{}", line);
                }
            }
        }
    });

    info!("live: type commands (record/play/stop/jump 0.5/speed -1/...), 'quit' to exit");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens[0] == "quit" || tokens[0] == "exit" {
            break;
        }
        match parse_action(&tokens) {
            Ok(Action::Engine(command)) => {
                if let Err(e) = controls.send(command) {
                    warn!("{}", e);
                }
            }
            Ok(Action::Speed(value)) => {
                speed_bits.store(value.to_bits(), Ordering::Relaxed);
            }
            Err(e) => warn!("{}", e),
        }
    }

    running.store(false, Ordering::Relaxed);
    worker.join().map_err(|_| anyhow!("render worker panicked"))?;
    drop(stream);
    info!(
        underruns = underruns.load(Ordering::Relaxed),
        "live session closed"
    );
    Ok(())
}
