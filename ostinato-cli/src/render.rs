//! Offline render
//!
//! Streams a WAV file through the looper one vector at a time, firing script
//! events at their timestamps, and writes whatever the engine plays back to
//! an output WAV. Telemetry frames come out as JSON lines on the log.

use crate::config::CliConfig;
use crate::script::{parse_script, Action, ScriptEvent};
use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use ostinato_engine::{LooperEngine, SharedSampleBuffer, SpeedInput};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Deinterleaved source audio mapped onto the engine's channel count.
pub struct SourceAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: f64,
    pub frames: usize,
}

/// Read a WAV file and spread its channels across `want_channels` slices,
/// repeating the last source channel where the engine has more.
pub fn load_wav(path: &Path, want_channels: usize) -> Result<SourceAudio> {
    let reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let src_channels = spec.channels as usize;
    if src_channels == 0 {
        bail!("{} has no channels", path.display());
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("failed to decode float samples")?,
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .context("failed to decode integer samples")?
        }
    };

    let frames = interleaved.len() / src_channels;
    let mut channels = vec![Vec::with_capacity(frames); want_channels];
    for frame in 0..frames {
        for (c, channel) in channels.iter_mut().enumerate() {
            let src = c.min(src_channels - 1);
            channel.push(interleaved[frame * src_channels + src]);
        }
    }

    Ok(SourceAudio {
        channels,
        sample_rate: spec.sample_rate as f64,
        frames,
    })
}

pub fn run(config: &CliConfig, input: &Path, output: &Path, script_path: &Path) -> Result<()> {
    let channels = config.engine.channels;
    let source = load_wav(input, channels)?;
    info!(
        frames = source.frames,
        sample_rate = source.sample_rate,
        "loaded input"
    );

    let script_text = std::fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let events = parse_script(&script_text)?;
    info!(events = events.len(), "loaded script");

    let sr = source.sample_rate;
    let loop_frames = (config.loop_seconds * sr) as usize;
    let buffer = Arc::new(SharedSampleBuffer::new(loop_frames, channels, sr)?);
    let mut engine = LooperEngine::new(config.engine.clone(), sr, config.vector_size)?;
    engine.bind_buffer(buffer)?;
    let mut controls = engine
        .take_controls()
        .expect("controls are available on a fresh engine");

    // render to the end of the input or one second past the last event,
    // whichever is later
    let last_event = events.last().map(|e| e.at_seconds).unwrap_or(0.0);
    let total_frames = source.frames.max(((last_event + 1.0) * sr) as usize);

    let mut writer = WavWriter::create(
        output,
        WavSpec {
            channels: channels as u16,
            sample_rate: sr as u32,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
    )
    .with_context(|| format!("failed to create {}", output.display()))?;

    let vector = config.vector_size;
    let mut speed = 1.0f64;
    let mut next_event = 0usize;
    let mut inputs: Vec<Vec<f32>> = vec![vec![0.0; vector]; channels];
    let mut outputs: Vec<Vec<f32>> = vec![vec![0.0; vector]; channels];

    let mut frame = 0usize;
    while frame < total_frames {
        let now = frame as f64 / sr;
        while next_event < events.len() && events[next_event].at_seconds <= now {
            let ScriptEvent { at_seconds, action } = &events[next_event];
            debug!(t = *at_seconds, ?action, "script event");
            match action {
                Action::Engine(command) => {
                    if let Err(e) = controls.send(command.clone()) {
                        bail!("command queue rejected a script event: {}", e);
                    }
                }
                Action::Speed(value) => speed = *value,
            }
            next_event += 1;
        }

        let n = vector.min(total_frames - frame);
        for (c, channel) in inputs.iter_mut().enumerate() {
            for (k, slot) in channel[..n].iter_mut().enumerate() {
                *slot = source
                    .channels[c]
                    .get(frame + k)
                    .copied()
                    .unwrap_or(0.0);
            }
        }

        {
            let input_refs: Vec<&[f32]> = inputs.iter().map(|ch| &ch[..n]).collect();
            let mut output_refs: Vec<&mut [f32]> =
                outputs.iter_mut().map(|ch| &mut ch[..n]).collect();
            engine.process_block(
                &input_refs,
                SpeedInput::Scalar(speed),
                &mut output_refs,
                None,
            );
        }

        for k in 0..n {
            for channel in outputs.iter() {
                writer.write_sample(channel[k])?;
            }
        }

        if let Some(report) = engine.take_report() {
            match serde_json::to_string(&report) {
                Ok(line) => info!(target: "ostinato::report", "{}", line),
                Err(e) => debug!("failed to serialize report: {}", e),
            }
        }

        frame += n;
    }

    writer.finalize().context("failed to finalize output WAV")?;
    info!(frames = total_frames, output = %output.display(), "render complete");
    Ok(())
}
