//! Perform-loop throughput benchmarks
//!
//! Measures the per-vector cost of the three hot configurations: plain
//! playback, varispeed playback with cubic interpolation, and overdub
//! (read + iPoke write each sample).

use criterion::{criterion_group, criterion_main, Criterion};
use ostinato_engine::{
    Command, CommandSender, EngineParams, InterpMode, LooperEngine, SharedSampleBuffer, SpeedInput,
};
use std::sync::Arc;

const SR: f64 = 48000.0;
const VECTOR: usize = 64;

fn prepared_engine(interp: InterpMode) -> (LooperEngine, CommandSender) {
    let params = EngineParams {
        channels: 1,
        ramp: 256,
        snramp: 256,
        report_ms: 0,
        interp,
        ..Default::default()
    };
    let mut engine = LooperEngine::new(params, SR, VECTOR).unwrap();
    let buffer = Arc::new(SharedSampleBuffer::new(SR as usize * 4, 1, SR).unwrap());
    engine.bind_buffer(buffer).unwrap();
    let mut controls = engine.take_controls().unwrap();

    // capture two seconds of material so playback has a real loop to chew on
    controls.send(Command::Record).unwrap();
    let noise: Vec<f32> = (0..SR as usize * 2)
        .map(|k| ((k as f32 * 0.61803) % 2.0) - 1.0)
        .collect();
    let mut out = vec![0.0f32; VECTOR];
    for chunk in noise.chunks(VECTOR) {
        engine.process_block(&[chunk], SpeedInput::Scalar(1.0), &mut [&mut out[..]], None);
    }
    controls.send(Command::Play).unwrap();
    engine.process_block(
        &[&[0.0; VECTOR][..]],
        SpeedInput::Scalar(1.0),
        &mut [&mut out[..]],
        None,
    );
    (engine, controls)
}

fn bench_playback(c: &mut Criterion) {
    let (mut engine, _controls) = prepared_engine(InterpMode::Linear);
    let input = [0.0f32; VECTOR];
    let mut out = [0.0f32; VECTOR];

    c.bench_function("playback_unit_speed", |bencher| {
        bencher.iter(|| {
            engine.process_block(
                &[&input[..]],
                SpeedInput::Scalar(1.0),
                &mut [&mut out[..]],
                None,
            );
        })
    });
}

fn bench_varispeed_cubic(c: &mut Criterion) {
    let (mut engine, _controls) = prepared_engine(InterpMode::Cubic);
    let input = [0.0f32; VECTOR];
    let mut out = [0.0f32; VECTOR];

    c.bench_function("playback_varispeed_cubic", |bencher| {
        bencher.iter(|| {
            engine.process_block(
                &[&input[..]],
                SpeedInput::Scalar(-1.37),
                &mut [&mut out[..]],
                None,
            );
        })
    });
}

fn bench_overdub(c: &mut Criterion) {
    let (mut engine, mut controls) = prepared_engine(InterpMode::Linear);
    let input = [0.25f32; VECTOR];
    let mut out = [0.0f32; VECTOR];

    // drop into overdub over the running loop
    controls.send(Command::Record).unwrap();
    engine.process_block(&[&input[..]], SpeedInput::Scalar(1.0), &mut [&mut out[..]], None);

    c.bench_function("overdub_unit_speed", |bencher| {
        bencher.iter(|| {
            engine.process_block(
                &[&input[..]],
                SpeedInput::Scalar(1.0),
                &mut [&mut out[..]],
                None,
            );
        })
    });
}

criterion_group!(benches, bench_playback, bench_varispeed_cubic, bench_overdub);
criterion_main!(benches);
