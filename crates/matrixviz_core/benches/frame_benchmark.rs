//! Full-frame benchmarks: samples in, pixels out
//!
//! Run with: cargo bench -p matrixviz_core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use matrixviz_core::{AudioSource, Command, Engine, Settings, SyntheticSource, VisualizerRegistry};
use matrixviz_display::FrameBuffer;

const RATE: f32 = 48_000.0;

fn engine() -> Engine {
    Engine::new(Settings::default(), VisualizerRegistry::default(), RATE, 64, 32).unwrap()
}

fn block() -> Vec<f32> {
    let mut source = SyntheticSource::new(RATE, vec![(110.0, 0.5), (880.0, 0.3), (4400.0, 0.1)]);
    let mut block = vec![0.0; 512];
    source.read_latest(&mut block);
    block
}

fn benchmark_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_64x32");
    let samples = block();

    let modes: [(&str, &[Command]); 4] = [
        ("overflow", &[]),
        ("standard", &[Command::ToggleOverflow]),
        ("full", &[Command::ToggleFull]),
        ("shadow_peaks", &[Command::ToggleShadow, Command::TogglePeaks]),
    ];

    for (name, commands) in modes {
        group.bench_function(name, |b| {
            let mut engine = engine();
            for &command in commands {
                engine.apply(command);
            }
            let mut fb = FrameBuffer::new(64, 32).unwrap();

            b.iter(|| {
                engine.render_frame(&mut fb, black_box(&samples)).unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_layers(c: &mut Criterion) {
    c.bench_function("frame_64x32_three_layers", |b| {
        let mut engine = engine();
        engine.apply(Command::ToggleLayers);
        let mut fb = FrameBuffer::new(64, 32).unwrap();
        let samples = block();

        b.iter(|| {
            engine.render_frame(&mut fb, black_box(&samples)).unwrap();
        });
    });
}

criterion_group!(benches, benchmark_modes, benchmark_layers);

criterion_main!(benches);
