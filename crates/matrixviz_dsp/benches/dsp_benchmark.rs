//! Performance benchmarks for the DSP module
//!
//! Run with: cargo bench -p matrixviz_dsp

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use matrixviz_dsp::{
    AdaptiveScaler, BinnerConfig, FrequencyBinSet, ScalerConfig, SpectralExtractor,
};

fn test_block(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let t = i as f32 / 48_000.0;
            (2.0 * std::f32::consts::PI * 220.0 * t).sin() * 0.5
                + (2.0 * std::f32::consts::PI * 3_300.0 * t).sin() * 0.2
        })
        .collect()
}

fn benchmark_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extractor");

    // FFT sizes in use: small matrix, default, high resolution
    let fft_sizes = [2048, 4096, 8192, 16384];

    for fft_size in fft_sizes {
        group.throughput(Throughput::Elements(512));

        group.bench_function(format!("extract_512_into_{}", fft_size), |b| {
            let bins = FrequencyBinSet::build(&BinnerConfig {
                fft_size,
                ..BinnerConfig::default()
            })
            .unwrap();
            let mut extractor = SpectralExtractor::new(512, fft_size, 0.3).unwrap();
            let block = test_block(512);
            let mut out = vec![0.0; bins.len()];

            b.iter(|| {
                extractor
                    .extract(black_box(&block), &bins, &mut out)
                    .unwrap();
            });
        });
    }

    group.finish();
}

fn benchmark_scaler(c: &mut Criterion) {
    c.bench_function("scaler_process_64_bins", |b| {
        let mut scaler = AdaptiveScaler::new(ScalerConfig::default(), 64);
        let raw: Vec<f32> = (0..64).map(|i| (i as f32 * 0.37).sin().abs() * 4.0).collect();

        b.iter(|| {
            let frame = scaler.process(black_box(&raw));
            black_box(frame.smoothed[0]);
        });
    });
}

fn benchmark_bin_build(c: &mut Criterion) {
    c.bench_function("bin_set_build_64", |b| {
        let config = BinnerConfig::default();
        b.iter(|| black_box(FrequencyBinSet::build(black_box(&config)).unwrap()));
    });
}

criterion_group!(benches, benchmark_extract, benchmark_scaler, benchmark_bin_build);

criterion_main!(benches);
