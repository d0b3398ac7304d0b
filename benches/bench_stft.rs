use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use specframe::window::sqrt_hann;
use specframe::{convolve, istft, resample, stft, StftMode};

fn signal(len: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn bench_stft_round_trip(c: &mut Criterion) {
    let input = signal(1 << 16);
    let mut group = c.benchmark_group("stft_round_trip");
    for &window_len in &[256usize, 1024, 4096] {
        let window = sqrt_hann(window_len);
        group.bench_with_input(
            BenchmarkId::from_parameter(window_len),
            &window_len,
            |b, &n| {
                b.iter(|| {
                    let (spectrogram, info) =
                        stft(black_box(&input), &window, n / 2, StftMode::Synthesis).unwrap();
                    istft(&spectrogram, &info).unwrap()
                })
            },
        );
    }
    group.finish();
}

fn bench_convolve(c: &mut Criterion) {
    let input = signal(1 << 15);
    let mut group = c.benchmark_group("convolve");
    for &ir_len in &[16usize, 256, 2048] {
        let ir = signal(ir_len);
        group.bench_with_input(BenchmarkId::from_parameter(ir_len), &ir, |b, ir| {
            b.iter(|| convolve(black_box(&input), ir).unwrap())
        });
    }
    group.finish();
}

fn bench_resample(c: &mut Criterion) {
    let input = signal(1 << 14);
    c.bench_function("resample_44100_to_48000", |b| {
        b.iter(|| resample(black_box(&input), 160, 147).unwrap())
    });
}

criterion_group!(benches, bench_stft_round_trip, bench_convolve, bench_resample);
criterion_main!(benches);
