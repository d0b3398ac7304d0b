use specframe::stft::cola_deviation;
use specframe::window::{hamming, hann, sqrt_hann};
use specframe::WindowFunction;

#[test]
fn hann_is_periodic() {
    let w = hann(16);
    // Periodic form: w[i] == w[len - i] for 0 < i < len.
    for i in 1..16 {
        assert!((w[i] - w[16 - i]).abs() < 1e-15);
    }
    assert_eq!(w[0], 0.0);
    assert!((w[8] - 1.0).abs() < 1e-15);
}

#[test]
fn hann_overlaps_to_constant() {
    let w = hann(32);
    for phase in 0..16 {
        assert!((w[phase] + w[phase + 16] - 1.0).abs() < 1e-14);
    }
}

#[test]
fn sqrt_hann_is_cola_at_half_overlap() {
    assert!(cola_deviation(&sqrt_hann(64), 32).unwrap() < 1e-14);
}

#[test]
fn hamming_endpoints() {
    let w = hamming(32);
    assert!((w[0] - 0.08).abs() < 1e-15);
    assert!((w[16] - 1.0).abs() < 1e-15);
}

#[test]
fn window_function_generates_named_windows() {
    assert_eq!(WindowFunction::Hann.generate(8), hann(8));
    assert_eq!(WindowFunction::SqrtHann.generate(8), sqrt_hann(8));
    assert_eq!(WindowFunction::Rectangular.generate(4), vec![1.0; 4]);
}
