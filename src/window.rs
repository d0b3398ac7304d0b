//! Common window functions for STFT and DSP.
//!
//! All windows are periodic (the DFT-even form, dividing by `len` rather
//! than `len - 1`), which is what overlap-add resynthesis needs.

use std::f64::consts::PI;

/// Generate a Hann window of length `len`.
pub fn hann(len: usize) -> Vec<f64> {
    let step = 2.0 * PI / len as f64;
    (0..len)
        .map(|i| 0.5 - 0.5 * (step * i as f64).cos())
        .collect()
}

/// Generate a square-root Hann window of length `len`.
///
/// Its square is a Hann window, so using it for both analysis and synthesis
/// with a frame shift of `len / 2` reconstructs perfectly.
pub fn sqrt_hann(len: usize) -> Vec<f64> {
    hann(len).into_iter().map(f64::sqrt).collect()
}

/// Generate a Hamming window of length `len`.
pub fn hamming(len: usize) -> Vec<f64> {
    let step = 2.0 * PI / len as f64;
    (0..len)
        .map(|i| 0.54 - 0.46 * (step * i as f64).cos())
        .collect()
}

/// Window shape selectable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowFunction {
    Rectangular,
    #[default]
    Hann,
    SqrtHann,
    Hamming,
}

impl WindowFunction {
    pub fn generate(&self, len: usize) -> Vec<f64> {
        match self {
            WindowFunction::Rectangular => vec![1.0; len],
            WindowFunction::Hann => hann(len),
            WindowFunction::SqrtHann => sqrt_hann(len),
            WindowFunction::Hamming => hamming(len),
        }
    }
}
