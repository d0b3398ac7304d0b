//! # specframe - framed spectral processing for Rust
//!
//! Cached FFTs, frame extraction, STFT analysis with perfect-reconstruction
//! resynthesis, FFT convolution and Lanczos resampling over `f64` signals.
//!
//! ## Features
//!
//! - **Per-thread transform cache**: each length is planned once per thread
//!   and reused without locking
//! - **Strided views**: every operation reads and writes through
//!   [`Strided`] / [`StridedMut`], so interleaved channels and columns work
//!   without copies
//! - **STFT / ISTFT** with a constant-overlap-add check for resynthesis
//! - **Overlap-add convolution** and **rational-ratio Lanczos resampling**
//! - **Parallel STFT** (optional)
//!
//! ## Cargo Features
//!
//! - `parallel`: Enable `stft_parallel` / `istft_parallel` with Rayon
//!
//! ## Configuration
//!
//! A few tunables can be set through environment variables or at runtime,
//! see [`config`].
//!
//! ## Example
//!
//! ```
//! use specframe::{istft, stft, window::sqrt_hann, StftMode};
//!
//! let signal: Vec<f64> = (0..256).map(|i| (i as f64 * 0.05).sin()).collect();
//! let window = sqrt_hann(32);
//! let (spectrogram, info) = stft(&signal, &window, 16, StftMode::Synthesis)?;
//! assert_eq!(spectrogram[0].len(), 17);
//! let restored = istft(&spectrogram, &info)?;
//! assert_eq!(restored.len(), signal.len());
//! # Ok::<(), specframe::SpectralError>(())
//! ```
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or https://www.apache.org/licenses/LICENSE-2.0)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or https://opensource.org/licenses/MIT)
//!
//! at your option.

/// Error type and result alias
pub mod error;

/// Strided read-only and mutable signal views
pub mod view;

/// Per-thread cache of planned transforms
pub mod cache;

/// Complex and real FFTs with `1/N` inverse scaling
pub mod fourier;

/// Frame extraction with implicit zero padding
pub mod frame;

/// Window functions for signal processing
///
/// Periodic Hann, square-root Hann and Hamming windows.
pub mod window;

/// Short-Time Fourier Transform (STFT)
///
/// Windowed analysis and weighted overlap-add resynthesis.
pub mod stft;

/// FFT overlap-add convolution
pub mod convolve;

/// Lanczos resampling by rational ratios
pub mod resample;

/// Environment and runtime tunables
pub mod config;

pub use rustfft::num_complex::Complex64;

pub use convolve::{convolve, convolve_into};
pub use error::{Result, SpectralError};
pub use fourier::{fft, fft_inplace, ifft, ifft_inplace, irfft, irfft_packed, rfft, rfft_packed};
pub use frame::{get_frame, get_windowed_frame};
pub use resample::{resample, resample_with};
pub use stft::{istft, stft, Spectrogram, StftInfo, StftMode};
#[cfg(feature = "parallel")]
pub use stft::{istft_parallel, stft_parallel};
pub use view::{Strided, StridedMut};
pub use window::WindowFunction;
