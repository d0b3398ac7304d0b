//! Error type shared by every transform in the crate.

use thiserror::Error;

/// Errors raised when a precondition of a spectral operation is violated.
///
/// All checks run before any output is written, so an `Err` never leaves a
/// destination half-filled.
#[derive(Debug, Error)]
pub enum SpectralError {
    /// A transform length was zero, not a power of two, or did not match
    /// the length of its counterpart buffer.
    #[error("invalid transform length {len}: must be a non-zero power of two")]
    InvalidLength { len: usize },

    /// Mismatched window, destination or spectrum sizes, or an unusable
    /// frame shift.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The window and frame shift do not satisfy the squared-window
    /// constant-overlap-add condition required for resynthesis.
    #[error("window and frame shift cannot reconstruct the signal (overlap-add deviation {deviation:e})")]
    ReconstructionNotPossible { deviation: f64 },

    /// No complete frame fits in the signal.
    #[error("signal of {signal_len} samples is too short for a {window_len}-sample window")]
    SignalTooShort { signal_len: usize, window_len: usize },

    /// The real FFT backend rejected a buffer.
    #[error(transparent)]
    Backend(#[from] realfft::FftError),
}

impl SpectralError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        SpectralError::InvalidArgument(msg.into())
    }
}

pub type Result<T, E = SpectralError> = core::result::Result<T, E>;

/// Returns `Ok(())` when `len` is a non-zero power of two.
pub(crate) fn ensure_power_of_two(len: usize) -> Result<()> {
    if len.is_power_of_two() {
        Ok(())
    } else {
        Err(SpectralError::InvalidLength { len })
    }
}
