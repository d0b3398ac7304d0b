//! Short-Time Fourier Transform (STFT) analysis and weighted overlap-add
//! resynthesis.
//!
//! [`stft`] slices a real signal into windowed frames `frame_shift` samples
//! apart and stores the half-spectrum of each frame. [`istft`] inverts every
//! half-spectrum, multiplies it by the window again, overlap-adds the frames
//! at their original positions and divides by the per-sample squared-window
//! gain `sum(w^2) / frame_shift`.
//!
//! Resynthesis is exact when every output sample sees the same squared
//! window gain, i.e. when the squared window is constant-overlap-add (COLA)
//! at the chosen shift. [`StftMode::Synthesis`] checks this up front and
//! places frames so that the first and last ones straddle the signal edges;
//! [`StftMode::Analysis`] only keeps frames lying fully inside the signal.

use log::trace;

use crate::error::{Result, SpectralError};
use crate::fourier::{irfft_packed, pack_half_spectrum, rfft_packed, unpack_half_spectrum};
use crate::frame::{get_windowed_frame_into, overlap};
use crate::view::{Strided, StridedMut};
use crate::Complex64;

/// Largest spread of per-phase squared-window sums accepted for
/// resynthesis.
pub const COLA_TOLERANCE: f64 = 1e-14;

/// Half-spectra of consecutive frames, in frame order.
pub type Spectrogram = Vec<Vec<Complex64>>;

/// Frame placement policy for [`stft`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StftMode {
    /// Frames start at sample 0 and never run past the end of the signal.
    Analysis,
    /// Frames overhang both ends so every sample is covered by a full set of
    /// overlapping frames, enabling perfect reconstruction.
    Synthesis,
}

/// Sample range `[start, end)` covered by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramePosition {
    start: isize,
    end: isize,
}

impl FramePosition {
    pub fn new(start: isize, end: isize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn start(&self) -> isize {
        self.start
    }

    pub fn end(&self) -> isize {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Middle sample, rounded toward negative infinity.
    pub fn center(&self) -> isize {
        (self.start + self.end).div_euclid(2)
    }

    pub fn to_time(&self, sample_rate: f64) -> FrameTime {
        FrameTime::new(
            self.start as f64 / sample_rate,
            self.end as f64 / sample_rate,
        )
    }
}

/// Time span of one frame in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    start: f64,
    end: f64,
}

impl FrameTime {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn center(&self) -> f64 {
        0.5 * (self.start + self.end)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Geometry of one STFT: the window, where the first frame starts, the
/// distance between frames and the length of the analysed signal.
///
/// Produced by [`stft`] and consumed by [`istft`].
#[derive(Debug, Clone, Copy)]
pub struct StftInfo<'w> {
    window: Strided<'w, f64>,
    first_frame_position: isize,
    frame_shift: usize,
    signal_length: usize,
}

impl<'w> StftInfo<'w> {
    /// # Errors
    ///
    /// [`SpectralError::InvalidArgument`] unless the window length is a power
    /// of two of at least 2, `frame_shift` is positive and divides the window
    /// length, and `signal_length` is positive.
    pub fn new(
        window: impl Into<Strided<'w, f64>>,
        first_frame_position: isize,
        frame_shift: usize,
        signal_length: usize,
    ) -> Result<Self> {
        let window = window.into();
        check_geometry(window.len(), frame_shift)?;
        if signal_length == 0 {
            return Err(SpectralError::invalid_argument(
                "signal length must be positive",
            ));
        }
        Ok(Self {
            window,
            first_frame_position,
            frame_shift,
            signal_length,
        })
    }

    pub fn window(&self) -> Strided<'w, f64> {
        self.window
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn first_frame_position(&self) -> isize {
        self.first_frame_position
    }

    pub fn frame_shift(&self) -> usize {
        self.frame_shift
    }

    pub fn signal_length(&self) -> usize {
        self.signal_length
    }

    /// Bins per half-spectrum.
    pub fn bin_count(&self) -> usize {
        self.window.len() / 2 + 1
    }

    pub fn frame_position(&self, index: usize) -> FramePosition {
        let start = self.first_frame_position + (index * self.frame_shift) as isize;
        FramePosition::new(start, start + self.window.len() as isize)
    }

    pub fn frame_time(&self, index: usize, sample_rate: f64) -> FrameTime {
        self.frame_position(index).to_time(sample_rate)
    }
}

fn check_geometry(window_len: usize, frame_shift: usize) -> Result<()> {
    if window_len < 2 || !window_len.is_power_of_two() {
        return Err(SpectralError::invalid_argument(format!(
            "window length {window_len} must be a power of two of at least 2"
        )));
    }
    if frame_shift == 0 {
        return Err(SpectralError::invalid_argument("frame shift must be positive"));
    }
    if window_len % frame_shift != 0 {
        return Err(SpectralError::invalid_argument(format!(
            "frame shift {frame_shift} does not divide window length {window_len}"
        )));
    }
    Ok(())
}

/// Spread between the largest and smallest per-phase sum of squared window
/// samples at `frame_shift`.
///
/// Phase `p` sums `w[p]^2 + w[p + shift]^2 + w[p + 2 * shift]^2 + ..`.
pub fn cola_deviation<'w>(window: impl Into<Strided<'w, f64>>, frame_shift: usize) -> Result<f64> {
    let window = window.into();
    if frame_shift == 0 {
        return Err(SpectralError::invalid_argument("frame shift must be positive"));
    }
    let mut sums = vec![0.0; frame_shift];
    for (i, w) in window.iter().enumerate() {
        sums[i % frame_shift] += w * w;
    }
    let max = sums.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = sums.iter().copied().fold(f64::INFINITY, f64::min);
    Ok(max - min)
}

/// Fail with [`SpectralError::ReconstructionNotPossible`] unless the squared
/// window is constant-overlap-add at `frame_shift`.
pub fn check_cola<'w>(window: impl Into<Strided<'w, f64>>, frame_shift: usize) -> Result<()> {
    let deviation = cola_deviation(window, frame_shift)?;
    if deviation > COLA_TOLERANCE {
        return Err(SpectralError::ReconstructionNotPossible { deviation });
    }
    Ok(())
}

/// Validate the request and lay out its frames.
fn plan_frames<'w>(
    signal_len: usize,
    window: Strided<'w, f64>,
    frame_shift: usize,
    mode: StftMode,
) -> Result<(StftInfo<'w>, usize)> {
    let window_len = window.len();
    check_geometry(window_len, frame_shift)?;
    if mode == StftMode::Synthesis {
        check_cola(window, frame_shift)?;
    }
    let too_short = SpectralError::SignalTooShort {
        signal_len,
        window_len,
    };
    if signal_len == 0 {
        return Err(too_short);
    }
    let (first, count) = match mode {
        // Truncating division: a trailing partial frame is dropped, not padded.
        StftMode::Analysis => {
            let count = (signal_len as isize - window_len as isize) / frame_shift as isize;
            (0, count.max(0) as usize)
        }
        StftMode::Synthesis => {
            let first = frame_shift as isize - window_len as isize;
            let span = signal_len + (window_len - frame_shift);
            (first, span.div_ceil(frame_shift))
        }
    };
    if count == 0 {
        return Err(too_short);
    }
    let info = StftInfo::new(window, first, frame_shift, signal_len)?;
    trace!(
        "stft: {count} frames of {window_len} samples, shift {frame_shift}, first at {first} ({mode:?})"
    );
    Ok((info, count))
}

fn analyze_frame(
    signal: Strided<'_, f64>,
    info: &StftInfo<'_>,
    index: usize,
    packed: &mut [f64],
) -> Result<Vec<Complex64>> {
    let n = info.window_len();
    let start = info.frame_position(index).start();
    get_windowed_frame_into(signal, start, info.window(), &mut packed[..n])?;
    rfft_packed(packed)?;
    Ok(unpack_half_spectrum(packed))
}

fn synthesize_frame(spectrum: &[Complex64], packed: &mut [f64]) -> Result<()> {
    pack_half_spectrum(spectrum, packed)?;
    irfft_packed(packed)
}

fn overlap_add(dst: &mut StridedMut<'_, f64>, frame: &[f64], window: Strided<'_, f64>, start: isize) {
    let (frame_offset, dst_offset, n) = overlap(start, frame.len(), dst.len());
    let samples = frame.iter().zip(window.iter()).skip(frame_offset);
    for (d, (x, w)) in dst.iter_mut().skip(dst_offset).zip(samples).take(n) {
        *d += x * w;
    }
}

/// Check every spectrum's size and return the overlap-add gain correction.
fn synthesis_scale(spectrogram: &[Vec<Complex64>], info: &StftInfo<'_>) -> Result<f64> {
    let bins = info.bin_count();
    if let Some((index, spectrum)) = spectrogram
        .iter()
        .enumerate()
        .find(|(_, s)| s.len() != bins)
    {
        return Err(SpectralError::invalid_argument(format!(
            "spectrum {index} has {} bins, expected {bins}",
            spectrum.len()
        )));
    }
    let energy: f64 = info.window().iter().map(|w| w * w).sum();
    if !energy.is_normal() {
        return Err(SpectralError::invalid_argument(
            "window has no energy to resynthesize with",
        ));
    }
    Ok(info.frame_shift() as f64 / energy)
}

/// Short-time Fourier transform of a real signal.
///
/// Returns one half-spectrum of `window.len() / 2 + 1` bins per frame along
/// with the [`StftInfo`] needed to invert it.
///
/// # Errors
///
/// * [`SpectralError::InvalidArgument`] for an unusable window length or
///   frame shift.
/// * [`SpectralError::ReconstructionNotPossible`] in
///   [`StftMode::Synthesis`] when the squared window is not COLA at
///   `frame_shift`.
/// * [`SpectralError::SignalTooShort`] when no frame can be placed.
///
/// # Examples
/// ```
/// use specframe::stft::{istft, stft, StftMode};
/// use specframe::window::sqrt_hann;
///
/// let signal: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
/// let window = sqrt_hann(16);
/// let (spectrogram, info) = stft(&signal, &window, 8, StftMode::Synthesis).unwrap();
/// let restored = istft(&spectrogram, &info).unwrap();
/// assert!(signal.iter().zip(&restored).all(|(a, b)| (a - b).abs() < 1e-10));
/// ```
pub fn stft<'s, 'w>(
    signal: impl Into<Strided<'s, f64>>,
    window: impl Into<Strided<'w, f64>>,
    frame_shift: usize,
    mode: StftMode,
) -> Result<(Spectrogram, StftInfo<'w>)> {
    let signal = signal.into();
    let (info, count) = plan_frames(signal.len(), window.into(), frame_shift, mode)?;
    let mut packed = vec![0.0; info.window_len() + 2];
    let spectrogram = (0..count)
        .map(|i| analyze_frame(signal, &info, i, &mut packed))
        .collect::<Result<Spectrogram>>()?;
    Ok((spectrogram, info))
}

/// Inverse STFT producing `info.signal_length()` samples.
///
/// # Errors
///
/// [`SpectralError::InvalidArgument`] if a spectrum does not have
/// `info.bin_count()` bins or the window is all zeros.
pub fn istft(spectrogram: &[Vec<Complex64>], info: &StftInfo<'_>) -> Result<Vec<f64>> {
    let mut out = vec![0.0; info.signal_length()];
    istft_into(spectrogram, info, &mut out)?;
    Ok(out)
}

/// Inverse STFT into `destination`.
///
/// Frame samples falling before index 0 or past the end of `destination`
/// are dropped.
pub fn istft_into<'b>(
    spectrogram: &[Vec<Complex64>],
    info: &StftInfo<'_>,
    destination: impl Into<StridedMut<'b, f64>>,
) -> Result<()> {
    let mut dst = destination.into();
    let scale = synthesis_scale(spectrogram, info)?;
    let n = info.window_len();
    let mut packed = vec![0.0; n + 2];
    dst.clear();
    for (i, spectrum) in spectrogram.iter().enumerate() {
        synthesize_frame(spectrum, &mut packed)?;
        let start = info.frame_position(i).start();
        overlap_add(&mut dst, &packed[..n], info.window(), start);
    }
    dst.iter_mut().for_each(|x| *x *= scale);
    Ok(())
}

#[cfg(feature = "parallel")]
/// [`stft`] with frames transformed on the rayon thread pool.
///
/// Requires the `parallel` feature. Each worker uses its own transform
/// cache. Requests with fewer than
/// [`crate::config::parallel_stft_min_frames`] frames run serially.
pub fn stft_parallel<'s, 'w>(
    signal: impl Into<Strided<'s, f64>>,
    window: impl Into<Strided<'w, f64>>,
    frame_shift: usize,
    mode: StftMode,
) -> Result<(Spectrogram, StftInfo<'w>)> {
    use rayon::prelude::*;

    let signal = signal.into();
    let (info, count) = plan_frames(signal.len(), window.into(), frame_shift, mode)?;
    let packed_len = info.window_len() + 2;
    let spectrogram = if count < crate::config::parallel_stft_min_frames() {
        let mut packed = vec![0.0; packed_len];
        (0..count)
            .map(|i| analyze_frame(signal, &info, i, &mut packed))
            .collect::<Result<Spectrogram>>()?
    } else {
        (0..count)
            .into_par_iter()
            .map_init(
                || vec![0.0; packed_len],
                |packed, i| analyze_frame(signal, &info, i, packed),
            )
            .collect::<Result<Spectrogram>>()?
    };
    Ok((spectrogram, info))
}

#[cfg(feature = "parallel")]
/// [`istft`] with the inverse transforms run on the rayon thread pool.
///
/// Frames are inverted in parallel and overlap-added serially in frame
/// order, so the output matches [`istft`].
pub fn istft_parallel(spectrogram: &[Vec<Complex64>], info: &StftInfo<'_>) -> Result<Vec<f64>> {
    use rayon::prelude::*;

    if spectrogram.len() < crate::config::parallel_stft_min_frames() {
        return istft(spectrogram, info);
    }
    let scale = synthesis_scale(spectrogram, info)?;
    let n = info.window_len();
    let frames = spectrogram
        .par_iter()
        .map_init(
            || vec![0.0; n + 2],
            |packed, spectrum| -> Result<Vec<f64>> {
                synthesize_frame(spectrum, packed)?;
                Ok(packed[..n].to_vec())
            },
        )
        .collect::<Result<Vec<_>>>()?;
    let mut out = vec![0.0; info.signal_length()];
    let mut dst = StridedMut::new(&mut out);
    for (i, frame) in frames.iter().enumerate() {
        overlap_add(&mut dst, frame, info.window(), info.frame_position(i).start());
    }
    out.iter_mut().for_each(|x| *x *= scale);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{hann, hamming, sqrt_hann};

    #[test]
    fn analysis_layout_truncates() {
        let window = hann(8);
        let (_, count) = plan_frames(20, Strided::from(&window), 4, StftMode::Analysis).unwrap();
        assert_eq!(count, 3);
        let (_, count) = plan_frames(16, Strided::from(&window), 4, StftMode::Analysis).unwrap();
        assert_eq!(count, 2);
        assert!(matches!(
            plan_frames(11, Strided::from(&window), 4, StftMode::Analysis),
            Err(SpectralError::SignalTooShort {
                signal_len: 11,
                window_len: 8
            })
        ));
        assert!(matches!(
            plan_frames(3, Strided::from(&window), 4, StftMode::Analysis),
            Err(SpectralError::SignalTooShort { .. })
        ));
    }

    #[test]
    fn synthesis_layout_straddles_both_edges() {
        let window = sqrt_hann(8);
        let (info, count) =
            plan_frames(16, Strided::from(&window), 4, StftMode::Synthesis).unwrap();
        assert_eq!(info.first_frame_position(), -4);
        assert_eq!(count, 5);
        let last = info.frame_position(count - 1);
        assert_eq!(last, FramePosition::new(12, 20));

        let window = hann(8);
        let (info, count) =
            plan_frames(16, Strided::from(&window), 2, StftMode::Synthesis).unwrap();
        assert_eq!(info.first_frame_position(), -6);
        assert_eq!(count, 11);
    }

    #[test]
    fn geometry_is_validated() {
        let window = hann(6);
        assert!(matches!(
            stft(&[0.0; 32], &window, 2, StftMode::Analysis),
            Err(SpectralError::InvalidArgument(_))
        ));
        let window = hann(8);
        assert!(matches!(
            stft(&[0.0; 32], &window, 0, StftMode::Analysis),
            Err(SpectralError::InvalidArgument(_))
        ));
        assert!(matches!(
            stft(&[0.0; 32], &window, 3, StftMode::Analysis),
            Err(SpectralError::InvalidArgument(_))
        ));
        assert!(matches!(
            stft(&[0.0; 32], &[1.0], 1, StftMode::Analysis),
            Err(SpectralError::InvalidArgument(_))
        ));
    }

    #[test]
    fn cola_deviation_of_common_windows() {
        assert!(cola_deviation(&sqrt_hann(16), 8).unwrap() <= COLA_TOLERANCE);
        assert!(cola_deviation(&hann(16), 4).unwrap() <= COLA_TOLERANCE);
        assert!(cola_deviation(&hamming(16), 4).unwrap() <= COLA_TOLERANCE);
        assert!((cola_deviation(&hann(8), 4).unwrap() - 0.5).abs() < 1e-12);
        assert!(cola_deviation(&hann(8), 0).is_err());
    }

    #[test]
    fn synthesis_mode_rejects_non_cola_windows() {
        let signal = [0.0; 16];
        let window = hann(8);
        assert!(matches!(
            stft(&signal, &window, 4, StftMode::Synthesis),
            Err(SpectralError::ReconstructionNotPossible { .. })
        ));
        // Analysis makes no reconstruction promise.
        assert!(stft(&signal, &window, 4, StftMode::Analysis).is_ok());
    }

    #[test]
    fn frame_position_and_time() {
        let window = hann(8);
        let info = StftInfo::new(&window, -4, 4, 100).unwrap();
        let pos = info.frame_position(2);
        assert_eq!((pos.start(), pos.end(), pos.len()), (4, 12, 8));
        assert_eq!(pos.center(), 8);
        assert_eq!(info.frame_position(0).center(), 0);
        assert_eq!(FramePosition::new(-5, 0).center(), -3);
        let time = info.frame_time(2, 8.0);
        assert_eq!((time.start(), time.end()), (0.5, 1.5));
        assert_eq!(time.center(), 1.0);
        assert_eq!(time.duration(), 1.0);
    }

    #[test]
    fn info_rejects_empty_signal() {
        let window = hann(8);
        assert!(StftInfo::new(&window, 0, 4, 0).is_err());
        assert!(StftInfo::new(&window, 0, 3, 10).is_err());
    }

    #[test]
    fn istft_rejects_wrong_bin_count() {
        let window = sqrt_hann(8);
        let info = StftInfo::new(&window, -4, 4, 16).unwrap();
        let spectrogram = vec![vec![Complex64::new(0.0, 0.0); 5], vec![Complex64::new(0.0, 0.0); 4]];
        let mut out = vec![7.0; 16];
        assert!(matches!(
            istft_into(&spectrogram, &info, &mut out),
            Err(SpectralError::InvalidArgument(_))
        ));
        assert!(out.iter().all(|&x| x == 7.0));
    }

    #[test]
    fn istft_rejects_silent_window() {
        let window = [0.0; 8];
        let info = StftInfo::new(&window, 0, 4, 16).unwrap();
        let spectrogram = vec![vec![Complex64::new(0.0, 0.0); 5]];
        assert!(matches!(
            istft(&spectrogram, &info),
            Err(SpectralError::InvalidArgument(_))
        ));
    }

    #[test]
    fn spectra_have_half_length_plus_one_bins() {
        let signal: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let window = hann(16);
        let (spectrogram, info) = stft(&signal, &window, 4, StftMode::Analysis).unwrap();
        assert_eq!(spectrogram.len(), 6);
        assert!(spectrogram.iter().all(|s| s.len() == 9));
        assert_eq!(info.bin_count(), 9);
        assert_eq!(info.signal_length(), 40);
    }

    #[test]
    fn first_bin_is_windowed_sum() {
        let signal = [1.0; 16];
        let window = hann(8);
        let (spectrogram, _) = stft(&signal, &window, 4, StftMode::Analysis).unwrap();
        let window_sum: f64 = window.iter().sum();
        assert!((spectrogram[0][0].re - window_sum).abs() < 1e-12);
        assert!(spectrogram[0][0].im.abs() < 1e-12);
    }
}
