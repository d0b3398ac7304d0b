//! Per-thread cache of planned transforms.
//!
//! Planning an FFT builds twiddle tables and picks butterfly kernels, which
//! is far more expensive than running it. Each thread keeps its own
//! [`TransformCache`] keyed by transform length, so repeated transforms of
//! the same size reuse one plan and its scratch buffers without any locking.
//! Plans never cross threads: a worker pays the planning cost once per
//! distinct length it touches.

use std::cell::RefCell;
use std::sync::Arc;

use hashbrown::HashMap;
use log::debug;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use rustfft::{Fft, FftPlanner};

use crate::error::Result;
use crate::Complex64;

/// Forward and inverse complex FFT of one length, plus the scratch space
/// both need.
pub struct ComplexPlan {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl ComplexPlan {
    fn new(planner: &mut FftPlanner<f64>, len: usize) -> Self {
        debug!(
            "planning {len}-point complex FFT on {:?}",
            std::thread::current().id()
        );
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        Self {
            len,
            forward,
            inverse,
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Unnormalized forward transform of `buffer` in place.
    ///
    /// `buffer.len()` must equal [`ComplexPlan::len`].
    pub fn forward(&mut self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.len);
        self.forward.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Unnormalized inverse transform of `buffer` in place.
    pub fn inverse(&mut self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.len);
        self.inverse.process_with_scratch(buffer, &mut self.scratch);
    }
}

/// Real-input FFT of one length with its own time and spectrum buffers.
///
/// The time buffer holds `len` real samples, the spectrum buffer the
/// `len / 2 + 1` non-negative frequency bins. [`RealPlan::forward`] maps time
/// to spectrum and [`RealPlan::inverse`] maps spectrum back to time; both
/// consume their input buffer as workspace.
pub struct RealPlan {
    len: usize,
    forward: Arc<dyn RealToComplex<f64>>,
    inverse: Arc<dyn ComplexToReal<f64>>,
    time: Vec<f64>,
    spectrum: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl RealPlan {
    fn new(planner: &mut RealFftPlanner<f64>, len: usize) -> Self {
        debug!(
            "planning {len}-point real FFT on {:?}",
            std::thread::current().id()
        );
        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let scratch_len = forward.get_scratch_len().max(inverse.get_scratch_len());
        Self {
            len,
            time: forward.make_input_vec(),
            spectrum: forward.make_output_vec(),
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
            forward,
            inverse,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn bin_count(&self) -> usize {
        self.len / 2 + 1
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut [f64] {
        &mut self.time
    }

    pub fn spectrum(&self) -> &[Complex64] {
        &self.spectrum
    }

    pub fn spectrum_mut(&mut self) -> &mut [Complex64] {
        &mut self.spectrum
    }

    /// Unnormalized real-to-half-spectrum transform, time buffer to spectrum
    /// buffer.
    pub fn forward(&mut self) -> Result<()> {
        self.forward
            .process_with_scratch(&mut self.time, &mut self.spectrum, &mut self.scratch)?;
        Ok(())
    }

    /// Unnormalized half-spectrum-to-real transform, spectrum buffer to time
    /// buffer.
    ///
    /// The imaginary parts of the DC and Nyquist bins cannot contribute to a
    /// real signal and are cleared before the transform.
    pub fn inverse(&mut self) -> Result<()> {
        if let Some(dc) = self.spectrum.first_mut() {
            dc.im = 0.0;
        }
        if self.len % 2 == 0 {
            if let Some(nyquist) = self.spectrum.last_mut() {
                nyquist.im = 0.0;
            }
        }
        self.inverse
            .process_with_scratch(&mut self.spectrum, &mut self.time, &mut self.scratch)?;
        Ok(())
    }
}

/// Plans keyed by transform length.
pub struct TransformCache {
    planner: FftPlanner<f64>,
    real_planner: RealFftPlanner<f64>,
    complex: HashMap<usize, ComplexPlan>,
    real: HashMap<usize, RealPlan>,
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformCache {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            real_planner: RealFftPlanner::new(),
            complex: HashMap::new(),
            real: HashMap::new(),
        }
    }

    /// Complex plan for `len`, created on first request.
    pub fn fft(&mut self, len: usize) -> &mut ComplexPlan {
        let planner = &mut self.planner;
        self.complex
            .entry(len)
            .or_insert_with(|| ComplexPlan::new(planner, len))
    }

    /// Real plan for `len`, created on first request.
    pub fn rft(&mut self, len: usize) -> &mut RealPlan {
        let planner = &mut self.real_planner;
        self.real
            .entry(len)
            .or_insert_with(|| RealPlan::new(planner, len))
    }

    pub fn fft_lengths(&self) -> Vec<usize> {
        let mut lens: Vec<usize> = self.complex.keys().copied().collect();
        lens.sort_unstable();
        lens
    }

    pub fn rft_lengths(&self) -> Vec<usize> {
        let mut lens: Vec<usize> = self.real.keys().copied().collect();
        lens.sort_unstable();
        lens
    }
}

thread_local! {
    static CACHE: RefCell<TransformCache> = RefCell::new(TransformCache::new());
}

/// Run `f` with this thread's complex plan for `len`.
///
/// `len` must already be validated by the caller. `f` must not call back
/// into the transform cache.
pub fn with_fft<R>(len: usize, f: impl FnOnce(&mut ComplexPlan) -> R) -> R {
    CACHE.with(|cache| f(cache.borrow_mut().fft(len)))
}

/// Run `f` with this thread's real plan for `len`.
pub fn with_rft<R>(len: usize, f: impl FnOnce(&mut RealPlan) -> R) -> R {
    CACHE.with(|cache| f(cache.borrow_mut().rft(len)))
}

/// Complex FFT lengths planned so far on the calling thread.
pub fn cached_fft_lengths() -> Vec<usize> {
    CACHE.with(|cache| cache.borrow().fft_lengths())
}

/// Real FFT lengths planned so far on the calling thread.
pub fn cached_rft_lengths() -> Vec<usize> {
    CACHE.with(|cache| cache.borrow().rft_lengths())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_are_created_once_per_length() {
        let mut cache = TransformCache::new();
        let first = Arc::as_ptr(&cache.fft(16).forward) as *const () as usize;
        let second = Arc::as_ptr(&cache.fft(16).forward) as *const () as usize;
        assert_eq!(first, second);
        cache.fft(32);
        cache.rft(8);
        assert_eq!(cache.fft_lengths(), vec![16, 32]);
        assert_eq!(cache.rft_lengths(), vec![8]);
    }

    #[test]
    fn real_plan_buffers_match_length() {
        let mut cache = TransformCache::new();
        let plan = cache.rft(16);
        assert_eq!(plan.len(), 16);
        assert_eq!(plan.time().len(), 16);
        assert_eq!(plan.spectrum().len(), 9);
        assert_eq!(plan.bin_count(), 9);
    }

    #[test]
    fn real_plan_round_trip_is_scaled_by_len() {
        let mut cache = TransformCache::new();
        let plan = cache.rft(8);
        let input = [1.0, -2.0, 3.0, 0.5, 0.0, 4.0, -1.0, 2.0];
        plan.time_mut().copy_from_slice(&input);
        plan.forward().unwrap();
        plan.inverse().unwrap();
        for (a, b) in plan.time().iter().zip(input.iter()) {
            assert!((a / 8.0 - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn thread_local_cache_is_per_thread() {
        with_fft(64, |plan| assert_eq!(plan.len(), 64));
        assert!(cached_fft_lengths().contains(&64));
        let other = std::thread::spawn(cached_fft_lengths).join().unwrap();
        assert!(!other.contains(&64));
    }
}
