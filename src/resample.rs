//! Rational-ratio resampling with a Lanczos (windowed sinc) kernel.
//!
//! Output sample `i` sits at source position `i * q / p`. Its value is the
//! sum of nearby source samples weighted by
//! `sinc(pi * x / s) * sinc(pi * x / (s * a))`, where `x` is the distance to
//! the source sample, `a` is the kernel half-width in output periods and `s`
//! is `1` when upsampling or `q / p` when downsampling. Stretching the kernel
//! by `q / p` moves its cutoff to the new Nyquist frequency; the result is
//! then scaled by `p / q` to keep the passband gain at one. Samples outside
//! the source count as zero.

use std::f64::consts::PI;

use log::trace;

use crate::config::lanczos_half_width;
use crate::error::{Result, SpectralError};
use crate::frame::get_frame_into;
use crate::view::{Strided, StridedMut};

const SINC_EPSILON: f64 = 1e-15;

/// Unnormalized sinc, `sin(x) / x`, with `sinc(0) = 1`.
pub fn sinc(x: f64) -> f64 {
    if x.abs() < SINC_EPSILON {
        1.0
    } else {
        x.sin() / x
    }
}

/// Number of samples [`resample`] produces: `ceil(len * p / q)`.
pub fn resampled_len(len: usize, p: usize, q: usize) -> usize {
    if q == 0 {
        return 0;
    }
    (len * p).div_ceil(q)
}

fn check_ratio(p: usize, q: usize, a: usize) -> Result<()> {
    if p == 0 || q == 0 {
        return Err(SpectralError::invalid_argument(format!(
            "resampling ratio {p}/{q} must have positive terms"
        )));
    }
    if a == 0 {
        return Err(SpectralError::invalid_argument(
            "Lanczos half-width must be positive",
        ));
    }
    Ok(())
}

/// Resample `source` by `p / q` with the configured Lanczos half-width.
///
/// See [`crate::config::lanczos_half_width`].
///
/// # Examples
/// ```
/// use specframe::resample::resample;
///
/// let source = [0.0, 1.0, 0.0, -1.0];
/// let upsampled = resample(&source, 2, 1).unwrap();
/// assert_eq!(upsampled.len(), 8);
/// assert!((upsampled[2] - 1.0).abs() < 1e-12);
/// ```
pub fn resample<'a>(source: impl Into<Strided<'a, f64>>, p: usize, q: usize) -> Result<Vec<f64>> {
    resample_with(source, p, q, lanczos_half_width())
}

/// Resample `source` by `p / q` with half-width `a`.
pub fn resample_with<'a>(
    source: impl Into<Strided<'a, f64>>,
    p: usize,
    q: usize,
    a: usize,
) -> Result<Vec<f64>> {
    let source = source.into();
    check_ratio(p, q, a)?;
    let mut out = vec![0.0; resampled_len(source.len(), p, q)];
    resample_into(source, &mut out, p, q, a)?;
    Ok(out)
}

/// Resample `source` by `p / q` into `destination`, whose length decides how
/// many output samples are computed.
///
/// With `p == q` the source is copied, truncated or zero-padded to fit.
///
/// # Errors
///
/// [`SpectralError::InvalidArgument`] if `p`, `q` or `a` is zero.
pub fn resample_into<'a, 'b>(
    source: impl Into<Strided<'a, f64>>,
    destination: impl Into<StridedMut<'b, f64>>,
    p: usize,
    q: usize,
    a: usize,
) -> Result<()> {
    let source = source.into();
    let mut dst = destination.into();
    check_ratio(p, q, a)?;

    if p == q {
        get_frame_into(source, 0, dst);
        return Ok(());
    }

    let step = q as f64 / p as f64;
    let stretch = step.max(1.0);
    let reach = a as f64 * stretch;
    let gain = 1.0 / stretch;
    trace!(
        "resample: {} -> {} samples, ratio {p}/{q}, kernel reach {reach}",
        source.len(),
        dst.len()
    );

    let last = source.len() as isize;
    for (i, out) in dst.iter_mut().enumerate() {
        let position = i as f64 * step;
        let lo = ((position - reach).floor() as isize + 1).max(0);
        let hi = ((position + reach).ceil() as isize).min(last);
        let mut acc = 0.0;
        for k in lo..hi {
            let x = PI * (k as f64 - position) / stretch;
            acc += source[k as usize] * sinc(x) * sinc(x / a as f64);
        }
        *out = acc * gain;
    }
    Ok(())
}
