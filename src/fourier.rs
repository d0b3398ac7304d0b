//! Fourier transforms over strided views.
//!
//! The forward transforms are unnormalized; the inverse transforms scale by
//! `1/N` so that `ifft(fft(x)) == x`. Only power-of-two lengths are
//! accepted. Plans come from the calling thread's [`crate::cache`].
//!
//! The real-input transforms come in two flavours. [`rfft`] / [`irfft`] move
//! between `N` real samples and `N/2 + 1` complex bins held in separate
//! buffers. [`rfft_packed`] / [`irfft_packed`] work on a single real buffer
//! of `N + 2` samples: on the time side the first `N` entries hold the
//! signal, on the frequency side the whole buffer holds the bins as
//! interleaved pairs `[re0, im0, re1, im1, .., re(N/2), im(N/2)]`.

use crate::cache::{with_fft, with_rft};
use crate::error::{ensure_power_of_two, Result, SpectralError};
use crate::view::{Strided, StridedMut};
use crate::Complex64;

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Inverse,
}

fn check_pair(src_len: usize, dst_len: usize) -> Result<()> {
    ensure_power_of_two(src_len)?;
    if dst_len != src_len {
        return Err(SpectralError::InvalidLength { len: dst_len });
    }
    Ok(())
}

fn transform_in_place(target: &mut StridedMut<'_, Complex64>, direction: Direction) {
    let len = target.len();
    target.with_contiguous(|buf| {
        with_fft(len, |plan| match direction {
            Direction::Forward => plan.forward(buf),
            Direction::Inverse => {
                plan.inverse(buf);
                let scale = 1.0 / len as f64;
                buf.iter_mut().for_each(|c| *c *= scale);
            }
        })
    });
}

/// Forward complex FFT of `src` into `dst`.
///
/// # Errors
///
/// [`SpectralError::InvalidLength`] if either view is empty, the lengths
/// differ, or the length is not a power of two.
pub fn fft<'a, 'b>(
    src: impl Into<Strided<'a, Complex64>>,
    dst: impl Into<StridedMut<'b, Complex64>>,
) -> Result<()> {
    let src = src.into();
    let mut dst = dst.into();
    check_pair(src.len(), dst.len())?;
    dst.copy_from(src)?;
    transform_in_place(&mut dst, Direction::Forward);
    Ok(())
}

/// Inverse complex FFT of `src` into `dst`, scaled by `1/N`.
pub fn ifft<'a, 'b>(
    src: impl Into<Strided<'a, Complex64>>,
    dst: impl Into<StridedMut<'b, Complex64>>,
) -> Result<()> {
    let src = src.into();
    let mut dst = dst.into();
    check_pair(src.len(), dst.len())?;
    dst.copy_from(src)?;
    transform_in_place(&mut dst, Direction::Inverse);
    Ok(())
}

/// Forward complex FFT in place.
pub fn fft_inplace<'a>(target: impl Into<StridedMut<'a, Complex64>>) -> Result<()> {
    let mut target = target.into();
    ensure_power_of_two(target.len())?;
    transform_in_place(&mut target, Direction::Forward);
    Ok(())
}

/// Inverse complex FFT in place, scaled by `1/N`.
pub fn ifft_inplace<'a>(target: impl Into<StridedMut<'a, Complex64>>) -> Result<()> {
    let mut target = target.into();
    ensure_power_of_two(target.len())?;
    transform_in_place(&mut target, Direction::Inverse);
    Ok(())
}

/// Forward FFT into a freshly allocated vector.
pub fn fft_vec<'a>(src: impl Into<Strided<'a, Complex64>>) -> Result<Vec<Complex64>> {
    let src = src.into();
    ensure_power_of_two(src.len())?;
    let mut out = src.to_vec();
    fft_inplace(&mut out)?;
    Ok(out)
}

/// Inverse FFT into a freshly allocated vector.
pub fn ifft_vec<'a>(src: impl Into<Strided<'a, Complex64>>) -> Result<Vec<Complex64>> {
    let src = src.into();
    ensure_power_of_two(src.len())?;
    let mut out = src.to_vec();
    ifft_inplace(&mut out)?;
    Ok(out)
}

fn check_real_len(len: usize) -> Result<()> {
    if len < 2 {
        return Err(SpectralError::InvalidLength { len });
    }
    ensure_power_of_two(len)
}

/// Half-spectrum of `N` real samples: `N/2 + 1` bins, unnormalized.
///
/// # Errors
///
/// [`SpectralError::InvalidLength`] unless `N` is a power of two of at least
/// 2; [`SpectralError::InvalidArgument`] if `dst` does not hold `N/2 + 1`
/// bins.
pub fn rfft<'a, 'b>(
    src: impl Into<Strided<'a, f64>>,
    dst: impl Into<StridedMut<'b, Complex64>>,
) -> Result<()> {
    let src = src.into();
    let mut dst = dst.into();
    let len = src.len();
    check_real_len(len)?;
    if dst.len() != len / 2 + 1 {
        return Err(SpectralError::invalid_argument(format!(
            "a {len}-point real transform has {} bins, destination holds {}",
            len / 2 + 1,
            dst.len()
        )));
    }
    with_rft(len, |plan| {
        for (t, s) in plan.time_mut().iter_mut().zip(src.iter()) {
            *t = *s;
        }
        plan.forward()?;
        for (d, s) in dst.iter_mut().zip(plan.spectrum()) {
            *d = *s;
        }
        Ok(())
    })
}

/// Real signal of `N = dst.len()` samples from its `N/2 + 1` bins, scaled by
/// `1/N`.
///
/// Imaginary parts of the DC and Nyquist bins are ignored.
pub fn irfft<'a, 'b>(
    src: impl Into<Strided<'a, Complex64>>,
    dst: impl Into<StridedMut<'b, f64>>,
) -> Result<()> {
    let src = src.into();
    let mut dst = dst.into();
    let len = dst.len();
    check_real_len(len)?;
    if src.len() != len / 2 + 1 {
        return Err(SpectralError::invalid_argument(format!(
            "a {len}-point real signal needs {} bins, got {}",
            len / 2 + 1,
            src.len()
        )));
    }
    with_rft(len, |plan| {
        for (b, s) in plan.spectrum_mut().iter_mut().zip(src.iter()) {
            *b = *s;
        }
        plan.inverse()?;
        let scale = 1.0 / len as f64;
        for (d, t) in dst.iter_mut().zip(plan.time()) {
            *d = t * scale;
        }
        Ok(())
    })
}

fn packed_len(buf_len: usize) -> Result<usize> {
    match buf_len.checked_sub(2) {
        Some(len) => {
            check_real_len(len)?;
            Ok(len)
        }
        None => Err(SpectralError::InvalidLength { len: buf_len }),
    }
}

/// In-place real FFT on a packed `N + 2` buffer.
///
/// On entry `buf[..N]` holds the signal (the last two entries are ignored);
/// on return the buffer holds `N/2 + 1` interleaved `(re, im)` pairs.
pub fn rfft_packed(buf: &mut [f64]) -> Result<()> {
    let len = packed_len(buf.len())?;
    with_rft(len, |plan| {
        plan.time_mut().copy_from_slice(&buf[..len]);
        plan.forward()?;
        for (pair, bin) in buf.chunks_exact_mut(2).zip(plan.spectrum()) {
            pair[0] = bin.re;
            pair[1] = bin.im;
        }
        Ok(())
    })
}

/// In-place inverse real FFT on a packed `N + 2` buffer, scaled by `1/N`.
///
/// On return `buf[..N]` holds the signal and the two trailing entries are
/// zero.
pub fn irfft_packed(buf: &mut [f64]) -> Result<()> {
    let len = packed_len(buf.len())?;
    with_rft(len, |plan| {
        for (bin, pair) in plan.spectrum_mut().iter_mut().zip(buf.chunks_exact(2)) {
            *bin = Complex64::new(pair[0], pair[1]);
        }
        plan.inverse()?;
        let scale = 1.0 / len as f64;
        for (out, t) in buf[..len].iter_mut().zip(plan.time()) {
            *out = t * scale;
        }
        buf[len..].fill(0.0);
        Ok(())
    })
}

/// Read the interleaved bins of a packed buffer.
pub fn unpack_half_spectrum(buf: &[f64]) -> Vec<Complex64> {
    buf.chunks_exact(2)
        .map(|pair| Complex64::new(pair[0], pair[1]))
        .collect()
}

/// Write `bins` into a packed buffer as interleaved pairs.
///
/// `buf` must hold exactly `2 * bins.len()` samples.
pub fn pack_half_spectrum(bins: &[Complex64], buf: &mut [f64]) -> Result<()> {
    if buf.len() != bins.len() * 2 {
        return Err(SpectralError::invalid_argument(format!(
            "{} bins need a packed buffer of {}, got {}",
            bins.len(),
            bins.len() * 2,
            buf.len()
        )));
    }
    for (pair, bin) in buf.chunks_exact_mut(2).zip(bins) {
        pair[0] = bin.re;
        pair[1] = bin.im;
    }
    Ok(())
}
