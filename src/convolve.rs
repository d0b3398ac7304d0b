//! Linear convolution by FFT overlap-add.
//!
//! The signal is cut into blocks of `fft_len / 2` samples. Each block is
//! zero-padded to `fft_len`, multiplied in the frequency domain with the
//! impulse response spectrum (computed once) and accumulated into the
//! output at the block's offset. Because the impulse response is at most
//! `fft_len / 2` long, each padded block product is a linear, not circular,
//! convolution.

use log::trace;

use crate::config::convolution_block_target;
use crate::error::{Result, SpectralError};
use crate::fourier::{irfft_packed, rfft_packed};
use crate::frame::{get_frame_into, overlap};
use crate::view::{Strided, StridedMut};
use crate::Complex64;

/// FFT length for a signal of `m` samples and an impulse response of `n`.
///
/// Smallest power of two holding twice the impulse response, doubled while
/// below both twice the signal length and the block target.
pub(crate) fn block_fft_len(m: usize, n: usize, target: usize) -> usize {
    let mut len = (2 * n).next_power_of_two();
    let limit = (2 * m).min(target);
    while len < limit {
        len *= 2;
    }
    len
}

/// Full linear convolution of `signal` with `impulse_response`.
///
/// The result holds `signal.len() + impulse_response.len() - 1` samples.
///
/// # Errors
///
/// [`SpectralError::InvalidArgument`] if either input is empty.
///
/// # Examples
/// ```
/// use specframe::convolve::convolve;
///
/// let out = convolve(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]).unwrap();
/// let expected = [0.0, 1.0, 2.5, 4.0, 1.5];
/// assert!(out.iter().zip(&expected).all(|(a, b)| (a - b).abs() < 1e-12));
/// ```
pub fn convolve<'s, 'h>(
    signal: impl Into<Strided<'s, f64>>,
    impulse_response: impl Into<Strided<'h, f64>>,
) -> Result<Vec<f64>> {
    let signal = signal.into();
    let impulse_response = impulse_response.into();
    let len = (signal.len() + impulse_response.len()).saturating_sub(1);
    let mut out = vec![0.0; len];
    convolve_into(signal, impulse_response, &mut out)?;
    Ok(out)
}

/// Full linear convolution into a presized `destination` of
/// `signal.len() + impulse_response.len() - 1` samples.
pub fn convolve_into<'s, 'h, 'd>(
    signal: impl Into<Strided<'s, f64>>,
    impulse_response: impl Into<Strided<'h, f64>>,
    destination: impl Into<StridedMut<'d, f64>>,
) -> Result<()> {
    let signal = signal.into();
    let ir = impulse_response.into();
    let mut dst = destination.into();
    let (m, n) = (signal.len(), ir.len());
    if m == 0 || n == 0 {
        return Err(SpectralError::invalid_argument(
            "convolution inputs must not be empty",
        ));
    }
    if dst.len() != m + n - 1 {
        return Err(SpectralError::invalid_argument(format!(
            "convolution output holds {} samples, expected {}",
            dst.len(),
            m + n - 1
        )));
    }

    let fft_len = block_fft_len(m, n, convolution_block_target());
    let half = fft_len / 2;
    trace!(
        "convolve: {m} x {n} samples, fft length {fft_len}, {} blocks",
        m.div_ceil(half)
    );

    let mut buf = vec![0.0; fft_len + 2];
    get_frame_into(ir, 0, &mut buf[..fft_len]);
    rfft_packed(&mut buf)?;
    let ir_spectrum: Vec<Complex64> = buf
        .chunks_exact(2)
        .map(|pair| Complex64::new(pair[0], pair[1]))
        .collect();

    dst.clear();
    for pos in (0..m).step_by(half) {
        get_frame_into(signal, pos as isize, &mut buf[..half]);
        buf[half..].fill(0.0);
        rfft_packed(&mut buf)?;
        for (pair, h) in buf.chunks_exact_mut(2).zip(&ir_spectrum) {
            let bin = Complex64::new(pair[0], pair[1]) * h;
            pair[0] = bin.re;
            pair[1] = bin.im;
        }
        irfft_packed(&mut buf)?;

        let (block_offset, dst_offset, count) = overlap(pos as isize, fft_len, dst.len());
        let block = buf[block_offset..].iter().take(count);
        for (d, x) in dst.iter_mut().skip(dst_offset).zip(block) {
            *d += x;
        }
    }
    Ok(())
}
