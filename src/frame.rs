//! Frame extraction from signals that are implicitly zero outside their
//! bounds.
//!
//! A frame may start before the first sample or run past the last one;
//! positions outside `[0, source.len())` read as zero. Real sources can be
//! promoted to complex frames, with the samples landing in the real parts.

use std::ops::Mul;

use rustfft::num_traits::Zero;

use crate::error::{Result, SpectralError};
use crate::view::{Strided, StridedMut};
use crate::Complex64;

/// Overlap of `[start, start + len)` with `[0, count)` as
/// `(frame offset, source offset, overlap length)`.
pub(crate) fn overlap(start: isize, len: usize, count: usize) -> (usize, usize, usize) {
    let end = start.saturating_add(len.min(isize::MAX as usize) as isize);
    let lo = start.max(0);
    let hi = end.min(count.min(isize::MAX as usize) as isize);
    if hi <= lo {
        return (0, 0, 0);
    }
    ((lo - start) as usize, lo as usize, (hi - lo) as usize)
}

fn extract<S, D>(
    source: Strided<'_, S>,
    start: isize,
    dst: &mut StridedMut<'_, D>,
    mut sample: impl FnMut(usize, S) -> D,
) where
    S: Copy,
    D: Zero,
{
    let (frame_offset, source_offset, n) = overlap(start, dst.len(), source.len());
    if n < dst.len() {
        dst.clear();
    }
    let copied = dst
        .iter_mut()
        .skip(frame_offset)
        .zip(source.iter().skip(source_offset))
        .take(n);
    for (i, (d, s)) in copied.enumerate() {
        *d = sample(frame_offset + i, *s);
    }
}

fn check_window_len(window: usize, dst: usize) -> Result<()> {
    if window != dst {
        return Err(SpectralError::invalid_argument(format!(
            "window has {window} samples but the frame holds {dst}"
        )));
    }
    Ok(())
}

/// Copy `len` samples of `source` starting at `start`.
pub fn get_frame<'a, T>(source: impl Into<Strided<'a, T>>, start: isize, len: usize) -> Vec<T>
where
    T: Copy + Zero + 'a,
{
    let mut frame = vec![T::zero(); len];
    get_frame_into(source, start, &mut frame);
    frame
}

/// Fill `destination` with the samples of `source` starting at `start`.
pub fn get_frame_into<'a, 'b, T>(
    source: impl Into<Strided<'a, T>>,
    start: isize,
    destination: impl Into<StridedMut<'b, T>>,
) where
    T: Copy + Zero + 'a + 'b,
{
    let mut dst = destination.into();
    extract(source.into(), start, &mut dst, |_, s| s);
}

/// Copy `window.len()` samples of `source` starting at `start`, each
/// multiplied by the aligned window sample.
pub fn get_windowed_frame<'a, 'w, T>(
    source: impl Into<Strided<'a, T>>,
    start: isize,
    window: impl Into<Strided<'w, f64>>,
) -> Vec<T>
where
    T: Copy + Zero + Mul<f64, Output = T> + 'a,
{
    let window = window.into();
    let mut frame = vec![T::zero(); window.len()];
    let mut dst = StridedMut::new(&mut frame);
    extract(source.into(), start, &mut dst, |i, s| s * window[i]);
    frame
}

/// Windowed frame into `destination`, which must be as long as `window`.
pub fn get_windowed_frame_into<'a, 'w, 'b, T>(
    source: impl Into<Strided<'a, T>>,
    start: isize,
    window: impl Into<Strided<'w, f64>>,
    destination: impl Into<StridedMut<'b, T>>,
) -> Result<()>
where
    T: Copy + Zero + Mul<f64, Output = T> + 'a + 'b,
{
    let window = window.into();
    let mut dst = destination.into();
    check_window_len(window.len(), dst.len())?;
    extract(source.into(), start, &mut dst, |i, s| s * window[i]);
    Ok(())
}

/// Real samples promoted to a complex frame.
pub fn get_frame_complex<'a>(
    source: impl Into<Strided<'a, f64>>,
    start: isize,
    len: usize,
) -> Vec<Complex64> {
    let mut frame = vec![Complex64::zero(); len];
    get_frame_complex_into(source, start, &mut frame);
    frame
}

pub fn get_frame_complex_into<'a, 'b>(
    source: impl Into<Strided<'a, f64>>,
    start: isize,
    destination: impl Into<StridedMut<'b, Complex64>>,
) {
    let mut dst = destination.into();
    extract(source.into(), start, &mut dst, |_, s| Complex64::new(s, 0.0));
}

/// Windowed real samples promoted to a complex frame.
pub fn get_windowed_frame_complex<'a, 'w>(
    source: impl Into<Strided<'a, f64>>,
    start: isize,
    window: impl Into<Strided<'w, f64>>,
) -> Vec<Complex64> {
    let window = window.into();
    let mut frame = vec![Complex64::zero(); window.len()];
    let mut dst = StridedMut::new(&mut frame);
    extract(source.into(), start, &mut dst, |i, s| {
        Complex64::new(s * window[i], 0.0)
    });
    frame
}

pub fn get_windowed_frame_complex_into<'a, 'w, 'b>(
    source: impl Into<Strided<'a, f64>>,
    start: isize,
    window: impl Into<Strided<'w, f64>>,
    destination: impl Into<StridedMut<'b, Complex64>>,
) -> Result<()> {
    let window = window.into();
    let mut dst = destination.into();
    check_window_len(window.len(), dst.len())?;
    extract(source.into(), start, &mut dst, |i, s| {
        Complex64::new(s * window[i], 0.0)
    });
    Ok(())
}
