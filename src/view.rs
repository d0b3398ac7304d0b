//! Strided views over borrowed sample buffers.
//!
//! Every transform in the crate reads its inputs through a [`Strided`] view
//! and writes through a [`StridedMut`] view, so callers can hand in one
//! channel of an interleaved buffer or a column of a row-major matrix
//! without copying. Plain slices, arrays and vectors convert into
//! contiguous (unit stride) views.

use std::borrow::Cow;
use std::iter::{StepBy, Take};
use std::ops::{Index, IndexMut};
use std::slice;

use rustfft::num_traits::Zero;

use crate::error::{Result, SpectralError};

fn check_span(backing: usize, offset: usize, len: usize, stride: usize) -> Result<()> {
    if stride == 0 {
        return Err(SpectralError::invalid_argument("view stride must be positive"));
    }
    if len == 0 {
        return Ok(());
    }
    let last = (len - 1)
        .checked_mul(stride)
        .and_then(|span| span.checked_add(offset));
    match last {
        Some(last) if last < backing => Ok(()),
        _ => Err(SpectralError::invalid_argument(format!(
            "view of {len} elements with stride {stride} at offset {offset} \
             exceeds {backing} backing elements"
        ))),
    }
}

/// Read-only view of `len` elements spaced `stride` apart.
#[derive(Debug)]
pub struct Strided<'a, T> {
    data: &'a [T],
    len: usize,
    stride: usize,
}

impl<T> Clone for Strided<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Strided<'_, T> {}

impl<'a, T> Strided<'a, T> {
    /// Contiguous view over the whole slice.
    pub fn new(data: &'a [T]) -> Self {
        Self {
            data,
            len: data.len(),
            stride: 1,
        }
    }

    /// View of `len` elements starting at `offset`, `stride` elements apart.
    pub fn with_stride(data: &'a [T], offset: usize, len: usize, stride: usize) -> Result<Self> {
        check_span(data.len(), offset, len, stride)?;
        let data = if len == 0 { &data[..0] } else { &data[offset..] };
        Ok(Self { data, len, stride })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn get(&self, index: usize) -> Option<&'a T> {
        if index < self.len {
            Some(&self.data[index * self.stride])
        } else {
            None
        }
    }

    pub fn iter(&self) -> Take<StepBy<slice::Iter<'a, T>>> {
        self.data.iter().step_by(self.stride).take(self.len)
    }

    /// Sub-range view of `len` logical elements beginning at `start`.
    pub fn slice(&self, start: usize, len: usize) -> Result<Strided<'a, T>> {
        match start.checked_add(len) {
            Some(end) if end <= self.len => {}
            _ => {
                return Err(SpectralError::invalid_argument(format!(
                    "range {start}..{start}+{len} is outside a view of {} elements",
                    self.len
                )))
            }
        }
        let data = if len == 0 {
            &self.data[..0]
        } else {
            &self.data[start * self.stride..]
        };
        Ok(Strided {
            data,
            len,
            stride: self.stride,
        })
    }

    /// The backing elements as a plain slice, if the view is unit-stride.
    pub fn as_slice(&self) -> Option<&'a [T]> {
        if self.stride == 1 || self.len <= 1 {
            Some(&self.data[..self.len])
        } else {
            None
        }
    }

    /// Contiguous copy of the view, borrowing instead when no copy is needed.
    pub fn to_contiguous(&self) -> Cow<'a, [T]>
    where
        T: Clone,
    {
        match self.as_slice() {
            Some(contiguous) => Cow::Borrowed(contiguous),
            None => Cow::Owned(self.to_vec()),
        }
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }
}

impl<T> Index<usize> for Strided<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        assert!(
            index < self.len,
            "index {index} out of range for view of length {}",
            self.len
        );
        &self.data[index * self.stride]
    }
}

impl<'a, T> From<&'a [T]> for Strided<'a, T> {
    fn from(data: &'a [T]) -> Self {
        Strided::new(data)
    }
}

impl<'a, T> From<&'a Vec<T>> for Strided<'a, T> {
    fn from(data: &'a Vec<T>) -> Self {
        Strided::new(data.as_slice())
    }
}

impl<'a, T, const N: usize> From<&'a [T; N]> for Strided<'a, T> {
    fn from(data: &'a [T; N]) -> Self {
        Strided::new(data.as_slice())
    }
}

/// Writable view of `len` elements spaced `stride` apart.
#[derive(Debug)]
pub struct StridedMut<'a, T> {
    data: &'a mut [T],
    len: usize,
    stride: usize,
}

impl<'a, T> StridedMut<'a, T> {
    pub fn new(data: &'a mut [T]) -> Self {
        let len = data.len();
        Self {
            data,
            len,
            stride: 1,
        }
    }

    pub fn with_stride(
        data: &'a mut [T],
        offset: usize,
        len: usize,
        stride: usize,
    ) -> Result<Self> {
        check_span(data.len(), offset, len, stride)?;
        let data = if len == 0 {
            &mut data[..0]
        } else {
            &mut data[offset..]
        };
        Ok(Self { data, len, stride })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index < self.len {
            Some(&self.data[index * self.stride])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if index < self.len {
            Some(&mut self.data[index * self.stride])
        } else {
            None
        }
    }

    pub fn iter(&self) -> Take<StepBy<slice::Iter<'_, T>>> {
        self.data.iter().step_by(self.stride).take(self.len)
    }

    pub fn iter_mut(&mut self) -> Take<StepBy<slice::IterMut<'_, T>>> {
        self.data.iter_mut().step_by(self.stride).take(self.len)
    }

    /// Read-only view of the same elements.
    pub fn as_view(&self) -> Strided<'_, T> {
        Strided {
            data: &*self.data,
            len: self.len,
            stride: self.stride,
        }
    }

    /// Shorter-lived writable view of the same elements.
    pub fn reborrow(&mut self) -> StridedMut<'_, T> {
        StridedMut {
            data: &mut *self.data,
            len: self.len,
            stride: self.stride,
        }
    }

    pub fn slice_mut(&mut self, start: usize, len: usize) -> Result<StridedMut<'_, T>> {
        match start.checked_add(len) {
            Some(end) if end <= self.len => {}
            _ => {
                return Err(SpectralError::invalid_argument(format!(
                    "range {start}..{start}+{len} is outside a view of {} elements",
                    self.len
                )))
            }
        }
        let data = if len == 0 {
            &mut self.data[..0]
        } else {
            &mut self.data[start * self.stride..]
        };
        Ok(StridedMut {
            data,
            len,
            stride: self.stride,
        })
    }

    pub fn as_mut_slice(&mut self) -> Option<&mut [T]> {
        if self.stride == 1 || self.len <= 1 {
            Some(&mut self.data[..self.len])
        } else {
            None
        }
    }

    pub fn fill(&mut self, value: T)
    where
        T: Clone,
    {
        for x in self.iter_mut() {
            *x = value.clone();
        }
    }

    pub fn clear(&mut self)
    where
        T: Zero,
    {
        for x in self.iter_mut() {
            *x = T::zero();
        }
    }

    /// Copy `src` element by element; both views must have the same length.
    pub fn copy_from(&mut self, src: Strided<'_, T>) -> Result<()>
    where
        T: Clone,
    {
        if src.len() != self.len {
            return Err(SpectralError::invalid_argument(format!(
                "cannot copy {} elements into a view of {}",
                src.len(),
                self.len
            )));
        }
        for (dst, s) in self.iter_mut().zip(src.iter()) {
            *dst = s.clone();
        }
        Ok(())
    }

    /// Run `f` on unit-stride storage holding the view's elements.
    ///
    /// Strided views are gathered into a temporary buffer and scattered back
    /// after `f` returns; contiguous views are handed over directly.
    pub fn with_contiguous<R>(&mut self, f: impl FnOnce(&mut [T]) -> R) -> R
    where
        T: Clone,
    {
        if let Some(contiguous) = self.as_mut_slice() {
            return f(contiguous);
        }
        let mut gathered = self.as_view().to_vec();
        let out = f(&mut gathered);
        for (dst, s) in self.iter_mut().zip(gathered) {
            *dst = s;
        }
        out
    }
}

impl<T> Index<usize> for StridedMut<'_, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        assert!(
            index < self.len,
            "index {index} out of range for view of length {}",
            self.len
        );
        &self.data[index * self.stride]
    }
}

impl<T> IndexMut<usize> for StridedMut<'_, T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        assert!(
            index < self.len,
            "index {index} out of range for view of length {}",
            self.len
        );
        &mut self.data[index * self.stride]
    }
}

impl<'a, T> From<&'a mut [T]> for StridedMut<'a, T> {
    fn from(data: &'a mut [T]) -> Self {
        StridedMut::new(data)
    }
}

impl<'a, T> From<&'a mut Vec<T>> for StridedMut<'a, T> {
    fn from(data: &'a mut Vec<T>) -> Self {
        StridedMut::new(data.as_mut_slice())
    }
}

impl<'a, T, const N: usize> From<&'a mut [T; N]> for StridedMut<'a, T> {
    fn from(data: &'a mut [T; N]) -> Self {
        StridedMut::new(data.as_mut_slice())
    }
}
