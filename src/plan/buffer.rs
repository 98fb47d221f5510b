use num::Complex;

use crate::{DftError, DftNum};

/// Allocates `len` copies of `value`, reporting allocation failure as an
/// error instead of aborting.
pub(crate) fn try_filled<V: Clone>(len: usize, value: V) -> Result<Vec<V>, DftError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| DftError::Allocation(len))?;
    data.resize(len, value);
    Ok(data)
}

/// Scratch storage owned by a cached plan.
///
/// Sized for `rows * cols` complex values, the largest layout any transform
/// kind reads or writes, and viewable as either real scalars or complex
/// values.
pub struct ScratchBuffer<T: DftNum> {
    data: Vec<Complex<T>>,
}

impl<T: DftNum> ScratchBuffer<T> {
    /// Allocates a zeroed buffer of `len` complex values.
    pub fn try_new(len: usize) -> Result<Self, DftError> {
        let data = try_filled(len, Complex::new(T::zero(), T::zero()))?;
        Ok(Self { data })
    }

    /// Length in complex values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_real(&self) -> &[T] {
        bytemuck::cast_slice(&self.data)
    }

    pub fn as_real_mut(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    pub fn as_complex(&self) -> &[Complex<T>] {
        &self.data
    }

    pub fn as_complex_mut(&mut self) -> &mut [Complex<T>] {
        &mut self.data
    }
}

impl<T: DftNum> std::fmt::Debug for ScratchBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("len", &self.data.len())
            .finish()
    }
}
