//! The view the dispatcher has of a host image matrix.
//!
//! Only introspection and raw element access are needed: the dispatcher
//! decides eligibility from these properties and copies the scalars into
//! plan scratch, it never interprets the matrix beyond that.

use ndarray::{ArrayBase, Data, Dimension};
use num::Complex;

/// Element bit depth of a host matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    U8,
    I8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

/// Host matrix introspection and data access.
pub trait SpectralInput {
    /// Number of array dimensions (channels excluded).
    fn dims(&self) -> usize;
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    /// Scalars per element: 1 for real, 2 for complex.
    fn channels(&self) -> usize;
    fn depth(&self) -> Depth;
    fn is_empty(&self) -> bool;
    /// Elements are stored densely in row-major order.
    fn is_contiguous(&self) -> bool;
    /// The matrix is a window into a larger one.
    fn is_subview(&self) -> bool;
    /// Row-major scalars with channels interleaved, when the depth is
    /// [`Depth::F32`] and the storage is contiguous.
    fn f32_data(&self) -> Option<&[f32]>;
}

/// Element types a host `ndarray` may hold.
pub trait Element: Copy {
    const DEPTH: Depth;
    const CHANNELS: usize;

    fn f32_scalars(_data: &[Self]) -> Option<&[f32]> {
        None
    }
}

macro_rules! impl_element {
    ($($t:ty => $depth:ident),*) => {
        $(impl Element for $t {
            const DEPTH: Depth = Depth::$depth;
            const CHANNELS: usize = 1;
        })*
    };
}

impl_element!(u8 => U8, i8 => I8, u16 => U16, i16 => I16, i32 => I32, f64 => F64);

impl Element for f32 {
    const DEPTH: Depth = Depth::F32;
    const CHANNELS: usize = 1;

    fn f32_scalars(data: &[Self]) -> Option<&[f32]> {
        Some(data)
    }
}

impl Element for Complex<f32> {
    const DEPTH: Depth = Depth::F32;
    const CHANNELS: usize = 2;

    fn f32_scalars(data: &[Self]) -> Option<&[f32]> {
        Some(bytemuck::cast_slice(data))
    }
}

impl Element for Complex<f64> {
    const DEPTH: Depth = Depth::F64;
    const CHANNELS: usize = 2;
}

/// `ndarray` has no parent/child notion, so a view is reported as a
/// sub-view whenever its strides are not the standard row-major ones of its
/// own shape, which is also when it is not contiguous.
impl<A, S, D> SpectralInput for ArrayBase<S, D>
where
    A: Element + 'static,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn dims(&self) -> usize {
        self.ndim()
    }

    fn nrows(&self) -> usize {
        self.shape().first().copied().unwrap_or(1)
    }

    fn ncols(&self) -> usize {
        self.shape().get(1).copied().unwrap_or(1)
    }

    fn channels(&self) -> usize {
        A::CHANNELS
    }

    fn depth(&self) -> Depth {
        A::DEPTH
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_contiguous(&self) -> bool {
        self.is_standard_layout()
    }

    fn is_subview(&self) -> bool {
        !self.is_standard_layout()
    }

    fn f32_data(&self) -> Option<&[f32]> {
        A::f32_scalars(self.as_slice()?)
    }
}
