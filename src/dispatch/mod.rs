//! Accelerated forward 2-D DFT of host matrices.
//!
//! The [`Dispatcher`] accepts contiguous single-precision 2-D matrices of at
//! least 4×4 elements with one (real) or two (complex) channels, and
//! produces either the packed-real or the full complex spectrum:
//!
//! | input   | output      | transform      | conversion            |
//! |---------|-------------|----------------|-----------------------|
//! | real    | packed-real | real-to-complex| compact → packed-real |
//! | real    | complex     | real-to-complex| compact → full        |
//! | complex | packed-real | complex        | full → packed-real    |
//! | complex | complex     | complex        | copy                  |
//!
//! Requests outside that envelope are declined with
//! [`DftError::Ineligible`] before any buffer is touched, and callers are
//! expected to fall back to an unaccelerated implementation. Plans always
//! run on scratch buffers owned by the cache, so a cached plan never refers
//! to memory the caller may have freed since.

use std::ops::BitOr;

use ndarray::{Array2, ArrayBase, Data, Dimension};
use num::Complex;

use crate::{
    layout,
    plan::{PlanCache, PlanKey, TransformKind},
    trace::{trace_event, trace_warn},
    DftError,
};

mod host;

pub use host::{Depth, Element, SpectralInput};

/// Smallest number of rows and of columns worth accelerating.
pub const MIN_SIDE: usize = 4;

/// Transform flag word, bit-compatible with the host library's DFT flags.
///
/// Only the empty set (packed-real output) and [`DftFlags::COMPLEX_OUTPUT`]
/// are accelerated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DftFlags(u32);

impl DftFlags {
    pub const NONE: Self = Self(0);
    pub const INVERSE: Self = Self(1);
    pub const SCALE: Self = Self(2);
    pub const ROWS: Self = Self(4);
    pub const COMPLEX_OUTPUT: Self = Self(16);
    pub const REAL_OUTPUT: Self = Self(32);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// The output layout these flags request, if it is one the dispatcher
    /// handles.
    pub fn layout(self) -> Option<OutputLayout> {
        match self {
            Self::NONE => Some(OutputLayout::Packed),
            Self::COMPLEX_OUTPUT => Some(OutputLayout::Complex),
            _ => None,
        }
    }
}

impl BitOr for DftFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl From<OutputLayout> for DftFlags {
    fn from(layout: OutputLayout) -> Self {
        match layout {
            OutputLayout::Packed => Self::NONE,
            OutputLayout::Complex => Self::COMPLEX_OUTPUT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputLayout {
    /// `rows × cols` real scalars, see [`crate::layout`].
    Packed,
    /// `rows × cols` complex values.
    Complex,
}

/// Transform result in the requested layout.
#[derive(Debug, Clone, PartialEq)]
pub enum Spectrum {
    Packed(Array2<f32>),
    Complex(Array2<Complex<f32>>),
}

impl Spectrum {
    pub fn layout(&self) -> OutputLayout {
        match self {
            Spectrum::Packed(_) => OutputLayout::Packed,
            Spectrum::Complex(_) => OutputLayout::Complex,
        }
    }

    pub fn as_packed(&self) -> Option<&Array2<f32>> {
        match self {
            Spectrum::Packed(a) => Some(a),
            Spectrum::Complex(_) => None,
        }
    }

    pub fn as_complex(&self) -> Option<&Array2<Complex<f32>>> {
        match self {
            Spectrum::Complex(a) => Some(a),
            Spectrum::Packed(_) => None,
        }
    }

    pub fn into_packed(self) -> Option<Array2<f32>> {
        match self {
            Spectrum::Packed(a) => Some(a),
            Spectrum::Complex(_) => None,
        }
    }

    pub fn into_complex(self) -> Option<Array2<Complex<f32>>> {
        match self {
            Spectrum::Complex(a) => Some(a),
            Spectrum::Packed(_) => None,
        }
    }
}

/// Eligibility check, plan lookup and layout conversion around a
/// [`PlanCache`].
///
/// Not thread-safe; callers sharing a dispatcher serialise access
/// themselves.
pub struct Dispatcher {
    cache: PlanCache<f32>,
    enabled: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(PlanCache::default())
    }
}

impl Dispatcher {
    /// Creates an enabled dispatcher running plans from `cache`.
    pub fn new(cache: PlanCache<f32>) -> Self {
        Self {
            cache,
            enabled: true,
        }
    }

    pub fn cache(&self) -> &PlanCache<f32> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut PlanCache<f32> {
        &mut self.cache
    }

    pub fn into_cache(self) -> PlanCache<f32> {
        self.cache
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns acceleration on or off, returning the previous state. While
    /// disabled every request is ineligible.
    pub fn set_enabled(&mut self, enable: bool) -> bool {
        std::mem::replace(&mut self.enabled, enable)
    }

    fn check<M: SpectralInput + ?Sized>(
        &self,
        src: &M,
        flags: DftFlags,
        nonzero_rows: usize,
    ) -> Result<OutputLayout, DftError> {
        if !self.enabled {
            return Err(DftError::Ineligible("acceleration disabled"));
        }
        if src.dims() != 2 {
            return Err(DftError::Ineligible("not a 2-D array"));
        }
        if src.is_empty() {
            return Err(DftError::Ineligible("empty array"));
        }
        if src.nrows() < MIN_SIDE || src.ncols() < MIN_SIDE {
            return Err(DftError::Ineligible("fewer than 4 rows or columns"));
        }
        if src.depth() != Depth::F32 {
            return Err(DftError::Ineligible("element depth is not f32"));
        }
        if !src.is_contiguous() {
            return Err(DftError::Ineligible("non-contiguous array"));
        }
        if src.is_subview() {
            return Err(DftError::Ineligible("sub-view array"));
        }
        if !matches!(src.channels(), 1 | 2) {
            return Err(DftError::Ineligible("channel count is not 1 or 2"));
        }
        if nonzero_rows != 0 {
            return Err(DftError::Ineligible("partial-row transforms"));
        }
        flags
            .layout()
            .ok_or(DftError::Ineligible("unsupported flags"))
    }

    /// Whether [`Dispatcher::process`] would accept the request.
    ///
    /// `nonzero_rows` is the host's hint that only the leading rows are
    /// non-zero; any value other than 0 is declined.
    pub fn can_process<M: SpectralInput + ?Sized>(
        &self,
        src: &M,
        flags: DftFlags,
        nonzero_rows: usize,
    ) -> bool {
        self.check(src, flags, nonzero_rows).is_ok()
    }

    /// Runs the forward DFT of `src` and returns the spectrum in the layout
    /// selected by `flags`.
    pub fn process<M: SpectralInput + ?Sized>(
        &mut self,
        src: &M,
        flags: DftFlags,
        nonzero_rows: usize,
    ) -> Result<Spectrum, DftError> {
        let requested = match self.check(src, flags, nonzero_rows) {
            Ok(requested) => requested,
            Err(e) => {
                trace_warn!("dispatch.declined", rows = src.nrows(), cols = src.ncols());
                return Err(e);
            }
        };
        let data = src
            .f32_data()
            .ok_or(DftError::Ineligible("element data is not readable as f32"))?;

        let (rows, cols) = (src.nrows(), src.ncols());
        let kind = if src.channels() == 1 {
            TransformKind::RealForward
        } else {
            TransformKind::ComplexForward
        };
        trace_event!(
            "dispatch.run",
            rows = rows,
            cols = cols,
            real = kind == TransformKind::RealForward
        );

        let entry = self.cache.acquire(PlanKey::scratch(rows, cols, kind))?;
        let input_len = entry.input_len();
        if data.len() < input_len {
            return Err(DftError::BufferTooSmall {
                needed: input_len,
                got: data.len(),
            });
        }

        entry
            .source_mut()
            .ok_or(DftError::BufferMismatch)?
            .as_real_mut()[..input_len]
            .copy_from_slice(&data[..input_len]);
        entry.execute()?;

        let output_len = entry.output_len();
        let raw = &entry
            .target()
            .ok_or(DftError::BufferMismatch)?
            .as_complex()[..output_len];

        Ok(match (kind, requested) {
            (TransformKind::RealForward, OutputLayout::Packed) => {
                let mut dst = Array2::zeros((rows, cols));
                layout::compact_to_packed(raw, contiguous_mut(&mut dst)?, rows, cols)?;
                Spectrum::Packed(dst)
            }
            (TransformKind::RealForward, OutputLayout::Complex) => {
                let mut dst = Array2::zeros((rows, cols));
                layout::compact_to_full(raw, contiguous_mut(&mut dst)?, rows, cols)?;
                Spectrum::Complex(dst)
            }
            (TransformKind::ComplexForward, OutputLayout::Packed) => {
                let mut dst = Array2::zeros((rows, cols));
                layout::full_to_packed(raw, contiguous_mut(&mut dst)?, rows, cols)?;
                Spectrum::Packed(dst)
            }
            (TransformKind::ComplexForward, OutputLayout::Complex) => Spectrum::Complex(
                Array2::from_shape_vec((rows, cols), raw.to_vec())
                    .map_err(|e| DftError::Transform(e.to_string()))?,
            ),
        })
    }

    /// [`Dispatcher::process`], reporting only whether the request was
    /// handled.
    pub fn try_process<M: SpectralInput + ?Sized>(
        &mut self,
        src: &M,
        flags: DftFlags,
        nonzero_rows: usize,
    ) -> Option<Spectrum> {
        self.process(src, flags, nonzero_rows).ok()
    }
}

fn contiguous_mut<A>(array: &mut Array2<A>) -> Result<&mut [A], DftError> {
    array
        .as_slice_mut()
        .ok_or(DftError::Transform("output array is not contiguous".to_string()))
}

/// Forward 2-D DFT directly on an `ndarray` value.
pub trait Dft2dExt {
    fn dft_2d(&self, dispatcher: &mut Dispatcher, flags: DftFlags) -> Result<Spectrum, DftError>;
}

impl<A, S, D> Dft2dExt for ArrayBase<S, D>
where
    A: Element + 'static,
    S: Data<Elem = A>,
    D: Dimension,
{
    fn dft_2d(&self, dispatcher: &mut Dispatcher, flags: DftFlags) -> Result<Spectrum, DftError> {
        dispatcher.process(self, flags, 0)
    }
}

#[cfg(test)]
mod tests;
