//! Cached 2-D DFT plans and spectrum layout transcoding for `ndarray`.
//!
//! The crate has three layers:
//!
//! * [`layout`]: pure conversions between the compact (half-stored),
//!   full complex and packed-real spectrum layouts.
//! * [`plan`]: a bounded least-recently-used cache of prepared 2-D
//!   transform plans and the scratch buffers they own.
//! * [`dispatch`]: decides whether a host array can be transformed, runs the
//!   cached plan and converts the result into the requested layout.
//!
//! ```rust
//! use ndarray::Array2;
//! use ndarray_dft::{Dft2dExt, DftFlags, Dispatcher, PlanCache};
//!
//! let mut dft = Dispatcher::new(PlanCache::default());
//! let image = Array2::<f32>::eye(4);
//!
//! let spectrum = image.dft_2d(&mut dft, DftFlags::COMPLEX_OUTPUT).unwrap();
//! assert_eq!(spectrum.as_complex().unwrap()[[0, 0]].re, 4.0);
//! ```

use rustfft::FftNum;

mod error;
mod trace;

pub mod dispatch;
pub mod layout;
pub mod plan;

pub use dispatch::{
    Depth, Dft2dExt, DftFlags, Dispatcher, Element, OutputLayout, SpectralInput, Spectrum,
};
pub use error::DftError;
pub use plan::{BufferId, CacheStats, PlanCache, PlanCacheConfig, PlanEntry, PlanKey, TransformKind};

/// Scalar types the transforms and transcoders operate on.
///
/// Besides being usable by `rustfft`, the type has to be plain old data so
/// scratch buffers can be viewed as real or complex slices without copies.
pub trait DftNum: FftNum + bytemuck::Pod {}

macro_rules! impl_dft_num {
    ($($t:ty),*) => {
        $(impl DftNum for $t {})*
    };
}

impl_dft_num!(f32, f64);
