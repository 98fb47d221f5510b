//! 2-D forward transform engines built from 1-D `rustfft`/`realfft` plans.
//!
//! Rows are transformed first along the contiguous axis, then every column
//! is gathered into a lane buffer, transformed and scattered back. Lane and
//! scratch buffers are allocated once when the engine is built, so running
//! an engine does not allocate.

use ndarray::{ArrayView1, ArrayViewMut2};
use num::Complex;
use realfft::RealFftPlanner;
use rustfft::{Fft, FftPlanner};

use crate::{DftError, DftNum};

use super::TransformKind;

pub mod complex;
pub mod real;

/// Interface shared by the real-input and complex-input engines.
pub trait Processor<T: DftNum> {
    /// Number of input scalars read by [`Processor::execute`].
    fn input_len(&self) -> usize;

    /// Number of complex values written by [`Processor::execute`].
    fn output_len(&self) -> usize;

    /// Runs the forward transform of `input` into `output`.
    ///
    /// `input` is a scalar view; complex input is stored as interleaved
    /// `re, im` pairs.
    fn execute(&mut self, input: &[T], output: &mut [Complex<T>]) -> Result<(), DftError>;
}

/// 1-D planners shared by every engine built through one cache, so twiddle
/// tables of repeated lengths are computed once.
pub struct Planners<T: DftNum> {
    real: RealFftPlanner<T>,
    complex: FftPlanner<T>,
}

impl<T: DftNum> Default for Planners<T> {
    fn default() -> Self {
        Self {
            real: RealFftPlanner::new(),
            complex: FftPlanner::new(),
        }
    }
}

/// A built engine for one transform kind and shape.
pub enum Engine<T: DftNum> {
    Real(real::Processor<T>),
    Complex(complex::Processor<T>),
}

impl<T: DftNum> Engine<T> {
    pub fn build(
        kind: TransformKind,
        rows: usize,
        cols: usize,
        planners: &mut Planners<T>,
    ) -> Result<Self, DftError> {
        // complex input is read as `2 * rows * cols` scalars
        let scalars = rows.checked_mul(cols).and_then(|n| n.checked_mul(2));
        if rows == 0 || cols == 0 || scalars.is_none() {
            return Err(DftError::InvalidShape { rows, cols });
        }
        Ok(match kind {
            TransformKind::RealForward => Engine::Real(real::Processor::new(rows, cols, planners)?),
            TransformKind::ComplexForward => {
                Engine::Complex(complex::Processor::new(rows, cols, planners)?)
            }
        })
    }
}

impl<T: DftNum> Processor<T> for Engine<T> {
    fn input_len(&self) -> usize {
        match self {
            Engine::Real(p) => p.input_len(),
            Engine::Complex(p) => p.input_len(),
        }
    }

    fn output_len(&self) -> usize {
        match self {
            Engine::Real(p) => p.output_len(),
            Engine::Complex(p) => p.output_len(),
        }
    }

    fn execute(&mut self, input: &[T], output: &mut [Complex<T>]) -> Result<(), DftError> {
        match self {
            Engine::Real(p) => p.execute(input, output),
            Engine::Complex(p) => p.execute(input, output),
        }
    }
}

fn check_len(needed: usize, got: usize) -> Result<(), DftError> {
    if got < needed {
        return Err(DftError::BufferTooSmall { needed, got });
    }
    Ok(())
}

/// Column pass over a row-major `rows × width` grid.
fn transform_columns<T: DftNum>(
    fft: &dyn Fft<T>,
    grid: &mut [Complex<T>],
    rows: usize,
    width: usize,
    lane: &mut [Complex<T>],
    scratch: &mut [Complex<T>],
) -> Result<(), DftError> {
    let mut grid = ArrayViewMut2::from_shape((rows, width), &mut grid[..rows * width])
        .map_err(|e| DftError::Transform(e.to_string()))?;

    for mut column in grid.columns_mut() {
        lane.iter_mut()
            .zip(column.iter())
            .for_each(|(dst, &src)| *dst = src);
        fft.process_with_scratch(lane, scratch);
        column.assign(&ArrayView1::from(&*lane));
    }

    Ok(())
}
