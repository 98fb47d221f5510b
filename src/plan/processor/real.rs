use std::sync::Arc;

use num::Complex;
use realfft::RealToComplex;
use rustfft::Fft;

use super::{check_len, transform_columns, Planners, Processor as ProcessorTrait};
use crate::{plan::buffer::try_filled, DftError, DftNum};

/// Real-to-complex forward 2-D transform producing the compact layout.
pub struct Processor<T: DftNum> {
    rows: usize,
    cols: usize,
    rp: Arc<dyn RealToComplex<T>>,
    cp: Arc<dyn Fft<T>>,
    // realfft uses its input as workspace, so rows are copied here first
    row: Vec<T>,
    lane: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T: DftNum> Processor<T> {
    pub fn new(rows: usize, cols: usize, planners: &mut Planners<T>) -> Result<Self, DftError> {
        let rp = planners.real.plan_fft_forward(cols);
        let cp = planners.complex.plan_fft_forward(rows);

        let zero = Complex::new(T::zero(), T::zero());
        let scratch_len = rp.get_scratch_len().max(cp.get_inplace_scratch_len());

        Ok(Self {
            rows,
            cols,
            row: try_filled(cols, T::zero())?,
            lane: try_filled(rows, zero)?,
            scratch: try_filled(scratch_len, zero)?,
            rp,
            cp,
        })
    }

    /// Width of the compact output.
    pub fn complex_len(&self) -> usize {
        self.rp.complex_len()
    }
}

impl<T: DftNum> ProcessorTrait<T> for Processor<T> {
    fn input_len(&self) -> usize {
        self.rows * self.cols
    }

    fn output_len(&self) -> usize {
        self.rows * self.complex_len()
    }

    fn execute(&mut self, input: &[T], output: &mut [Complex<T>]) -> Result<(), DftError> {
        check_len(self.input_len(), input.len())?;
        check_len(self.output_len(), output.len())?;

        let hcols = self.complex_len();
        let rp_scratch = self.rp.get_scratch_len();
        for (src, dst) in input
            .chunks_exact(self.cols)
            .zip(output.chunks_exact_mut(hcols))
            .take(self.rows)
        {
            self.row.copy_from_slice(src);
            self.rp
                .process_with_scratch(&mut self.row, dst, &mut self.scratch[..rp_scratch])
                .map_err(|e| DftError::Transform(e.to_string()))?;
        }

        let cp_scratch = self.cp.get_inplace_scratch_len();
        transform_columns(
            self.cp.as_ref(),
            output,
            self.rows,
            hcols,
            &mut self.lane,
            &mut self.scratch[..cp_scratch],
        )
    }
}
