use std::sync::Arc;

use num::Complex;
use rustfft::Fft;

use super::{check_len, transform_columns, Planners, Processor as ProcessorTrait};
use crate::{plan::buffer::try_filled, DftError, DftNum};

/// Complex-to-complex forward 2-D transform producing the full layout.
pub struct Processor<T: DftNum> {
    rows: usize,
    cols: usize,
    row_fft: Arc<dyn Fft<T>>,
    col_fft: Arc<dyn Fft<T>>,
    lane: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T: DftNum> Processor<T> {
    pub fn new(rows: usize, cols: usize, planners: &mut Planners<T>) -> Result<Self, DftError> {
        let row_fft = planners.complex.plan_fft_forward(cols);
        let col_fft = planners.complex.plan_fft_forward(rows);

        let zero = Complex::new(T::zero(), T::zero());
        let scratch_len = row_fft
            .get_inplace_scratch_len()
            .max(col_fft.get_inplace_scratch_len());

        Ok(Self {
            rows,
            cols,
            lane: try_filled(rows, zero)?,
            scratch: try_filled(scratch_len, zero)?,
            row_fft,
            col_fft,
        })
    }
}

impl<T: DftNum> ProcessorTrait<T> for Processor<T> {
    fn input_len(&self) -> usize {
        self.rows * self.cols * 2
    }

    fn output_len(&self) -> usize {
        self.rows * self.cols
    }

    fn execute(&mut self, input: &[T], output: &mut [Complex<T>]) -> Result<(), DftError> {
        check_len(self.input_len(), input.len())?;
        check_len(self.output_len(), output.len())?;

        let len = self.output_len();
        let input: &[Complex<T>] = bytemuck::try_cast_slice(&input[..self.input_len()])
            .map_err(|e| DftError::Transform(e.to_string()))?;
        let output = &mut output[..len];
        output.copy_from_slice(input);

        // rustfft runs every `cols`-long chunk of the buffer
        let row_scratch = self.row_fft.get_inplace_scratch_len();
        self.row_fft
            .process_with_scratch(output, &mut self.scratch[..row_scratch]);

        let col_scratch = self.col_fft.get_inplace_scratch_len();
        transform_columns(
            self.col_fft.as_ref(),
            output,
            self.rows,
            self.cols,
            &mut self.lane,
            &mut self.scratch[..col_scratch],
        )
    }
}
