//! Conversions between the three spectral layouts of a 2-D transform.
//!
//! * **compact**: `rows × hcols` complex values with `hcols = cols / 2 + 1`,
//!   the independent half of the spectrum of a real input, as produced by a
//!   real-to-complex transform.
//! * **full**: `rows × cols` complex values, Hermitian-symmetric when the
//!   input was real: `F[r, c] == conj(F[(rows - r) % rows, (cols - c) % cols])`.
//! * **packed**: `rows × cols` real scalars holding the whole spectrum of a
//!   real input without redundancy. Column 0 (and the Nyquist column when
//!   `cols` is even) stores the purely real / conjugate-paired bins
//!   vertically, every other row position stores interleaved `re, im` pairs.
//!
//! All buffers are row-major and contiguous. Zero dimensions are accepted
//! and leave the destination untouched.

use num::Complex;

use crate::{DftError, DftNum};

/// Which half of a complex value a packed slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Re,
    Im,
}

impl Component {
    #[inline]
    fn of<T: Copy>(self, value: &Complex<T>) -> T {
        match self {
            Component::Re => value.re,
            Component::Im => value.im,
        }
    }

    #[inline]
    fn set<T: Copy>(self, value: &mut Complex<T>, scalar: T) {
        match self {
            Component::Re => value.re = scalar,
            Component::Im => value.im = scalar,
        }
    }
}

/// Number of stored columns in the compact layout.
#[inline]
pub fn half_cols(cols: usize) -> usize {
    cols / 2 + 1
}

/// Maps packed row `m > 0` of column 0 (or of the Nyquist column) to the
/// spectrum row and component it holds.
///
/// Odd rows hold the real part and even rows the imaginary part of row
/// `(m + 1) / 2`, so the rows read `re1, im1, re2, im2, ...`. Row 0 is the
/// DC (or Nyquist) bin itself and maps to `(0, Re)`.
#[inline]
pub fn conjugate_source(m: usize) -> (usize, Component) {
    if m == 0 {
        return (0, Component::Re);
    }
    let component = if (m + 1) % 2 == 0 {
        Component::Re
    } else {
        Component::Im
    };
    ((m + 1) / 2, component)
}

fn check_len(needed: usize, got: usize) -> Result<(), DftError> {
    if got < needed {
        return Err(DftError::BufferTooSmall { needed, got });
    }
    Ok(())
}

/// Element count of a `rows × width` grid for a `rows × cols` transform.
fn area(rows: usize, cols: usize, width: usize) -> Result<usize, DftError> {
    rows.checked_mul(width)
        .ok_or(DftError::InvalidShape { rows, cols })
}

fn snapshot<T: Copy>(data: &[T]) -> Result<Vec<T>, DftError> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(data.len())
        .map_err(|_| DftError::Allocation(data.len()))?;
    copy.extend_from_slice(data);
    Ok(copy)
}

/// Expands a compact spectrum into the full Hermitian-symmetric grid.
///
/// `compact` holds `rows * half_cols(cols)` values, `full` receives
/// `rows * cols` values. The implied columns are written as conjugates of
/// their mirror positions, reflecting the row index too for rows past 0.
pub fn compact_to_full<T: DftNum>(
    compact: &[Complex<T>],
    full: &mut [Complex<T>],
    rows: usize,
    cols: usize,
) -> Result<(), DftError> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let hcols = half_cols(cols);
    check_len(area(rows, cols, hcols)?, compact.len())?;
    check_len(area(rows, cols, cols)?, full.len())?;

    for (src, dst) in compact
        .chunks_exact(hcols)
        .zip(full.chunks_exact_mut(cols))
        .take(rows)
    {
        dst[..hcols].copy_from_slice(src);
    }

    // Only columns below `hcols` are read, so the fill order does not matter.
    for (colin, colout) in (1..).zip((hcols..cols).rev()) {
        full[colout] = full[colin].conj();
    }
    for (rowin, rowout) in (1..rows).zip((1..rows).rev()) {
        for (colin, colout) in (1..).zip((hcols..cols).rev()) {
            full[rowout * cols + colout] = full[rowin * cols + colin].conj();
        }
    }

    Ok(())
}

/// Like [`compact_to_full`], with the compact input stored at the front of
/// the output buffer itself. The compact values are snapshotted first since
/// the expansion overwrites them.
pub fn compact_to_full_in_place<T: DftNum>(
    buffer: &mut [Complex<T>],
    rows: usize,
    cols: usize,
) -> Result<(), DftError> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let compact_len = area(rows, cols, half_cols(cols))?;
    check_len(area(rows, cols, cols)?, buffer.len())?;
    let compact = snapshot(&buffer[..compact_len])?;
    compact_to_full(&compact, buffer, rows, cols)
}

/// Packs a spectrum whose rows are `stride` complex values apart.
///
/// Only columns `0..=cols / 2` of the source are read, which is why the
/// same routine serves both the full (`stride == cols`) and the compact
/// (`stride == hcols`) layouts.
fn pack<T: DftNum>(src: &[Complex<T>], stride: usize, packed: &mut [T], rows: usize, cols: usize) {
    packed[0] = src[0].re;
    for m in 1..rows {
        let (row, part) = conjugate_source(m);
        packed[m * cols] = part.of(&src[row * stride]);
    }

    // Interleaved pairs for columns 1.., leaving the last slot alone when
    // `cols` is even.
    let span = cols + cols % 2 - 2;
    for m in 0..rows {
        let out = &mut packed[m * cols + 1..m * cols + 1 + span];
        let row = &src[m * stride + 1..];
        for (pair, value) in out.chunks_exact_mut(2).zip(row) {
            pair[0] = value.re;
            pair[1] = value.im;
        }
    }

    if cols % 2 == 0 {
        let nyquist = cols / 2;
        packed[cols - 1] = src[nyquist].re;
        for m in 1..rows {
            let (row, part) = conjugate_source(m);
            packed[m * cols + cols - 1] = part.of(&src[row * stride + nyquist]);
        }
    }
}

/// Packs a full spectrum into the packed-real layout.
///
/// The imaginary parts of the DC bin (and of the Nyquist bin of row 0) are
/// discarded; they are zero for a real input.
pub fn full_to_packed<T: DftNum>(
    full: &[Complex<T>],
    packed: &mut [T],
    rows: usize,
    cols: usize,
) -> Result<(), DftError> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    check_len(area(rows, cols, cols)?, full.len())?;
    check_len(area(rows, cols, cols)?, packed.len())?;
    pack(full, cols, packed, rows, cols);
    Ok(())
}

/// Like [`full_to_packed`], writing the packed scalars over the leading
/// `rows * cols` scalars of the full buffer.
pub fn full_to_packed_in_place<T: DftNum>(
    buffer: &mut [Complex<T>],
    rows: usize,
    cols: usize,
) -> Result<(), DftError> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    check_len(area(rows, cols, cols)?, buffer.len())?;
    let full = snapshot(&buffer[..rows * cols])?;
    let packed: &mut [T] = bytemuck::cast_slice_mut(buffer);
    pack(&full, cols, packed, rows, cols);
    Ok(())
}

/// Packs a compact spectrum straight into the packed-real layout.
///
/// Produces exactly what [`compact_to_full`] followed by [`full_to_packed`]
/// produces, without the intermediate full grid.
pub fn compact_to_packed<T: DftNum>(
    compact: &[Complex<T>],
    packed: &mut [T],
    rows: usize,
    cols: usize,
) -> Result<(), DftError> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let hcols = half_cols(cols);
    check_len(area(rows, cols, hcols)?, compact.len())?;
    check_len(area(rows, cols, cols)?, packed.len())?;
    pack(compact, hcols, packed, rows, cols);
    Ok(())
}

/// Rebuilds the compact spectrum from a packed-real buffer.
///
/// Bins that the packed layout stores only once (column 0 and the Nyquist
/// column) are completed by conjugate symmetry down the rows.
pub fn packed_to_compact<T: DftNum>(
    packed: &[T],
    compact: &mut [Complex<T>],
    rows: usize,
    cols: usize,
) -> Result<(), DftError> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let hcols = half_cols(cols);
    check_len(area(rows, cols, cols)?, packed.len())?;
    check_len(area(rows, cols, hcols)?, compact.len())?;

    let zero = Complex::new(T::zero(), T::zero());
    compact[..rows * hcols].fill(zero);

    let mut vertical = |src_col: usize, dst_col: usize| {
        for m in 0..rows {
            let (row, part) = conjugate_source(m);
            part.set(&mut compact[row * hcols + dst_col], packed[m * cols + src_col]);
        }
        for row in rows / 2 + 1..rows {
            compact[row * hcols + dst_col] = compact[(rows - row) * hcols + dst_col].conj();
        }
    };
    vertical(0, 0);
    if cols % 2 == 0 {
        vertical(cols - 1, cols / 2);
    }

    let span = cols + cols % 2 - 2;
    for m in 0..rows {
        let src = &packed[m * cols + 1..m * cols + 1 + span];
        let row = &mut compact[m * hcols + 1..(m + 1) * hcols];
        for (pair, value) in src.chunks_exact(2).zip(row) {
            *value = Complex::new(pair[0], pair[1]);
        }
    }

    Ok(())
}

/// Rebuilds the full spectrum from a packed-real buffer.
pub fn packed_to_full<T: DftNum>(
    packed: &[T],
    full: &mut [Complex<T>],
    rows: usize,
    cols: usize,
) -> Result<(), DftError> {
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    check_len(area(rows, cols, cols)?, full.len())?;
    packed_to_compact(packed, full, rows, cols)?;
    compact_to_full_in_place(full, rows, cols)
}
