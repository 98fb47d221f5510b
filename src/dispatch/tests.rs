use super::*;
use crate::plan::PlanCacheConfig;
use ndarray::{array, prelude::*, s};
use ndarray_rand::{rand_distr::Uniform, RandomExt};

const TOLERANCE: f32 = 1e-3;

fn dispatcher() -> Dispatcher {
    Dispatcher::new(PlanCache::new(PlanCacheConfig { capacity: 4 }))
}

fn naive_dft(input: &Array2<Complex<f64>>) -> Array2<Complex<f32>> {
    let (rows, cols) = input.dim();
    Array::from_shape_fn((rows, cols), |(k, l)| {
        let sum: Complex<f64> = input
            .indexed_iter()
            .map(|((m, n), &x)| {
                let phase = -2.0
                    * std::f64::consts::PI
                    * ((k * m) as f64 / rows as f64 + (l * n) as f64 / cols as f64);
                x * Complex::from_polar(1.0, phase)
            })
            .sum();
        Complex::new(sum.re as f32, sum.im as f32)
    })
}

fn packed_of(full: &Array2<Complex<f32>>) -> Array2<f32> {
    let (rows, cols) = full.dim();
    let mut packed = Array2::zeros((rows, cols));
    layout::full_to_packed(
        full.as_slice().unwrap(),
        packed.as_slice_mut().unwrap(),
        rows,
        cols,
    )
    .unwrap();
    packed
}

fn assert_close<A, F>(got: &Array2<A>, want: &Array2<A>, dist: F)
where
    A: std::fmt::Debug,
    F: Fn(&A, &A) -> f32,
{
    assert_eq!(got.dim(), want.dim());
    for ((idx, g), w) in got.indexed_iter().zip(want.iter()) {
        assert!(dist(g, w) < TOLERANCE, "mismatch at {idx:?}: {g:?} vs {w:?}");
    }
}

/// Host matrix with freely chosen properties.
struct FakeMatrix {
    channels: usize,
    subview: bool,
    data: Vec<f32>,
}

impl FakeMatrix {
    fn new(channels: usize, subview: bool) -> Self {
        Self {
            channels,
            subview,
            data: vec![0.0; 16 * channels],
        }
    }
}

impl SpectralInput for FakeMatrix {
    fn dims(&self) -> usize {
        2
    }
    fn nrows(&self) -> usize {
        4
    }
    fn ncols(&self) -> usize {
        4
    }
    fn channels(&self) -> usize {
        self.channels
    }
    fn depth(&self) -> Depth {
        Depth::F32
    }
    fn is_empty(&self) -> bool {
        false
    }
    fn is_contiguous(&self) -> bool {
        true
    }
    fn is_subview(&self) -> bool {
        self.subview
    }
    fn f32_data(&self) -> Option<&[f32]> {
        Some(self.data.as_slice())
    }
}

#[test]
fn accepts_real_and_complex_f32() {
    let dft = dispatcher();
    let real = Array2::<f32>::zeros((4, 4));
    let complex = Array2::<Complex<f32>>::zeros((5, 7));
    for flags in [DftFlags::NONE, DftFlags::COMPLEX_OUTPUT] {
        assert!(dft.can_process(&real, flags, 0));
        assert!(dft.can_process(&complex, flags, 0));
    }
    assert!(dft.can_process(&FakeMatrix::new(1, false), DftFlags::NONE, 0));
    assert!(dft.can_process(&FakeMatrix::new(2, false), DftFlags::NONE, 0));
}

#[test]
fn rejects_ineligible_shapes_and_layouts() {
    let dft = dispatcher();
    let flags = DftFlags::NONE;

    assert!(!dft.can_process(&Array2::<f32>::zeros((0, 0)), flags, 0));
    assert!(!dft.can_process(&Array2::<f32>::zeros((3, 8)), flags, 0));
    assert!(!dft.can_process(&Array2::<f32>::zeros((8, 3)), flags, 0));
    assert!(!dft.can_process(&Array1::<f32>::zeros(16), flags, 0));
    assert!(!dft.can_process(&Array3::<f32>::zeros((4, 4, 4)), flags, 0));

    let wide = Array2::<f32>::zeros((4, 6));
    assert!(!dft.can_process(&wide.t(), flags, 0));
    assert!(!dft.can_process(&wide.slice(s![.., ..4]), flags, 0));
    assert!(!dft.can_process(&wide.slice(s![.., ..;2]), flags, 0));
}

#[test]
fn contiguous_row_range_views_are_accepted() {
    let dft = dispatcher();
    let big = Array2::<f32>::zeros((8, 6));

    // a view over whole rows is indistinguishable from an owned matrix
    let rows = big.slice(s![2..6, ..]);
    assert!(rows.is_standard_layout());
    assert!(!SpectralInput::is_subview(&rows));
    assert!(dft.can_process(&rows, DftFlags::NONE, 0));

    // a column window is not
    assert!(!dft.can_process(&big.slice(s![2..6, 1..5]), DftFlags::NONE, 0));
}

#[test]
fn rejects_other_depths_and_channel_counts() {
    let dft = dispatcher();
    let flags = DftFlags::NONE;

    assert!(!dft.can_process(&Array2::<f64>::zeros((4, 4)), flags, 0));
    assert!(!dft.can_process(&Array2::<u8>::zeros((4, 4)), flags, 0));
    assert!(!dft.can_process(&Array2::<i32>::zeros((4, 4)), flags, 0));
    assert!(!dft.can_process(&Array2::<Complex<f64>>::zeros((4, 4)), flags, 0));

    assert!(!dft.can_process(&FakeMatrix::new(3, false), flags, 0));
    assert!(!dft.can_process(&FakeMatrix::new(4, false), flags, 0));
    assert!(!dft.can_process(&FakeMatrix::new(1, true), flags, 0));
}

#[test]
fn rejects_unsupported_flags_and_row_hints() {
    let dft = dispatcher();
    let src = Array2::<f32>::zeros((4, 4));

    for flags in [
        DftFlags::INVERSE,
        DftFlags::SCALE,
        DftFlags::ROWS,
        DftFlags::REAL_OUTPUT,
        DftFlags::COMPLEX_OUTPUT | DftFlags::SCALE,
        DftFlags::from_bits(8),
    ] {
        assert!(!dft.can_process(&src, flags, 0), "{flags:?} accepted");
    }
    assert!(!dft.can_process(&src, DftFlags::NONE, 2));
}

#[test]
fn declined_requests_touch_nothing() {
    let mut dft = dispatcher();
    let src = Array2::<f64>::zeros((4, 4));
    assert!(matches!(
        dft.process(&src, DftFlags::NONE, 0),
        Err(DftError::Ineligible(_))
    ));
    assert!(dft.try_process(&src, DftFlags::NONE, 0).is_none());
    assert!(dft.cache().is_empty());
}

#[test]
fn toggle_disables_and_restores_acceleration() {
    let mut dft = dispatcher();
    let src = Array2::<f32>::ones((4, 4));
    assert!(dft.is_enabled());

    assert!(dft.set_enabled(false));
    assert!(!dft.is_enabled());
    assert!(!dft.can_process(&src, DftFlags::NONE, 0));
    assert!(dft.try_process(&src, DftFlags::NONE, 0).is_none());

    assert!(!dft.set_enabled(true));
    assert!(dft.can_process(&src, DftFlags::NONE, 0));
    assert!(dft.try_process(&src, DftFlags::NONE, 0).is_some());
}

#[test]
fn zeros_give_an_all_zero_spectrum() {
    let mut dft = dispatcher();
    let src = Array2::<f32>::zeros((4, 4));
    let spectrum = src.dft_2d(&mut dft, DftFlags::COMPLEX_OUTPUT).unwrap();
    assert_eq!(spectrum.layout(), OutputLayout::Complex);
    let full = spectrum.into_complex().unwrap();
    assert_eq!(full.dim(), (4, 4));
    assert!(full.iter().all(|v| v.norm() == 0.0));
}

#[test]
fn identity_packs_to_known_layout() {
    let mut dft = dispatcher();
    let src = Array2::<f32>::eye(4);
    let packed = src
        .dft_2d(&mut dft, DftFlags::NONE)
        .unwrap()
        .into_packed()
        .unwrap();

    let expected = array![
        [4., 0., 0., 0.],
        [0., 0., 0., 0.],
        [0., 0., 0., 0.],
        [0., 4., 0., 4.]
    ];
    assert_close(&packed, &expected, |a, b| (a - b).abs());

    let spectrum = src.dft_2d(&mut dft, DftFlags::NONE).unwrap();
    assert_eq!(spectrum.as_packed(), Some(&packed));
    assert!(spectrum.as_complex().is_none());

    // the spectrum is 4 at (0,0), (1,3), (2,2) and (3,1)
    let mut full = vec![Complex::new(0f32, 0.0); 16];
    layout::packed_to_full(packed.as_slice().unwrap(), &mut full, 4, 4).unwrap();
    let energy: f32 = full.iter().map(|v| v.norm_sqr()).sum();
    assert!((energy - 64.0).abs() < TOLERANCE);
}

#[test]
fn real_input_matches_naive_dft() {
    let mut dft = dispatcher();
    for (rows, cols) in [(4, 4), (5, 6), (8, 5), (7, 9)] {
        let src = Array::random((rows, cols), Uniform::new(-1f32, 1.));
        let want = naive_dft(&src.mapv(|v| Complex::new(v as f64, 0.0)));

        let full = src
            .dft_2d(&mut dft, DftFlags::COMPLEX_OUTPUT)
            .unwrap()
            .into_complex()
            .unwrap();
        assert_close(&full, &want, |a, b| (a - b).norm());

        let packed = src
            .dft_2d(&mut dft, DftFlags::NONE)
            .unwrap()
            .into_packed()
            .unwrap();
        assert_close(&packed, &packed_of(&want), |a, b| (a - b).abs());
    }
}

#[test]
fn complex_input_matches_naive_dft() {
    let mut dft = dispatcher();
    for (rows, cols) in [(4, 4), (6, 5), (5, 8)] {
        let re = Array::random((rows, cols), Uniform::new(-1f32, 1.));
        let im = Array::random((rows, cols), Uniform::new(-1f32, 1.));
        let src = Array::from_shape_fn((rows, cols), |idx| Complex::new(re[idx], im[idx]));
        let want = naive_dft(&src.mapv(|v| Complex::new(v.re as f64, v.im as f64)));

        let full = src
            .dft_2d(&mut dft, DftFlags::COMPLEX_OUTPUT)
            .unwrap()
            .into_complex()
            .unwrap();
        assert_close(&full, &want, |a, b| (a - b).norm());

        let packed = src
            .dft_2d(&mut dft, DftFlags::NONE)
            .unwrap()
            .into_packed()
            .unwrap();
        assert_close(&packed, &packed_of(&want), |a, b| (a - b).abs());
    }
}

#[test]
fn repeated_shapes_reuse_the_cached_plan() {
    let mut dft = dispatcher();
    let a = Array::random((6, 6), Uniform::new(0f32, 1.));
    let b = Array::random((6, 6), Uniform::new(0f32, 1.));

    let first = a.dft_2d(&mut dft, DftFlags::COMPLEX_OUTPUT).unwrap();
    b.dft_2d(&mut dft, DftFlags::NONE).unwrap();
    let again = a.dft_2d(&mut dft, DftFlags::COMPLEX_OUTPUT).unwrap();

    assert_eq!(first, again);
    assert_eq!(dft.cache().len(), 1);
    assert_eq!(dft.cache().stats().hits, 2);
    assert_eq!(dft.cache().stats().misses, 1);
}

#[test]
fn flags_round_trip_through_layouts() {
    assert_eq!(DftFlags::default(), DftFlags::NONE);
    assert_eq!(DftFlags::from(OutputLayout::Complex).bits(), 16);
    assert_eq!(DftFlags::NONE.layout(), Some(OutputLayout::Packed));
    assert_eq!(DftFlags::COMPLEX_OUTPUT.layout(), Some(OutputLayout::Complex));
    assert_eq!((DftFlags::INVERSE | DftFlags::SCALE).bits(), 3);
}

#[test]
fn cache_can_be_managed_and_taken_back() {
    let mut dft = dispatcher();
    let src = Array2::<f32>::ones((4, 4));
    src.dft_2d(&mut dft, DftFlags::NONE).unwrap();
    assert_eq!(dft.cache().len(), 1);

    dft.cache_mut().clear();
    assert!(dft.cache().is_empty());

    src.dft_2d(&mut dft, DftFlags::COMPLEX_OUTPUT).unwrap();
    let cache = dft.into_cache();
    assert!(cache.contains(&PlanKey::scratch(4, 4, TransformKind::RealForward)));
    assert_eq!(cache.stats().misses, 2);
}
