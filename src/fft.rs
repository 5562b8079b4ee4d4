// src/fft.rs
//
// Square N x N complex 2D FFT on rustfft, rows then columns, in place.
// Both directions are unnormalised: forward followed by inverse multiplies by N^2.

use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftDirection, FftPlanner, FftPlannerScalar};

use crate::wisdom::{FftKernel, PlanRecord, Wisdom};

// Grids with fewer cells than this gather columns serially instead of transposing.
// Override with VORTEX_FFT_PAR_THRESHOLD.
static FFT_PAR_THRESHOLD: OnceLock<usize> = OnceLock::new();
const DEFAULT_FFT_PAR_THRESHOLD: usize = 16_384;

fn fft_par_threshold() -> usize {
    *FFT_PAR_THRESHOLD.get_or_init(|| {
        std::env::var("VORTEX_FFT_PAR_THRESHOLD")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_FFT_PAR_THRESHOLD)
    })
}

#[inline]
fn use_parallel_column_fft(n: usize) -> bool {
    n >= 64 && n.saturating_mul(n) >= fft_par_threshold()
}

/// How the plans of an engine were chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Planning {
    /// Default planner, no measurement.
    Estimate,
    /// Kernel family taken from wisdom or picked by benchmark.
    Exhaustive,
}

pub struct Fft2D {
    n: usize,
    fwd: Arc<dyn Fft<f64>>,
    inv: Arc<dyn Fft<f64>>,
    kernel: FftKernel,
    planning: Planning,
    // column scratch (len = n*n) for the transpose path
    tmp: Vec<Complex<f64>>,
    // exported back to disk when the engine is dropped
    wisdom: Option<Wisdom>,
}

impl std::fmt::Debug for Fft2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft2D")
            .field("n", &self.n)
            .field("kernel", &self.kernel)
            .field("planning", &self.planning)
            .finish()
    }
}

impl Fft2D {
    /// Plan an N x N engine. With a readable wisdom file at `wisdom_path` the kernel is
    /// chosen exhaustively and the file is refreshed on drop; otherwise plans are estimated.
    pub fn new(n: usize, wisdom_path: Option<&Path>) -> Self {
        let wisdom = wisdom_path.and_then(|p| match Wisdom::load(p) {
            Ok(w) => Some(w),
            Err(e) => {
                info!("[fft] no usable wisdom, planning by estimate: {e}");
                None
            }
        });
        Self::with_wisdom(n, wisdom)
    }

    /// Plan with an already opened wisdom store (or none).
    pub fn with_wisdom(n: usize, mut wisdom: Option<Wisdom>) -> Self {
        assert!(n > 0, "Fft2D: grid resolution must be positive");

        let (kernel, planning) = match wisdom.as_mut() {
            Some(w) => (choose_kernel(n, w), Planning::Exhaustive),
            None => (FftKernel::Simd, Planning::Estimate),
        };
        let (fwd, inv) = plan_pair(n, kernel);

        debug!("[fft] planned {n}x{n} ({kernel:?}, {planning:?})");

        Self {
            n,
            fwd,
            inv,
            kernel,
            planning,
            tmp: vec![Complex::new(0.0, 0.0); n * n],
            wisdom,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn kernel(&self) -> FftKernel {
        self.kernel
    }

    pub fn planning(&self) -> Planning {
        self.planning
    }

    pub fn wisdom(&self) -> Option<&Wisdom> {
        self.wisdom.as_ref()
    }

    /// Unnormalised forward transform (exp(-i k x)).
    pub fn forward(&mut self, data: &mut [Complex<f64>]) {
        fft2_in_place(data, self.n, &self.fwd, &mut self.tmp);
    }

    /// Unnormalised inverse transform (exp(+i k x)).
    pub fn inverse(&mut self, data: &mut [Complex<f64>]) {
        fft2_in_place(data, self.n, &self.inv, &mut self.tmp);
    }
}

fn plan_pair(n: usize, kernel: FftKernel) -> (Arc<dyn Fft<f64>>, Arc<dyn Fft<f64>>) {
    match kernel {
        FftKernel::Simd => {
            let mut planner = FftPlanner::<f64>::new();
            (planner.plan_fft_forward(n), planner.plan_fft_inverse(n))
        }
        FftKernel::Scalar => {
            let mut planner = FftPlannerScalar::<f64>::new();
            (planner.plan_fft_forward(n), planner.plan_fft_inverse(n))
        }
    }
}

/// Kernel family for length `n`: from the table if recorded, else benchmark and record.
pub fn choose_kernel(n: usize, wisdom: &mut Wisdom) -> FftKernel {
    if let Some(rec) = wisdom.get(n) {
        return rec.kernel;
    }

    let t_simd = time_kernel(n, FftKernel::Simd);
    let t_scalar = time_kernel(n, FftKernel::Scalar);
    let (kernel, nanos) = if t_scalar < t_simd {
        (FftKernel::Scalar, t_scalar)
    } else {
        (FftKernel::Simd, t_simd)
    };

    info!(
        "[fft] measured length {n}: simd {t_simd:.1} ns, scalar {t_scalar:.1} ns -> {kernel:?}"
    );
    wisdom.record(
        n,
        PlanRecord {
            kernel,
            nanos_per_transform: nanos,
        },
    );
    kernel
}

/// Mean wall time of one 1D transform of length `n`, in ns.
fn time_kernel(n: usize, kernel: FftKernel) -> f64 {
    let fft = match kernel {
        FftKernel::Simd => FftPlanner::<f64>::new().plan_fft(n, FftDirection::Forward),
        FftKernel::Scalar => FftPlannerScalar::<f64>::new().plan_fft(n, FftDirection::Forward),
    };
    let mut buf: Vec<Complex<f64>> = (0..n)
        .map(|i| Complex::new((i as f64).sin(), 0.0))
        .collect();
    let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

    // warm-up
    fft.process_with_scratch(&mut buf, &mut scratch);

    let reps = (1 << 18) / n.max(1) + 16;
    let t0 = Instant::now();
    for _ in 0..reps {
        fft.process_with_scratch(&mut buf, &mut scratch);
    }
    t0.elapsed().as_nanos() as f64 / reps as f64
}

/// 2D transform in place: 1D transforms over rows, then over columns.
///
/// Columns go through `tmp` either one at a time (small grids) or as a whole transposed
/// block processed in parallel.
fn fft2_in_place(
    data: &mut [Complex<f64>],
    n: usize,
    fft: &Arc<dyn Fft<f64>>,
    tmp: &mut [Complex<f64>],
) {
    let nn = n * n;
    assert_eq!(data.len(), nn, "fft2_in_place: buffer is not {n}x{n}");
    assert!(tmp.len() >= nn, "fft2_in_place: scratch too small");

    data.par_chunks_mut(n).for_each(|row| fft.process(row));

    if use_parallel_column_fft(n) {
        let block = &mut tmp[..nn];
        transpose_into(data, block, n);
        block.par_chunks_mut(n).for_each(|col| fft.process(col));
        transpose_into(block, data, n);
    } else {
        let col = &mut tmp[..n];
        for x in 0..n {
            for (c, v) in col.iter_mut().zip(data[x..].iter().step_by(n)) {
                *c = *v;
            }
            fft.process(col);
            for (v, c) in data[x..].iter_mut().step_by(n).zip(col.iter()) {
                *v = *c;
            }
        }
    }
}

/// dst[x * n + y] = src[y * n + x] for an n x n block.
fn transpose_into(src: &[Complex<f64>], dst: &mut [Complex<f64>], n: usize) {
    dst.par_chunks_mut(n).enumerate().for_each(|(x, out)| {
        for (y, o) in out.iter_mut().enumerate() {
            *o = src[y * n + x];
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn forward_then_inverse_scales_by_n_squared() {
        let n = 16;
        let mut fft = Fft2D::new(n, None);
        assert_eq!(fft.planning(), Planning::Estimate);

        let orig: Vec<Complex<f64>> = (0..n * n)
            .map(|i| Complex::new((0.3 * i as f64).cos(), (0.1 * i as f64).sin()))
            .collect();
        let mut buf = orig.clone();
        fft.forward(&mut buf);
        fft.inverse(&mut buf);

        let s = (n * n) as f64;
        for (a, b) in buf.iter().zip(orig.iter()) {
            assert!(approx_eq(a.re / s, b.re, 1e-12));
            assert!(approx_eq(a.im / s, b.im, 1e-12));
        }
    }

    #[test]
    fn single_mode_lands_in_its_slot() {
        // cos(2 pi (2x + y)/N) -> slots (row 1, col 2) and (row N-1, col N-2)
        let n = 8;
        let mut fft = Fft2D::new(n, None);
        let mut buf = vec![Complex::new(0.0, 0.0); n * n];
        for row in 0..n {
            for col in 0..n {
                let phase =
                    2.0 * std::f64::consts::PI * (2.0 * col as f64 + row as f64) / n as f64;
                buf[row * n + col] = Complex::new(phase.cos(), 0.0);
            }
        }
        fft.forward(&mut buf);
        let half = (n * n) as f64 / 2.0;
        for (i, c) in buf.iter().enumerate() {
            let expected = if i == n + 2 || i == (n - 1) * n + (n - 2) {
                half
            } else {
                0.0
            };
            assert!(approx_eq(c.re, expected, 1e-9), "slot {i}: {c}");
            assert!(approx_eq(c.im, 0.0, 1e-9));
        }
    }

    #[test]
    fn parallel_column_path_matches_serial() {
        // n = 128 takes the transpose path with the default threshold
        let n = 128;
        let mut fft = Fft2D::new(n, None);
        let orig: Vec<Complex<f64>> = (0..n * n)
            .map(|i| Complex::new(((i * 7) % 13) as f64, 0.0))
            .collect();
        let mut buf = orig.clone();
        fft.forward(&mut buf);

        // DC equals the plain sum
        let sum: f64 = orig.iter().map(|c| c.re).sum();
        assert!(approx_eq(buf[0].re, sum, 1e-6 * sum));

        fft.inverse(&mut buf);
        let s = (n * n) as f64;
        for (a, b) in buf.iter().zip(orig.iter()) {
            assert!(approx_eq(a.re / s, b.re, 1e-9));
        }
    }

    #[test]
    fn transpose_swaps_rows_and_columns() {
        let n = 5;
        let src: Vec<Complex<f64>> = (0..n * n).map(|i| Complex::new(i as f64, 0.0)).collect();
        let mut dst = vec![Complex::new(0.0, 0.0); n * n];
        transpose_into(&src, &mut dst, n);
        assert_eq!(dst[n + 3], src[3 * n + 1]);
        let mut back = vec![Complex::new(0.0, 0.0); n * n];
        transpose_into(&dst, &mut back, n);
        assert_eq!(back, src);
    }

    #[test]
    fn transpose_path_puts_a_mode_in_its_slot() {
        // n = 128 takes the transpose path with the default threshold
        let n = 128;
        let mut fft = Fft2D::new(n, None);
        let mut buf = vec![Complex::new(0.0, 0.0); n * n];
        for row in 0..n {
            for col in 0..n {
                let phase = 2.0 * std::f64::consts::PI * (3.0 * col as f64 + row as f64) / n as f64;
                buf[row * n + col] = Complex::new(phase.cos(), 0.0);
            }
        }
        fft.forward(&mut buf);
        let half = (n * n) as f64 / 2.0;
        assert!(approx_eq(buf[n + 3].re, half, 1e-6));
        assert!(approx_eq(buf[(n - 1) * n + (n - 3)].re, half, 1e-6));
        assert!(approx_eq(buf[3].norm(), 0.0, 1e-6));
    }
}
