//! Dense vector kernels used by the solver hot loop.
//!
//! Elementwise kernels may run on the rayon pool; reductions always run
//! serially so results do not depend on how work gets split.

/// Controls whether kernels are allowed to use additional threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobMode {
    Serial,
    Parallel,
}

impl JobMode {
    /// Picks the parallel path only when enabled and the vector is large enough.
    pub fn select(parallel: bool, len: usize, threshold: usize) -> Self {
        if parallel && cfg!(feature = "parallel") && len >= threshold {
            JobMode::Parallel
        } else {
            JobMode::Serial
        }
    }
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// Squared distance `‖a − b‖²`.
pub fn distance_squared(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// `out[i] = x[i] + alpha * d[i]`.
pub fn axpy_into(out: &mut [f64], x: &[f64], alpha: f64, d: &[f64], mode: JobMode) {
    #[cfg(feature = "parallel")]
    if mode == JobMode::Parallel {
        use rayon::prelude::*;
        out.par_iter_mut()
            .zip(x.par_iter())
            .zip(d.par_iter())
            .for_each(|((o, xi), di)| *o = xi + alpha * di);
        return;
    }
    let _ = mode;
    for ((o, xi), di) in out.iter_mut().zip(x).zip(d) {
        *o = xi + alpha * di;
    }
}

/// `out[i] = a[i] + beta * (a[i] - b[i])`, the momentum extrapolation.
pub fn extrapolate_into(out: &mut [f64], a: &[f64], b: &[f64], beta: f64, mode: JobMode) {
    #[cfg(feature = "parallel")]
    if mode == JobMode::Parallel {
        use rayon::prelude::*;
        out.par_iter_mut()
            .zip(a.par_iter())
            .zip(b.par_iter())
            .for_each(|((o, ai), bi)| *o = ai + beta * (ai - bi));
        return;
    }
    let _ = mode;
    for ((o, ai), bi) in out.iter_mut().zip(a).zip(b) {
        *o = ai + beta * (ai - bi);
    }
}

/// `out[i] = a[i] - b[i]`.
pub fn sub_into(out: &mut [f64], a: &[f64], b: &[f64]) {
    for ((o, ai), bi) in out.iter_mut().zip(a).zip(b) {
        *o = ai - bi;
    }
}

/// Resizes `v` to `len` and zeroes every entry without reallocating when the
/// capacity is already there.
pub fn reset(v: &mut Vec<f64>, len: usize) {
    v.clear();
    v.resize(len, 0.0);
}
