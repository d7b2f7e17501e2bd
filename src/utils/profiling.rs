use std::time::{Duration, Instant};

use log::info;

/// Per-solve timing and work counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolverProfiler {
    pub schur_vector_time: Duration,
    pub operator_time: Duration,
    pub projection_time: Duration,
    pub residual_time: Duration,
    pub total_time: Duration,

    pub constraint_count: usize,
    pub operator_applications: usize,
    pub projections: usize,
    pub backtracks: usize,
    pub restarts: usize,
}

impl SolverProfiler {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn report(&self) {
        let total_us = self.total_time.as_micros() as f32;
        if total_us < 1.0 {
            return;
        }

        info!(
            "solve: {} constraints, {} operator applications, {} projections, {} backtracks, {} restarts, {:.3} ms",
            self.constraint_count,
            self.operator_applications,
            self.projections,
            self.backtracks,
            self.restarts,
            self.total_time.as_secs_f32() * 1000.0
        );

        for (label, time) in [
            ("schur vector", self.schur_vector_time),
            ("operator", self.operator_time),
            ("projection", self.projection_time),
            ("residual", self.residual_time),
        ] {
            info!(
                "  {:<13} {:.3} ms ({:.1}%)",
                label,
                time.as_secs_f32() * 1000.0,
                (time.as_micros() as f32 / total_us) * 100.0
            );
        }
    }
}

/// Adds the elapsed time to `output` when dropped.
pub struct ScopedTimer<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> ScopedTimer<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for ScopedTimer<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}
