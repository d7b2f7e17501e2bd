/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// No constraints, nothing to do.
    Trivial,
    /// Best residual reached the tolerance.
    Converged,
    /// Iteration budget exhausted; the best iterate found is still committed.
    IterationLimit,
}

/// Snapshot of one pass through the main loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub iteration: usize,
    /// Residual of this iteration's candidate.
    pub residual: f64,
    /// Lowest residual seen so far, including this iteration.
    pub best_residual: f64,
    /// Step size `t = 1/L` accepted by the backtracking search.
    pub step_size: f64,
    pub backtracks: usize,
    pub restarted: bool,
}

/// Outcome of a single solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub status: SolveStatus,
    pub iterations: usize,
    pub residual: f64,
    pub restarts: usize,
    pub backtracks: usize,
    pub projections: usize,
    pub history: Vec<IterationRecord>,
}

impl SolveReport {
    pub fn trivial() -> Self {
        Self {
            status: SolveStatus::Trivial,
            iterations: 0,
            residual: 0.0,
            restarts: 0,
            backtracks: 0,
            projections: 0,
            history: Vec::new(),
        }
    }

    pub fn converged(&self) -> bool {
        matches!(self.status, SolveStatus::Trivial | SolveStatus::Converged)
    }

    pub(crate) fn record_iteration(&mut self, record: IterationRecord, keep_history: bool) {
        self.iterations = record.iteration + 1;
        self.backtracks += record.backtracks;
        if record.restarted {
            self.restarts += 1;
        }
        if keep_history {
            self.history.push(record);
        }
    }

    /// Accumulates counters from another solve, e.g. over several islands.
    pub fn merge(&mut self, other: &Self) {
        self.iterations = self.iterations.max(other.iterations);
        self.residual = self.residual.max(other.residual);
        self.restarts += other.restarts;
        self.backtracks += other.backtracks;
        self.projections += other.projections;
        if other.status == SolveStatus::IterationLimit {
            self.status = SolveStatus::IterationLimit;
        } else if self.status == SolveStatus::Trivial {
            self.status = other.status;
        }
    }
}
