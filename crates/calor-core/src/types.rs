//! Parameter and result containers shared across the Calor workspace.

use serde::{Deserialize, Serialize};

/// Parameters controlling a relaxation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxParams {
    /// Convergence threshold on the normalised per-sweep residual.
    pub tolerance: f64,
    /// Hard cap on the number of sweeps.
    pub max_sweeps: usize,
}

impl Default for RelaxParams {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_sweeps: 100,
        }
    }
}

/// Progress of a relaxation loop, advanced once per completed sweep.
#[derive(Debug, Clone, Copy)]
pub struct IterationState {
    /// Sweeps completed so far.
    pub sweeps: usize,
    /// Team-wide residual of the most recent sweep.
    pub residual: f64,
    /// Whether the normalised residual has dropped below tolerance.
    pub converged: bool,
}

impl IterationState {
    pub fn new() -> Self {
        Self {
            sweeps: 0,
            residual: f64::INFINITY,
            converged: false,
        }
    }

    /// Record a completed sweep and re-evaluate convergence.
    ///
    /// `normalisation` is the global cell count n², so the criterion matches
    /// the single-partition reference regardless of how rows are split.
    pub fn advance(&mut self, residual: f64, normalisation: f64, tolerance: f64) {
        self.sweeps += 1;
        self.residual = residual;
        self.converged = residual / normalisation < tolerance;
    }
}

impl Default for IterationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal result of one partition's relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveReport {
    pub worker_id: usize,
    pub converged: bool,
    pub sweeps: usize,
}
