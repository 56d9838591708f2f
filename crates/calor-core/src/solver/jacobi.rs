//! Double-buffered Jacobi relaxation over one row block.

use super::{SolverError, SweepSync};
use crate::field::LocalBlock;
use crate::types::{IterationState, RelaxParams};

/// Jacobi relaxation: every interior cell moves to
/// `0.2 * (self + left + right + above + below)`, reading only values from
/// the start of the sweep.
#[derive(Debug, Clone, Default)]
pub struct JacobiSolver {
    pub params: RelaxParams,
}

impl JacobiSolver {
    pub fn new(params: RelaxParams) -> Self {
        Self { params }
    }

    /// Relax `block` until the normalised residual drops below tolerance or
    /// the sweep cap is reached. Halo rows are refreshed through `sync`
    /// between sweeps, and the convergence decision is taken on the combined
    /// residual, so every partition of a team stops on the same sweep.
    ///
    /// Reaching the cap is not an error; it is reported through the returned
    /// state's `converged` flag.
    pub fn run(
        &self,
        block: &mut LocalBlock,
        sync: &mut dyn SweepSync,
    ) -> Result<IterationState, SolverError> {
        let cols = block.cols();
        let mut next = LocalBlock::zeroed(block.rows(), cols)?;
        let normalisation = (cols * cols) as f64;
        let mut state = IterationState::new();

        while state.sweeps < self.params.max_sweeps && !state.converged {
            if state.sweeps > 0 {
                sync.refresh_halos(block)?;
            }
            let local = sweep(block, &mut next);
            let total = sync.combine_residual(local)?;
            state.advance(total, normalisation, self.params.tolerance);
        }
        Ok(state)
    }
}

/// One Jacobi sweep from `current` into `next`, returning the accumulated
/// absolute change over the interior. Edge rows and columns carry over
/// unchanged; the buffers are swapped before returning so `current` always
/// holds the freshest values.
fn sweep(current: &mut LocalBlock, next: &mut LocalBlock) -> f64 {
    let rows = current.rows();
    let cols = current.cols();
    next.copy_from(current);

    let mut residual = 0.0;
    for row in 1..rows.saturating_sub(1) {
        for col in 1..cols - 1 {
            let old = current.at(row, col);
            let new = 0.2
                * (old
                    + current.at(row, col - 1)
                    + current.at(row, col + 1)
                    + current.at(row - 1, col)
                    + current.at(row + 1, col));
            next.set(row, col, new);
            residual += f64::from((new - old).abs());
        }
    }
    current.swap_cells(next);
    residual
}
