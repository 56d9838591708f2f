//! Relaxation solver and the synchronisation seam it runs against.
//!
//! The solver itself is sequential and partition-local. Everything a sweep
//! needs from the rest of the team (refreshed halo rows, the team-wide
//! residual) arrives through [`SweepSync`], so the same kernel drives a
//! single-partition run and a full worker team without knowing which it is.

pub mod jacobi;

use thiserror::Error;

use crate::field::{FieldError, LocalBlock};

/// Errors that can occur during a relaxation run.
#[derive(Debug, Error)]
pub enum SolverError {
    /// A halo refresh or residual reduction failed underneath the solver.
    #[error("sweep synchronisation failed: {0}")]
    Sync(String),

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Per-sweep coupling between one partition and the rest of the team.
///
/// The solver calls `refresh_halos` before every sweep after the first
/// (the first sweep runs on the halos installed at distribution time), and
/// `combine_residual` after every sweep. The combined residual must be the
/// same on every partition, so that all of them take the same continue/stop
/// decision and no partition outlives its neighbours.
pub trait SweepSync {
    fn refresh_halos(&mut self, block: &mut LocalBlock) -> Result<(), SolverError>;

    fn combine_residual(&mut self, local: f64) -> Result<f64, SolverError>;
}

/// Synchronisation for a single-partition run: there are no neighbours, and
/// the local residual already covers the whole grid.
pub struct SoloSync;

impl SweepSync for SoloSync {
    fn refresh_halos(&mut self, _block: &mut LocalBlock) -> Result<(), SolverError> {
        Ok(())
    }

    fn combine_residual(&mut self, local: f64) -> Result<f64, SolverError> {
        Ok(local)
    }
}
