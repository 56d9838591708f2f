//! Per-sweep lockstep across the worker team.
//!
//! Between sweeps, seam neighbours swap boundary interior rows so no
//! partition ever relaxes against stale halos. After every sweep, each
//! partition's residual is summed at the coordinator and the total broadcast
//! back; every partition therefore sees the same number and takes the same
//! continue/stop decision on the same sweep.
//!
//! The reduction uses one channel per member in both directions. A member
//! that dies closes its channels, which surfaces at the coordinator as an
//! error instead of a hang, and the coordinator's exit in turn releases
//! every remaining member.

use std::sync::mpsc::{Receiver, Sender};

use calor_core::field::LocalBlock;
use calor_core::solver::{SolverError, SweepSync};

use crate::link::NeighbourLinks;

fn sync_error(error: impl std::fmt::Display) -> SolverError {
    SolverError::Sync(error.to_string())
}

/// Coordinator-side sweep synchronisation: reduces the team's residuals and
/// broadcasts the total.
pub struct RootSync {
    neighbours: NeighbourLinks,
    residuals: Vec<Receiver<f64>>,
    verdicts: Vec<Sender<f64>>,
}

impl RootSync {
    pub fn new(
        neighbours: NeighbourLinks,
        residuals: Vec<Receiver<f64>>,
        verdicts: Vec<Sender<f64>>,
    ) -> Self {
        Self {
            neighbours,
            residuals,
            verdicts,
        }
    }
}

impl SweepSync for RootSync {
    fn refresh_halos(&mut self, block: &mut LocalBlock) -> Result<(), SolverError> {
        self.neighbours.exchange(block).map_err(sync_error)
    }

    fn combine_residual(&mut self, local: f64) -> Result<f64, SolverError> {
        let mut total = local;
        for residual in &self.residuals {
            total += residual.recv().map_err(sync_error)?;
        }
        for verdict in &self.verdicts {
            verdict.send(total).map_err(sync_error)?;
        }
        Ok(total)
    }
}

/// Worker-side sweep synchronisation: reports the local residual and adopts
/// the coordinator's total.
pub struct MemberSync {
    neighbours: NeighbourLinks,
    residual: Sender<f64>,
    verdict: Receiver<f64>,
}

impl MemberSync {
    pub fn new(neighbours: NeighbourLinks, residual: Sender<f64>, verdict: Receiver<f64>) -> Self {
        Self {
            neighbours,
            residual,
            verdict,
        }
    }
}

impl SweepSync for MemberSync {
    fn refresh_halos(&mut self, block: &mut LocalBlock) -> Result<(), SolverError> {
        self.neighbours.exchange(block).map_err(sync_error)
    }

    fn combine_residual(&mut self, local: f64) -> Result<f64, SolverError> {
        self.residual.send(local).map_err(sync_error)?;
        self.verdict.recv().map_err(sync_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::NeighbourLinks;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_residuals_reduce_to_the_same_total_everywhere() {
        let (residual_tx, residual_rx) = mpsc::channel();
        let (verdict_tx, verdict_rx) = mpsc::channel();
        let mut root = RootSync::new(NeighbourLinks::default(), vec![residual_rx], vec![verdict_tx]);
        let mut member = MemberSync::new(NeighbourLinks::default(), residual_tx, verdict_rx);

        thread::scope(|scope| {
            let root_total = scope.spawn(move || root.combine_residual(1.5).expect("reduce"));
            let member_total = member.combine_residual(2.25).expect("reduce");
            assert_eq!(member_total, 3.75);
            assert_eq!(root_total.join().expect("root thread"), 3.75);
        });
    }

    #[test]
    fn test_dead_member_surfaces_as_an_error_not_a_hang() {
        let (residual_tx, residual_rx) = mpsc::channel::<f64>();
        let (verdict_tx, _verdict_rx) = mpsc::channel();
        drop(residual_tx);
        let mut root = RootSync::new(NeighbourLinks::default(), vec![residual_rx], vec![verdict_tx]);
        assert!(root.combine_residual(1.0).is_err());
    }
}
