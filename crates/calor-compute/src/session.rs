//! The relaxation session: partition, distribute, solve, collect.
//!
//! The coordinator doubles as worker 0, carving its own block out of the
//! grid locally while workers `1..w` each run on their own thread. Blocks
//! travel out through the configured [`HaloExchange`] strategy, all
//! partitions relax in lockstep (see [`crate::sync`]), and the interior rows
//! travel back to be reassembled in partition order. The global boundary
//! rows are never touched by a sweep, so the coordinator's retained copies
//! complete the grid.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use calor_core::field::{Field, FieldError, LocalBlock};
use calor_core::partition::{Partition, PartitionError, PartitionPlan};
use calor_core::solver::jacobi::JacobiSolver;
use calor_core::solver::SolverError;
use calor_core::types::{RelaxParams, SolveReport};
use thiserror::Error;

use crate::exchange::{exchange_for, ExchangeError, ExchangeMode};
use crate::link::{self, Message, NeighbourLinks, WorkerLink};
use crate::sync::{MemberSync, RootSync};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("worker {worker_id} terminated abnormally")]
    WorkerFailed { worker_id: usize },
}

/// Configuration of one relaxation session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub workers: usize,
    pub mode: ExchangeMode,
    pub params: RelaxParams,
}

/// Wall-clock spent in each coordinator phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimings {
    pub distribute: Duration,
    pub solve: Duration,
    pub collect: Duration,
}

impl PhaseTimings {
    /// Total time in the two communication phases.
    pub fn communication(&self) -> Duration {
        self.distribute + self.collect
    }

    pub fn total(&self) -> Duration {
        self.distribute + self.solve + self.collect
    }
}

/// Result of a completed session: the reassembled grid, one report per
/// partition ordered by worker id, and the coordinator's phase timings.
#[derive(Debug)]
pub struct SessionOutcome {
    pub field: Field,
    pub reports: Vec<SolveReport>,
    pub timings: PhaseTimings,
}

/// Everything one worker thread needs, handed over at spawn time.
struct WorkerContext {
    partition: Partition,
    cols: usize,
    mode: ExchangeMode,
    solver: JacobiSolver,
    link: WorkerLink,
    neighbours: NeighbourLinks,
    residual: Sender<f64>,
    verdict: Receiver<f64>,
}

/// Run a full relaxation session over `field`.
pub fn relax(field: Field, config: &SessionConfig) -> Result<SessionOutcome, SessionError> {
    let n = field.size();
    let plan = PartitionPlan::new(config.workers, n)?;
    let workers = plan.workers();
    let mode = config.mode;
    let solver = JacobiSolver::new(config.params.clone());
    log::debug!("relaxing a {n}x{n} grid across {workers} workers ({mode} transfers)");

    // Coordinator<->worker links, ascending by id.
    let mut coordinator_links = Vec::with_capacity(workers - 1);
    let mut worker_links = Vec::with_capacity(workers - 1);
    for worker_id in 1..workers {
        let (coordinator, worker) = link::link_pair(worker_id);
        coordinator_links.push(coordinator);
        worker_links.push(worker);
    }

    // Seam links between adjacent partitions.
    let mut neighbour_links: Vec<NeighbourLinks> =
        (0..workers).map(|_| NeighbourLinks::default()).collect();
    for seam in 1..workers {
        let (down, up) = link::seam_pair();
        neighbour_links[seam - 1].down = Some(down);
        neighbour_links[seam].up = Some(up);
    }
    let mut neighbour_links = neighbour_links.into_iter();
    let coordinator_neighbours = neighbour_links.next().unwrap_or_default();

    // Residual reduction channels, one pair per member so that a dead
    // worker is observed as a closed channel rather than a missing message.
    let mut residual_rxs = Vec::with_capacity(workers - 1);
    let mut verdict_txs = Vec::with_capacity(workers - 1);
    let mut member_channels = Vec::with_capacity(workers - 1);
    for _ in 1..workers {
        let (residual_tx, residual_rx) = mpsc::channel();
        let (verdict_tx, verdict_rx) = mpsc::channel();
        residual_rxs.push(residual_rx);
        verdict_txs.push(verdict_tx);
        member_channels.push((residual_tx, verdict_rx));
    }

    let (field, reports, timings) = thread::scope(|scope| {
        // The links must be owned by the scope body: an early error return
        // has to drop them so that workers blocked on a receive observe a
        // disconnect instead of waiting forever.
        let coordinator_links = coordinator_links;

        let mut handles = Vec::with_capacity(workers.saturating_sub(1));
        for ((worker_link, neighbours), (residual, verdict)) in worker_links
            .into_iter()
            .zip(neighbour_links)
            .zip(member_channels)
        {
            let context = WorkerContext {
                partition: *plan.get(worker_link.worker_id),
                cols: n,
                mode,
                solver: solver.clone(),
                link: worker_link,
                neighbours,
                residual,
                verdict,
            };
            let worker_id = context.partition.worker_id;
            handles.push((worker_id, scope.spawn(move || worker_main(context))));
        }

        let exchange = exchange_for(mode);
        let mut field = field;

        let started = Instant::now();
        exchange.distribute(&field, &plan, &coordinator_links)?;
        let own = *plan.get(0);
        let mut block =
            LocalBlock::from_rows(field.segment(own.lower, own.upper), own.row_count(), n)?;
        let distribute = started.elapsed();

        let started = Instant::now();
        let mut sync = RootSync::new(coordinator_neighbours, residual_rxs, verdict_txs);
        let state = solver.run(&mut block, &mut sync)?;
        let solve = started.elapsed();

        let started = Instant::now();
        field.write_rows(own.lower + 1, &block.interior_values())?;
        exchange.collect(&mut field, &plan, &coordinator_links)?;
        let collect = started.elapsed();

        let mut reports = vec![SolveReport {
            worker_id: 0,
            converged: state.converged,
            sweeps: state.sweeps,
        }];
        for link in &coordinator_links {
            reports.push(link::recv_report(&link.rx)?);
        }

        for (worker_id, handle) in handles {
            match handle.join() {
                Ok(Ok(())) => {}
                Ok(Err(error)) => return Err(error),
                Err(_) => return Err(SessionError::WorkerFailed { worker_id }),
            }
        }

        reports.sort_by_key(|report| report.worker_id);
        Ok((
            field,
            reports,
            PhaseTimings {
                distribute,
                solve,
                collect,
            },
        ))
    })?;

    log::debug!(
        "session finished after {} sweeps (converged: {})",
        reports[0].sweeps,
        reports[0].converged
    );
    Ok(SessionOutcome {
        field,
        reports,
        timings,
    })
}

fn worker_main(context: WorkerContext) -> Result<(), SessionError> {
    let WorkerContext {
        partition,
        cols,
        mode,
        solver,
        link,
        neighbours,
        residual,
        verdict,
    } = context;

    let exchange = exchange_for(mode);
    let mut block = exchange.receive_block(&partition, cols, &link)?;
    let mut sync = MemberSync::new(neighbours, residual, verdict);
    let state = solver.run(&mut block, &mut sync)?;
    exchange.submit_interior(&block, &link)?;
    link::send(
        &link.tx,
        Message::Report(SolveReport {
            worker_id: partition.worker_id,
            converged: state.converged,
            sweeps: state.sweeps,
        }),
    )?;
    Ok(())
}
