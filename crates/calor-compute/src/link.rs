//! Channel plumbing between the coordinator, the workers, and seam
//! neighbours.
//!
//! Block payloads, interior rows, and terminal reports travel on one
//! coordinator<->worker link per worker; single boundary rows travel on
//! dedicated seam links between adjacent partitions. Payload sizes are
//! validated on receipt; a wrong element count is fatal.

use std::sync::mpsc::{self, Receiver, Sender};

use calor_core::field::LocalBlock;
use calor_core::types::SolveReport;

use crate::exchange::ExchangeError;

/// A message on a coordinator<->worker link.
#[derive(Debug)]
pub enum Message {
    /// Row-major cell values: a whole block outbound, interior rows inbound.
    Payload(Vec<f32>),
    /// Receipt confirmation, used by the pairwise strategy.
    Ack,
    /// A worker's terminal solve report.
    Report(SolveReport),
}

/// Coordinator-side endpoint of one worker's link.
#[derive(Debug)]
pub struct CoordinatorLink {
    pub worker_id: usize,
    pub tx: Sender<Message>,
    pub rx: Receiver<Message>,
}

/// Worker-side endpoint of the same link.
#[derive(Debug)]
pub struct WorkerLink {
    pub worker_id: usize,
    pub tx: Sender<Message>,
    pub rx: Receiver<Message>,
}

/// Create the two endpoints of a coordinator<->worker link.
pub fn link_pair(worker_id: usize) -> (CoordinatorLink, WorkerLink) {
    let (to_worker, from_coordinator) = mpsc::channel();
    let (to_coordinator, from_worker) = mpsc::channel();
    (
        CoordinatorLink {
            worker_id,
            tx: to_worker,
            rx: from_worker,
        },
        WorkerLink {
            worker_id,
            tx: to_coordinator,
            rx: from_coordinator,
        },
    )
}

pub fn send(tx: &Sender<Message>, message: Message) -> Result<(), ExchangeError> {
    tx.send(message).map_err(|_| ExchangeError::Disconnected)
}

/// Receive a payload of exactly `expected` elements.
pub fn recv_payload(rx: &Receiver<Message>, expected: usize) -> Result<Vec<f32>, ExchangeError> {
    match rx.recv() {
        Ok(Message::Payload(values)) if values.len() == expected => Ok(values),
        Ok(Message::Payload(values)) => Err(ExchangeError::SizeMismatch {
            expected,
            received: values.len(),
        }),
        Ok(_) => Err(ExchangeError::UnexpectedMessage { expected: "payload" }),
        Err(_) => Err(ExchangeError::Disconnected),
    }
}

pub fn recv_ack(rx: &Receiver<Message>) -> Result<(), ExchangeError> {
    match rx.recv() {
        Ok(Message::Ack) => Ok(()),
        Ok(_) => Err(ExchangeError::UnexpectedMessage { expected: "ack" }),
        Err(_) => Err(ExchangeError::Disconnected),
    }
}

pub fn recv_report(rx: &Receiver<Message>) -> Result<SolveReport, ExchangeError> {
    match rx.recv() {
        Ok(Message::Report(report)) => Ok(report),
        Ok(_) => Err(ExchangeError::UnexpectedMessage { expected: "report" }),
        Err(_) => Err(ExchangeError::Disconnected),
    }
}

/// One partition's end of a seam: a sender towards the neighbour and a
/// receiver for the neighbour's boundary row.
#[derive(Debug)]
pub struct RowLink {
    pub tx: Sender<Vec<f32>>,
    pub rx: Receiver<Vec<f32>>,
}

/// Create both ends of a seam: the upper partition's downward link and the
/// lower partition's upward link.
pub fn seam_pair() -> (RowLink, RowLink) {
    let (down_tx, down_rx) = mpsc::channel();
    let (up_tx, up_rx) = mpsc::channel();
    (
        RowLink {
            tx: down_tx,
            rx: up_rx,
        },
        RowLink {
            tx: up_tx,
            rx: down_rx,
        },
    )
}

/// A partition's links to its seam neighbours.
#[derive(Debug, Default)]
pub struct NeighbourLinks {
    /// Towards `worker_id - 1`, if any.
    pub up: Option<RowLink>,
    /// Towards `worker_id + 1`, if any.
    pub down: Option<RowLink>,
}

impl NeighbourLinks {
    /// Swap boundary interior rows with both neighbours and install the
    /// received rows as halos: local row 1 goes up and lands as the upper
    /// neighbour's last row, local row `rows - 2` goes down and lands as the
    /// lower neighbour's row 0. Both sends complete before either receive,
    /// so adjacent partitions cannot deadlock.
    pub fn exchange(&self, block: &mut LocalBlock) -> Result<(), ExchangeError> {
        let rows = block.rows();
        let cols = block.cols();

        if let Some(up) = &self.up {
            up.tx
                .send(block.row_values(1))
                .map_err(|_| ExchangeError::Disconnected)?;
        }
        if let Some(down) = &self.down {
            down.tx
                .send(block.row_values(rows - 2))
                .map_err(|_| ExchangeError::Disconnected)?;
        }

        if let Some(up) = &self.up {
            let row = up.rx.recv().map_err(|_| ExchangeError::Disconnected)?;
            if row.len() != cols {
                return Err(ExchangeError::SizeMismatch {
                    expected: cols,
                    received: row.len(),
                });
            }
            block.write_row(0, &row)?;
        }
        if let Some(down) = &self.down {
            let row = down.rx.recv().map_err(|_| ExchangeError::Disconnected)?;
            if row.len() != cols {
                return Err(ExchangeError::SizeMismatch {
                    expected: cols,
                    received: row.len(),
                });
            }
            block.write_row(rows - 1, &row)?;
        }
        Ok(())
    }
}
