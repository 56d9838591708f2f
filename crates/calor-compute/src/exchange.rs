//! Halo-exchange strategy abstraction.
//!
//! Both strategies move the same rows to the same workers: whole blocks out
//! on distribution, interior rows back on collection. They differ only in
//! transfer ordering and acknowledgement, and are selected once at
//! configuration time.

use std::fmt;
use std::str::FromStr;

use calor_core::field::{Field, FieldError, LocalBlock};
use calor_core::partition::{Partition, PartitionPlan};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collective::CollectiveExchange;
use crate::link::{CoordinatorLink, WorkerLink};
use crate::pairwise::PairwiseExchange;

/// A failed transfer. All of these are fatal: the transport is assumed
/// reliable, so nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("element count mismatch: expected {expected}, received {received}")]
    SizeMismatch { expected: usize, received: usize },

    #[error("unexpected message where a {expected} was due")]
    UnexpectedMessage { expected: &'static str },

    #[error("link closed mid-transfer")]
    Disconnected,

    #[error(transparent)]
    Storage(#[from] FieldError),
}

/// Which communication strategy moves blocks between the coordinator and
/// the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeMode {
    Pairwise,
    Collective,
}

impl ExchangeMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Pairwise => "pairwise",
            Self::Collective => "collective",
        }
    }
}

impl fmt::Display for ExchangeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExchangeMode {
    type Err = String;

    /// Accepts the numeric mode switches (`0`, `1`) as well as the strategy
    /// names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "pairwise" => Ok(Self::Pairwise),
            "1" | "collective" => Ok(Self::Collective),
            other => Err(format!(
                "unknown communication mode '{other}' (expected 0|pairwise or 1|collective)"
            )),
        }
    }
}

/// Moves row blocks out to the workers and interior rows back.
///
/// The coordinator itself holds partition 0, so links cover workers
/// `1..workers` in ascending id order. Implementations must produce
/// identical grid content for identical input.
pub trait HaloExchange: Send + Sync {
    fn mode(&self) -> ExchangeMode;

    /// Coordinator side: send every linked worker its block rows.
    fn distribute(
        &self,
        grid: &Field,
        plan: &PartitionPlan,
        links: &[CoordinatorLink],
    ) -> Result<(), ExchangeError>;

    /// Worker side: receive this partition's block.
    fn receive_block(
        &self,
        partition: &Partition,
        cols: usize,
        link: &WorkerLink,
    ) -> Result<LocalBlock, ExchangeError>;

    /// Worker side: return the solved interior rows.
    fn submit_interior(&self, block: &LocalBlock, link: &WorkerLink) -> Result<(), ExchangeError>;

    /// Coordinator side: write every linked worker's interior rows back into
    /// the grid, halo rows excluded.
    fn collect(
        &self,
        grid: &mut Field,
        plan: &PartitionPlan,
        links: &[CoordinatorLink],
    ) -> Result<(), ExchangeError>;
}

/// Select the strategy once at configuration time.
pub fn exchange_for(mode: ExchangeMode) -> Box<dyn HaloExchange> {
    match mode {
        ExchangeMode::Pairwise => Box::new(PairwiseExchange),
        ExchangeMode::Collective => Box::new(CollectiveExchange),
    }
}
