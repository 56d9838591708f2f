//! Point-to-point strategy: ordered, acknowledged, one worker at a time.

use calor_core::field::{Field, LocalBlock};
use calor_core::partition::{Partition, PartitionPlan};

use crate::exchange::{ExchangeError, ExchangeMode, HaloExchange};
use crate::link::{self, CoordinatorLink, Message, WorkerLink};

/// Point-to-point protocol: the coordinator walks worker ids in increasing
/// order and completes each transfer before starting the next.
pub struct PairwiseExchange;

impl HaloExchange for PairwiseExchange {
    fn mode(&self) -> ExchangeMode {
        ExchangeMode::Pairwise
    }

    fn distribute(
        &self,
        grid: &Field,
        plan: &PartitionPlan,
        links: &[CoordinatorLink],
    ) -> Result<(), ExchangeError> {
        for link in links {
            let partition = plan.get(link.worker_id);
            link::send(
                &link.tx,
                Message::Payload(grid.segment(partition.lower, partition.upper)),
            )?;
            // The transfer is complete only once the worker confirms receipt.
            link::recv_ack(&link.rx)?;
        }
        Ok(())
    }

    fn receive_block(
        &self,
        partition: &Partition,
        cols: usize,
        link: &WorkerLink,
    ) -> Result<LocalBlock, ExchangeError> {
        let values = link::recv_payload(&link.rx, partition.element_count(cols))?;
        link::send(&link.tx, Message::Ack)?;
        Ok(LocalBlock::from_rows(values, partition.row_count(), cols)?)
    }

    fn submit_interior(&self, block: &LocalBlock, link: &WorkerLink) -> Result<(), ExchangeError> {
        link::send(&link.tx, Message::Payload(block.interior_values()))
    }

    fn collect(
        &self,
        grid: &mut Field,
        plan: &PartitionPlan,
        links: &[CoordinatorLink],
    ) -> Result<(), ExchangeError> {
        for link in links {
            let partition = plan.get(link.worker_id);
            let expected = partition.interior_row_count() * plan.n();
            let values = link::recv_payload(&link.rx, expected)?;
            grid.write_rows(partition.lower + 1, &values)?;
        }
        Ok(())
    }
}
