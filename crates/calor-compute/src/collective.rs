//! Collective strategy: scatter out, gather in, no per-transfer ordering.

use calor_core::field::{Field, LocalBlock};
use calor_core::partition::{Partition, PartitionPlan};

use crate::exchange::{ExchangeError, ExchangeMode, HaloExchange};
use crate::link::{self, CoordinatorLink, Message, WorkerLink};

/// Scatter/gather analogue of the point-to-point protocol: distribution
/// enqueues every worker's block in a single pass with no acknowledgements,
/// and collection receives and validates every interior payload before any
/// row lands in the grid.
pub struct CollectiveExchange;

impl HaloExchange for CollectiveExchange {
    fn mode(&self) -> ExchangeMode {
        ExchangeMode::Collective
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
        let mut gathered = Vec::with_capacity(links.len());
        for link in links {
            let partition = plan.get(link.worker_id);
            let expected = partition.interior_row_count() * plan.n();
            gathered.push((partition.lower + 1, link::recv_payload(&link.rx, expected)?));
        }
        for (first_row, values) in gathered {
            grid.write_rows(first_row, &values)?;
        }
        Ok(())
    }
}
