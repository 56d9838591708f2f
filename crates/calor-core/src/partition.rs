//! Row-block decomposition of the global grid across a worker team.
//!
//! Each worker takes a contiguous, inclusive range of global rows. Adjacent
//! ranges share two rows at every seam: each side's outermost row is a halo
//! mirroring the neighbour's boundary interior row. The arithmetic hands
//! every worker an even share of `floor(n / workers)` interior rows plus the
//! two halo rows, which is why grid sizes of the form `2^k + 2` split cleanly
//! across any power-of-two team (`(2^k + 2) mod 2^j = 2`).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors detected while planning a decomposition. All of them are fatal at
/// startup, before any block is allocated or any row moves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("grid size {n} is too small: relaxation needs at least a 3x3 grid")]
    GridTooSmall { n: usize },

    #[error("at least one worker is required")]
    NoWorkers,

    #[error("{workers} workers cannot each take a row block of a {n}-row grid")]
    TooManyWorkers { workers: usize, n: usize },

    #[error(
        "{n} rows over {workers} workers leave {remainder} rows unassigned; \
         sizes of the form 2^k + 2 split evenly"
    )]
    UnevenSplit {
        n: usize,
        workers: usize,
        remainder: usize,
    },

    #[error("the last of {workers} blocks would hold only {rows} rows; 3 are needed for an interior")]
    BlockTooThin { workers: usize, rows: usize },
}

/// Upper bound on rows per block: an even share plus the two halo rows.
pub fn max_rows(workers: usize, n: usize) -> usize {
    n / workers + 2
}

/// First global row of a worker's block (inclusive).
pub fn lower_index(worker_id: usize, max_rows: usize) -> usize {
    worker_id * (max_rows - 2)
}

/// Last global row of a worker's block (inclusive, clamped to the grid).
pub fn upper_index(worker_id: usize, max_rows: usize, n: usize) -> usize {
    ((worker_id + 1) * (max_rows - 2) + 1).min(n - 1)
}

/// One worker's contiguous, halo-inclusive row range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub worker_id: usize,
    /// First global row of the block, inclusive.
    pub lower: usize,
    /// Last global row of the block, inclusive.
    pub upper: usize,
}

impl Partition {
    pub fn row_count(&self) -> usize {
        self.upper - self.lower + 1
    }

    pub fn element_count(&self, cols: usize) -> usize {
        self.row_count() * cols
    }

    /// Rows returned to the coordinator after solving: the block without its
    /// first and last row.
    pub fn interior_row_count(&self) -> usize {
        self.row_count().saturating_sub(2)
    }

    pub fn has_upper_neighbour(&self) -> bool {
        self.worker_id > 0
    }

    pub fn has_lower_neighbour(&self, workers: usize) -> bool {
        self.worker_id + 1 < workers
    }
}

/// The full decomposition of an n-row grid across a worker team.
#[derive(Debug, Clone)]
pub struct PartitionPlan {
    n: usize,
    partitions: Vec<Partition>,
}

impl PartitionPlan {
    /// Plan the decomposition, rejecting shapes the row arithmetic cannot
    /// cover: the index formulas only reach row `n - 1` when
    /// `n mod workers <= 2`, and every block needs at least three rows to
    /// hold an interior row between its halos.
    pub fn new(workers: usize, n: usize) -> Result<Self, PartitionError> {
        if n < 3 {
            return Err(PartitionError::GridTooSmall { n });
        }
        if workers == 0 {
            return Err(PartitionError::NoWorkers);
        }
        let share = n / workers;
        if share == 0 {
            return Err(PartitionError::TooManyWorkers { workers, n });
        }
        let remainder = n % workers;
        if remainder > 2 {
            return Err(PartitionError::UnevenSplit {
                n,
                workers,
                remainder,
            });
        }
        // The last block absorbs the remainder and is the thinnest.
        if share + remainder < 3 {
            return Err(PartitionError::BlockTooThin {
                workers,
                rows: share + remainder,
            });
        }

        let max_rows = max_rows(workers, n);
        let partitions = (0..workers)
            .map(|worker_id| Partition {
                worker_id,
                lower: lower_index(worker_id, max_rows),
                upper: upper_index(worker_id, max_rows, n),
            })
            .collect();
        Ok(Self { n, partitions })
    }

    /// Grid dimension n.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn workers(&self) -> usize {
        self.partitions.len()
    }

    /// The partition assigned to `worker_id`. Panics if the id is outside
    /// the team.
    pub fn get(&self, worker_id: usize) -> &Partition {
        &self.partitions[worker_id]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_decomposition() {
        // 16 rows over 4 workers: an even share of 4 plus two halo rows each.
        let plan = PartitionPlan::new(4, 16).expect("valid decomposition");
        let ranges: Vec<(usize, usize)> = plan.iter().map(|p| (p.lower, p.upper)).collect();
        assert_eq!(ranges, vec![(0, 5), (4, 9), (8, 13), (12, 15)]);
    }

    #[test]
    fn test_max_rows_reserves_two_halo_rows() {
        assert_eq!(max_rows(4, 16), 6);
        assert_eq!(max_rows(1, 9), 11);
        assert_eq!(max_rows(3, 10), 5);
    }

    #[test]
    fn test_accepted_plans_cover_the_grid() {
        for n in 3..=48 {
            for workers in 1..=16 {
                let plan = match PartitionPlan::new(workers, n) {
                    Ok(plan) => plan,
                    Err(_) => continue,
                };
                let partitions: Vec<&Partition> = plan.iter().collect();
                assert_eq!(partitions[0].lower, 0);
                assert_eq!(partitions[partitions.len() - 1].upper, n - 1);
                for p in &partitions {
                    assert!(p.upper <= n - 1);
                    assert!(p.row_count() >= 3);
                }
                // Every seam shares exactly the two rows that are one side's
                // halo and the other side's boundary interior row.
                for pair in partitions.windows(2) {
                    assert_eq!(pair[0].upper, pair[1].lower + 1);
                }
                // The halo-free row ranges tile [0, n-1] exactly.
                let mut next_row = 0;
                for p in &partitions {
                    let from = if p.has_upper_neighbour() { p.lower + 1 } else { p.lower };
                    let to = if p.has_lower_neighbour(partitions.len()) {
                        p.upper - 1
                    } else {
                        p.upper
                    };
                    assert_eq!(from, next_row, "gap before worker {} (n={n}, w={workers})", p.worker_id);
                    next_row = to + 1;
                }
                assert_eq!(next_row, n);
            }
        }
    }

    #[test]
    fn test_power_of_two_plus_two_sizes_split_across_power_of_two_teams() {
        for workers in [1, 2, 4, 8, 16] {
            assert!(PartitionPlan::new(workers, 18).is_ok());
            assert!(PartitionPlan::new(workers, 1026).is_ok());
        }
    }

    #[test]
    fn test_rejects_undersized_grid() {
        assert_eq!(
            PartitionPlan::new(1, 2).unwrap_err(),
            PartitionError::GridTooSmall { n: 2 }
        );
    }

    #[test]
    fn test_rejects_empty_team() {
        assert_eq!(PartitionPlan::new(0, 8).unwrap_err(), PartitionError::NoWorkers);
    }

    #[test]
    fn test_rejects_more_workers_than_rows() {
        assert_eq!(
            PartitionPlan::new(4, 3).unwrap_err(),
            PartitionError::TooManyWorkers { workers: 4, n: 3 }
        );
    }

    #[test]
    fn test_rejects_uneven_remainder() {
        assert_eq!(
            PartitionPlan::new(4, 11).unwrap_err(),
            PartitionError::UnevenSplit {
                n: 11,
                workers: 4,
                remainder: 3
            }
        );
    }

    #[test]
    fn test_rejects_thin_tail_block() {
        assert_eq!(
            PartitionPlan::new(2, 4).unwrap_err(),
            PartitionError::BlockTooThin { workers: 2, rows: 2 }
        );
    }
}
