//! # Calor Core
//!
//! The numerical backbone of the Calor workspace. This crate implements the
//! pieces of a distributed steady-state relaxation that are pure computation:
//! how a grid's rows are split across a worker team, how each worker stores
//! its block, and how a block is relaxed to convergence.
//!
//! ## Architecture
//!
//! The solver is deliberately ignorant of how partitions talk to each other.
//! It runs against the [`solver::SweepSync`] trait, which supplies halo rows
//! between sweeps and turns a partition-local residual into the team-wide
//! one. The execution engine in `calor-compute` provides the channel-backed
//! implementations; [`solver::SoloSync`] covers the single-partition case.
//!
//! ## Modules
//!
//! - [`types`] — Parameter and result containers.
//! - [`partition`] — Row-block decomposition across a worker team.
//! - [`field`] — Owned storage for the full grid and per-worker blocks.
//! - [`solver`] — The Jacobi relaxation kernel and its synchronisation seam.

pub mod field;
pub mod partition;
pub mod solver;
pub mod types;
