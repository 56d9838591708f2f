//! # Calor Compute
//!
//! The parallel execution engine of the Calor workspace. One thread runs per
//! row partition; nothing is shared between them, and every row that crosses
//! a partition boundary does so as a message.
//!
//! The [`exchange::HaloExchange`] trait isolates the session from how blocks
//! travel between the coordinator and the workers:
//!
//! | Strategy | Mode | Transfer discipline |
//! |----------|------|---------------------|
//! | [`pairwise::PairwiseExchange`] | `0` | ascending worker id, acknowledged, one at a time |
//! | [`collective::CollectiveExchange`] | `1` | scatter out in one pass, gather all before assembly |
//!
//! Both strategies produce identical grid content; adding a third transport
//! touches neither the session nor the solver.

pub mod collective;
pub mod exchange;
pub mod link;
pub mod pairwise;
pub mod session;
pub mod sync;

pub use exchange::{exchange_for, ExchangeError, ExchangeMode, HaloExchange};
pub use session::{relax, PhaseTimings, SessionConfig, SessionError, SessionOutcome};
