//! Ethereum Virtual Machine with per-hardfork protocol schedules.
//!
//! [standard] runs transactions the way mainnet does for one fork,
//! [schedule] picks the fork active at a block and [backend] supplies the
//! world state.

#![forbid(unsafe_code)]

pub mod backend;
pub mod call_stack;
pub mod schedule;
pub mod standard;

pub use forkevm_interpreter::*;

/// How a finished substate is folded into its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeStrategy {
	/// Keep the changes and the refunds.
	Commit,
	/// Drop the changes but hand back the remaining gas.
	Revert,
	/// Drop the changes and the gas.
	Discard,
}
