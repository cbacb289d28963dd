//! World state access for a running transaction.
//!
//! The executor never writes to the world state directly. Every transaction
//! runs against an [OverlayedBackend] whose substates follow the frame tree;
//! once the transaction is done, the overlay is turned into an
//! [OverlayedChangeSet] and applied to a [MutableWorldState].

mod in_memory;
mod overlayed;

pub use self::in_memory::{BlockEnvironment, BlockHashLookup, InMemoryAccount, InMemoryWorldState};
pub use self::overlayed::{AccountChange, OverlayedBackend, OverlayedChangeSet};

use auto_impl::auto_impl;
use forkevm_interpreter::ExitError;
use primitive_types::{H160, H256, U256};

use crate::MergeStrategy;

/// Account fields besides storage.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Account {
	pub balance: U256,
	pub nonce: U256,
	pub code: Vec<u8>,
}

/// Read view of the world state as of the start of a transaction.
#[auto_impl(&, Box, std::sync::Arc)]
pub trait WorldState {
	/// The account at `address`, `None` if it does not exist.
	fn account(&self, address: H160) -> Option<Account>;
	/// Storage value, zero if never written.
	fn storage(&self, address: H160, index: H256) -> H256;
}

/// World state that a finished transaction can be committed to.
pub trait MutableWorldState: WorldState {
	fn apply(&mut self, changeset: OverlayedChangeSet);
	/// Digest of the whole state, recorded in pre-Byzantium receipts.
	fn state_root(&self) -> H256;
}

/// Nested transactional scopes over a backend. Each call or create frame
/// runs in its own substate.
pub trait TransactionalBackend {
	fn push_substate(&mut self);
	fn pop_substate(&mut self, strategy: MergeStrategy) -> Result<(), ExitError>;
}
