use std::collections::{BTreeMap, BTreeSet};

use forkevm_interpreter::{
	ExceptionalHaltReason, ExitError, ExitFatal, Log, RuntimeBackend, RuntimeBaseBackend,
	RuntimeEnvironment,
};
use primitive_types::{H160, H256, U256};

use super::{TransactionalBackend, WorldState};
use crate::MergeStrategy;

// Touching the RIPEMD-160 precompile survives a revert of the touching frame.
// Mainnet kept this behaviour after the Spurious Dragon state-clearing
// incident, so it is part of consensus.
const RIPEMD: H160 = forkevm_precompile::address(3);

/// Pending changes to one account. Unset fields fall through to the layer
/// below.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountChange {
	pub balance: Option<U256>,
	pub nonce: Option<U256>,
	pub code: Option<Vec<u8>>,
	/// Storage as of the layer below is wiped.
	pub reset_storage: bool,
	pub deleted: bool,
}

impl AccountChange {
	fn materialised(&self) -> bool {
		self.balance.is_some() || self.nonce.is_some() || self.code.is_some()
	}

	fn absorb(&mut self, newer: AccountChange) {
		self.balance = newer.balance.or(self.balance);
		self.nonce = newer.nonce.or(self.nonce);
		if newer.code.is_some() {
			self.code = newer.code;
		}
		self.reset_storage |= newer.reset_storage;
		self.deleted |= newer.deleted;
	}
}

/// Everything a transaction changed, flattened.
#[derive(Clone, Debug, Default)]
pub struct OverlayedChangeSet {
	pub logs: Vec<Log>,
	pub accounts: BTreeMap<H160, AccountChange>,
	pub storage: BTreeMap<(H160, H256), H256>,
	pub touched: BTreeSet<H160>,
}

impl OverlayedChangeSet {
	fn wipe_storage(&mut self, address: H160) {
		self.storage.retain(|(owner, _), _| *owner != address);
	}

	/// Fold the changes of a committed inner layer into this one.
	fn absorb(&mut self, newer: OverlayedChangeSet) {
		for (address, change) in newer.accounts {
			if change.reset_storage {
				self.wipe_storage(address);
			}
			self.accounts.entry(address).or_default().absorb(change);
		}
		self.storage.extend(newer.storage);
		self.logs.extend(newer.logs);
		self.touched.extend(newer.touched);
	}
}

/// Copy-on-write view over a world state. Each frame gets a layer of its
/// own on top of the transaction's root layer.
pub struct OverlayedBackend<W, E> {
	world: W,
	environment: E,
	layers: Vec<OverlayedChangeSet>,
	touched_ripemd: bool,
}

impl<W, E> OverlayedBackend<W, E> {
	pub fn new(world: W, environment: E) -> Self {
		Self {
			world,
			environment,
			layers: vec![OverlayedChangeSet::default()],
			touched_ripemd: false,
		}
	}

	/// Accounts touched so far by committed frames.
	pub fn touched(&self) -> BTreeSet<H160> {
		let mut touched: BTreeSet<H160> = self
			.layers
			.iter()
			.flat_map(|layer| layer.touched.iter().copied())
			.collect();
		if self.touched_ripemd {
			touched.insert(RIPEMD);
		}
		touched
	}

	pub fn environment(&self) -> &E {
		&self.environment
	}

	/// Give back the world state and the changes of every layer still open.
	pub fn deconstruct(self) -> (W, OverlayedChangeSet) {
		let mut layers = self.layers.into_iter();
		let mut changes = layers.next().unwrap_or_default();
		for layer in layers {
			changes.absorb(layer);
		}
		if self.touched_ripemd {
			changes.touched.insert(RIPEMD);
		}

		(self.world, changes)
	}

	/// Newest change recorded for `address` that `field` has an answer for.
	fn find<T>(&self, address: H160, field: impl Fn(&AccountChange) -> Option<T>) -> Option<T> {
		self.layers
			.iter()
			.rev()
			.filter_map(|layer| layer.accounts.get(&address))
			.find_map(field)
	}

	fn top(&mut self) -> &mut OverlayedChangeSet {
		let last = self.layers.len() - 1;
		&mut self.layers[last]
	}

	fn change(&mut self, address: H160) -> &mut AccountChange {
		self.top().accounts.entry(address).or_default()
	}
}

impl<W, E: RuntimeEnvironment> RuntimeEnvironment for OverlayedBackend<W, E> {
	fn block_hash(&self, number: U256) -> H256 {
		self.environment.block_hash(number)
	}

	fn block_number(&self) -> U256 {
		self.environment.block_number()
	}

	fn block_coinbase(&self) -> H160 {
		self.environment.block_coinbase()
	}

	fn block_timestamp(&self) -> U256 {
		self.environment.block_timestamp()
	}

	fn block_difficulty(&self) -> U256 {
		self.environment.block_difficulty()
	}

	fn block_gas_limit(&self) -> U256 {
		self.environment.block_gas_limit()
	}

	fn chain_id(&self) -> U256 {
		self.environment.chain_id()
	}
}

impl<W: WorldState, E> RuntimeBaseBackend for OverlayedBackend<W, E> {
	fn balance(&self, address: H160) -> U256 {
		self.find(address, |change| change.balance)
			.or_else(|| self.world.account(address).map(|account| account.balance))
			.unwrap_or_default()
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.find(address, |change| change.code.clone())
			.or_else(|| self.world.account(address).map(|account| account.code))
			.unwrap_or_default()
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		for layer in self.layers.iter().rev() {
			if let Some(value) = layer.storage.get(&(address, index)) {
				return *value;
			}
			if layer.accounts.get(&address).map_or(false, |c| c.reset_storage) {
				return H256::zero();
			}
		}
		self.world.storage(address, index)
	}

	fn exists(&self, address: H160) -> bool {
		let materialised = self.find(address, |change| change.materialised().then_some(()));
		materialised.is_some() || self.world.account(address).is_some()
	}

	fn nonce(&self, address: H160) -> U256 {
		self.find(address, |change| change.nonce)
			.or_else(|| self.world.account(address).map(|account| account.nonce))
			.unwrap_or_default()
	}
}

impl<W: WorldState, E> RuntimeBackend for OverlayedBackend<W, E> {
	fn original_storage(&self, address: H160, index: H256) -> H256 {
		if self
			.find(address, |change| change.reset_storage.then_some(()))
			.is_some()
		{
			H256::zero()
		} else {
			self.world.storage(address, index)
		}
	}

	fn deleted(&self, address: H160) -> bool {
		self.find(address, |change| change.deleted.then_some(()))
			.is_some()
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.top().storage.insert((address, index), value);
		Ok(())
	}

	fn log(&mut self, log: Log) -> Result<(), ExitError> {
		self.top().logs.push(log);
		Ok(())
	}

	fn mark_delete(&mut self, address: H160) {
		self.change(address).deleted = true;
	}

	fn touch(&mut self, address: H160) {
		if address == RIPEMD {
			self.touched_ripemd = true;
		}
		if !self.exists(address) {
			self.change(address).balance = Some(U256::zero());
		}
		self.top().touched.insert(address);
	}

	fn reset_storage(&mut self, address: H160) {
		let top = self.top();
		top.wipe_storage(address);
		top.accounts.entry(address).or_default().reset_storage = true;
	}

	fn set_code(&mut self, address: H160, code: Vec<u8>) -> Result<(), ExitError> {
		self.change(address).code = Some(code);
		Ok(())
	}

	fn reset_balance(&mut self, address: H160) {
		self.change(address).balance = Some(U256::zero());
	}

	fn deposit(&mut self, target: H160, value: U256) {
		if value.is_zero() {
			return;
		}

		let balance = self.balance(target).saturating_add(value);
		self.change(target).balance = Some(balance);
	}

	fn withdrawal(&mut self, source: H160, value: U256) -> Result<(), ExitError> {
		if value.is_zero() {
			return Ok(());
		}

		let balance = self
			.balance(source)
			.checked_sub(value)
			.ok_or(ExceptionalHaltReason::InsufficientBalance)?;
		self.change(source).balance = Some(balance);
		Ok(())
	}

	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError> {
		let nonce = self.nonce(address);
		if nonce >= U256::from(u64::MAX) {
			return Err(ExceptionalHaltReason::NonceOverflow.into());
		}
		self.change(address).nonce = Some(nonce + U256::one());
		Ok(())
	}
}

impl<W: WorldState, E> TransactionalBackend for OverlayedBackend<W, E> {
	fn push_substate(&mut self) {
		self.layers.push(OverlayedChangeSet::default());
	}

	fn pop_substate(&mut self, strategy: MergeStrategy) -> Result<(), ExitError> {
		if self.layers.len() < 2 {
			return Err(ExitFatal::Other("pop of the root substate".into()).into());
		}
		let child = self.layers.pop().unwrap_or_default();

		if strategy == MergeStrategy::Commit {
			self.top().absorb(child);
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::{Account, InMemoryAccount, InMemoryWorldState};

	fn alice() -> H160 {
		H160::repeat_byte(1)
	}

	fn key() -> H256 {
		H256::from_low_u64_be(1)
	}

	fn world() -> InMemoryWorldState {
		let mut world = InMemoryWorldState::default();
		world.accounts.insert(
			alice(),
			InMemoryAccount {
				balance: U256::from(100),
				storage: [(key(), H256::from_low_u64_be(7))].into_iter().collect(),
				..Default::default()
			},
		);
		world
	}

	#[test]
	fn reverted_substates_leave_no_trace() {
		let world = world();
		let mut backend = OverlayedBackend::new(&world, ());
		let bob = H160::repeat_byte(2);

		backend.push_substate();
		backend.withdrawal(alice(), U256::from(40)).unwrap();
		backend.deposit(bob, U256::from(40));
		backend.push_substate();
		backend
			.set_storage(alice(), key(), H256::from_low_u64_be(9))
			.unwrap();
		assert_eq!(backend.storage(alice(), key()), H256::from_low_u64_be(9));
		backend.pop_substate(MergeStrategy::Revert).unwrap();
		backend.pop_substate(MergeStrategy::Commit).unwrap();

		assert_eq!(backend.balance(alice()), U256::from(60));
		assert_eq!(backend.balance(bob), U256::from(40));
		assert_eq!(backend.storage(alice(), key()), H256::from_low_u64_be(7));
		assert!(backend.pop_substate(MergeStrategy::Commit).is_err());
	}

	#[test]
	fn original_storage_ignores_writes() {
		let world = world();
		let mut backend = OverlayedBackend::new(&world, ());

		backend.set_storage(alice(), key(), H256::zero()).unwrap();
		assert_eq!(backend.storage(alice(), key()), H256::zero());
		assert_eq!(backend.original_storage(alice(), key()), H256::from_low_u64_be(7));

		backend.reset_storage(alice());
		assert_eq!(backend.original_storage(alice(), key()), H256::zero());
	}

	#[test]
	fn committed_reset_hides_older_writes() {
		let world = world();
		let mut backend = OverlayedBackend::new(&world, ());
		let other = H256::from_low_u64_be(2);

		backend.set_storage(alice(), other, H256::repeat_byte(2)).unwrap();
		backend.push_substate();
		backend.reset_storage(alice());
		backend.pop_substate(MergeStrategy::Commit).unwrap();

		assert_eq!(backend.storage(alice(), key()), H256::zero());
		assert_eq!(backend.storage(alice(), other), H256::zero());
		let (_, changes) = backend.deconstruct();
		assert!(changes.storage.is_empty());
		assert!(changes.accounts[&alice()].reset_storage);
	}

	#[test]
	fn touch_materialises_missing_accounts() {
		let world = world();
		let mut backend = OverlayedBackend::new(&world, ());
		let carol = H160::repeat_byte(3);

		assert!(!backend.exists(carol));
		backend.push_substate();
		backend.touch(carol);
		backend.pop_substate(MergeStrategy::Commit).unwrap();
		assert!(backend.exists(carol));
		assert!(backend.is_empty(carol));
		assert!(backend.touched().contains(&carol));

		let (_, changes) = backend.deconstruct();
		assert_eq!(changes.accounts[&carol].balance, Some(U256::zero()));
	}

	#[test]
	fn ripemd_touch_survives_revert() {
		let world = world();
		let mut backend = OverlayedBackend::new(&world, ());

		backend.push_substate();
		backend.touch(RIPEMD);
		backend.touch(H160::repeat_byte(4));
		backend.pop_substate(MergeStrategy::Discard).unwrap();

		let touched = backend.touched();
		assert!(touched.contains(&RIPEMD));
		assert!(!touched.contains(&H160::repeat_byte(4)));
	}

	#[test]
	fn overdraft_is_refused() {
		let world = world();
		let mut backend = OverlayedBackend::new(&world, ());
		assert_eq!(
			backend.withdrawal(alice(), U256::from(101)),
			Err(ExceptionalHaltReason::InsufficientBalance.into())
		);
		assert_eq!(
			world.account(alice()).map(|a: Account| a.balance),
			Some(U256::from(100))
		);
	}
}
