use std::collections::BTreeMap;

use auto_impl::auto_impl;
use forkevm_interpreter::RuntimeEnvironment;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use super::{Account, MutableWorldState, OverlayedChangeSet, WorldState};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InMemoryAccount {
	pub balance: U256,
	pub nonce: U256,
	pub code: Vec<u8>,
	pub storage: BTreeMap<H256, H256>,
}

/// World state kept in a `BTreeMap`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InMemoryWorldState {
	pub accounts: BTreeMap<H160, InMemoryAccount>,
}

impl WorldState for InMemoryWorldState {
	fn account(&self, address: H160) -> Option<Account> {
		self.accounts.get(&address).map(|account| Account {
			balance: account.balance,
			nonce: account.nonce,
			code: account.code.clone(),
		})
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.accounts
			.get(&address)
			.and_then(|account| account.storage.get(&index))
			.copied()
			.unwrap_or_default()
	}
}

impl MutableWorldState for InMemoryWorldState {
	fn apply(&mut self, changeset: OverlayedChangeSet) {
		for (address, change) in &changeset.accounts {
			let account = self.accounts.entry(*address).or_default();
			if change.reset_storage {
				account.storage.clear();
			}
			if let Some(balance) = change.balance {
				account.balance = balance;
			}
			if let Some(nonce) = change.nonce {
				account.nonce = nonce;
			}
			if let Some(code) = &change.code {
				account.code = code.clone();
			}
		}
		for ((address, index), value) in changeset.storage {
			let storage = &mut self.accounts.entry(address).or_default().storage;
			if value.is_zero() {
				storage.remove(&index);
			} else {
				storage.insert(index, value);
			}
		}
		for (address, change) in changeset.accounts {
			if change.deleted {
				self.accounts.remove(&address);
			}
		}
	}

	/// Keccak-256 over the RLP of all accounts in address order. Not a
	/// Merkle-Patricia root, but it changes whenever any account does.
	fn state_root(&self) -> H256 {
		let mut stream = rlp::RlpStream::new_list(self.accounts.len());
		for (address, account) in &self.accounts {
			stream.begin_list(5);
			stream.append(address);
			stream.append(&account.nonce);
			stream.append(&account.balance);
			stream.append(&H256::from_slice(
				Keccak256::digest(&account.code[..]).as_slice(),
			));
			stream.begin_list(account.storage.len());
			for (index, value) in &account.storage {
				stream.begin_list(2);
				stream.append(index);
				stream.append(value);
			}
		}
		H256::from_slice(Keccak256::digest(&stream.out()[..]).as_slice())
	}
}

/// Source of ancestor block hashes.
#[auto_impl(&, Box, std::sync::Arc)]
pub trait BlockHashLookup {
	fn block_hash(&self, number: U256) -> Option<H256>;
}

impl BlockHashLookup for BTreeMap<U256, H256> {
	fn block_hash(&self, number: U256) -> Option<H256> {
		self.get(&number).copied()
	}
}

/// Header fields of the block being executed.
#[derive(Clone, Debug, Default)]
pub struct BlockEnvironment<L = BTreeMap<U256, H256>> {
	pub number: U256,
	pub coinbase: H160,
	pub timestamp: U256,
	pub difficulty: U256,
	pub gas_limit: U256,
	pub chain_id: U256,
	pub block_hashes: L,
}

impl<L: BlockHashLookup> RuntimeEnvironment for BlockEnvironment<L> {
	fn block_hash(&self, number: U256) -> H256 {
		self.block_hashes.block_hash(number).unwrap_or_default()
	}

	fn block_number(&self) -> U256 {
		self.number
	}

	fn block_coinbase(&self) -> H160 {
		self.coinbase
	}

	fn block_timestamp(&self) -> U256 {
		self.timestamp
	}

	fn block_difficulty(&self) -> U256 {
		self.difficulty
	}

	fn block_gas_limit(&self) -> U256 {
		self.gas_limit
	}

	fn chain_id(&self) -> U256 {
		self.chain_id
	}
}
