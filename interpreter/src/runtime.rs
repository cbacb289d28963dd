use std::rc::Rc;

use auto_impl::auto_impl;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use crate::ExitError;

/// Who runs the code of a frame, and on whose behalf.
#[derive(Clone, Debug)]
pub struct Context {
	/// Account whose storage and balance the frame works on.
	pub address: H160,
	/// `CALLER`.
	pub caller: H160,
	/// `CALLVALUE`. For `DELEGATECALL` this is the value of the parent.
	pub apparent_value: U256,
}

/// Context shared by every frame of one transaction.
#[derive(Clone, Debug)]
pub struct TransactionContext {
	pub gas_price: U256,
	/// Sender of the transaction, `ORIGIN`.
	pub origin: H160,
}

/// State a machine carries besides its stack and memory.
#[derive(Clone, Debug)]
pub struct RuntimeState {
	pub context: Context,
	pub transaction_context: Rc<TransactionContext>,
	/// Output of the most recent call or create, for `RETURNDATA*`.
	pub retbuf: Vec<u8>,
	/// Gas left once the current opcode has been paid for. Read by `GAS`.
	pub gas: u64,
}

impl AsRef<Self> for RuntimeState {
	fn as_ref(&self) -> &Self {
		self
	}
}

impl AsMut<Self> for RuntimeState {
	fn as_mut(&mut self) -> &mut Self {
		self
	}
}

/// Entry written by `LOG0` to `LOG4`.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
	pub address: H160,
	pub topics: Vec<H256>,
	pub data: Vec<u8>,
}

/// Value moved by a call, a create or a self-destruct.
#[derive(Clone, Debug)]
pub struct Transfer {
	pub source: H160,
	pub target: H160,
	pub value: U256,
}

/// Block context consumed by the environmental opcodes.
#[auto_impl(&, Box, std::sync::Arc)]
pub trait RuntimeEnvironment {
	/// Hash of block `number`, with no window applied. `BLOCKHASH` only
	/// asks for the 256 most recent ancestors.
	fn block_hash(&self, number: U256) -> H256;
	fn block_number(&self) -> U256;
	fn block_coinbase(&self) -> H160;
	fn block_timestamp(&self) -> U256;
	fn block_difficulty(&self) -> U256;
	fn block_gas_limit(&self) -> U256;
	/// Value of `CHAINID`.
	fn chain_id(&self) -> U256;
}

/// Read access to accounts.
pub trait RuntimeBaseBackend {
	fn balance(&self, address: H160) -> U256;
	fn code(&self, address: H160) -> Vec<u8>;
	/// Current value of a storage slot, zero if never written.
	fn storage(&self, address: H160, index: H256) -> H256;
	fn exists(&self, address: H160) -> bool;
	fn nonce(&self, address: H160) -> U256;

	fn code_size(&self, address: H160) -> U256 {
		U256::from(self.code(address).len())
	}

	/// `EXTCODEHASH`: zero for accounts that do not exist.
	fn code_hash(&self, address: H160) -> H256 {
		if !self.exists(address) {
			return H256::default();
		}

		let code = self.code(address);
		H256::from_slice(Keccak256::digest(&code[..]).as_slice())
	}

	/// An account is empty when it has no code, zero nonce and zero balance.
	fn is_empty(&self, address: H160) -> bool {
		self.balance(address).is_zero()
			&& self.nonce(address).is_zero()
			&& self.code_size(address).is_zero()
	}
}

/// Mutable access to accounts, scoped to the current frame.
pub trait RuntimeBackend: RuntimeBaseBackend {
	/// Slot value as of the start of the transaction. SSTORE metering from
	/// Constantinople on prices against it.
	fn original_storage(&self, address: H160, index: H256) -> H256;
	/// Whether `SELFDESTRUCT` already hit the account in this transaction.
	fn deleted(&self, address: H160) -> bool;

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError>;
	fn log(&mut self, log: Log) -> Result<(), ExitError>;
	/// Schedule the account for removal once the transaction ends.
	fn mark_delete(&mut self, address: H160);
	/// Record the account as touched, materialising it when missing.
	fn touch(&mut self, address: H160);
	/// Drop every storage slot of the account.
	fn reset_storage(&mut self, address: H160);
	fn set_code(&mut self, address: H160, code: Vec<u8>) -> Result<(), ExitError>;
	fn reset_balance(&mut self, address: H160);
	fn deposit(&mut self, target: H160, value: U256);
	/// Fails with `InsufficientBalance` and leaves the account alone when
	/// `value` exceeds the balance.
	fn withdrawal(&mut self, source: H160, value: U256) -> Result<(), ExitError>;
	/// Fails with `NonceOverflow` once the nonce reaches `2^64 - 1`.
	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError>;

	/// Move `transfer.value` and touch both ends, even for a zero value.
	fn transfer(&mut self, transfer: Transfer) -> Result<(), ExitError> {
		self.withdrawal(transfer.source, transfer.value)?;
		self.deposit(transfer.target, transfer.value);
		self.touch(transfer.source);
		self.touch(transfer.target);
		Ok(())
	}
}

/// Everything an operation may consult while executing.
pub trait RuntimeHandler: RuntimeEnvironment + RuntimeBackend {}

impl<T: RuntimeEnvironment + RuntimeBackend + ?Sized> RuntimeHandler for T {}
