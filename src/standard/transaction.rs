use std::rc::Rc;

use forkevm_interpreter::call_create::CreateScheme;
use forkevm_interpreter::{
	Context, ExitResult, Log, RuntimeBackend, RuntimeBaseBackend, RuntimeEnvironment, RuntimeState,
	TransactionContext, Transfer,
};
use primitive_types::{H160, U256};

use super::gasometer::TransactionCost;
use super::{Config, GasometerState, Invoker};
use crate::backend::{MutableWorldState, OverlayedBackend, WorldState};
use crate::call_stack;

/// Destination of a transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransactionAction {
	Call(H160),
	Create,
}

/// A signed transaction with its sender already recovered.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transaction {
	pub caller: H160,
	pub nonce: U256,
	pub gas_limit: u64,
	pub gas_price: U256,
	pub action: TransactionAction,
	pub value: U256,
	pub data: Vec<u8>,
	/// Chain id the signature commits to. `None` for pre-EIP-155 signatures.
	pub chain_id: Option<U256>,
}

impl Transaction {
	pub fn intrinsic_gas(&self, config: &Config) -> u64 {
		let cost = match self.action {
			TransactionAction::Call(_) => TransactionCost::call(&self.data),
			TransactionAction::Create => TransactionCost::create(&self.data),
		};
		cost.cost(config)
	}

	/// `gas_limit * gas_price + value`, or `None` when it does not fit a word.
	pub fn upfront_cost(&self) -> Option<U256> {
		self.gas_price
			.checked_mul(U256::from(self.gas_limit))
			.and_then(|fee| fee.checked_add(self.value))
	}
}

/// Reasons a transaction is rejected before any code runs.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TransactionInvalid {
	#[error("transaction nonce {actual} does not match sender nonce {expected}")]
	InvalidNonce { expected: U256, actual: U256 },
	#[error("sender nonce is at its maximum")]
	NonceOverflow,
	#[error("intrinsic gas {intrinsic} exceeds gas limit {gas_limit}")]
	IntrinsicGasTooLow { intrinsic: u64, gas_limit: u64 },
	#[error("sender balance {balance} does not cover the up-front cost {cost}")]
	InsufficientBalance { balance: U256, cost: U256 },
	#[error("chain id {0} is not accepted here")]
	WrongChainId(U256),
	#[error("gas limit {gas_limit} exceeds the {available} gas left in the block")]
	BlockGasLimitExceeded { gas_limit: u64, available: u64 },
}

/// Stateless transaction checks of one fork.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TransactionValidator {
	/// Chain id replay-protected signatures must carry. Protected signatures
	/// are refused entirely when unset.
	pub chain_id: Option<U256>,
}

impl TransactionValidator {
	/// Check `transaction` against the sender account and the gas left in
	/// the block. Returns the intrinsic gas.
	pub fn validate<H: RuntimeBaseBackend + ?Sized>(
		&self,
		config: &Config,
		transaction: &Transaction,
		handler: &H,
		block_gas_left: u64,
	) -> Result<u64, TransactionInvalid> {
		if let Some(chain_id) = transaction.chain_id {
			if !config.replay_protection || self.chain_id != Some(chain_id) {
				return Err(TransactionInvalid::WrongChainId(chain_id));
			}
		}

		let intrinsic = transaction.intrinsic_gas(config);
		if transaction.gas_limit < intrinsic {
			return Err(TransactionInvalid::IntrinsicGasTooLow {
				intrinsic,
				gas_limit: transaction.gas_limit,
			});
		}

		if transaction.gas_limit > block_gas_left {
			return Err(TransactionInvalid::BlockGasLimitExceeded {
				gas_limit: transaction.gas_limit,
				available: block_gas_left,
			});
		}

		let expected = handler.nonce(transaction.caller);
		if transaction.nonce != expected {
			return Err(TransactionInvalid::InvalidNonce {
				expected,
				actual: transaction.nonce,
			});
		}
		if expected >= U256::from(u64::MAX) {
			return Err(TransactionInvalid::NonceOverflow);
		}

		let balance = handler.balance(transaction.caller);
		let cost = transaction.upfront_cost().unwrap_or(U256::MAX);
		if balance < cost {
			return Err(TransactionInvalid::InsufficientBalance { balance, cost });
		}

		Ok(intrinsic)
	}
}

/// Result of an executed transaction. Failed executions are still included
/// in the block and pay for their gas.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransactionOutcome {
	pub result: ExitResult,
	/// Gas charged to the sender, after the refund.
	pub gas_used: u64,
	pub output: Vec<u8>,
	/// Address of the new contract, for successful creations.
	pub created: Option<H160>,
}

impl TransactionOutcome {
	pub fn is_success(&self) -> bool {
		self.result.is_ok()
	}
}

/// Validate and execute `transaction` inside `backend`. Nothing is written to
/// the backend when the transaction is invalid.
pub fn transact<W: WorldState, E: RuntimeEnvironment>(
	invoker: &Invoker<'_>,
	validator: &TransactionValidator,
	transaction: &Transaction,
	backend: &mut OverlayedBackend<W, E>,
	block_gas_left: u64,
) -> Result<TransactionOutcome, TransactionInvalid> {
	let config = invoker.config();
	let intrinsic = validator.validate(config, transaction, &*backend, block_gas_left)?;
	let caller = transaction.caller;
	log::debug!(
		target: "evm",
		"transaction from {:?} nonce {} {:?}, gas limit {}",
		caller,
		transaction.nonce,
		transaction.action,
		transaction.gas_limit
	);

	// Validation above guarantees the sender can pay.
	let fee = transaction.gas_price * U256::from(transaction.gas_limit);
	backend
		.withdrawal(caller, fee)
		.map_err(|_| TransactionInvalid::InsufficientBalance {
			balance: backend.balance(caller),
			cost: fee,
		})?;

	let mut gasometer = GasometerState::new(transaction.gas_limit, false, config);
	gasometer
		.record_gas64(intrinsic)
		.map_err(|_| TransactionInvalid::IntrinsicGasTooLow {
			intrinsic,
			gas_limit: transaction.gas_limit,
		})?;

	let transaction_context = Rc::new(TransactionContext {
		gas_price: transaction.gas_price,
		origin: caller,
	});
	let (control, created) = match transaction.action {
		TransactionAction::Call(address) => {
			backend
				.inc_nonce(caller)
				.map_err(|_| TransactionInvalid::NonceOverflow)?;

			let runtime = RuntimeState {
				context: Context {
					address,
					caller,
					apparent_value: transaction.value,
				},
				transaction_context,
				retbuf: Vec::new(),
				gas: 0,
			};
			let transfer = Transfer {
				source: caller,
				target: address,
				value: transaction.value,
			};
			let control = invoker.enter_call(
				runtime,
				gasometer,
				address,
				Some(transfer),
				transaction.data.clone(),
				0,
				backend,
			);
			(control, None)
		}
		TransactionAction::Create => {
			let address = CreateScheme::Legacy { caller }.address(&*backend);
			let runtime = RuntimeState {
				context: Context {
					address,
					caller,
					apparent_value: transaction.value,
				},
				transaction_context,
				retbuf: Vec::new(),
				gas: 0,
			};
			let control = invoker.enter_create(runtime, gasometer, transaction.data.clone(), 0, backend);
			(control, Some(address))
		}
	};

	let outcome = call_stack::execute(invoker, control, created, backend);

	let gas_left = outcome.gasometer.effective_gas();
	let gas_used = transaction.gas_limit - gas_left;
	backend.deposit(caller, transaction.gas_price * U256::from(gas_left));

	let coinbase = backend.block_coinbase();
	backend.deposit(coinbase, transaction.gas_price * U256::from(gas_used));
	backend.touch(coinbase);

	if config.clear_empty_accounts {
		for address in backend.touched() {
			if backend.is_empty(address) {
				backend.mark_delete(address);
			}
		}
	}

	log::debug!(
		target: "evm",
		"transaction from {:?} finished with {:?}, gas used {}",
		caller,
		outcome.result,
		gas_used
	);

	Ok(TransactionOutcome {
		created: created.filter(|_| outcome.result.is_ok()),
		result: outcome.result,
		gas_used,
		output: outcome.retval,
	})
}

/// Run `transaction` over `world` and write its changes back. Returns the
/// outcome and the logs it emitted.
pub fn apply_transaction<W: MutableWorldState, E: RuntimeEnvironment>(
	invoker: &Invoker<'_>,
	validator: &TransactionValidator,
	transaction: &Transaction,
	world: &mut W,
	environment: &E,
	block_gas_left: u64,
) -> Result<(TransactionOutcome, Vec<Log>), TransactionInvalid> {
	let mut backend = OverlayedBackend::new(&*world, environment);
	let outcome = transact(invoker, validator, transaction, &mut backend, block_gas_left)?;
	let (_, mut changeset) = backend.deconstruct();

	// Frames that failed already dropped their logs.
	let logs = std::mem::take(&mut changeset.logs);
	world.apply(changeset);

	Ok((outcome, logs))
}
