//! Pricing of the operations whose cost is only known at execution time.
//!
//! Each function reads the operands from the stack, before the operation
//! pops them, and whatever it needs from the world state. The operation table
//! stores them as [PriceFn]s next to the evaluation functions.

use forkevm_interpreter::{ExitError, Machine, Opcode, RuntimeHandler, RuntimeState};
use primitive_types::{H160, U256};

use super::consts::{G_CREATE, G_VERYLOW, G_ZERO};
use super::{costs, MemoryRegion};
use crate::standard::Config;

/// Prices one execution of a dynamically priced operation.
pub type PriceFn = fn(
	Opcode,
	&Machine<RuntimeState>,
	&dyn RuntimeHandler,
	&Config,
) -> Result<DynamicCost, ExitError>;

/// What one execution of an operation costs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DynamicCost {
	pub gas: u64,
	/// Added to the refund counter, negative when a refund is taken back.
	pub refund: i64,
	/// Memory the operation touches. Growth is charged on top of `gas`.
	pub memory: Option<MemoryRegion>,
	/// Gas requested for a child frame, checked against what is left once
	/// everything else is paid.
	pub forwarded: Option<U256>,
}

impl DynamicCost {
	fn flat(gas: u64) -> Self {
		Self {
			gas,
			..Self::default()
		}
	}

	fn touching(mut self, memory: MemoryRegion) -> Self {
		self.memory = Some(memory);
		self
	}
}

fn word(machine: &Machine<RuntimeState>, n: usize) -> Result<U256, ExitError> {
	Ok(U256::from_big_endian(&machine.stack.peek(n)?[..]))
}

fn region(machine: &Machine<RuntimeState>, offset: usize, len: usize) -> Result<MemoryRegion, ExitError> {
	Ok(MemoryRegion {
		offset: word(machine, offset)?,
		len: word(machine, len)?,
	})
}

/// Before EIP-161 only missing accounts are new, after it empty ones too.
fn is_new_account(target: H160, handler: &dyn RuntimeHandler, config: &Config) -> bool {
	if config.clear_empty_accounts {
		handler.is_empty(target)
	} else {
		!handler.exists(target)
	}
}

pub fn exp(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	config: &Config,
) -> Result<DynamicCost, ExitError> {
	Ok(DynamicCost::flat(costs::exp_cost(word(machine, 1)?, config)))
}

pub fn sha3(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	_config: &Config,
) -> Result<DynamicCost, ExitError> {
	Ok(DynamicCost::flat(costs::sha3_cost(word(machine, 1)?)?).touching(region(machine, 0, 1)?))
}

/// `CALLDATACOPY`, `CODECOPY` and `RETURNDATACOPY`.
pub fn data_copy(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	_config: &Config,
) -> Result<DynamicCost, ExitError> {
	Ok(DynamicCost::flat(costs::copy_cost(word(machine, 2)?)?)
		.touching(region(machine, 0, 2)?))
}

pub fn extcodecopy(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	config: &Config,
) -> Result<DynamicCost, ExitError> {
	Ok(DynamicCost::flat(costs::extcodecopy_cost(word(machine, 3)?, config)?)
		.touching(region(machine, 1, 3)?))
}

/// `MLOAD`, `MSTORE` and `MSTORE8`.
pub fn memory_access(
	opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	_config: &Config,
) -> Result<DynamicCost, ExitError> {
	let len = if opcode == Opcode::MSTORE8 { 1 } else { 32 };
	Ok(DynamicCost::flat(G_VERYLOW).touching(MemoryRegion {
		offset: word(machine, 0)?,
		len: U256::from(len),
	}))
}

pub fn sstore(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	handler: &dyn RuntimeHandler,
	config: &Config,
) -> Result<DynamicCost, ExitError> {
	let address = machine.state.context.address;
	let index = machine.stack.peek(0)?;
	let new = machine.stack.peek(1)?;
	let original = handler.original_storage(address, index);
	let current = handler.storage(address, index);

	Ok(DynamicCost {
		gas: costs::sstore_cost(original, current, new, config),
		refund: costs::sstore_refund(original, current, new, config),
		..DynamicCost::default()
	})
}

/// `LOG0` to `LOG4`.
pub fn log(
	opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	_config: &Config,
) -> Result<DynamicCost, ExitError> {
	let topics = opcode.as_u8() - Opcode::LOG0.as_u8();
	Ok(DynamicCost::flat(costs::log_cost(topics, word(machine, 1)?)?)
		.touching(region(machine, 0, 1)?))
}

pub fn create(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	_config: &Config,
) -> Result<DynamicCost, ExitError> {
	Ok(DynamicCost::flat(G_CREATE).touching(region(machine, 1, 2)?))
}

/// `CREATE2` also pays for hashing the init code.
pub fn create2(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	_config: &Config,
) -> Result<DynamicCost, ExitError> {
	Ok(DynamicCost::flat(costs::create2_cost(word(machine, 2)?)?)
		.touching(region(machine, 1, 2)?))
}

/// `RETURN` and `REVERT` pay for the memory holding the output.
pub fn output(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_handler: &dyn RuntimeHandler,
	_config: &Config,
) -> Result<DynamicCost, ExitError> {
	Ok(DynamicCost::flat(G_ZERO).touching(region(machine, 0, 1)?))
}

pub fn selfdestruct(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	handler: &dyn RuntimeHandler,
	config: &Config,
) -> Result<DynamicCost, ExitError> {
	let address = machine.state.context.address;
	let beneficiary = machine.stack.peek(0)?.into();

	Ok(DynamicCost {
		gas: costs::selfdestruct_cost(
			handler.balance(address),
			is_new_account(beneficiary, handler, config),
			config,
		),
		refund: costs::selfdestruct_refund(handler.deleted(address)),
		..DynamicCost::default()
	})
}

/// The four call opcodes. `CALL` and `CALLCODE` carry a value word after
/// the target, which shifts the memory operands by one.
pub fn call(
	opcode: Opcode,
	machine: &Machine<RuntimeState>,
	handler: &dyn RuntimeHandler,
	config: &Config,
) -> Result<DynamicCost, ExitError> {
	let carries_value = matches!(opcode, Opcode::CALL | Opcode::CALLCODE);
	let reaches_target = matches!(opcode, Opcode::CALL | Opcode::STATICCALL);
	let (value, args) = if carries_value {
		(word(machine, 2)?, 3)
	} else {
		(U256::zero(), 2)
	};
	let target_is_new =
		reaches_target && is_new_account(machine.stack.peek(1)?.into(), handler, config);

	let input = region(machine, args, args + 1)?;
	let output = region(machine, args + 2, args + 3)?;
	Ok(DynamicCost {
		gas: costs::call_cost(value, carries_value, reaches_target, target_is_new, config),
		refund: 0,
		memory: Some(input.join(output)),
		forwarded: Some(word(machine, 0)?),
	})
}
