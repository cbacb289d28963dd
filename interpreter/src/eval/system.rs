use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use super::{Control, Step};
use crate::{ExceptionalHaltReason, ExitSucceed, Log, Machine, RuntimeHandler, RuntimeState, Transfer};

/// Number of ancestors `BLOCKHASH` can see.
pub const BLOCK_HASH_WINDOW: u64 = 256;

fn state<S: AsRef<RuntimeState>>(machine: &Machine<S>) -> &RuntimeState {
	machine.state.as_ref()
}

fn pop_address<S>(machine: &mut Machine<S>) -> Result<H160, ExceptionalHaltReason> {
	machine.stack.pop().map(H160::from)
}

fn push_word<S>(machine: &mut Machine<S>, value: impl Into<H256>) -> Step {
	machine.stack.push(value.into())?;
	Ok(Control::Continue)
}

fn push_u256<S>(machine: &mut Machine<S>, value: U256) -> Step {
	machine.stack.push_u256(value)?;
	Ok(Control::Continue)
}

pub fn sha3<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let offset = machine.stack.pop_u256()?;
	let len = machine.stack.pop_u256()?;
	let data = machine.memory.load(offset, len)?;

	push_word(machine, H256::from_slice(&Keccak256::digest(&data)))
}

pub fn address<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let address = state(machine).context.address;
	push_word(machine, address)
}

pub fn origin<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let origin = state(machine).transaction_context.origin;
	push_word(machine, origin)
}

pub fn caller<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let caller = state(machine).context.caller;
	push_word(machine, caller)
}

pub fn callvalue<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let value = state(machine).context.apparent_value;
	push_u256(machine, value)
}

pub fn gasprice<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let price = state(machine).transaction_context.gas_price;
	push_u256(machine, price)
}

/// Gas left after this operation's own cost was charged.
pub fn gas<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let gas = state(machine).gas;
	push_u256(machine, U256::from(gas))
}

pub fn returndatasize<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let size = state(machine).retbuf.len();
	push_u256(machine, U256::from(size))
}

/// Unlike the other copies, reading past the end of the return buffer is an
/// exceptional halt.
pub fn returndatacopy<S: AsRef<RuntimeState>>(machine: &mut Machine<S>) -> Step {
	let memory_offset = machine.stack.pop_u256()?;
	let data_offset = machine.stack.pop_u256()?;
	let len = machine.stack.pop_u256()?;

	machine.memory.resize_offset(memory_offset, len)?;
	let available = U256::from(machine.state.as_ref().retbuf.len());
	if data_offset.checked_add(len).map_or(true, |end| end > available) {
		return Err(ExceptionalHaltReason::OutOfBounds.into());
	}

	let retbuf = &machine.state.as_ref().retbuf;
	machine
		.memory
		.copy_large(memory_offset, data_offset, len, retbuf)?;
	Ok(Control::Continue)
}

pub fn balance<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	let address = pop_address(machine)?;
	push_u256(machine, handler.balance(address))
}

pub fn selfbalance<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	let address = state(machine).context.address;
	push_u256(machine, handler.balance(address))
}

pub fn extcodesize<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	let address = pop_address(machine)?;
	push_u256(machine, handler.code_size(address))
}

/// Zero for empty accounts, as well as for accounts that do not exist.
pub fn extcodehash<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	let address = pop_address(machine)?;
	let hash = if handler.is_empty(address) {
		H256::zero()
	} else {
		handler.code_hash(address)
	};
	push_word(machine, hash)
}

pub fn extcodecopy<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	let address = pop_address(machine)?;
	let memory_offset = machine.stack.pop_u256()?;
	let code_offset = machine.stack.pop_u256()?;
	let len = machine.stack.pop_u256()?;

	machine.memory.resize_offset(memory_offset, len)?;
	machine
		.memory
		.copy_large(memory_offset, code_offset, len, &handler.code(address))?;
	Ok(Control::Continue)
}

/// Zero for the current block, future blocks, and anything older than the
/// most recent `BLOCK_HASH_WINDOW` ancestors.
pub fn blockhash<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	let number = machine.stack.pop_u256()?;
	let current = handler.block_number();

	let visible = number < current && current - number <= U256::from(BLOCK_HASH_WINDOW);
	let hash = if visible {
		handler.block_hash(number)
	} else {
		H256::zero()
	};
	push_word(machine, hash)
}

pub fn coinbase<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	push_word(machine, handler.block_coinbase())
}

pub fn timestamp<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	push_u256(machine, handler.block_timestamp())
}

pub fn number<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	push_u256(machine, handler.block_number())
}

pub fn difficulty<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	push_u256(machine, handler.block_difficulty())
}

pub fn gaslimit<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	push_u256(machine, handler.block_gas_limit())
}

pub fn chainid<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	push_u256(machine, handler.chain_id())
}

pub fn sload<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &H,
) -> Step {
	let index = machine.stack.pop()?;
	let value = handler.storage(state(machine).context.address, index);
	push_word(machine, value)
}

pub fn sstore<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &mut H,
) -> Step {
	let index = machine.stack.pop()?;
	let value = machine.stack.pop()?;

	handler.set_storage(state(machine).context.address, index, value)?;
	Ok(Control::Continue)
}

/// `LOGn`: data from memory, then `n` topics from the stack.
pub fn log<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	n: u8,
	handler: &mut H,
) -> Step {
	let offset = machine.stack.pop_u256()?;
	let len = machine.stack.pop_u256()?;
	let data = machine.memory.load(offset, len)?;
	let topics = (0..n)
		.map(|_| machine.stack.pop())
		.collect::<Result<Vec<_>, _>>()?;

	handler.log(Log {
		address: state(machine).context.address,
		topics,
		data,
	})?;
	Ok(Control::Continue)
}

/// The whole balance moves to the beneficiary. When the beneficiary is the
/// account itself the balance is burned.
pub fn selfdestruct<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &mut H,
) -> Step {
	let beneficiary = pop_address(machine)?;
	let address = state(machine).context.address;
	let value = handler.balance(address);

	handler.transfer(Transfer {
		source: address,
		target: beneficiary,
		value,
	})?;
	handler.mark_delete(address);
	handler.reset_balance(address);

	Ok(Control::Exit(ExitSucceed::SelfDestructed.into()))
}
