use core::cmp::min;
use std::rc::Rc;

use primitive_types::{H256, U256};

use super::{Control, Step};
use crate::utils::u256_to_usize;
use crate::{ExceptionalHaltReason, ExitError, ExitSucceed, Machine};

/// Shared tail of `CODECOPY` and `CALLDATACOPY`.
fn copy_to_memory<S>(machine: &mut Machine<S>, source: Rc<Vec<u8>>) -> Step {
	let memory_offset = machine.stack.pop_u256()?;
	let source_offset = machine.stack.pop_u256()?;
	let len = machine.stack.pop_u256()?;

	machine.memory.resize_offset(memory_offset, len)?;
	machine
		.memory
		.copy_large(memory_offset, source_offset, len, &source)?;
	Ok(Control::Continue)
}

pub fn codesize<S>(machine: &mut Machine<S>) -> Step {
	machine.stack.push_u256(U256::from(machine.code.len()))?;
	Ok(Control::Continue)
}

pub fn codecopy<S>(machine: &mut Machine<S>) -> Step {
	let code = machine.code.clone();
	copy_to_memory(machine, code)
}

/// Reads 32 bytes of input, zero-padded past its end.
pub fn calldataload<S>(machine: &mut Machine<S>) -> Step {
	let index = machine.stack.pop_u256()?;

	let mut word = H256::zero();
	if index < U256::from(machine.data.len()) {
		let start = index.as_usize();
		let end = min(start + 32, machine.data.len());
		word[..end - start].copy_from_slice(&machine.data[start..end]);
	}

	machine.stack.push(word)?;
	Ok(Control::Continue)
}

pub fn calldatasize<S>(machine: &mut Machine<S>) -> Step {
	machine.stack.push_u256(U256::from(machine.data.len()))?;
	Ok(Control::Continue)
}

pub fn calldatacopy<S>(machine: &mut Machine<S>) -> Step {
	let data = machine.data.clone();
	copy_to_memory(machine, data)
}

pub fn pop<S>(machine: &mut Machine<S>) -> Step {
	machine.stack.pop()?;
	Ok(Control::Continue)
}

pub fn mload<S>(machine: &mut Machine<S>) -> Step {
	let offset = machine.stack.pop_u256()?;
	let word = machine.memory.load(offset, U256::from(32))?;
	machine.stack.push(H256::from_slice(&word))?;
	Ok(Control::Continue)
}

pub fn mstore<S>(machine: &mut Machine<S>) -> Step {
	let offset = machine.stack.pop_u256()?;
	let value = machine.stack.pop()?;

	machine.memory.resize_offset(offset, U256::from(32))?;
	machine
		.memory
		.set(u256_to_usize(offset)?, value.as_bytes(), None)?;
	Ok(Control::Continue)
}

pub fn mstore8<S>(machine: &mut Machine<S>) -> Step {
	let offset = machine.stack.pop_u256()?;
	let value = machine.stack.pop_u256()?;

	machine.memory.resize_offset(offset, U256::one())?;
	machine
		.memory
		.set(u256_to_usize(offset)?, &[value.byte(0)], None)?;
	Ok(Control::Continue)
}

/// Destinations beyond `usize` can never be a `JUMPDEST`.
fn destination(dest: U256) -> Result<usize, ExitError> {
	if dest > U256::from(usize::MAX) {
		Err(ExceptionalHaltReason::InvalidJumpDestination.into())
	} else {
		Ok(dest.as_usize())
	}
}

pub fn jump<S>(machine: &mut Machine<S>) -> Step {
	let dest = machine.stack.pop_u256()?;
	Ok(Control::Jump(destination(dest)?))
}

/// The condition is checked first, so an unvalidated destination is
/// harmless when the jump is not taken.
pub fn jumpi<S>(machine: &mut Machine<S>) -> Step {
	let dest = machine.stack.pop_u256()?;
	let condition = machine.stack.pop()?;

	if condition.is_zero() {
		Ok(Control::Continue)
	} else {
		Ok(Control::Jump(destination(dest)?))
	}
}

pub fn pc<S>(machine: &mut Machine<S>, position: usize) -> Step {
	machine.stack.push_u256(U256::from(position))?;
	Ok(Control::Continue)
}

pub fn msize<S>(machine: &mut Machine<S>) -> Step {
	machine.stack.push_u256(machine.memory.effective_len())?;
	Ok(Control::Continue)
}

/// `PUSHn` at `position`. Immediate bytes cut off by the end of the code
/// read as zero.
pub fn push<S>(machine: &mut Machine<S>, n: usize, position: usize) -> Step {
	let start = position + 1;
	let end = min(start + n, machine.code.len());
	let immediate = machine.code.get(start..end).unwrap_or_default();

	let mut word = H256::zero();
	word[32 - n..32 - n + immediate.len()].copy_from_slice(immediate);
	machine.stack.push(word)?;
	Ok(Control::ContinueN(1 + n))
}

pub fn dup<S>(machine: &mut Machine<S>, n: usize) -> Step {
	let value = machine.stack.peek(n - 1)?;
	machine.stack.push(value)?;
	Ok(Control::Continue)
}

pub fn swap<S>(machine: &mut Machine<S>, n: usize) -> Step {
	machine.stack.swap(n)?;
	Ok(Control::Continue)
}

fn load_retval<S>(machine: &mut Machine<S>) -> Result<(), ExitError> {
	let offset = machine.stack.pop_u256()?;
	let len = machine.stack.pop_u256()?;
	machine.retval = machine.memory.load(offset, len)?;
	Ok(())
}

pub fn ret<S>(machine: &mut Machine<S>) -> Step {
	load_retval(machine)?;
	Ok(Control::Exit(ExitSucceed::Returned.into()))
}

pub fn revert<S>(machine: &mut Machine<S>) -> Step {
	load_retval(machine)?;
	Ok(Control::Exit(Err(ExitError::Reverted)))
}
