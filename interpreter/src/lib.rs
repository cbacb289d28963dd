//! Core layer for the forkevm Ethereum Virtual Machine.
//!
//! The interpreter owns the per-frame machine (code, program counter, stack,
//! memory) and the evaluation functions of every opcode. Gas metering and
//! fork selection happen one layer up.

#![forbid(unsafe_code)]

pub mod call_create;
mod error;
pub mod eval;
mod memory;
mod opcode;
pub mod runtime;
mod stack;
pub mod utils;
mod valids;

pub use crate::error::{
	Capture, ExceptionalHaltReason, ExitError, ExitFatal, ExitResult, ExitSucceed,
};
pub use crate::eval::Control;
pub use crate::memory::{next_multiple_of_32, Memory};
pub use crate::opcode::Opcode;
pub use crate::runtime::{
	Context, Log, RuntimeBackend, RuntimeBaseBackend, RuntimeEnvironment, RuntimeHandler,
	RuntimeState, TransactionContext, Transfer,
};
pub use crate::stack::Stack;
pub use crate::valids::Valids;

use std::rc::Rc;

/// One frame's worth of EVM execution: code, input, program counter, stack
/// and memory. `S` is whatever the layer above needs to carry along.
pub struct Machine<S> {
	data: Rc<Vec<u8>>,
	code: Rc<Vec<u8>>,
	position: usize,
	valids: Valids,
	pub memory: Memory,
	pub stack: Stack,
	/// Output set by `RETURN` or `REVERT`.
	pub retval: Vec<u8>,
	pub state: S,
}

impl<S> Machine<S> {
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
		state: S,
	) -> Self {
		Self {
			valids: Valids::new(&code),
			data,
			code,
			position: 0,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
			retval: Vec::new(),
			state,
		}
	}

	/// Program counter.
	pub fn position(&self) -> usize {
		self.position
	}

	pub fn code(&self) -> &Rc<Vec<u8>> {
		&self.code
	}

	/// Call data of the frame.
	pub fn data(&self) -> &Rc<Vec<u8>> {
		&self.data
	}

	/// Whether `dest` is a `JUMPDEST` outside of push data.
	pub fn is_valid_jump(&self, dest: usize) -> bool {
		self.valids.is_valid(dest)
	}

	/// Move the program counter past the end so nothing runs anymore.
	pub fn exit(&mut self) {
		self.position = self.code.len();
	}

	pub fn is_exited(&self) -> bool {
		self.position >= self.code.len()
	}

	/// Opcode under the program counter, `None` once the code is exhausted.
	pub fn peek_opcode(&self) -> Option<Opcode> {
		self.code.get(self.position).copied().map(Opcode)
	}

	/// Apply the control flow returned by the opcode evaluated at `position`.
	pub fn advance(
		&mut self,
		position: usize,
		control: Control,
	) -> Result<(), Capture<ExitResult, Opcode>> {
		match control {
			Control::Continue => self.position = position + 1,
			Control::ContinueN(n) => self.position = position + n,
			Control::Jump(dest) if self.valids.is_valid(dest) => self.position = dest,
			Control::Jump(_) => {
				self.exit();
				return Err(Capture::Exit(
					ExceptionalHaltReason::InvalidJumpDestination.into(),
				));
			}
			Control::Exit(result) => {
				self.exit();
				return Err(Capture::Exit(result));
			}
			Control::Trap(opcode) => {
				self.position = position + 1;
				return Err(Capture::Trap(opcode));
			}
		}

		Ok(())
	}
}
