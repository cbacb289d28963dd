use std::rc::Rc;

use forkevm_interpreter::{Machine, RuntimeState};

use super::{Config, GasometerState};

/// What a frame was started for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameType {
	MessageCall,
	ContractCreation,
}

/// Lifecycle of a frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrameState {
	NotStarted,
	CodeExecuting,
	/// `STOP`, `RETURN`, `SELFDESTRUCT` or end of code.
	CodeSuccess,
	/// Waiting for a child frame.
	CodeSuspended,
	Revert,
	ExceptionalHalt,
	/// Folded into the parent with its changes kept.
	CompletedSuccess,
	/// Folded into the parent with its changes dropped.
	CompletedFailed,
}

/// Execution context of one call or create.
///
/// The machine holds code, stack, memory, program counter and the call
/// context. Gas lives next to it in the gasometer. Logs, self-destructs and
/// storage writes go to the backend substate the frame was entered with.
pub struct MessageFrame<'config> {
	pub machine: Machine<RuntimeState>,
	pub gasometer: GasometerState<'config>,
	pub frame_type: FrameType,
	pub depth: usize,
	state: FrameState,
}

impl<'config> MessageFrame<'config> {
	pub fn new(
		frame_type: FrameType,
		code: Vec<u8>,
		input: Vec<u8>,
		runtime: RuntimeState,
		gasometer: GasometerState<'config>,
		depth: usize,
	) -> Self {
		let config: &Config = gasometer.config;
		let machine = Machine::new(
			Rc::new(code),
			Rc::new(input),
			config.stack_limit,
			config.memory_limit,
			runtime,
		);

		Self {
			machine,
			gasometer,
			frame_type,
			depth,
			state: FrameState::NotStarted,
		}
	}

	pub fn state(&self) -> FrameState {
		self.state
	}

	pub(crate) fn set_state(&mut self, state: FrameState) {
		self.state = state;
	}

	/// Stop the frame exceptionally: no output and no gas left.
	pub(crate) fn halt(&mut self) {
		self.machine.exit();
		self.machine.retval.clear();
		self.gasometer.oog();
		self.state = FrameState::ExceptionalHalt;
	}

	pub fn is_static(&self) -> bool {
		self.gasometer.is_static
	}

	/// Output of `RETURN` or `REVERT`, empty otherwise.
	pub fn output(&self) -> &[u8] {
		&self.machine.retval
	}
}
