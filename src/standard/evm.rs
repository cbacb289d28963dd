use forkevm_interpreter::{
	Capture, ExitError, ExitResult, ExitSucceed, Opcode, RuntimeHandler,
};

use super::{Config, FrameState, MessageFrame, Operation, OperationCost, OperationTable};

/// One fork's interpreter: its config and the opcode table built from it.
#[derive(Clone)]
pub struct Evm {
	config: Config,
	table: OperationTable,
}

impl Evm {
	pub fn new(config: Config) -> Self {
		let table = OperationTable::new(&config);
		Self { config, table }
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn table(&self) -> &OperationTable {
		&self.table
	}

	/// Execute one opcode of `frame`. `Err` carries either the exit of the
	/// frame or the opcode it trapped on.
	pub fn step(
		&self,
		frame: &mut MessageFrame<'_>,
		handler: &mut dyn RuntimeHandler,
	) -> Result<(), Capture<ExitResult, Opcode>> {
		if frame.state() != FrameState::CodeExecuting {
			frame.set_state(FrameState::CodeExecuting);
		}

		let position = frame.machine.position();
		let opcode = match frame.machine.peek_opcode() {
			Some(opcode) => opcode,
			None => {
				frame.machine.exit();
				return Err(finish(frame, Capture::Exit(ExitSucceed::Stopped.into())));
			}
		};
		let operation = self.table.get(opcode);

		log::trace!(
			target: "evm",
			"depth {} pc {} {} gas {}",
			frame.depth,
			position,
			opcode,
			frame.gasometer.gas64()
		);

		if let Err(e) = charge(operation, frame, handler) {
			return Err(finish(frame, Capture::Exit(Err(e))));
		}
		frame.machine.state.gas = frame.gasometer.gas64();

		let control = (operation.execute)(&mut frame.machine, handler, opcode, position);
		frame
			.machine
			.advance(position, control)
			.map_err(|capture| finish(frame, capture))
	}

	/// Step until the frame exits or traps.
	pub fn run(
		&self,
		frame: &mut MessageFrame<'_>,
		handler: &mut dyn RuntimeHandler,
	) -> Capture<ExitResult, Opcode> {
		loop {
			if let Err(capture) = self.step(frame, handler) {
				return capture;
			}
		}
	}
}

fn charge(
	operation: &Operation,
	frame: &mut MessageFrame<'_>,
	handler: &dyn RuntimeHandler,
) -> Result<(), ExitError> {
	operation.check(&frame.machine, &frame.gasometer)?;

	match operation.cost {
		OperationCost::Fixed(cost) => frame.gasometer.record_fixed(cost),
		OperationCost::Dynamic(price) => {
			frame
				.gasometer
				.record_dynamic(price, operation.opcode, &frame.machine, handler)
		}
	}
}

fn finish(
	frame: &mut MessageFrame<'_>,
	capture: Capture<ExitResult, Opcode>,
) -> Capture<ExitResult, Opcode> {
	match &capture {
		Capture::Trap(_) => frame.set_state(FrameState::CodeSuspended),
		Capture::Exit(Ok(_)) => frame.set_state(FrameState::CodeSuccess),
		Capture::Exit(Err(ExitError::Reverted)) => frame.set_state(FrameState::Revert),
		Capture::Exit(Err(_)) => frame.halt(),
	}
	capture
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;
	use std::rc::Rc;

	use forkevm_interpreter::{
		Context, ExceptionalHaltReason, Log, RuntimeBackend, RuntimeBaseBackend,
		RuntimeEnvironment, RuntimeState, TransactionContext,
	};
	use primitive_types::{H160, H256, U256};

	use super::*;
	use crate::standard::{FrameType, GasometerState};

	#[derive(Default)]
	struct Storage {
		slots: BTreeMap<H256, H256>,
	}

	impl RuntimeEnvironment for Storage {
		fn block_hash(&self, _number: U256) -> H256 {
			H256::default()
		}
		fn block_number(&self) -> U256 {
			U256::zero()
		}
		fn block_coinbase(&self) -> H160 {
			H160::default()
		}
		fn block_timestamp(&self) -> U256 {
			U256::zero()
		}
		fn block_difficulty(&self) -> U256 {
			U256::zero()
		}
		fn block_gas_limit(&self) -> U256 {
			U256::zero()
		}
		fn chain_id(&self) -> U256 {
			U256::one()
		}
	}

	impl RuntimeBaseBackend for Storage {
		fn balance(&self, _address: H160) -> U256 {
			U256::zero()
		}
		fn code(&self, _address: H160) -> Vec<u8> {
			Vec::new()
		}
		fn storage(&self, _address: H160, index: H256) -> H256 {
			self.slots.get(&index).copied().unwrap_or_default()
		}
		fn exists(&self, _address: H160) -> bool {
			true
		}
		fn nonce(&self, _address: H160) -> U256 {
			U256::zero()
		}
	}

	impl RuntimeBackend for Storage {
		fn original_storage(&self, _address: H160, _index: H256) -> H256 {
			H256::default()
		}
		fn deleted(&self, _address: H160) -> bool {
			false
		}
		fn set_storage(&mut self, _address: H160, index: H256, value: H256) -> Result<(), ExitError> {
			self.slots.insert(index, value);
			Ok(())
		}
		fn log(&mut self, _log: Log) -> Result<(), ExitError> {
			Ok(())
		}
		fn mark_delete(&mut self, _address: H160) {}
		fn touch(&mut self, _address: H160) {}
		fn reset_storage(&mut self, _address: H160) {}
		fn set_code(&mut self, _address: H160, _code: Vec<u8>) -> Result<(), ExitError> {
			Ok(())
		}
		fn reset_balance(&mut self, _address: H160) {}
		fn deposit(&mut self, _target: H160, _value: U256) {}
		fn withdrawal(&mut self, _source: H160, _value: U256) -> Result<(), ExitError> {
			Ok(())
		}
		fn inc_nonce(&mut self, _address: H160) -> Result<(), ExitError> {
			Ok(())
		}
	}

	fn frame<'config>(code: &str, gas_limit: u64, config: &'config Config) -> MessageFrame<'config> {
		MessageFrame::new(
			FrameType::MessageCall,
			hex::decode(code).unwrap(),
			Vec::new(),
			RuntimeState {
				context: Context {
					address: H160::repeat_byte(0x11),
					caller: H160::repeat_byte(0x22),
					apparent_value: U256::zero(),
				},
				transaction_context: Rc::new(TransactionContext {
					gas_price: U256::zero(),
					origin: H160::repeat_byte(0x22),
				}),
				retbuf: Vec::new(),
				gas: 0,
			},
			GasometerState::new(gas_limit, false, config),
			0,
		)
	}

	#[test]
	fn return_of_empty_memory() {
		let evm = Evm::new(Config::istanbul());
		let mut storage = Storage::default();
		// PUSH1 0 PUSH1 0 RETURN
		let mut frame = frame("60006000f3", 100, evm.config());

		assert_eq!(frame.state(), FrameState::NotStarted);
		let exit = evm.run(&mut frame, &mut storage);
		assert_eq!(exit, Capture::Exit(Ok(ExitSucceed::Returned)));
		assert_eq!(frame.state(), FrameState::CodeSuccess);
		assert_eq!(frame.gasometer.total_used_gas(), 6);
		assert!(frame.output().is_empty());
	}

	#[test]
	fn end_of_code_stops() {
		let evm = Evm::new(Config::frontier());
		let mut storage = Storage::default();
		let mut frame = frame("6001", 100, evm.config());

		assert_eq!(evm.step(&mut frame, &mut storage), Ok(()));
		assert_eq!(frame.state(), FrameState::CodeExecuting);
		assert_eq!(
			evm.step(&mut frame, &mut storage),
			Err(Capture::Exit(Ok(ExitSucceed::Stopped)))
		);
		assert_eq!(frame.gasometer.gas64(), 97);
	}

	#[test]
	fn exceptional_halt_consumes_all_gas() {
		let evm = Evm::new(Config::istanbul());
		let mut storage = Storage::default();
		// PUSH1 0 JUMP
		let mut frame = frame("600056", 1_000, evm.config());

		assert_eq!(
			evm.run(&mut frame, &mut storage),
			Capture::Exit(Err(ExceptionalHaltReason::InvalidJumpDestination.into()))
		);
		assert_eq!(frame.state(), FrameState::ExceptionalHalt);
		assert_eq!(frame.gasometer.gas64(), 0);
	}

	#[test]
	fn revert_keeps_remaining_gas() {
		let evm = Evm::new(Config::byzantium());
		let mut storage = Storage::default();
		// PUSH1 0x2a PUSH1 0 MSTORE PUSH1 32 PUSH1 0 REVERT
		let mut frame = frame("602a60005260206000fd", 1_000, evm.config());

		assert_eq!(evm.run(&mut frame, &mut storage), Capture::Exit(Err(ExitError::Reverted)));
		assert_eq!(frame.state(), FrameState::Revert);
		assert_eq!(frame.gasometer.total_used_gas(), 3 + 3 + 6 + 3 + 3);
		assert_eq!(frame.output(), H256::from_low_u64_be(0x2a).as_bytes());
	}

	#[test]
	fn out_of_gas_before_execution() {
		let evm = Evm::new(Config::istanbul());
		let mut storage = Storage::default();
		// PUSH1 1 PUSH1 0 SSTORE
		let mut frame = frame("6001600055", 20_000, evm.config());

		assert_eq!(
			evm.run(&mut frame, &mut storage),
			Capture::Exit(Err(ExceptionalHaltReason::InsufficientGas.into()))
		);
		assert!(storage.slots.is_empty());
	}

	#[test]
	fn calls_trap_after_charging() {
		let evm = Evm::new(Config::istanbul());
		let mut storage = Storage::default();
		// PUSH1 0 DUP1 DUP1 DUP1 DUP1 PUSH1 0x11 PUSH2 0xffff CALL
		let mut frame = frame("600080808080601161fffff1", 10_000, evm.config());

		assert_eq!(evm.run(&mut frame, &mut storage), Capture::Trap(Opcode::CALL));
		assert_eq!(frame.state(), FrameState::CodeSuspended);
		assert_eq!(frame.gasometer.total_used_gas(), 3 * 7 + 700);
		assert_eq!(frame.machine.stack.len(), 7);
	}

	#[test]
	fn gas_reads_after_its_own_charge() {
		let evm = Evm::new(Config::istanbul());
		let mut storage = Storage::default();
		// GAS
		let mut frame = frame("5a", 100, evm.config());

		evm.run(&mut frame, &mut storage);
		assert_eq!(frame.machine.stack.peek(0).unwrap(), H256::from_low_u64_be(98));
	}
}
