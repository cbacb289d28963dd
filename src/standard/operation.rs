//! Opcode registry of one fork.
//!
//! Every byte maps to an [Operation] carrying its stack arity, how it is
//! priced, the evaluation function and an optional halt predicate. Tables are
//! built once per fork by layering the opcode sets each fork adds on top of
//! Frontier.

use core::fmt;

use forkevm_interpreter::{
	eval, Control, ExceptionalHaltReason, Machine, Opcode, RuntimeHandler, RuntimeState,
};
use primitive_types::{H256, U256};

use super::gasometer::consts::*;
use super::gasometer::{pricing, GasometerState, PriceFn};
use super::{Config, SstoreMetering};

/// Evaluation function of an operation.
pub type Efn = fn(&mut Machine<RuntimeState>, &mut dyn RuntimeHandler, Opcode, usize) -> Control;

/// Exceptional halt predicate, consulted after the stack check and before
/// anything is charged.
pub type HaltFn =
	fn(Opcode, &Machine<RuntimeState>, &GasometerState<'_>) -> Result<(), ExceptionalHaltReason>;

macro_rules! efn {
	( $eval:path ) => {{
		let execute: Efn =
			|machine, handler, opcode, position| $eval(machine, handler, opcode, position);
		execute
	}};
}

/// How an operation is priced.
#[derive(Clone, Copy, Debug)]
pub enum OperationCost {
	/// Cost fixed for the fork when the table is built.
	Fixed(u64),
	/// Cost depends on operands, memory growth or the world state.
	Dynamic(PriceFn),
}

/// Descriptor of one opcode under one fork.
#[derive(Clone, Copy)]
pub struct Operation {
	pub opcode: Opcode,
	/// Words popped.
	pub inputs: usize,
	/// Words pushed.
	pub outputs: usize,
	pub cost: OperationCost,
	pub execute: Efn,
	pub halt: Option<HaltFn>,
}

impl Operation {
	fn invalid(opcode: Opcode) -> Self {
		Self {
			opcode,
			inputs: 0,
			outputs: 0,
			cost: OperationCost::Fixed(G_ZERO),
			execute: efn!(eval::eval_invalid),
			halt: Some(halt_invalid),
		}
	}

	/// Mnemonic of the opcode.
	pub fn name(&self) -> &'static str {
		self.opcode.name()
	}

	/// Uniform precondition check: stack arity first, then the operation's
	/// own halt predicate.
	pub fn check(
		&self,
		machine: &Machine<RuntimeState>,
		gasometer: &GasometerState<'_>,
	) -> Result<(), ExceptionalHaltReason> {
		machine.stack.check_pop_push(self.inputs, self.outputs)?;
		if let Some(halt) = self.halt {
			halt(self.opcode, machine, gasometer)?;
		}
		Ok(())
	}
}

impl fmt::Debug for Operation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Operation")
			.field("opcode", &self.opcode)
			.field("inputs", &self.inputs)
			.field("outputs", &self.outputs)
			.field("cost", &self.cost)
			.field("halt", &self.halt.is_some())
			.finish()
	}
}

/// Fixed 256-entry opcode table.
#[derive(Clone)]
pub struct OperationTable {
	operations: Box<[Operation; 256]>,
}

impl OperationTable {
	/// Build the table for the fork described by `config`.
	pub fn new(config: &Config) -> Self {
		let mut operations = Box::new([Operation::invalid(Opcode::INVALID); 256]);
		for (byte, operation) in operations.iter_mut().enumerate() {
			operation.opcode = Opcode(byte as u8);
		}

		let mut table = Self { operations };
		table.register_frontier(config);
		table.register_homestead(config);
		table.register_byzantium(config);
		table.register_constantinople(config);
		table.register_istanbul(config);
		table
	}

	pub fn get(&self, opcode: Opcode) -> &Operation {
		&self.operations[opcode.as_usize()]
	}

	/// Iterate over all 256 entries, in opcode order.
	pub fn iter(&self) -> impl Iterator<Item = &Operation> {
		self.operations.iter()
	}

	fn set(&mut self, opcode: Opcode, inputs: usize, outputs: usize, cost: OperationCost, execute: Efn) {
		self.operations[opcode.as_usize()] = Operation {
			opcode,
			inputs,
			outputs,
			cost,
			execute,
			halt: None,
		};
	}

	fn set_halt(&mut self, opcode: Opcode, halt: HaltFn) {
		self.operations[opcode.as_usize()].halt = Some(halt);
	}

	fn register_frontier(&mut self, config: &Config) {
		use OperationCost::{Dynamic, Fixed};

		self.set(Opcode::STOP, 0, 0, Fixed(G_ZERO), efn!(eval::eval_stop));

		self.set(Opcode::ADD, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_add));
		self.set(Opcode::MUL, 2, 1, Fixed(G_LOW), efn!(eval::eval_mul));
		self.set(Opcode::SUB, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_sub));
		self.set(Opcode::DIV, 2, 1, Fixed(G_LOW), efn!(eval::eval_div));
		self.set(Opcode::SDIV, 2, 1, Fixed(G_LOW), efn!(eval::eval_sdiv));
		self.set(Opcode::MOD, 2, 1, Fixed(G_LOW), efn!(eval::eval_mod));
		self.set(Opcode::SMOD, 2, 1, Fixed(G_LOW), efn!(eval::eval_smod));
		self.set(Opcode::ADDMOD, 3, 1, Fixed(G_MID), efn!(eval::eval_addmod));
		self.set(Opcode::MULMOD, 3, 1, Fixed(G_MID), efn!(eval::eval_mulmod));
		self.set(Opcode::EXP, 2, 1, Dynamic(pricing::exp), efn!(eval::eval_exp));
		self.set(Opcode::SIGNEXTEND, 2, 1, Fixed(G_LOW), efn!(eval::eval_signextend));

		self.set(Opcode::LT, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_lt));
		self.set(Opcode::GT, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_gt));
		self.set(Opcode::SLT, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_slt));
		self.set(Opcode::SGT, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_sgt));
		self.set(Opcode::EQ, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_eq));
		self.set(Opcode::ISZERO, 1, 1, Fixed(G_VERYLOW), efn!(eval::eval_iszero));
		self.set(Opcode::AND, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_and));
		self.set(Opcode::OR, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_or));
		self.set(Opcode::XOR, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_xor));
		self.set(Opcode::NOT, 1, 1, Fixed(G_VERYLOW), efn!(eval::eval_not));
		self.set(Opcode::BYTE, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_byte));

		self.set(Opcode::SHA3, 2, 1, Dynamic(pricing::sha3), efn!(eval::eval_sha3));

		self.set(Opcode::ADDRESS, 0, 1, Fixed(G_BASE), efn!(eval::eval_address));
		self.set(Opcode::BALANCE, 1, 1, Fixed(config.gas.balance), efn!(eval::eval_balance));
		self.set(Opcode::ORIGIN, 0, 1, Fixed(G_BASE), efn!(eval::eval_origin));
		self.set(Opcode::CALLER, 0, 1, Fixed(G_BASE), efn!(eval::eval_caller));
		self.set(Opcode::CALLVALUE, 0, 1, Fixed(G_BASE), efn!(eval::eval_callvalue));
		self.set(Opcode::CALLDATALOAD, 1, 1, Fixed(G_VERYLOW), efn!(eval::eval_calldataload));
		self.set(Opcode::CALLDATASIZE, 0, 1, Fixed(G_BASE), efn!(eval::eval_calldatasize));
		self.set(Opcode::CALLDATACOPY, 3, 0, Dynamic(pricing::data_copy), efn!(eval::eval_calldatacopy));
		self.set(Opcode::CODESIZE, 0, 1, Fixed(G_BASE), efn!(eval::eval_codesize));
		self.set(Opcode::CODECOPY, 3, 0, Dynamic(pricing::data_copy), efn!(eval::eval_codecopy));
		self.set(Opcode::GASPRICE, 0, 1, Fixed(G_BASE), efn!(eval::eval_gasprice));
		self.set(
			Opcode::EXTCODESIZE,
			1,
			1,
			Fixed(config.gas.ext_code),
			efn!(eval::eval_extcodesize),
		);
		self.set(Opcode::EXTCODECOPY, 4, 0, Dynamic(pricing::extcodecopy), efn!(eval::eval_extcodecopy));

		self.set(Opcode::BLOCKHASH, 1, 1, Fixed(G_BLOCKHASH), efn!(eval::eval_blockhash));
		self.set(Opcode::COINBASE, 0, 1, Fixed(G_BASE), efn!(eval::eval_coinbase));
		self.set(Opcode::TIMESTAMP, 0, 1, Fixed(G_BASE), efn!(eval::eval_timestamp));
		self.set(Opcode::NUMBER, 0, 1, Fixed(G_BASE), efn!(eval::eval_number));
		self.set(Opcode::DIFFICULTY, 0, 1, Fixed(G_BASE), efn!(eval::eval_difficulty));
		self.set(Opcode::GASLIMIT, 0, 1, Fixed(G_BASE), efn!(eval::eval_gaslimit));

		self.set(Opcode::POP, 1, 0, Fixed(G_BASE), efn!(eval::eval_pop));
		self.set(Opcode::MLOAD, 1, 1, Dynamic(pricing::memory_access), efn!(eval::eval_mload));
		self.set(Opcode::MSTORE, 2, 0, Dynamic(pricing::memory_access), efn!(eval::eval_mstore));
		self.set(Opcode::MSTORE8, 2, 0, Dynamic(pricing::memory_access), efn!(eval::eval_mstore8));
		self.set(Opcode::SLOAD, 1, 1, Fixed(config.gas.sload), efn!(eval::eval_sload));
		self.set(Opcode::SSTORE, 2, 0, Dynamic(pricing::sstore), efn!(eval::eval_sstore));
		self.set_halt(Opcode::SSTORE, halt_static_write);
		self.set(Opcode::JUMP, 1, 0, Fixed(G_MID), efn!(eval::eval_jump));
		self.set_halt(Opcode::JUMP, halt_jump);
		self.set(Opcode::JUMPI, 2, 0, Fixed(G_HIGH), efn!(eval::eval_jumpi));
		self.set_halt(Opcode::JUMPI, halt_jumpi);
		self.set(Opcode::PC, 0, 1, Fixed(G_BASE), efn!(eval::eval_pc));
		self.set(Opcode::MSIZE, 0, 1, Fixed(G_BASE), efn!(eval::eval_msize));
		self.set(Opcode::GAS, 0, 1, Fixed(G_BASE), efn!(eval::eval_gas));
		self.set(Opcode::JUMPDEST, 0, 0, Fixed(G_JUMPDEST), efn!(eval::eval_jumpdest));

		for n in 0..32u8 {
			self.set(
				Opcode(Opcode::PUSH1.as_u8() + n),
				0,
				1,
				Fixed(G_VERYLOW),
				efn!(eval::eval_push),
			);
		}
		for n in 0..16u8 {
			let depth = n as usize + 1;
			self.set(
				Opcode(Opcode::DUP1.as_u8() + n),
				depth,
				depth + 1,
				Fixed(G_VERYLOW),
				efn!(eval::eval_dup),
			);
			self.set(
				Opcode(Opcode::SWAP1.as_u8() + n),
				depth + 1,
				depth + 1,
				Fixed(G_VERYLOW),
				efn!(eval::eval_swap),
			);
		}
		for n in 0..5u8 {
			let opcode = Opcode(Opcode::LOG0.as_u8() + n);
			self.set(opcode, n as usize + 2, 0, Dynamic(pricing::log), efn!(eval::eval_log));
			self.set_halt(opcode, halt_static_write);
		}

		self.set(Opcode::CREATE, 3, 1, Dynamic(pricing::create), efn!(eval::eval_call_create));
		self.set_halt(Opcode::CREATE, halt_static_write);
		self.set(Opcode::CALL, 7, 1, Dynamic(pricing::call), efn!(eval::eval_call_create));
		self.set_halt(Opcode::CALL, halt_static_call_value);
		self.set(Opcode::CALLCODE, 7, 1, Dynamic(pricing::call), efn!(eval::eval_call_create));
		self.set(Opcode::RETURN, 2, 0, Dynamic(pricing::output), efn!(eval::eval_return));
		self.set(Opcode::SELFDESTRUCT, 1, 0, Dynamic(pricing::selfdestruct), efn!(eval::eval_selfdestruct));
		self.set_halt(Opcode::SELFDESTRUCT, halt_static_write);
	}

	fn register_homestead(&mut self, config: &Config) {
		if config.has_delegate_call {
			self.set(
				Opcode::DELEGATECALL,
				6,
				1,
				OperationCost::Dynamic(pricing::call),
				efn!(eval::eval_call_create),
			);
		}
	}

	fn register_byzantium(&mut self, config: &Config) {
		use OperationCost::{Dynamic, Fixed};

		if config.has_static_call {
			self.set(Opcode::STATICCALL, 6, 1, Dynamic(pricing::call), efn!(eval::eval_call_create));
		}
		if config.has_revert {
			self.set(Opcode::REVERT, 2, 0, Dynamic(pricing::output), efn!(eval::eval_revert));
		}
		if config.has_return_data {
			self.set(
				Opcode::RETURNDATASIZE,
				0,
				1,
				Fixed(G_BASE),
				efn!(eval::eval_returndatasize),
			);
			self.set(
				Opcode::RETURNDATACOPY,
				3,
				0,
				Dynamic(pricing::data_copy),
				efn!(eval::eval_returndatacopy),
			);
		}
	}

	fn register_constantinople(&mut self, config: &Config) {
		use OperationCost::{Dynamic, Fixed};

		if config.has_bitwise_shifting {
			self.set(Opcode::SHL, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_shl));
			self.set(Opcode::SHR, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_shr));
			self.set(Opcode::SAR, 2, 1, Fixed(G_VERYLOW), efn!(eval::eval_sar));
		}
		if config.has_create2 {
			self.set(Opcode::CREATE2, 4, 1, Dynamic(pricing::create2), efn!(eval::eval_call_create));
			self.set_halt(Opcode::CREATE2, halt_static_write);
		}
		if config.has_ext_code_hash {
			self.set(
				Opcode::EXTCODEHASH,
				1,
				1,
				Fixed(config.gas.ext_code_hash),
				efn!(eval::eval_extcodehash),
			);
		}
	}

	fn register_istanbul(&mut self, config: &Config) {
		use OperationCost::Fixed;

		if config.has_chain_id {
			self.set(Opcode::CHAINID, 0, 1, Fixed(G_BASE), efn!(eval::eval_chainid));
		}
		if config.has_self_balance {
			self.set(Opcode::SELFBALANCE, 0, 1, Fixed(G_LOW), efn!(eval::eval_selfbalance));
		}
		if config.sstore_metering == SstoreMetering::Eip2200 {
			self.set_halt(Opcode::SSTORE, halt_sstore_stipend);
		}
	}
}

fn halt_invalid(
	opcode: Opcode,
	_machine: &Machine<RuntimeState>,
	_gasometer: &GasometerState<'_>,
) -> Result<(), ExceptionalHaltReason> {
	Err(ExceptionalHaltReason::InvalidOperation(opcode))
}

fn halt_static_write(
	_opcode: Opcode,
	_machine: &Machine<RuntimeState>,
	gasometer: &GasometerState<'_>,
) -> Result<(), ExceptionalHaltReason> {
	if gasometer.is_static {
		Err(ExceptionalHaltReason::IllegalStateChange)
	} else {
		Ok(())
	}
}

fn halt_static_call_value(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	gasometer: &GasometerState<'_>,
) -> Result<(), ExceptionalHaltReason> {
	if gasometer.is_static && machine.stack.peek(2)? != H256::zero() {
		Err(ExceptionalHaltReason::IllegalStateChange)
	} else {
		Ok(())
	}
}

// EIP-1706: no SSTORE once the frame is down to the call stipend.
fn halt_sstore_stipend(
	opcode: Opcode,
	machine: &Machine<RuntimeState>,
	gasometer: &GasometerState<'_>,
) -> Result<(), ExceptionalHaltReason> {
	halt_static_write(opcode, machine, gasometer)?;
	if gasometer.gas64() <= G_CALLSTIPEND {
		Err(ExceptionalHaltReason::InsufficientGas)
	} else {
		Ok(())
	}
}

fn check_jump_destination(
	machine: &Machine<RuntimeState>,
	dest: H256,
) -> Result<(), ExceptionalHaltReason> {
	let dest = U256::from_big_endian(&dest[..]);
	if dest > U256::from(usize::MAX) || !machine.is_valid_jump(dest.as_usize()) {
		Err(ExceptionalHaltReason::InvalidJumpDestination)
	} else {
		Ok(())
	}
}

fn halt_jump(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_gasometer: &GasometerState<'_>,
) -> Result<(), ExceptionalHaltReason> {
	check_jump_destination(machine, machine.stack.peek(0)?)
}

fn halt_jumpi(
	_opcode: Opcode,
	machine: &Machine<RuntimeState>,
	_gasometer: &GasometerState<'_>,
) -> Result<(), ExceptionalHaltReason> {
	if machine.stack.peek(1)? == H256::zero() {
		Ok(())
	} else {
		check_jump_destination(machine, machine.stack.peek(0)?)
	}
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use forkevm_interpreter::{Context, TransactionContext};
	use primitive_types::H160;

	use super::*;

	fn machine(code: &str, stack: &[u64]) -> Machine<RuntimeState> {
		let mut machine = Machine::new(
			Rc::new(hex::decode(code).unwrap()),
			Rc::new(Vec::new()),
			1024,
			usize::MAX,
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
		);
		for value in stack {
			machine.stack.push(H256::from_low_u64_be(*value)).unwrap();
		}
		machine
	}

	#[test]
	fn opcode_sets_follow_forks() {
		let frontier = OperationTable::new(&Config::frontier());
		let homestead = OperationTable::new(&Config::homestead());
		let byzantium = OperationTable::new(&Config::byzantium());
		let istanbul = OperationTable::new(&Config::istanbul());

		assert!(frontier.get(Opcode::DELEGATECALL).halt.is_some());
		assert!(homestead.get(Opcode::DELEGATECALL).halt.is_none());
		assert!(homestead.get(Opcode::REVERT).halt.is_some());
		assert!(byzantium.get(Opcode::REVERT).halt.is_none());
		assert!(byzantium.get(Opcode::SHL).halt.is_some());
		assert!(byzantium.get(Opcode::CHAINID).halt.is_some());
		assert!(istanbul.get(Opcode::CHAINID).halt.is_none());
		assert_eq!(istanbul.get(Opcode::CREATE2).inputs, 4);
		assert_eq!(istanbul.iter().count(), 256);
	}

	#[test]
	fn fixed_costs_are_taken_from_the_fork() {
		let balance = |config: Config| OperationTable::new(&config).get(Opcode::BALANCE).cost;
		assert!(matches!(balance(Config::frontier()), OperationCost::Fixed(20)));
		assert!(matches!(balance(Config::tangerine_whistle()), OperationCost::Fixed(400)));
		assert!(matches!(balance(Config::istanbul()), OperationCost::Fixed(700)));

		let istanbul = OperationTable::new(&Config::istanbul());
		assert!(matches!(istanbul.get(Opcode::SLOAD).cost, OperationCost::Fixed(800)));
		assert!(matches!(istanbul.get(Opcode::SELFBALANCE).cost, OperationCost::Fixed(5)));
		assert!(matches!(istanbul.get(Opcode::SSTORE).cost, OperationCost::Dynamic(_)));
	}

	#[test]
	fn unassigned_bytes_halt() {
		let config = Config::istanbul();
		let table = OperationTable::new(&config);
		let gasometer = GasometerState::new(100_000, false, &config);
		let machine = machine("0c", &[]);

		assert_eq!(table.get(Opcode(0x0c)).name(), "UNASSIGNED");
		assert_eq!(
			table.get(Opcode(0x0c)).check(&machine, &gasometer),
			Err(ExceptionalHaltReason::InvalidOperation(Opcode(0x0c)))
		);
		assert_eq!(
			table.get(Opcode::INVALID).check(&machine, &gasometer),
			Err(ExceptionalHaltReason::InvalidOperation(Opcode::INVALID))
		);
	}

	#[test]
	fn stack_is_checked_before_the_predicate() {
		let config = Config::istanbul();
		let table = OperationTable::new(&config);
		let gasometer = GasometerState::new(100_000, true, &config);

		assert_eq!(
			table
				.get(Opcode::SSTORE)
				.check(&machine("55", &[1]), &gasometer),
			Err(ExceptionalHaltReason::StackUnderflow)
		);
		assert_eq!(
			table
				.get(Opcode::SSTORE)
				.check(&machine("55", &[1, 1]), &gasometer),
			Err(ExceptionalHaltReason::IllegalStateChange)
		);

		let full = machine("80", &[0; 1024]);
		assert_eq!(
			table.get(Opcode::DUP1).check(&full, &gasometer),
			Err(ExceptionalHaltReason::StackOverflow)
		);
	}

	#[test]
	fn static_frames_reject_writes() {
		let config = Config::istanbul();
		let table = OperationTable::new(&config);
		let gasometer = GasometerState::new(100_000, true, &config);

		// out_len, out_offset, in_len, in_offset, value, to, gas
		let with_value = machine("f1", &[0, 0, 0, 0, 1, 0x11, 0]);
		let without_value = machine("f1", &[0, 0, 0, 0, 0, 0x11, 0]);
		assert_eq!(
			table.get(Opcode::CALL).check(&with_value, &gasometer),
			Err(ExceptionalHaltReason::IllegalStateChange)
		);
		assert_eq!(table.get(Opcode::CALL).check(&without_value, &gasometer), Ok(()));
		assert_eq!(
			table.get(Opcode::LOG2).check(&machine("a2", &[0, 0, 0, 0]), &gasometer),
			Err(ExceptionalHaltReason::IllegalStateChange)
		);
		assert_eq!(
			table
				.get(Opcode::SELFDESTRUCT)
				.check(&machine("ff", &[0]), &gasometer),
			Err(ExceptionalHaltReason::IllegalStateChange)
		);
	}

	#[test]
	fn sstore_needs_more_than_the_stipend() {
		let config = Config::istanbul();
		let table = OperationTable::new(&config);
		let machine = machine("55", &[1, 0]);

		let low = GasometerState::new(2_300, false, &config);
		assert_eq!(
			table.get(Opcode::SSTORE).check(&machine, &low),
			Err(ExceptionalHaltReason::InsufficientGas)
		);
		let enough = GasometerState::new(2_301, false, &config);
		assert_eq!(table.get(Opcode::SSTORE).check(&machine, &enough), Ok(()));

		let constantinople = Config::constantinople();
		let table = OperationTable::new(&constantinople);
		let low = GasometerState::new(2_300, false, &constantinople);
		assert_eq!(table.get(Opcode::SSTORE).check(&machine, &low), Ok(()));
	}

	#[test]
	fn jump_destinations_are_validated() {
		let config = Config::frontier();
		let table = OperationTable::new(&config);
		let gasometer = GasometerState::new(100_000, false, &config);

		// PUSH1 0x03 JUMP JUMPDEST
		assert_eq!(table.get(Opcode::JUMP).check(&machine("6003565b", &[3]), &gasometer), Ok(()));
		assert_eq!(
			table.get(Opcode::JUMP).check(&machine("6003565b", &[2]), &gasometer),
			Err(ExceptionalHaltReason::InvalidJumpDestination)
		);
		// A JUMPDEST byte inside push data is not a destination.
		assert_eq!(
			table.get(Opcode::JUMP).check(&machine("605b56", &[1]), &gasometer),
			Err(ExceptionalHaltReason::InvalidJumpDestination)
		);
		// cond, dest: a false condition never jumps.
		assert_eq!(table.get(Opcode::JUMPI).check(&machine("57", &[0, 9]), &gasometer), Ok(()));
		assert_eq!(
			table.get(Opcode::JUMPI).check(&machine("57", &[1, 9]), &gasometer),
			Err(ExceptionalHaltReason::InvalidJumpDestination)
		);
	}
}
