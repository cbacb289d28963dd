//! Opcode evaluation.
//!
//! Every `eval_*` function has the same shape so that an operation table can
//! hold them as plain function pointers. Gas and stack arity are checked by
//! the caller before evaluation. The helpers behind them return a [Step] and
//! use `?`; a failed step becomes [Control::Exit] at this boundary.

mod arithmetic;
mod bitwise;
mod misc;
mod system;

pub use self::system::BLOCK_HASH_WINDOW;

use primitive_types::U256;

use crate::{
	ExceptionalHaltReason, ExitError, ExitResult, ExitSucceed, Machine, Opcode, RuntimeHandler,
	RuntimeState,
};

/// What the machine does after an evaluation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Control {
	/// Move to the next opcode.
	Continue,
	/// Skip `n` bytes, used by `PUSHn`.
	ContinueN(usize),
	/// Exit the machine.
	Exit(ExitResult),
	/// Jump to the given position.
	Jump(usize),
	/// Suspend the machine for a sub-call or create.
	Trap(Opcode),
}

/// Outcome of an evaluation helper.
type Step = Result<Control, ExitError>;

impl From<Step> for Control {
	fn from(step: Step) -> Self {
		step.unwrap_or_else(|e| Control::Exit(Err(e)))
	}
}

fn unary<S>(machine: &mut Machine<S>, op: fn(U256) -> U256) -> Step {
	let a = machine.stack.pop_u256()?;
	machine.stack.push_u256(op(a))?;
	Ok(Control::Continue)
}

fn binary<S>(machine: &mut Machine<S>, op: fn(U256, U256) -> U256) -> Step {
	let a = machine.stack.pop_u256()?;
	let b = machine.stack.pop_u256()?;
	machine.stack.push_u256(op(a, b))?;
	Ok(Control::Continue)
}

fn ternary<S>(machine: &mut Machine<S>, op: fn(U256, U256, U256) -> U256) -> Step {
	let a = machine.stack.pop_u256()?;
	let b = machine.stack.pop_u256()?;
	let c = machine.stack.pop_u256()?;
	machine.stack.push_u256(op(a, b, c))?;
	Ok(Control::Continue)
}

fn predicate<S>(machine: &mut Machine<S>, op: fn(U256, U256) -> bool) -> Step {
	let a = machine.stack.pop_u256()?;
	let b = machine.stack.pop_u256()?;
	machine.stack.push_u256(U256::from(op(a, b) as u8))?;
	Ok(Control::Continue)
}

/// Operations that only work on the stack and memory.
macro_rules! machine_ops {
	( $( $(#[$attr:meta])* $name:ident($machine:ident) => $body:expr; )* ) => {
		$(
			$(#[$attr])*
			pub fn $name<S, H: ?Sized>(
				$machine: &mut Machine<S>,
				_handler: &mut H,
				_opcode: Opcode,
				_position: usize,
			) -> Control {
				Control::from($body)
			}
		)*
	};
}

/// Operations that also read the call context.
macro_rules! context_ops {
	( $( $(#[$attr:meta])* $name:ident($machine:ident) => $body:expr; )* ) => {
		$(
			$(#[$attr])*
			pub fn $name<S: AsRef<RuntimeState>, H: ?Sized>(
				$machine: &mut Machine<S>,
				_handler: &mut H,
				_opcode: Opcode,
				_position: usize,
			) -> Control {
				Control::from($body)
			}
		)*
	};
}

/// Operations that query or modify the world through the handler.
macro_rules! handler_ops {
	( $( $(#[$attr:meta])* $name:ident($machine:ident, $handler:ident) => $body:expr; )* ) => {
		$(
			$(#[$attr])*
			pub fn $name<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
				$machine: &mut Machine<S>,
				$handler: &mut H,
				_opcode: Opcode,
				_position: usize,
			) -> Control {
				Control::from($body)
			}
		)*
	};
}

machine_ops! {
	/// `STOP`
	eval_stop(_machine) => Control::Exit(ExitSucceed::Stopped.into());
	/// `JUMPDEST`
	eval_jumpdest(_machine) => Control::Continue;

	eval_add(machine) => binary(machine, |a, b| a.overflowing_add(b).0);
	eval_mul(machine) => binary(machine, |a, b| a.overflowing_mul(b).0);
	eval_sub(machine) => binary(machine, |a, b| a.overflowing_sub(b).0);
	eval_div(machine) => binary(machine, self::arithmetic::div);
	eval_sdiv(machine) => binary(machine, self::arithmetic::sdiv);
	eval_mod(machine) => binary(machine, self::arithmetic::rem);
	eval_smod(machine) => binary(machine, self::arithmetic::srem);
	eval_addmod(machine) => ternary(machine, self::arithmetic::addmod);
	eval_mulmod(machine) => ternary(machine, self::arithmetic::mulmod);
	eval_exp(machine) => binary(machine, self::arithmetic::exp);
	eval_signextend(machine) => binary(machine, self::arithmetic::signextend);

	eval_lt(machine) => predicate(machine, |a, b| a < b);
	eval_gt(machine) => predicate(machine, |a, b| a > b);
	eval_slt(machine) => predicate(machine, self::bitwise::slt);
	eval_sgt(machine) => predicate(machine, self::bitwise::sgt);
	eval_eq(machine) => predicate(machine, |a, b| a == b);
	eval_iszero(machine) => unary(machine, |a| U256::from(a.is_zero() as u8));
	eval_and(machine) => binary(machine, |a, b| a & b);
	eval_or(machine) => binary(machine, |a, b| a | b);
	eval_xor(machine) => binary(machine, |a, b| a ^ b);
	eval_not(machine) => unary(machine, |a| !a);
	eval_byte(machine) => binary(machine, self::bitwise::byte);
	eval_shl(machine) => binary(machine, self::bitwise::shl);
	eval_shr(machine) => binary(machine, self::bitwise::shr);
	eval_sar(machine) => binary(machine, self::bitwise::sar);

	eval_codesize(machine) => self::misc::codesize(machine);
	eval_codecopy(machine) => self::misc::codecopy(machine);
	eval_calldataload(machine) => self::misc::calldataload(machine);
	eval_calldatasize(machine) => self::misc::calldatasize(machine);
	eval_calldatacopy(machine) => self::misc::calldatacopy(machine);
	eval_pop(machine) => self::misc::pop(machine);
	eval_mload(machine) => self::misc::mload(machine);
	eval_mstore(machine) => self::misc::mstore(machine);
	eval_mstore8(machine) => self::misc::mstore8(machine);
	eval_jump(machine) => self::misc::jump(machine);
	eval_jumpi(machine) => self::misc::jumpi(machine);
	eval_msize(machine) => self::misc::msize(machine);
	/// `RETURN`
	eval_return(machine) => self::misc::ret(machine);
	/// `REVERT`
	eval_revert(machine) => self::misc::revert(machine);
}

context_ops! {
	/// `SHA3` over a memory range.
	eval_sha3(machine) => self::system::sha3(machine);
	eval_address(machine) => self::system::address(machine);
	eval_origin(machine) => self::system::origin(machine);
	eval_caller(machine) => self::system::caller(machine);
	eval_callvalue(machine) => self::system::callvalue(machine);
	eval_gasprice(machine) => self::system::gasprice(machine);
	eval_returndatasize(machine) => self::system::returndatasize(machine);
	eval_returndatacopy(machine) => self::system::returndatacopy(machine);
	/// `GAS`, after the operation's own cost is paid.
	eval_gas(machine) => self::system::gas(machine);
}

handler_ops! {
	eval_balance(machine, handler) => self::system::balance(machine, handler);
	eval_selfbalance(machine, handler) => self::system::selfbalance(machine, handler);
	eval_extcodesize(machine, handler) => self::system::extcodesize(machine, handler);
	eval_extcodehash(machine, handler) => self::system::extcodehash(machine, handler);
	eval_extcodecopy(machine, handler) => self::system::extcodecopy(machine, handler);

	eval_blockhash(machine, handler) => self::system::blockhash(machine, handler);
	eval_coinbase(machine, handler) => self::system::coinbase(machine, handler);
	eval_timestamp(machine, handler) => self::system::timestamp(machine, handler);
	eval_number(machine, handler) => self::system::number(machine, handler);
	eval_difficulty(machine, handler) => self::system::difficulty(machine, handler);
	eval_gaslimit(machine, handler) => self::system::gaslimit(machine, handler);
	eval_chainid(machine, handler) => self::system::chainid(machine, handler);

	eval_sload(machine, handler) => self::system::sload(machine, handler);
	eval_sstore(machine, handler) => self::system::sstore(machine, handler);
	eval_selfdestruct(machine, handler) => self::system::selfdestruct(machine, handler);
}

/// `PC`
pub fn eval_pc<S, H: ?Sized>(
	machine: &mut Machine<S>,
	_handler: &mut H,
	_opcode: Opcode,
	position: usize,
) -> Control {
	self::misc::pc(machine, position).into()
}

/// `PUSH1` to `PUSH32`
pub fn eval_push<S, H: ?Sized>(
	machine: &mut Machine<S>,
	_handler: &mut H,
	opcode: Opcode,
	position: usize,
) -> Control {
	let n = opcode.is_push().unwrap_or(1) as usize;
	self::misc::push(machine, n, position).into()
}

/// `DUP1` to `DUP16`
pub fn eval_dup<S, H: ?Sized>(
	machine: &mut Machine<S>,
	_handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::dup(machine, (opcode.as_u8() - Opcode::DUP1.as_u8()) as usize + 1).into()
}

/// `SWAP1` to `SWAP16`
pub fn eval_swap<S, H: ?Sized>(
	machine: &mut Machine<S>,
	_handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::swap(machine, (opcode.as_u8() - Opcode::SWAP1.as_u8()) as usize + 1).into()
}

/// `LOG0` to `LOG4`
pub fn eval_log<S: AsRef<RuntimeState>, H: RuntimeHandler + ?Sized>(
	machine: &mut Machine<S>,
	handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::log(machine, opcode.as_u8() - Opcode::LOG0.as_u8(), handler).into()
}

/// `INVALID`, and every byte the active fork leaves unassigned.
pub fn eval_invalid<S, H: ?Sized>(
	_machine: &mut Machine<S>,
	_handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	Control::Exit(ExceptionalHaltReason::InvalidOperation(opcode).into())
}

/// `CREATE`, `CREATE2` and the `CALL` family. The machine suspends and the
/// caller builds the child frame from the stack.
pub fn eval_call_create<S, H: ?Sized>(
	_machine: &mut Machine<S>,
	_handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	Control::Trap(opcode)
}

#[cfg(test)]
mod tests {
	use std::rc::Rc;

	use primitive_types::{H160, H256};

	use super::*;
	use crate::{Context, TransactionContext};

	fn machine(code: &[u8]) -> Machine<RuntimeState> {
		Machine::new(
			Rc::new(code.to_vec()),
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
					gas_price: U256::one(),
					origin: H160::repeat_byte(0x22),
				}),
				retbuf: Vec::new(),
				gas: 0,
			},
		)
	}

	#[test]
	fn push_reads_truncated_immediate_as_zero() {
		let mut machine = machine(&[0x61, 0x01]);
		let control = eval_push(&mut machine, &mut (), Opcode::PUSH2, 0);

		assert_eq!(control, Control::ContinueN(3));
		assert_eq!(machine.stack.peek(0), Ok(H256::from_low_u64_be(0x0100)));
	}

	#[test]
	fn dup_and_swap_derive_depth_from_opcode() {
		let mut machine = machine(&[]);
		machine.stack.push(H256::from_low_u64_be(1)).unwrap();
		machine.stack.push(H256::from_low_u64_be(2)).unwrap();

		assert_eq!(eval_dup(&mut machine, &mut (), Opcode::DUP2, 0), Control::Continue);
		assert_eq!(machine.stack.peek(0), Ok(H256::from_low_u64_be(1)));

		assert_eq!(eval_swap(&mut machine, &mut (), Opcode::SWAP2, 0), Control::Continue);
		assert_eq!(machine.stack.peek(0), Ok(H256::from_low_u64_be(1)));
		assert_eq!(machine.stack.peek(2), Ok(H256::from_low_u64_be(1)));
		assert_eq!(machine.stack.peek(1), Ok(H256::from_low_u64_be(2)));
	}

	#[test]
	fn return_copies_memory_into_retval() {
		let mut machine = machine(&[]);
		machine.memory.set(0, &[0xaa, 0xbb], None).unwrap();
		machine.stack.push(H256::from_low_u64_be(2)).unwrap();
		machine.stack.push(H256::zero()).unwrap();

		assert_eq!(
			eval_return(&mut machine, &mut (), Opcode::RETURN, 0),
			Control::Exit(ExitSucceed::Returned.into())
		);
		assert_eq!(machine.retval, vec![0xaa, 0xbb]);
	}

	#[test]
	fn unassigned_opcode_is_invalid_operation() {
		let mut machine = machine(&[]);
		assert_eq!(
			eval_invalid(&mut machine, &mut (), Opcode(0x0c), 0),
			Control::Exit(ExceptionalHaltReason::InvalidOperation(Opcode(0x0c)).into())
		);
	}
}
