//! Call and create trap data.
//!
//! A machine that reaches one of the `CALL` or `CREATE` opcodes suspends
//! itself. The operands are then read from its stack into the data below,
//! which the invoker turns into a child frame. When the child is done the
//! same data writes the outcome back into the parent with `feedback`.

use core::cmp::min;

use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use crate::{
	Context, ExitError, ExitFatal, ExitResult, Machine, Opcode, RuntimeBaseBackend,
	RuntimeState, Transfer,
};

/// `keccak256(rlp([caller, nonce]))[12..]`
pub fn create_address(caller: H160, nonce: U256) -> H160 {
	let mut stream = rlp::RlpStream::new_list(2);
	stream.append(&caller).append(&nonce);
	keccak(&stream.out()).into()
}

/// `keccak256(0xff ++ caller ++ salt ++ code_hash)[12..]`
pub fn create2_address(caller: H160, salt: H256, code_hash: H256) -> H160 {
	let mut preimage = Vec::with_capacity(1 + 20 + 32 + 32);
	preimage.push(0xff);
	preimage.extend_from_slice(caller.as_bytes());
	preimage.extend_from_slice(salt.as_bytes());
	preimage.extend_from_slice(code_hash.as_bytes());
	keccak(&preimage).into()
}

fn keccak(data: &[u8]) -> H256 {
	H256::from_slice(Keccak256::digest(data).as_slice())
}

/// How the address of a new contract is derived.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CreateScheme {
	/// `CREATE` and creation transactions, from the creator's nonce.
	Legacy { caller: H160 },
	/// `CREATE2`, from a salt and the hash of the init code.
	Create2 {
		caller: H160,
		code_hash: H256,
		salt: H256,
	},
}

impl CreateScheme {
	/// Address of the new contract. The legacy scheme reads the creator's
	/// current nonce, so this has to run before the nonce is bumped.
	pub fn address<H: RuntimeBaseBackend + ?Sized>(&self, handler: &H) -> H160 {
		match *self {
			Self::Legacy { caller } => create_address(caller, handler.nonce(caller)),
			Self::Create2 {
				caller,
				code_hash,
				salt,
			} => create2_address(caller, salt, code_hash),
		}
	}

	pub const fn caller(&self) -> H160 {
		match *self {
			Self::Legacy { caller } | Self::Create2 { caller, .. } => caller,
		}
	}
}

/// The four message-call flavours.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CallScheme {
	Call,
	CallCode,
	DelegateCall,
	StaticCall,
}

impl CallScheme {
	pub const fn from_opcode(opcode: Opcode) -> Option<Self> {
		match opcode {
			Opcode::CALL => Some(Self::Call),
			Opcode::CALLCODE => Some(Self::CallCode),
			Opcode::DELEGATECALL => Some(Self::DelegateCall),
			Opcode::STATICCALL => Some(Self::StaticCall),
			_ => None,
		}
	}

	/// Whether the opcode takes a value operand.
	pub const fn carries_value(self) -> bool {
		matches!(self, Self::Call | Self::CallCode)
	}

	/// Context the callee runs in. Only `CALL` and `STATICCALL` switch to
	/// the target's storage; `DELEGATECALL` also keeps the caller and value.
	fn context(self, current: &Context, target: H160, value: U256) -> Context {
		match self {
			Self::Call | Self::StaticCall => Context {
				address: target,
				caller: current.address,
				apparent_value: value,
			},
			Self::CallCode => Context {
				address: current.address,
				caller: current.address,
				apparent_value: value,
			},
			Self::DelegateCall => current.clone(),
		}
	}

	fn transfer(self, current: &Context, target: H160, value: U256) -> Option<Transfer> {
		let target = match self {
			Self::Call => target,
			Self::CallCode => current.address,
			Self::DelegateCall | Self::StaticCall => return None,
		};

		Some(Transfer {
			source: current.address,
			target,
			value,
		})
	}
}

/// Operands of a trapped call or create.
#[derive(Clone, Debug)]
pub enum CallCreateTrapData {
	Call(CallTrapData),
	Create(CreateTrapData),
}

impl CallCreateTrapData {
	/// Gas the caller asked to forward. Creates have no gas operand and
	/// take whatever the caller may give.
	pub const fn target_gas(&self) -> Option<U256> {
		match self {
			Self::Call(call) => Some(call.gas),
			Self::Create(_) => None,
		}
	}

	pub fn has_value(&self) -> bool {
		match self {
			Self::Call(call) => call.has_value(),
			Self::Create(create) => !create.value.is_zero(),
		}
	}

	/// Take the operands of `opcode` off the machine's stack, expanding
	/// memory over the regions they name.
	pub fn new_from<S: AsRef<RuntimeState> + AsMut<RuntimeState>>(
		opcode: Opcode,
		machine: &mut Machine<S>,
	) -> Result<Self, ExitError> {
		if let Some(scheme) = CallScheme::from_opcode(opcode) {
			return Ok(Self::Call(CallTrapData::new_from(scheme, machine)?));
		}

		match opcode {
			Opcode::CREATE => Ok(Self::Create(CreateTrapData::new_from(false, machine)?)),
			Opcode::CREATE2 => Ok(Self::Create(CreateTrapData::new_from(true, machine)?)),
			_ => Err(ExitFatal::Other(format!("{} does not trap", opcode).into()).into()),
		}
	}
}

#[derive(Clone, Debug)]
pub struct CallTrapData {
	pub scheme: CallScheme,
	/// Address whose code runs.
	pub target: H160,
	pub transfer: Option<Transfer>,
	pub input: Vec<u8>,
	pub gas: U256,
	pub is_static: bool,
	pub out_offset: U256,
	pub out_len: U256,
	pub context: Context,
}

impl CallTrapData {
	/// Stack layout, top first: gas, to, value (`CALL` and `CALLCODE`
	/// only), in_offset, in_len, out_offset, out_len.
	pub fn new_from<S: AsRef<RuntimeState> + AsMut<RuntimeState>>(
		scheme: CallScheme,
		machine: &mut Machine<S>,
	) -> Result<Self, ExitError> {
		let gas = machine.stack.pop_u256()?;
		let target = H160::from(machine.stack.pop()?);
		let value = if scheme.carries_value() {
			machine.stack.pop_u256()?
		} else {
			U256::zero()
		};
		let in_offset = machine.stack.pop_u256()?;
		let in_len = machine.stack.pop_u256()?;
		let out_offset = machine.stack.pop_u256()?;
		let out_len = machine.stack.pop_u256()?;

		let input = machine.memory.load(in_offset, in_len)?;
		machine.memory.resize_offset(out_offset, out_len)?;

		let state = machine.state.as_mut();
		state.retbuf.clear();
		let context = scheme.context(&state.context, target, value);
		let transfer = scheme.transfer(&state.context, target, value);

		Ok(Self {
			scheme,
			target,
			transfer,
			input,
			gas,
			is_static: scheme == CallScheme::StaticCall,
			out_offset,
			out_len,
			context,
		})
	}

	/// Push the success flag. Output is copied into the caller's region on
	/// success and revert, truncated to the region's length.
	pub fn feedback<S: AsRef<RuntimeState> + AsMut<RuntimeState>>(
		self,
		reason: ExitResult,
		retbuf: Vec<u8>,
		machine: &mut Machine<S>,
	) -> Result<(), ExitError> {
		let copies_output = matches!(reason, Ok(_) | Err(ExitError::Reverted));
		if copies_output {
			let len = min(self.out_len, U256::from(retbuf.len()));
			machine
				.memory
				.copy_large(self.out_offset, U256::zero(), len, &retbuf)?;
		}

		let flag = if reason.is_ok() {
			H256::from_low_u64_be(1)
		} else {
			H256::zero()
		};
		machine.stack.push(flag)?;
		if let Err(ExitError::Fatal(fatal)) = reason {
			return Err(fatal.into());
		}

		machine.state.as_mut().retbuf = retbuf;
		Ok(())
	}

	pub fn has_value(&self) -> bool {
		self.transfer
			.as_ref()
			.map_or(false, |transfer| !transfer.value.is_zero())
	}
}

#[derive(Clone, Debug)]
pub struct CreateTrapData {
	pub scheme: CreateScheme,
	pub value: U256,
	pub code: Vec<u8>,
}

impl CreateTrapData {
	/// Stack layout, top first: value, offset, len, and the salt for
	/// `CREATE2`.
	pub fn new_from<S: AsRef<RuntimeState> + AsMut<RuntimeState>>(
		salted: bool,
		machine: &mut Machine<S>,
	) -> Result<Self, ExitError> {
		let value = machine.stack.pop_u256()?;
		let offset = machine.stack.pop_u256()?;
		let len = machine.stack.pop_u256()?;
		let salt = if salted {
			Some(machine.stack.pop()?)
		} else {
			None
		};

		let code = machine.memory.load(offset, len)?;
		let state = machine.state.as_mut();
		state.retbuf.clear();

		let caller = state.context.address;
		let scheme = match salt {
			Some(salt) => CreateScheme::Create2 {
				caller,
				code_hash: keccak(&code),
				salt,
			},
			None => CreateScheme::Legacy { caller },
		};

		Ok(Self {
			scheme,
			value,
			code,
		})
	}

	/// Push the new address, or zero when the creation failed.
	pub fn feedback<S: AsRef<RuntimeState> + AsMut<RuntimeState>>(
		self,
		reason: Result<H160, ExitError>,
		retbuf: Vec<u8>,
		machine: &mut Machine<S>,
	) -> Result<(), ExitError> {
		match reason {
			Ok(address) => machine.stack.push(address.into())?,
			Err(ExitError::Fatal(fatal)) => {
				machine.stack.push(H256::zero())?;
				return Err(fatal.into());
			}
			Err(_) => machine.stack.push(H256::zero())?,
		}

		machine.state.as_mut().retbuf = retbuf;
		Ok(())
	}
}
