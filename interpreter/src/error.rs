use std::borrow::Cow;

use crate::Opcode;

/// Either a finished machine or one suspended on a trap.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Capture<E, T> {
	/// The machine is done and will not step again.
	Exit(E),
	/// The machine stopped at an opcode it cannot finish on its own. Resume
	/// it once the trap has been handled.
	Trap(T),
}

impl<E, T> Capture<E, T> {
	pub fn exit(self) -> Option<E> {
		match self {
			Self::Exit(e) => Some(e),
			Self::Trap(_) => None,
		}
	}

	pub fn trap(self) -> Option<T> {
		match self {
			Self::Trap(t) => Some(t),
			Self::Exit(_) => None,
		}
	}
}

/// How a frame finished.
pub type ExitResult = Result<ExitSucceed, ExitError>;

/// Successful ways for a frame to finish.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitSucceed {
	/// `STOP`, or the program counter ran off the end of the code.
	Stopped,
	/// `RETURN`.
	Returned,
	/// `SELFDESTRUCT`.
	SelfDestructed,
}

/// Unsuccessful ways for a frame to finish.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitError {
	/// All gas of the frame is consumed.
	#[error("exceptional halt: {0}")]
	Exception(ExceptionalHaltReason),
	/// `REVERT`. The frame keeps its unused gas.
	#[error("execution reverted")]
	Reverted,
	/// Not an EVM outcome at all. The whole transaction is abandoned.
	#[error("fatal error: {0}")]
	Fatal(ExitFatal),
}

impl ExitError {
	/// Whether the error leaves the remaining gas of the frame untouched.
	pub fn returns_gas(&self) -> bool {
		use ExceptionalHaltReason::*;

		match self {
			Self::Reverted => true,
			Self::Exception(reason) => matches!(
				reason,
				CallDepthExceeded | InsufficientBalance | NonceOverflow
			),
			Self::Fatal(_) => false,
		}
	}
}

/// Reason of an exceptional halt.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExceptionalHaltReason {
	#[error("out of gas")]
	InsufficientGas,
	#[error("stack underflow")]
	StackUnderflow,
	#[error("stack limit reached")]
	StackOverflow,
	/// Jump destination is not a `JUMPDEST` outside of push data.
	#[error("invalid jump destination")]
	InvalidJumpDestination,
	/// Unassigned opcode for the active fork, or the designated `INVALID`.
	#[error("invalid operation {0}")]
	InvalidOperation(Opcode),
	/// State modification attempted inside a static frame.
	#[error("state change in a static frame")]
	IllegalStateChange,
	/// `RETURNDATACOPY` past the end of the return buffer.
	#[error("read past the end of the return data")]
	OutOfBounds,
	#[error("call depth limit reached")]
	CallDepthExceeded,
	/// Not enough balance to transfer the value of a call or create.
	#[error("insufficient balance for transfer")]
	InsufficientBalance,
	/// Create targets an address that already has code or a nonce.
	#[error("contract address collision")]
	ContractAddressCollision,
	#[error("deployed code exceeds the size limit")]
	CodeSizeExceeded,
	#[error("nonce overflow")]
	NonceOverflow,
	#[error("{0}")]
	Other(Cow<'static, str>),
}

/// Failures outside of the EVM rules, such as values the host cannot
/// represent.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitFatal {
	#[error("not supported")]
	NotSupported,
	#[error("{0}")]
	Other(Cow<'static, str>),
}

impl From<ExceptionalHaltReason> for ExitError {
	fn from(reason: ExceptionalHaltReason) -> Self {
		Self::Exception(reason)
	}
}

impl From<ExitFatal> for ExitError {
	fn from(fatal: ExitFatal) -> Self {
		Self::Fatal(fatal)
	}
}

impl From<ExitSucceed> for ExitResult {
	fn from(succeed: ExitSucceed) -> Self {
		Ok(succeed)
	}
}

impl From<ExitError> for ExitResult {
	fn from(error: ExitError) -> Self {
		Err(error)
	}
}

impl From<ExceptionalHaltReason> for ExitResult {
	fn from(reason: ExceptionalHaltReason) -> Self {
		Err(reason.into())
	}
}

impl From<ExitFatal> for ExitResult {
	fn from(fatal: ExitFatal) -> Self {
		Err(fatal.into())
	}
}
