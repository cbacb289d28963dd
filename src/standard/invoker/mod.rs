//! Message call and contract creation processing.
//!
//! The invoker turns a trapped `CALL*`/`CREATE*` into a child frame and folds
//! the finished child back into its parent. Each child runs in its own
//! backend substate, so a failed child leaves no trace beyond the gas it
//! burned.

mod routines;

pub use self::routines::l64;

use core::cmp::min;

use forkevm_interpreter::call_create::{CallCreateTrapData, CallTrapData, CreateTrapData};
use forkevm_interpreter::{
	Context, ExceptionalHaltReason, ExitError, ExitResult, Opcode, RuntimeHandler, RuntimeState,
	Transfer,
};
use forkevm_precompile::PrecompileSet;
use primitive_types::{H160, U256};

use super::{Config, Evm, FrameState, FrameType, GasometerState, MessageFrame};
use crate::backend::TransactionalBackend;
use crate::MergeStrategy;

/// Backend an invoker can run frames against.
pub trait InvokerHandler: RuntimeHandler + TransactionalBackend {}

impl<T: RuntimeHandler + TransactionalBackend> InvokerHandler for T {}

/// Result of entering a frame.
pub enum InvokerControl<'config> {
	/// A frame that has code to run.
	Enter(MessageFrame<'config>),
	/// Finished without running code: a precompile, or a failure before the
	/// first opcode.
	DirectExit(ExitResult, GasometerState<'config>, Vec<u8>),
}

/// What a suspended parent waits for.
pub enum SubstackInvoke {
	Call { trap: CallTrapData },
	Create { trap: CreateTrapData, address: H160 },
}

pub struct Invoker<'spec> {
	evm: &'spec Evm,
	precompiles: &'spec dyn PrecompileSet,
}

impl<'spec> Invoker<'spec> {
	pub fn new(evm: &'spec Evm, precompiles: &'spec dyn PrecompileSet) -> Self {
		Self { evm, precompiles }
	}

	pub fn evm(&self) -> &'spec Evm {
		self.evm
	}

	pub fn config(&self) -> &'spec Config {
		self.evm.config()
	}

	/// Open a substate and start a message call. `code_address` is where the
	/// code, or the precompile, comes from.
	#[allow(clippy::too_many_arguments)]
	pub fn enter_call<H: InvokerHandler>(
		&self,
		runtime: RuntimeState,
		mut gasometer: GasometerState<'spec>,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		depth: usize,
		handler: &mut H,
	) -> InvokerControl<'spec> {
		log::debug!(
			target: "evm",
			"call {:?} -> {:?} at depth {} with gas {}",
			runtime.context.caller,
			code_address,
			depth,
			gasometer.gas64()
		);
		handler.push_substate();
		handler.touch(runtime.context.address);

		if let Some(transfer) = transfer {
			if let Err(e) = handler.transfer(transfer) {
				return InvokerControl::DirectExit(Err(e), gasometer, Vec::new());
			}
		}

		if let Some((result, retval)) = self.precompiles.execute(code_address, &input, &mut gasometer)
		{
			return InvokerControl::DirectExit(result, gasometer, retval);
		}

		let code = handler.code(code_address);
		InvokerControl::Enter(MessageFrame::new(
			FrameType::MessageCall,
			code,
			input,
			runtime,
			gasometer,
			depth,
		))
	}

	/// Bump the creator's nonce, open a substate and start the init code of
	/// the contract at `runtime.context.address`.
	pub fn enter_create<H: InvokerHandler>(
		&self,
		runtime: RuntimeState,
		gasometer: GasometerState<'spec>,
		init_code: Vec<u8>,
		depth: usize,
		handler: &mut H,
	) -> InvokerControl<'spec> {
		let caller = runtime.context.caller;
		let address = runtime.context.address;
		let value = runtime.context.apparent_value;
		log::debug!(
			target: "evm",
			"create {:?} by {:?} at depth {} with gas {}",
			address,
			caller,
			depth,
			gasometer.gas64()
		);

		// The creator's nonce stays bumped even if the creation fails.
		let prepared = if handler.balance(caller) < value {
			Err(ExceptionalHaltReason::InsufficientBalance.into())
		} else {
			handler.inc_nonce(caller)
		};
		handler.push_substate();

		let entered = prepared
			.and_then(|()| routines::make_enter_create(self.config(), caller, address, value, handler));
		match entered {
			Ok(()) => InvokerControl::Enter(MessageFrame::new(
				FrameType::ContractCreation,
				init_code,
				Vec::new(),
				runtime,
				gasometer,
				depth,
			)),
			Err(e) => InvokerControl::DirectExit(Err(e), gasometer, Vec::new()),
		}
	}

	/// Build the child of a frame that trapped on `opcode`. The operands are
	/// taken off the parent's stack and the child's gas is charged to it.
	pub fn enter_substack<H: InvokerHandler>(
		&self,
		opcode: Opcode,
		parent: &mut MessageFrame<'spec>,
		handler: &mut H,
	) -> Result<(SubstackInvoke, InvokerControl<'spec>), ExitError> {
		let config = self.config();
		let trap = CallCreateTrapData::new_from(opcode, &mut parent.machine)?;

		let after_gas = if config.all_but_one_64th {
			l64(parent.gasometer.gas64())
		} else {
			parent.gasometer.gas64()
		};
		let target_gas = trap.target_gas().unwrap_or_else(|| U256::from(after_gas));
		let gas_limit = min(U256::from(after_gas), target_gas);

		let is_static = parent.is_static()
			|| matches!(&trap, CallCreateTrapData::Call(call) if call.is_static);
		let stipend = matches!(&trap, CallCreateTrapData::Call(_)) && trap.has_value();
		let gasometer = parent.gasometer.submeter(gas_limit, is_static, stipend)?;

		let depth = parent.depth + 1;
		let too_deep = parent.depth >= config.call_depth_limit;
		let transaction_context = parent.machine.state.transaction_context.clone();

		match trap {
			CallCreateTrapData::Call(trap) => {
				let control = if too_deep {
					reject(ExceptionalHaltReason::CallDepthExceeded, gasometer, handler)
				} else {
					let runtime = RuntimeState {
						context: trap.context.clone(),
						transaction_context,
						retbuf: Vec::new(),
						gas: 0,
					};
					self.enter_call(
						runtime,
						gasometer,
						trap.target,
						trap.transfer.clone(),
						trap.input.clone(),
						depth,
						handler,
					)
				};

				Ok((SubstackInvoke::Call { trap }, control))
			}
			CallCreateTrapData::Create(trap) => {
				let caller = trap.scheme.caller();
				let address = trap.scheme.address(handler);

				let control = if too_deep {
					reject(ExceptionalHaltReason::CallDepthExceeded, gasometer, handler)
				} else {
					let runtime = RuntimeState {
						context: Context {
							address,
							caller,
							apparent_value: trap.value,
						},
						transaction_context,
						retbuf: Vec::new(),
						gas: 0,
					};
					self.enter_create(runtime, gasometer, trap.code.clone(), depth, handler)
				};

				Ok((SubstackInvoke::Create { trap, address }, control))
			}
		}
	}

	/// Fold a finished child into its suspended parent.
	pub fn exit_substack<H: InvokerHandler>(
		&self,
		result: ExitResult,
		mut gasometer: GasometerState<'spec>,
		retval: Vec<u8>,
		invoke: SubstackInvoke,
		parent: &mut MessageFrame<'spec>,
		handler: &mut H,
	) -> Result<FrameState, ExitError> {
		let created = match &invoke {
			SubstackInvoke::Call { .. } => None,
			SubstackInvoke::Create { address, .. } => Some(*address),
		};
		let (result, strategy) = self.exit_frame(result, &mut gasometer, &retval, created, handler)?;
		parent.gasometer.merge(gasometer, strategy);

		match invoke {
			SubstackInvoke::Call { trap } => trap.feedback(result, retval, &mut parent.machine)?,
			SubstackInvoke::Create { trap, address } => {
				let retbuf = if result == Err(ExitError::Reverted) {
					retval
				} else {
					Vec::new()
				};
				trap.feedback(result.map(|_| address), retbuf, &mut parent.machine)?
			}
		}

		Ok(completed(strategy))
	}

	/// Close the substate of a finished frame, deploying code first if the
	/// frame was a successful creation.
	pub fn exit_frame<H: InvokerHandler>(
		&self,
		result: ExitResult,
		gasometer: &mut GasometerState<'spec>,
		retval: &[u8],
		created: Option<H160>,
		handler: &mut H,
	) -> Result<(ExitResult, MergeStrategy), ExitError> {
		let result = match (result, created) {
			(Ok(succeed), Some(address)) => {
				routines::deploy_create_code(self.config(), address, retval, gasometer, handler)
					.map(|()| succeed)
			}
			(result, _) => result,
		};

		let strategy = match &result {
			Ok(_) => MergeStrategy::Commit,
			Err(e) if e.returns_gas() => MergeStrategy::Revert,
			Err(_) => {
				gasometer.oog();
				MergeStrategy::Discard
			}
		};
		log::debug!(target: "evm", "frame exit {:?}, {:?}", result, strategy);

		handler.pop_substate(strategy)?;
		Ok((result, strategy))
	}
}

/// State of a frame once it has been folded back.
pub fn completed(strategy: MergeStrategy) -> FrameState {
	match strategy {
		MergeStrategy::Commit => FrameState::CompletedSuccess,
		MergeStrategy::Revert | MergeStrategy::Discard => FrameState::CompletedFailed,
	}
}

fn reject<'config, H: InvokerHandler>(
	reason: ExceptionalHaltReason,
	gasometer: GasometerState<'config>,
	handler: &mut H,
) -> InvokerControl<'config> {
	log::debug!(target: "evm", "child frame rejected: {}", reason);
	handler.push_substate();
	InvokerControl::DirectExit(Err(reason.into()), gasometer, Vec::new())
}
