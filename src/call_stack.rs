//! Iterative driver for nested frames.
//!
//! Suspended parents are kept on a heap-allocated stack rather than the
//! native one, so the 1024-deep call limit never threatens the host thread.

use core::mem;

use forkevm_interpreter::{Capture, ExitResult};
use primitive_types::H160;

use crate::standard::invoker::{completed, Invoker, InvokerControl, InvokerHandler, SubstackInvoke};
use crate::standard::{FrameState, GasometerState, MessageFrame};

struct Substack<'config> {
	invoke: SubstackInvoke,
	frame: MessageFrame<'config>,
}

/// Result of running a root frame to completion.
pub struct Outcome<'config> {
	pub result: ExitResult,
	pub gasometer: GasometerState<'config>,
	pub retval: Vec<u8>,
	pub state: FrameState,
}

/// Run `root` and every frame it spawns. `created` is the address of the
/// contract when the root frame is a creation.
pub fn execute<'spec, H: InvokerHandler>(
	invoker: &Invoker<'spec>,
	root: InvokerControl<'spec>,
	created: Option<H160>,
	handler: &mut H,
) -> Outcome<'spec> {
	let mut current = match root {
		InvokerControl::Enter(frame) => frame,
		InvokerControl::DirectExit(result, gasometer, retval) => {
			return exit_root(invoker, result, gasometer, retval, created, handler);
		}
	};
	let mut stack: Vec<Substack<'spec>> = Vec::new();
	// Exit forced on the current frame by a failure outside its own code.
	let mut pending: Option<ExitResult> = None;

	loop {
		let capture = match pending.take() {
			Some(result) => Capture::Exit(result),
			None => invoker.evm().run(&mut current, handler),
		};

		match capture {
			Capture::Trap(opcode) => match invoker.enter_substack(opcode, &mut current, handler) {
				Ok((invoke, InvokerControl::Enter(child))) => {
					let parent = mem::replace(&mut current, child);
					stack.push(Substack {
						invoke,
						frame: parent,
					});
				}
				Ok((invoke, InvokerControl::DirectExit(result, gasometer, retval))) => {
					if let Err(e) =
						invoker.exit_substack(result, gasometer, retval, invoke, &mut current, handler)
					{
						current.halt();
						pending = Some(Err(e));
					}
				}
				Err(e) => {
					current.halt();
					pending = Some(Err(e));
				}
			},
			Capture::Exit(result) => match stack.pop() {
				None => {
					let MessageFrame {
						machine, gasometer, ..
					} = current;
					return exit_root(invoker, result, gasometer, machine.retval, created, handler);
				}
				Some(Substack { invoke, frame }) => {
					let child = mem::replace(&mut current, frame);
					let MessageFrame {
						machine, gasometer, ..
					} = child;
					if let Err(e) = invoker.exit_substack(
						result,
						gasometer,
						machine.retval,
						invoke,
						&mut current,
						handler,
					) {
						current.halt();
						pending = Some(Err(e));
					}
				}
			},
		}
	}
}

fn exit_root<'spec, H: InvokerHandler>(
	invoker: &Invoker<'spec>,
	result: ExitResult,
	mut gasometer: GasometerState<'spec>,
	retval: Vec<u8>,
	created: Option<H160>,
	handler: &mut H,
) -> Outcome<'spec> {
	let (result, state) = match invoker.exit_frame(result, &mut gasometer, &retval, created, handler) {
		Ok((result, strategy)) => (result, completed(strategy)),
		Err(e) => {
			gasometer.oog();
			(Err(e), FrameState::CompletedFailed)
		}
	};

	Outcome {
		result,
		gasometer,
		retval,
		state,
	}
}
