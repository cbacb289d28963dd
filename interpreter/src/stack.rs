use primitive_types::{H256, U256};

use crate::utils::{h256_to_u256, u256_to_h256};
use crate::ExceptionalHaltReason;

/// Word stack of a machine. Index `0` is the top.
#[derive(Clone, Debug)]
pub struct Stack {
	data: Vec<H256>,
	limit: usize,
}

impl Stack {
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::with_capacity(limit.min(32)),
			limit,
		}
	}

	#[inline]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	#[inline]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Fail unless `pop` items are available and pushing `push` items after
	/// that stays within the limit. Checked once per operation, before it
	/// runs, so an operation never halts with a half-consumed stack.
	pub fn check_pop_push(&self, pop: usize, push: usize) -> Result<(), ExceptionalHaltReason> {
		let remaining = self
			.len()
			.checked_sub(pop)
			.ok_or(ExceptionalHaltReason::StackUnderflow)?;
		if remaining + push > self.limit {
			return Err(ExceptionalHaltReason::StackOverflow);
		}
		Ok(())
	}

	#[inline]
	pub fn pop(&mut self) -> Result<H256, ExceptionalHaltReason> {
		self.data.pop().ok_or(ExceptionalHaltReason::StackUnderflow)
	}

	#[inline]
	pub fn pop_u256(&mut self) -> Result<U256, ExceptionalHaltReason> {
		self.pop().map(h256_to_u256)
	}

	/// Push a word. At the limit the stack is left unchanged.
	#[inline]
	pub fn push(&mut self, value: H256) -> Result<(), ExceptionalHaltReason> {
		if self.data.len() >= self.limit {
			return Err(ExceptionalHaltReason::StackOverflow);
		}
		self.data.push(value);
		Ok(())
	}

	#[inline]
	pub fn push_u256(&mut self, value: U256) -> Result<(), ExceptionalHaltReason> {
		self.push(u256_to_h256(value))
	}

	fn slot(&self, depth: usize) -> Result<usize, ExceptionalHaltReason> {
		self.data
			.len()
			.checked_sub(depth + 1)
			.ok_or(ExceptionalHaltReason::StackUnderflow)
	}

	#[inline]
	pub fn peek(&self, depth: usize) -> Result<H256, ExceptionalHaltReason> {
		Ok(self.data[self.slot(depth)?])
	}

	#[inline]
	pub fn set(&mut self, depth: usize, value: H256) -> Result<(), ExceptionalHaltReason> {
		let slot = self.slot(depth)?;
		self.data[slot] = value;
		Ok(())
	}

	/// Exchange the top with the item `depth` below it.
	pub fn swap(&mut self, depth: usize) -> Result<(), ExceptionalHaltReason> {
		let top = self.slot(0)?;
		let other = self.slot(depth)?;
		self.data.swap(top, other);
		Ok(())
	}
}
