//! Gas accounting of a frame and the fork's gas calculator.
//!
//! [GasometerState] tracks what a frame has spent. Costs known when the
//! operation table is built are charged with [GasometerState::record_fixed],
//! everything else goes through a [PriceFn] from [pricing].

pub mod consts;
pub mod costs;
pub mod pricing;

use core::cmp::{max, min};

use forkevm_interpreter::{
	ExceptionalHaltReason, ExitError, Machine, Opcode, RuntimeHandler, RuntimeState,
};
use forkevm_precompile::GasMutState;
use primitive_types::U256;

use self::consts::{G_CALLSTIPEND, G_TRANSACTION, G_TXDATAZERO, MAX_REFUND_QUOTIENT};

pub use self::pricing::{DynamicCost, PriceFn};
use crate::{standard::Config, MergeStrategy};

fn out_of_gas() -> ExitError {
	ExceptionalHaltReason::InsufficientGas.into()
}

/// Gas accounting of one frame.
#[derive(Clone, Debug)]
pub struct GasometerState<'config> {
	gas_limit: u64,
	/// Cost of the largest memory paid for so far.
	memory_gas: u64,
	used_gas: u64,
	refunded_gas: i64,
	pub is_static: bool,
	pub config: &'config Config,
}

impl<'config> GasometerState<'config> {
	pub fn new(gas_limit: u64, is_static: bool, config: &'config Config) -> Self {
		Self {
			gas_limit,
			memory_gas: 0,
			used_gas: 0,
			refunded_gas: 0,
			is_static,
			config,
		}
	}

	/// Run `f`, exhausting the frame if it fails.
	#[inline]
	pub fn perform<R, F: FnOnce(&mut Self) -> Result<R, ExitError>>(
		&mut self,
		f: F,
	) -> Result<R, ExitError> {
		f(self).map_err(|err| {
			self.oog();
			err
		})
	}

	/// Consume everything. Refunds gathered so far are lost.
	pub fn oog(&mut self) {
		self.used_gas = self.gas_limit;
		self.memory_gas = 0;
		self.refunded_gas = 0;
	}

	pub fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	/// Execution and memory gas spent so far.
	pub fn total_used_gas(&self) -> u64 {
		self.used_gas + self.memory_gas
	}

	/// Gas left.
	pub fn gas64(&self) -> u64 {
		self.gas_limit - self.total_used_gas()
	}

	pub fn gas(&self) -> U256 {
		U256::from(self.gas64())
	}

	/// Refund counter. May be negative inside a frame that takes back a
	/// refund granted by an ancestor.
	pub fn refunded_gas(&self) -> i64 {
		self.refunded_gas
	}

	/// Charge `cost`, failing without any change when less is left.
	pub fn record_gas64(&mut self, cost: u64) -> Result<(), ExitError> {
		match self.total_used_gas().checked_add(cost) {
			Some(total) if total <= self.gas_limit => {
				self.used_gas += cost;
				Ok(())
			}
			_ => Err(out_of_gas()),
		}
	}

	pub fn record_gas(&mut self, cost: U256) -> Result<(), ExitError> {
		if cost > U256::from(u64::MAX) {
			return Err(out_of_gas());
		}
		self.record_gas64(cost.as_u64())
	}

	pub fn record_refund(&mut self, refund: i64) {
		self.refunded_gas = self.refunded_gas.saturating_add(refund);
	}

	/// Charge the deposit of `len` bytes of contract code.
	pub fn record_codedeposit(&mut self, len: usize) -> Result<(), ExitError> {
		self.perform(|gasometer| {
			let cost = (len as u64)
				.checked_mul(consts::G_CODEDEPOSIT)
				.ok_or_else(out_of_gas)?;
			gasometer.record_gas64(cost)
		})
	}

	/// Charge the expansion of memory to cover `region`. Only the growth over
	/// the largest size paid for so far costs anything.
	pub fn record_memory(&mut self, region: MemoryRegion) -> Result<(), ExitError> {
		let memory_gas = match region.cost()? {
			Some(cost) => max(self.memory_gas, cost),
			None => return Ok(()),
		};
		match self.used_gas.checked_add(memory_gas) {
			Some(total) if total <= self.gas_limit => {
				self.memory_gas = memory_gas;
				Ok(())
			}
			_ => Err(out_of_gas()),
		}
	}

	/// Charge a cost fixed when the operation table was built.
	pub fn record_fixed(&mut self, cost: u64) -> Result<(), ExitError> {
		self.perform(|gasometer| gasometer.record_gas64(cost))
	}

	/// Charge an operation priced by `price`, memory growth included.
	pub fn record_dynamic(
		&mut self,
		price: PriceFn,
		opcode: Opcode,
		machine: &Machine<RuntimeState>,
		handler: &dyn RuntimeHandler,
	) -> Result<(), ExitError> {
		self.perform(|gasometer| {
			let cost = price(opcode, machine, handler, gasometer.config)?;
			gasometer.record_gas64(cost.gas)?;
			gasometer.record_refund(cost.refund);
			if let Some(region) = cost.memory {
				gasometer.record_memory(region)?;
			}
			if let Some(forwarded) = cost.forwarded {
				costs::call_extra_check(forwarded, gasometer.gas64(), gasometer.config)?;
			}
			Ok(())
		})
	}

	/// Gas left once the refund is applied, capped at a share of the gas
	/// used. Only meaningful for the root frame, at the end of a transaction.
	pub fn effective_gas(&self) -> u64 {
		let used = self.total_used_gas();
		let refund = min(
			max(self.refunded_gas, 0) as u64,
			used / MAX_REFUND_QUOTIENT,
		);
		self.gas_limit - (used - refund)
	}

	/// Charge `gas_limit` to this frame and hand it to a child, topped up with
	/// the call stipend when the call moves value.
	pub fn submeter(
		&mut self,
		gas_limit: U256,
		is_static: bool,
		call_has_value: bool,
	) -> Result<Self, ExitError> {
		self.record_gas(gas_limit)?;
		let mut child_limit = gas_limit.as_u64();
		if call_has_value {
			child_limit = child_limit.saturating_add(G_CALLSTIPEND);
		}
		Ok(Self::new(child_limit, is_static, self.config))
	}

	/// Fold a finished child back. Committed children hand back their gas and
	/// refunds, reverted ones only their gas, discarded ones nothing.
	pub fn merge(&mut self, child: Self, strategy: MergeStrategy) {
		if strategy == MergeStrategy::Discard {
			return;
		}
		self.used_gas = self.used_gas.saturating_sub(child.gas64());
		if strategy == MergeStrategy::Commit {
			self.record_refund(child.refunded_gas);
		}
	}
}

impl GasMutState for GasometerState<'_> {
	fn record_gas(&mut self, gas: u64) -> Result<(), ExitError> {
		self.record_gas64(gas)
	}
}

/// Memory an operation reads or writes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MemoryRegion {
	pub offset: U256,
	pub len: U256,
}

impl MemoryRegion {
	fn end(&self) -> U256 {
		self.offset.saturating_add(self.len)
	}

	/// The region reaching further, ignoring empty ones.
	pub fn join(self, other: MemoryRegion) -> MemoryRegion {
		if self.len.is_zero() {
			other
		} else if other.len.is_zero() || self.end() >= other.end() {
			self
		} else {
			other
		}
	}

	/// Total memory gas for a memory covering this region, `None` when the
	/// region is empty and memory does not grow.
	pub fn cost(&self) -> Result<Option<u64>, ExitError> {
		if self.len.is_zero() {
			return Ok(None);
		}
		let end = self.offset.checked_add(self.len).ok_or_else(out_of_gas)?;
		if end > U256::from(usize::MAX) {
			return Err(out_of_gas());
		}
		let words = (end.as_usize() - 1) / 32 + 1;
		costs::memory_gas(words).map(Some)
	}
}

/// Intrinsic cost of a transaction, paid before any code runs.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TransactionCost {
	pub is_create: bool,
	pub zero_bytes: u64,
	pub non_zero_bytes: u64,
}

impl TransactionCost {
	fn new(is_create: bool, data: &[u8]) -> Self {
		let zero_bytes = data.iter().filter(|byte| **byte == 0).count() as u64;
		Self {
			is_create,
			zero_bytes,
			non_zero_bytes: data.len() as u64 - zero_bytes,
		}
	}

	pub fn call(data: &[u8]) -> Self {
		Self::new(false, data)
	}

	pub fn create(data: &[u8]) -> Self {
		Self::new(true, data)
	}

	pub fn cost(&self, config: &Config) -> u64 {
		let base = if self.is_create {
			config.gas.transaction_create
		} else {
			G_TRANSACTION
		};

		base.saturating_add(self.zero_bytes.saturating_mul(G_TXDATAZERO))
			.saturating_add(
				self.non_zero_bytes
					.saturating_mul(config.gas.transaction_non_zero_data),
			)
	}
}
