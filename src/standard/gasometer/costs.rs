//! Pure cost functions. None of them look at the world state; the caller
//! hands over whatever observations the cost depends on.

use forkevm_interpreter::{ExceptionalHaltReason, ExitError};
use primitive_types::{H256, U256};

use super::consts::*;
use crate::standard::{Config, SstoreMetering};

fn out_of_gas() -> ExitError {
	ExceptionalHaltReason::InsufficientGas.into()
}

/// Length in 32-byte words, rounded up.
fn words(len: U256) -> U256 {
	let partial = !(len % 32).is_zero();
	len / 32 + U256::from(partial as u8)
}

/// `base + per_unit * units`, out of gas when that does not fit a `u64`.
fn linear(base: u64, per_unit: u64, units: U256) -> Result<u64, ExitError> {
	U256::from(per_unit)
		.checked_mul(units)
		.and_then(|cost| cost.checked_add(U256::from(base)))
		.filter(|cost| *cost <= U256::from(u64::MAX))
		.map(|cost| cost.as_u64())
		.ok_or_else(out_of_gas)
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitError> {
	linear(G_SHA3, G_SHA3WORD, words(len))
}

/// `CALLDATACOPY`, `CODECOPY` and `RETURNDATACOPY`.
pub fn copy_cost(len: U256) -> Result<u64, ExitError> {
	linear(G_VERYLOW, G_COPY, words(len))
}

pub fn extcodecopy_cost(len: U256, config: &Config) -> Result<u64, ExitError> {
	linear(config.gas.ext_code, G_COPY, words(len))
}

pub fn create2_cost(len: U256) -> Result<u64, ExitError> {
	linear(G_CREATE, G_SHA3WORD, words(len))
}

pub fn log_cost(topics: u8, len: U256) -> Result<u64, ExitError> {
	linear(G_LOG + G_LOGTOPIC * u64::from(topics), G_LOGDATA, len)
}

/// Charged per significant byte of the exponent.
pub fn exp_cost(power: U256, config: &Config) -> u64 {
	let bytes = (power.bits() as u64 + 7) / 8;
	G_EXP + config.gas.exp_byte * bytes
}

/// Total gas for a memory of `words` words: `3w + w²/512`.
pub fn memory_gas(words: usize) -> Result<u64, ExitError> {
	let w = u64::try_from(words).map_err(|_| out_of_gas())?;
	let linear = G_MEMORY.checked_mul(w);
	let quadratic = w.checked_mul(w).map(|square| square / 512);

	linear
		.zip(quadratic)
		.and_then(|(linear, quadratic)| linear.checked_add(quadratic))
		.ok_or_else(out_of_gas)
}

/// `SSTORE` cost from the original (transaction start), current and new
/// value of the slot.
pub fn sstore_cost(original: H256, current: H256, new: H256, config: &Config) -> u64 {
	match config.sstore_metering {
		SstoreMetering::Legacy if current.is_zero() && !new.is_zero() => G_SSET,
		SstoreMetering::Legacy => G_SRESET,
		// A no-op, or a slot already dirtied earlier in the transaction.
		_ if new == current || original != current => config.gas.sload,
		_ if original.is_zero() => G_SSET,
		_ => G_SRESET,
	}
}

/// Refund of an `SSTORE`. Under net gas metering it is negative when a
/// refund granted earlier in the transaction is taken back.
pub fn sstore_refund(original: H256, current: H256, new: H256, config: &Config) -> i64 {
	let clears = |from: H256, to: H256| !from.is_zero() && to.is_zero();

	match config.sstore_metering {
		SstoreMetering::Legacy if clears(current, new) => R_SCLEAR,
		SstoreMetering::Legacy => 0,
		_ if current == new => 0,
		_ if original == current && clears(original, new) => R_SCLEAR,
		_ if original == current => 0,
		_ => {
			let mut refund = 0;
			if clears(original, current) {
				refund -= R_SCLEAR;
			} else if clears(original, new) {
				refund += R_SCLEAR;
			}

			if original == new {
				let first_write = if original.is_zero() { G_SSET } else { G_SRESET };
				refund += (first_write - config.gas.sload) as i64;
			}
			refund
		}
	}
}

/// `target_is_new` already folds in the fork's notion of a new account:
/// absent before EIP-161, empty after.
pub fn selfdestruct_cost(value: U256, target_is_new: bool, config: &Config) -> u64 {
	let funds_new_account = if config.clear_empty_accounts {
		target_is_new && !value.is_zero()
	} else {
		target_is_new
	};

	if funds_new_account {
		config.gas.selfdestruct + config.gas.selfdestruct_new_account
	} else {
		config.gas.selfdestruct
	}
}

pub fn selfdestruct_refund(already_deleted: bool) -> i64 {
	if already_deleted {
		0
	} else {
		R_SELFDESTRUCT
	}
}

/// Base cost of a call, before the forwarded gas.
///
/// `carries_value` is true for `CALL` and `CALLCODE`, `reaches_target` for
/// `CALL` and `STATICCALL`: only those can bring a new account to life.
pub fn call_cost(
	value: U256,
	carries_value: bool,
	reaches_target: bool,
	target_is_new: bool,
	config: &Config,
) -> u64 {
	let transfers = !value.is_zero();
	let value_cost = if carries_value && transfers {
		G_CALLVALUE
	} else {
		0
	};
	let creates_account =
		reaches_target && target_is_new && (transfers || !config.clear_empty_accounts);
	let account_cost = if creates_account { G_NEWACCOUNT } else { 0 };

	config.gas.call + value_cost + account_cost
}

/// Before EIP-150 a call may not ask for more gas than is left.
pub fn call_extra_check(requested: U256, available: u64, config: &Config) -> Result<(), ExitError> {
	if !config.all_but_one_64th && requested > U256::from(available) {
		Err(out_of_gas())
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn word(v: u64) -> H256 {
		H256::from_low_u64_be(v)
	}

	// (original, current, new, cost, refund) under Constantinople.
	const EIP1283_CASES: [(u64, u64, u64, u64, i64); 9] = [
		(0, 0, 0, 200, 0),
		(0, 0, 1, 20000, 0),
		(0, 1, 0, 200, 19800),
		(0, 1, 2, 200, 0),
		(1, 1, 0, 5000, 15000),
		(1, 1, 2, 5000, 0),
		(1, 0, 1, 200, -15000 + 4800),
		(1, 2, 0, 200, 15000),
		(1, 2, 1, 200, 4800),
	];

	#[test]
	fn eip1283_table() {
		let config = Config::constantinople();
		for (original, current, new, cost, refund) in EIP1283_CASES {
			let (original, current, new) = (word(original), word(current), word(new));
			assert_eq!(sstore_cost(original, current, new, &config), cost);
			assert_eq!(sstore_refund(original, current, new, &config), refund);
		}
	}

	#[test]
	fn eip2200_reprices_on_sload() {
		let config = Config::istanbul();
		assert_eq!(sstore_cost(word(0), word(0), word(0), &config), 800);
		assert_eq!(sstore_cost(word(0), word(0), word(1), &config), 20000);
		assert_eq!(sstore_refund(word(0), word(1), word(0), &config), 19200);
		assert_eq!(sstore_refund(word(1), word(2), word(1), &config), 4200);
	}

	#[test]
	fn legacy_sstore() {
		let config = Config::petersburg();
		assert_eq!(sstore_cost(word(0), word(0), word(1), &config), 20000);
		assert_eq!(sstore_cost(word(0), word(1), word(0), &config), 5000);
		assert_eq!(sstore_cost(word(0), word(0), word(0), &config), 5000);
		assert_eq!(sstore_refund(word(0), word(1), word(0), &config), 15000);
		assert_eq!(sstore_refund(word(0), word(0), word(0), &config), 0);
	}

	#[test]
	fn memory_is_quadratic() {
		assert_eq!(memory_gas(0).unwrap(), 0);
		assert_eq!(memory_gas(1).unwrap(), 3);
		assert_eq!(memory_gas(32).unwrap(), 98);
		assert_eq!(memory_gas(1024).unwrap(), 3072 + 2048);
		assert!(memory_gas(usize::MAX).is_err());
	}

	#[test]
	fn new_account_surcharge_follows_eip161() {
		let value = U256::from(1);
		assert_eq!(call_cost(U256::zero(), true, true, true, &Config::homestead()), 40 + 25000);
		assert_eq!(
			call_cost(U256::zero(), true, true, true, &Config::spurious_dragon()),
			700
		);
		assert_eq!(
			call_cost(value, true, true, true, &Config::spurious_dragon()),
			700 + 9000 + 25000
		);
		assert_eq!(call_cost(value, true, false, true, &Config::byzantium()), 700 + 9000);
	}

	#[test]
	fn exp_charges_per_exponent_byte() {
		assert_eq!(exp_cost(U256::zero(), &Config::frontier()), 10);
		assert_eq!(exp_cost(U256::from(255), &Config::frontier()), 20);
		assert_eq!(exp_cost(U256::from(256), &Config::spurious_dragon()), 110);
		assert_eq!(exp_cost(U256::MAX, &Config::spurious_dragon()), 10 + 50 * 32);
	}

	#[test]
	fn log_and_hash_costs() {
		assert_eq!(log_cost(2, U256::from(10)).unwrap(), 375 + 750 + 80);
		assert_eq!(sha3_cost(U256::from(33)).unwrap(), 30 + 12);
		assert_eq!(copy_cost(U256::zero()).unwrap(), 3);
		assert!(log_cost(0, U256::MAX).is_err());
		assert!(create2_cost(U256::MAX).is_err());
	}
}
