//! Fork configuration.
//!
//! A [Config] holds every price and switch that some hard fork changed.
//! Each fork constructor starts from its predecessor and overrides only what
//! that fork touched, so the constructors double as a changelog.

use forkevm_precompile::StandardPrecompileSet;

/// How `SSTORE` is metered and refunded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SstoreMetering {
	/// Flat set/reset costs with a refund for clearing a slot.
	Legacy,
	/// EIP-1283 net gas metering, keyed on the original value of the slot.
	Eip1283,
	/// EIP-2200: EIP-1283 repriced on top of `SLOAD`, plus the EIP-1706
	/// stipend guard.
	Eip2200,
}

/// Prices that were changed by at least one fork.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GasTable {
	pub balance: u64,
	pub sload: u64,
	/// `EXTCODESIZE`, and the base of `EXTCODECOPY`.
	pub ext_code: u64,
	pub ext_code_hash: u64,
	/// Base of the four `CALL` opcodes.
	pub call: u64,
	pub selfdestruct: u64,
	/// Extra charge when `SELFDESTRUCT` funds an account that did not exist.
	pub selfdestruct_new_account: u64,
	/// Per byte of the `EXP` exponent.
	pub exp_byte: u64,
	pub transaction_create: u64,
	pub transaction_non_zero_data: u64,
}

impl GasTable {
	const FRONTIER: GasTable = GasTable {
		balance: 20,
		sload: 50,
		ext_code: 20,
		ext_code_hash: 400,
		call: 40,
		selfdestruct: 0,
		selfdestruct_new_account: 0,
		exp_byte: 10,
		transaction_create: 21_000,
		transaction_non_zero_data: 68,
	};
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub struct Config {
	pub gas: GasTable,
	pub sstore_metering: SstoreMetering,
	pub precompiles: StandardPrecompileSet,

	/// EIP-2: a create that cannot pay for its code deposit fails. Before,
	/// it succeeds and leaves the account without code.
	pub strict_code_deposit: bool,
	/// EIP-150: a call forwards at most all but one 64th of the gas left, and
	/// asking for more is not an error.
	pub all_but_one_64th: bool,
	/// EIP-155: transactions may be bound to a chain id.
	pub replay_protection: bool,
	/// EIP-161: empty accounts count as absent and are deleted once touched.
	pub clear_empty_accounts: bool,
	/// EIP-161: new contracts start with nonce 1.
	pub contract_nonce_starts_at_one: bool,
	/// EIP-170 cap on deployed code.
	pub max_code_size: Option<usize>,

	pub has_delegate_call: bool,
	pub has_revert: bool,
	pub has_return_data: bool,
	pub has_static_call: bool,
	pub has_bitwise_shifting: bool,
	pub has_create2: bool,
	pub has_ext_code_hash: bool,
	pub has_chain_id: bool,
	pub has_self_balance: bool,

	pub stack_limit: usize,
	pub memory_limit: usize,
	/// Frames at or beyond this depth cannot call or create.
	pub call_depth_limit: usize,
}

impl Config {
	pub const fn frontier() -> Config {
		Config {
			gas: GasTable::FRONTIER,
			sstore_metering: SstoreMetering::Legacy,
			precompiles: StandardPrecompileSet::frontier(),
			strict_code_deposit: false,
			all_but_one_64th: false,
			replay_protection: false,
			clear_empty_accounts: false,
			contract_nonce_starts_at_one: false,
			max_code_size: None,
			has_delegate_call: false,
			has_revert: false,
			has_return_data: false,
			has_static_call: false,
			has_bitwise_shifting: false,
			has_create2: false,
			has_ext_code_hash: false,
			has_chain_id: false,
			has_self_balance: false,
			stack_limit: 1024,
			memory_limit: usize::MAX,
			call_depth_limit: 1024,
		}
	}

	pub const fn homestead() -> Config {
		let previous = Self::frontier();
		Config {
			gas: GasTable {
				transaction_create: 53_000,
				..previous.gas
			},
			strict_code_deposit: true,
			has_delegate_call: true,
			..previous
		}
	}

	/// EIP-150 IO repricing.
	pub const fn tangerine_whistle() -> Config {
		let previous = Self::homestead();
		Config {
			gas: GasTable {
				balance: 400,
				sload: 200,
				ext_code: 700,
				call: 700,
				selfdestruct: 5_000,
				selfdestruct_new_account: 25_000,
				..previous.gas
			},
			all_but_one_64th: true,
			..previous
		}
	}

	pub const fn spurious_dragon() -> Config {
		let previous = Self::tangerine_whistle();
		Config {
			gas: GasTable {
				exp_byte: 50,
				..previous.gas
			},
			replay_protection: true,
			clear_empty_accounts: true,
			contract_nonce_starts_at_one: true,
			max_code_size: Some(0x6000),
			..previous
		}
	}

	pub const fn byzantium() -> Config {
		Config {
			precompiles: StandardPrecompileSet::byzantium(),
			has_revert: true,
			has_return_data: true,
			has_static_call: true,
			..Self::spurious_dragon()
		}
	}

	pub const fn constantinople() -> Config {
		Config {
			sstore_metering: SstoreMetering::Eip1283,
			has_bitwise_shifting: true,
			has_create2: true,
			has_ext_code_hash: true,
			..Self::byzantium()
		}
	}

	/// Constantinople without EIP-1283.
	pub const fn petersburg() -> Config {
		Config {
			sstore_metering: SstoreMetering::Legacy,
			..Self::constantinople()
		}
	}

	pub const fn istanbul() -> Config {
		let previous = Self::petersburg();
		Config {
			gas: GasTable {
				balance: 700,
				sload: 800,
				ext_code_hash: 700,
				transaction_non_zero_data: 16,
				..previous.gas
			},
			sstore_metering: SstoreMetering::Eip2200,
			precompiles: StandardPrecompileSet::istanbul(),
			has_chain_id: true,
			has_self_balance: true,
			..previous
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn forks_only_change_their_deltas() {
		let petersburg = Config::petersburg();
		let istanbul = Config::istanbul();

		assert_eq!(petersburg.gas.transaction_non_zero_data, 68);
		assert_eq!(istanbul.gas.transaction_non_zero_data, 16);
		assert_eq!(istanbul.gas.sload, 800);
		assert_eq!(istanbul.gas.call, petersburg.gas.call);
		assert_eq!(istanbul.sstore_metering, SstoreMetering::Eip2200);
		assert_eq!(petersburg.sstore_metering, SstoreMetering::Legacy);
		assert_eq!(
			Config::constantinople().sstore_metering,
			SstoreMetering::Eip1283
		);
		assert_eq!(
			Config {
				sstore_metering: SstoreMetering::Eip1283,
				..petersburg
			},
			Config::constantinople()
		);
	}

	#[test]
	fn tangerine_whistle_reprices_io() {
		let frontier = Config::frontier();
		let tangerine = Config::tangerine_whistle();

		assert_eq!(frontier.gas.call, 40);
		assert_eq!(tangerine.gas.call, 700);
		assert_eq!(frontier.gas.sload, 50);
		assert_eq!(tangerine.gas.sload, 200);
		assert_eq!(frontier.gas.selfdestruct, 0);
		assert_eq!(tangerine.gas.selfdestruct, 5000);
		assert_eq!(tangerine.max_code_size, None);
		assert_eq!(Config::spurious_dragon().max_code_size, Some(24576));
	}

	#[test]
	fn precompiles_follow_fork() {
		assert_eq!(Config::frontier().precompiles, StandardPrecompileSet::frontier());
		assert_eq!(Config::petersburg().precompiles, StandardPrecompileSet::byzantium());
		assert_eq!(Config::istanbul().precompiles, StandardPrecompileSet::istanbul());
	}
}
