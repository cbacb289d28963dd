//! Standard EVM precompiles, from Frontier to Istanbul.

#![forbid(unsafe_code, unused_variables)]
#![warn(missing_docs)]

mod blake2;
mod bn128;
mod modexp;
mod simple;

pub use crate::modexp::byzantium_gas_calc;

use forkevm_interpreter::{ExceptionalHaltReason, ExitError, ExitResult, ExitSucceed};
use primitive_types::H160;

use crate::{
	blake2::Blake2F,
	bn128::{
		Bn128AddByzantium, Bn128AddIstanbul, Bn128MulByzantium, Bn128MulIstanbul,
		Bn128PairingByzantium, Bn128PairingIstanbul,
	},
	modexp::ModexpByzantium,
	simple::{ECRecover, Identity, Ripemd160, Sha256},
};

/// Gas sink of a precompile execution.
pub trait GasMutState {
	/// Charge `gas`, failing with `InsufficientGas` when the frame cannot pay.
	fn record_gas(&mut self, gas: u64) -> Result<(), ExitError>;
}

/// A set of precompiled contracts addressed by account.
pub trait PrecompileSet {
	/// Whether `address` holds a precompile under this set.
	fn is_precompile(&self, address: H160) -> bool;

	/// Run the precompile at `address`, or `None` if there is none. Gas is
	/// charged through `gasometer` before any work is done.
	fn execute(
		&self,
		address: H160,
		input: &[u8],
		gasometer: &mut dyn GasMutState,
	) -> Option<(ExitResult, Vec<u8>)>;
}

impl PrecompileSet for () {
	fn is_precompile(&self, _address: H160) -> bool {
		false
	}

	fn execute(
		&self,
		_address: H160,
		_input: &[u8],
		_gasometer: &mut dyn GasMutState,
	) -> Option<(ExitResult, Vec<u8>)> {
		None
	}
}

/// A precompile whose output depends on its input alone.
trait PurePrecompile {
	fn run(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError>;

	fn execute(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> (ExitResult, Vec<u8>) {
		match self.run(input, gasometer) {
			Ok(output) => (Ok(ExitSucceed::Returned), output),
			Err(err) => (Err(err), Vec::new()),
		}
	}
}

/// The standard precompile set on Ethereum mainnet. Addresses 1 to 4 are
/// always present, the rest are switched on by fork.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StandardPrecompileSet {
	/// Modular exponentiation at address 5 (EIP-198).
	pub has_modexp: bool,
	/// alt_bn128 addition and scalar multiplication at 6 and 7 (EIP-196).
	pub has_alt_bn128: bool,
	/// alt_bn128 pairing check at 8 (EIP-197).
	pub has_alt_bn128_pairing: bool,
	/// Blake2 compression function at 9 (EIP-152).
	pub has_blake2f: bool,
	/// Istanbul prices for the alt_bn128 operations (EIP-1108).
	pub cheap_alt_bn128: bool,
}

impl StandardPrecompileSet {
	/// Precompiles available from Frontier to Spurious Dragon.
	pub const fn frontier() -> Self {
		Self {
			has_modexp: false,
			has_alt_bn128: false,
			has_alt_bn128_pairing: false,
			has_blake2f: false,
			cheap_alt_bn128: false,
		}
	}

	/// Precompiles available from Byzantium to Petersburg.
	pub const fn byzantium() -> Self {
		Self {
			has_modexp: true,
			has_alt_bn128: true,
			has_alt_bn128_pairing: true,
			..Self::frontier()
		}
	}

	/// Precompiles available from Istanbul.
	pub const fn istanbul() -> Self {
		Self {
			has_blake2f: true,
			cheap_alt_bn128: true,
			..Self::byzantium()
		}
	}
}

impl PrecompileSet for StandardPrecompileSet {
	fn is_precompile(&self, code_address: H160) -> bool {
		let last = code_address.0[19];
		if code_address != address(last) {
			return false;
		}

		match last {
			1..=4 => true,
			5 => self.has_modexp,
			6 | 7 => self.has_alt_bn128,
			8 => self.has_alt_bn128_pairing,
			9 => self.has_blake2f,
			_ => false,
		}
	}

	fn execute(
		&self,
		code_address: H160,
		input: &[u8],
		gasometer: &mut dyn GasMutState,
	) -> Option<(ExitResult, Vec<u8>)> {
		if !self.is_precompile(code_address) {
			return None;
		}

		let istanbul = self.cheap_alt_bn128;
		let precompile: &dyn PurePrecompile = match code_address.0[19] {
			1 => &ECRecover,
			2 => &Sha256,
			3 => &Ripemd160,
			4 => &Identity,
			5 => &ModexpByzantium,
			6 if istanbul => &Bn128AddIstanbul,
			6 => &Bn128AddByzantium,
			7 if istanbul => &Bn128MulIstanbul,
			7 => &Bn128MulByzantium,
			8 if istanbul => &Bn128PairingIstanbul,
			8 => &Bn128PairingByzantium,
			9 => &Blake2F,
			_ => return None,
		};

		Some(precompile.execute(input, gasometer))
	}
}

/// Charge `base` plus `per_word` for every started 32-byte word of `input`.
fn charge_per_word(
	gasometer: &mut dyn GasMutState,
	input: &[u8],
	base: u64,
	per_word: u64,
) -> Result<(), ExitError> {
	let words = (input.len() as u64).saturating_add(31) / 32;
	let cost = per_word
		.checked_mul(words)
		.and_then(|cost| cost.checked_add(base))
		.ok_or(ExceptionalHaltReason::InsufficientGas)?;

	gasometer.record_gas(cost)
}

/// `data` truncated or zero-extended to exactly `LEN` bytes.
fn right_pad<const LEN: usize>(data: &[u8]) -> [u8; LEN] {
	let mut padded = [0u8; LEN];
	let len = data.len().min(LEN);
	padded[..len].copy_from_slice(&data[..len]);
	padded
}

/// Address of the precompile numbered `last`.
pub const fn address(last: u8) -> H160 {
	H160([
		0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, last,
	])
}

#[cfg(test)]
mod tests {
	use super::*;

	pub struct Meter {
		pub left: u64,
	}

	impl GasMutState for Meter {
		fn record_gas(&mut self, gas: u64) -> Result<(), ExitError> {
			if gas > self.left {
				self.left = 0;
				return Err(ExceptionalHaltReason::InsufficientGas.into());
			}
			self.left -= gas;
			Ok(())
		}
	}

	#[test]
	fn set_follows_fork_flags() {
		let frontier = StandardPrecompileSet::frontier();
		assert!(frontier.is_precompile(address(1)));
		assert!(frontier.is_precompile(address(4)));
		assert!(!frontier.is_precompile(address(5)));

		let byzantium = StandardPrecompileSet::byzantium();
		assert!(byzantium.is_precompile(address(8)));
		assert!(!byzantium.is_precompile(address(9)));

		let istanbul = StandardPrecompileSet::istanbul();
		assert!(istanbul.is_precompile(address(9)));
		assert!(!istanbul.is_precompile(address(10)));
		assert!(!istanbul.is_precompile(H160::repeat_byte(1)));
	}

	#[test]
	fn identity_charges_per_word() {
		let mut meter = Meter { left: 100 };
		let (result, out) = StandardPrecompileSet::frontier()
			.execute(address(4), &[1, 2, 3], &mut meter)
			.unwrap();

		assert!(result.is_ok());
		assert_eq!(out, vec![1, 2, 3]);
		assert_eq!(meter.left, 100 - 18);
	}

	#[test]
	fn sha256_and_ripemd160_digests() {
		let mut meter = Meter { left: 10_000 };
		let set = StandardPrecompileSet::frontier();

		let (_, sha) = set.execute(address(2), b"", &mut meter).unwrap();
		assert_eq!(
			hex::encode(sha),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
		);
		assert_eq!(meter.left, 10_000 - 60);

		let (_, ripemd) = set.execute(address(3), b"", &mut meter).unwrap();
		assert_eq!(
			hex::encode(ripemd),
			"0000000000000000000000009c1185a5c5e9fc54612808977ee8f548b2258d31"
		);
		assert_eq!(meter.left, 10_000 - 60 - 600);
	}

	#[test]
	fn out_of_gas_precompile_halts() {
		let mut meter = Meter { left: 10 };
		let (result, out) = StandardPrecompileSet::frontier()
			.execute(address(1), &[], &mut meter)
			.unwrap();

		assert_eq!(result, Err(ExceptionalHaltReason::InsufficientGas.into()));
		assert!(out.is_empty());
	}
}
