use core::cmp::{max, min};

use forkevm_interpreter::{ExceptionalHaltReason, ExitError};
use num::{BigUint, Zero};
use primitive_types::U256;

use crate::{GasMutState, PurePrecompile};

const HEADER_LENGTH: usize = 96;

fn modexp(base: &[u8], exponent: &[u8], modulus: &[u8]) -> Vec<u8> {
	let modulus = BigUint::from_bytes_be(modulus);
	if modulus.is_zero() {
		return Vec::new();
	}

	let base = BigUint::from_bytes_be(base);
	let exponent = BigUint::from_bytes_be(exponent);
	base.modpow(&exponent, &modulus).to_bytes_be()
}

/// Adjusted exponent length: the bit length of the leading 32 bytes of the
/// exponent, plus eight per byte beyond them.
fn calculate_iteration_count(exp_length: u64, exp_highp: &U256) -> u64 {
	let iteration_count = if exp_length <= 32 && exp_highp.is_zero() {
		0
	} else if exp_length <= 32 {
		exp_highp.bits() as u64 - 1
	} else {
		8u64.saturating_mul(exp_length - 32)
			.saturating_add(max(1, exp_highp.bits() as u64) - 1)
	};

	max(iteration_count, 1)
}

fn mult_complexity(x: u64) -> U256 {
	if x <= 64 {
		U256::from(x * x)
	} else if x <= 1_024 {
		U256::from(x * x / 4 + 96 * x - 3_072)
	} else {
		let x = U256::from(x);
		x * x / U256::from(16) + U256::from(480) * x - U256::from(199_680)
	}
}

/// Gas cost of the modexp precompile under EIP-198. Saturates at `u64::MAX`.
pub fn byzantium_gas_calc(base_len: u64, exp_len: u64, mod_len: u64, exp_highp: &U256) -> u64 {
	const GAS_DIVISOR: u64 = 20;

	let complexity = mult_complexity(max(base_len, mod_len));
	let iteration_count = calculate_iteration_count(exp_len, exp_highp);
	let gas = complexity
		.saturating_mul(U256::from(iteration_count))
		/ U256::from(GAS_DIVISOR);

	if gas > U256::from(u64::MAX) {
		u64::MAX
	} else {
		gas.as_u64()
	}
}

/// `data[offset..offset + len]`, zero-padded on the right.
fn padded(data: &[u8], offset: usize, len: usize) -> Vec<u8> {
	let mut out = vec![0u8; len];
	if offset < data.len() {
		let end = min(data.len(), offset.saturating_add(len));
		out[..(end - offset)].copy_from_slice(&data[offset..end]);
	}
	out
}

fn len_at(input: &[u8], offset: usize) -> U256 {
	U256::from_big_endian(&padded(input, offset, 32))
}

pub struct ModexpByzantium;

impl PurePrecompile for ModexpByzantium {
	/// Input is `<base_len> <exp_len> <mod_len> <base> <exponent> <modulus>`,
	/// each length a 32-byte big-endian word.
	fn run(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
		let base_len = len_at(input, 0);
		let exp_len = len_at(input, 32);
		let mod_len = len_at(input, 64);

		let body = input.get(HEADER_LENGTH..).unwrap_or_default();

		// Lengths past u64 can never be paid for.
		let base_len_u64 = if base_len > U256::from(u64::MAX) {
			u64::MAX
		} else {
			base_len.as_u64()
		};
		let mod_len_u64 = if mod_len > U256::from(u64::MAX) {
			u64::MAX
		} else {
			mod_len.as_u64()
		};
		let exp_len_u64 = if exp_len > U256::from(u64::MAX) {
			u64::MAX
		} else {
			exp_len.as_u64()
		};

		let exp_highp = if base_len > U256::from(usize::MAX) {
			U256::zero()
		} else {
			let highp_len = min(exp_len_u64, 32) as usize;
			let highp = padded(body, base_len.as_usize(), highp_len);
			U256::from_big_endian(&highp)
		};

		let gas_cost = byzantium_gas_calc(base_len_u64, exp_len_u64, mod_len_u64, &exp_highp);
		gasometer.record_gas(gas_cost)?;

		if base_len.is_zero() && mod_len.is_zero() {
			return Ok(Vec::new());
		}

		let (base_len, exp_len, mod_len) = match (
			usize::try_from(base_len_u64),
			usize::try_from(exp_len_u64),
			usize::try_from(mod_len_u64),
		) {
			(Ok(b), Ok(e), Ok(m)) => (b, e, m),
			_ => return Err(ExceptionalHaltReason::InsufficientGas.into()),
		};

		let base = padded(body, 0, base_len);
		let exponent = padded(body, base_len, exp_len);
		let modulus = padded(body, base_len.saturating_add(exp_len), mod_len);

		let output = modexp(&base, &exponent, &modulus);
		let mut ret = vec![0u8; mod_len];
		ret[(mod_len - output.len())..].copy_from_slice(&output);

		Ok(ret)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use forkevm_interpreter::ExitSucceed;
	use crate::tests::Meter;

	#[test]
	fn fermat_little_theorem() {
		// 3 ^ (p - 1) mod p for p = 2^256 - 2^32 - 977
		let input = hex::decode(
			"0000000000000000000000000000000000000000000000000000000000000001\
			 0000000000000000000000000000000000000000000000000000000000000020\
			 0000000000000000000000000000000000000000000000000000000000000020\
			 03\
			 fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2e\
			 fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f",
		)
		.unwrap();
		let mut meter = Meter { left: 100_000 };

		let (result, out) = ModexpByzantium.execute(&input, &mut meter);
		assert_eq!(result, Ok(ExitSucceed::Returned));
		let mut expected = vec![0u8; 32];
		expected[31] = 1;
		assert_eq!(out, expected);
		// 32 * 32 complexity, 255 iterations, divided by 20.
		assert_eq!(meter.left, 100_000 - 13_056);
	}

	#[test]
	fn zero_modulus_yields_zeros() {
		let input = hex::decode(
			"0000000000000000000000000000000000000000000000000000000000000001\
			 0000000000000000000000000000000000000000000000000000000000000001\
			 0000000000000000000000000000000000000000000000000000000000000002\
			 0203",
		)
		.unwrap();
		let mut meter = Meter { left: 1_000 };

		let (result, out) = ModexpByzantium.execute(&input, &mut meter);
		assert_eq!(result, Ok(ExitSucceed::Returned));
		assert_eq!(out, vec![0, 0]);
	}

	#[test]
	fn huge_lengths_run_out_of_gas() {
		let mut input = vec![0u8; 96];
		input[0..32].copy_from_slice(&[0xff; 32]);
		let mut meter = Meter { left: 1_000_000 };

		let (result, _) = ModexpByzantium.execute(&input, &mut meter);
		assert_eq!(result, Err(ExceptionalHaltReason::InsufficientGas.into()));
	}
}
