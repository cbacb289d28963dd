use primitive_types::{U256, U512};

use crate::utils::{is_negative, magnitude, negate};

pub fn div(a: U256, b: U256) -> U256 {
	a.checked_div(b).unwrap_or_default()
}

pub fn rem(a: U256, b: U256) -> U256 {
	a.checked_rem(b).unwrap_or_default()
}

/// Signed division, truncating toward zero. `MIN / -1` wraps back to `MIN`.
pub fn sdiv(a: U256, b: U256) -> U256 {
	if b.is_zero() {
		return U256::zero();
	}

	let quotient = magnitude(a) / magnitude(b);
	if is_negative(a) != is_negative(b) {
		negate(quotient)
	} else {
		quotient
	}
}

/// Signed remainder. The result takes the sign of the dividend.
pub fn srem(a: U256, b: U256) -> U256 {
	if b.is_zero() {
		return U256::zero();
	}

	let remainder = magnitude(a) % magnitude(b);
	if is_negative(a) {
		negate(remainder)
	} else {
		remainder
	}
}

fn reduce(v: U512, modulus: U256) -> U256 {
	if modulus.is_zero() {
		return U256::zero();
	}

	let reduced = v % U512::from(modulus);
	// Below `modulus`, so the high half is empty.
	U256::try_from(reduced).unwrap_or_default()
}

pub fn addmod(a: U256, b: U256, modulus: U256) -> U256 {
	reduce(U512::from(a) + U512::from(b), modulus)
}

pub fn mulmod(a: U256, b: U256, modulus: U256) -> U256 {
	reduce(a.full_mul(b), modulus)
}

/// Square and multiply, wrapping at 2^256.
pub fn exp(base: U256, exponent: U256) -> U256 {
	let mut base = base;
	let mut result = U256::one();

	for bit in 0..exponent.bits() {
		if exponent.bit(bit) {
			result = result.overflowing_mul(base).0;
		}
		base = base.overflowing_mul(base).0;
	}

	result
}

/// Extend the sign bit of the byte at index `byte` (counting from the least
/// significant) through the rest of the word. Indices past 30 leave the
/// word untouched.
pub fn signextend(byte: U256, value: U256) -> U256 {
	if byte >= U256::from(31) {
		return value;
	}

	let sign_bit = 8 * byte.as_usize() + 7;
	let low_bits = (U256::one() << (sign_bit + 1)) - U256::one();
	if value.bit(sign_bit) {
		value | !low_bits
	} else {
		value & low_bits
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn minus(n: u64) -> U256 {
		negate(U256::from(n))
	}

	#[test]
	fn sign_extension() {
		assert_eq!(signextend(U256::zero(), U256::from(0xff)), U256::MAX);
		assert_eq!(signextend(U256::zero(), U256::from(0x7f)), U256::from(0x7f));
		assert_eq!(signextend(U256::zero(), U256::from(0x1ff)), U256::MAX);
		assert_eq!(signextend(U256::from(32), U256::from(0xff)), U256::from(0xff));
		assert_eq!(signextend(U256::one(), U256::from(0x80ff)), minus(0x7f01));
	}

	#[test]
	fn modular_arithmetic_uses_wide_intermediates() {
		assert_eq!(addmod(U256::MAX, U256::from(2), U256::MAX), U256::from(2));
		assert_eq!(mulmod(U256::MAX, U256::MAX, U256::from(12)), U256::from(9));
		assert_eq!(addmod(U256::one(), U256::one(), U256::zero()), U256::zero());
	}

	#[test]
	fn signed_division_and_remainder() {
		let min = U256::one() << 255;
		assert_eq!(sdiv(U256::from(10), minus(2)), minus(5));
		assert_eq!(sdiv(minus(7), U256::from(2)), minus(3));
		assert_eq!(sdiv(min, minus(1)), min);
		assert_eq!(srem(minus(7), U256::from(3)), minus(1));
		assert_eq!(srem(U256::from(7), minus(3)), U256::one());
		assert_eq!(div(U256::one(), U256::zero()), U256::zero());
		assert_eq!(rem(U256::one(), U256::zero()), U256::zero());
	}

	#[test]
	fn exponentiation_wraps() {
		assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
		assert_eq!(exp(U256::from(2), U256::from(255)), U256::one() << 255);
		assert_eq!(exp(U256::from(3), U256::from(3)), U256::from(27));
		assert_eq!(exp(U256::zero(), U256::zero()), U256::one());
	}
}
