//! Word conversions and two's-complement helpers.

use core::cmp::Ordering;

use primitive_types::{H256, U256};

use crate::{ExitError, ExitFatal};

#[must_use]
pub fn u256_to_h256(v: U256) -> H256 {
	let mut word = H256::zero();
	v.to_big_endian(word.as_bytes_mut());
	word
}

#[must_use]
pub fn h256_to_u256(v: H256) -> U256 {
	U256::from_big_endian(v.as_bytes())
}

/// Offsets and lengths that do not fit a `usize` cannot be backed by real
/// memory, so they are a fatal error rather than an exceptional halt.
pub fn u256_to_usize(v: U256) -> Result<usize, ExitError> {
	if v > U256::from(usize::MAX) {
		Err(ExitFatal::NotSupported.into())
	} else {
		Ok(v.as_usize())
	}
}

/// Whether the word is negative when read as a signed 256-bit integer.
#[must_use]
pub fn is_negative(v: U256) -> bool {
	v.bit(255)
}

/// `-v` modulo 2^256.
#[must_use]
pub fn negate(v: U256) -> U256 {
	(!v).overflowing_add(U256::one()).0
}

/// Magnitude of a signed word. The most negative value maps onto itself,
/// which is still its correct magnitude when read unsigned.
#[must_use]
pub fn magnitude(v: U256) -> U256 {
	if is_negative(v) {
		negate(v)
	} else {
		v
	}
}

#[must_use]
pub fn signed_cmp(a: U256, b: U256) -> Ordering {
	match (is_negative(a), is_negative(b)) {
		(true, false) => Ordering::Less,
		(false, true) => Ordering::Greater,
		_ => a.cmp(&b),
	}
}
