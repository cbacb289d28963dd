use core::cmp::Ordering;

use primitive_types::U256;

use crate::utils::{is_negative, signed_cmp};

pub fn slt(a: U256, b: U256) -> bool {
	signed_cmp(a, b) == Ordering::Less
}

pub fn sgt(a: U256, b: U256) -> bool {
	signed_cmp(a, b) == Ordering::Greater
}

/// `BYTE`: byte `index` of `value`, counting from the most significant.
pub fn byte(index: U256, value: U256) -> U256 {
	if index >= U256::from(32) {
		U256::zero()
	} else {
		U256::from(value.byte(31 - index.as_usize()))
	}
}

fn shift_amount(shift: U256) -> Option<usize> {
	(shift < U256::from(256)).then(|| shift.as_usize())
}

pub fn shl(shift: U256, value: U256) -> U256 {
	shift_amount(shift).map_or_else(U256::zero, |n| value << n)
}

pub fn shr(shift: U256, value: U256) -> U256 {
	shift_amount(shift).map_or_else(U256::zero, |n| value >> n)
}

/// Arithmetic shift right. Negative values shift in ones and settle at -1.
pub fn sar(shift: U256, value: U256) -> U256 {
	if is_negative(value) {
		!shift_amount(shift).map_or_else(U256::zero, |n| !value >> n)
	} else {
		shr(shift, value)
	}
}
