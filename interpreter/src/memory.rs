use core::cmp::{max, min};

use primitive_types::U256;

use crate::utils::u256_to_usize;
use crate::{ExceptionalHaltReason, ExitError, ExitFatal};

/// Byte-addressed machine memory.
///
/// The backing buffer only grows when something is written. The size the
/// program observes through `MSIZE`, and pays for, is `effective_len`: the
/// highest word any access has touched so far.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	effective_len: U256,
	limit: usize,
}

impl Memory {
	pub fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			effective_len: U256::zero(),
			limit,
		}
	}

	/// Always a multiple of 32.
	pub fn effective_len(&self) -> U256 {
		self.effective_len
	}

	/// Grow the effective length to cover `[offset, offset + len)`. An empty
	/// range touches nothing, whatever its offset.
	pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExceptionalHaltReason> {
		if len.is_zero() {
			return Ok(());
		}

		let end = offset
			.checked_add(len)
			.and_then(next_multiple_of_32)
			.ok_or(ExceptionalHaltReason::OutOfBounds)?;
		self.effective_len = max(self.effective_len, end);
		Ok(())
	}

	/// Copy `size` bytes out, reading zeros past the written part.
	pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
		let mut out = vec![0; size];
		if let Some(written) = self.data.get(offset..) {
			let n = min(size, written.len());
			out[..n].copy_from_slice(&written[..n]);
		}
		out
	}

	/// Grow over `[offset, offset + len)` and read it.
	pub fn load(&mut self, offset: U256, len: U256) -> Result<Vec<u8>, ExitError> {
		if len.is_zero() {
			return Ok(Vec::new());
		}

		self.resize_offset(offset, len)?;
		Ok(self.get(u256_to_usize(offset)?, u256_to_usize(len)?))
	}

	/// Write `value` at `offset`. With a `target_size` longer than the value
	/// the rest of the region is zeroed; with a shorter one the value is cut.
	pub fn set(
		&mut self,
		offset: usize,
		value: &[u8],
		target_size: Option<usize>,
	) -> Result<(), ExitFatal> {
		let size = target_size.unwrap_or(value.len());
		if size == 0 {
			return Ok(());
		}

		let end = offset
			.checked_add(size)
			.filter(|end| *end <= self.limit)
			.ok_or(ExitFatal::NotSupported)?;
		if self.data.len() < end {
			self.data.resize(end, 0);
		}

		let (copied, zeroed) = self.data[offset..end].split_at_mut(min(value.len(), size));
		copied.copy_from_slice(&value[..copied.len()]);
		zeroed.fill(0);
		Ok(())
	}

	/// Copy `len` bytes of `data` starting at `data_offset` into memory at
	/// `memory_offset`. Source bytes past the end of `data` read as zero.
	pub fn copy_large(
		&mut self,
		memory_offset: U256,
		data_offset: U256,
		len: U256,
		data: &[u8],
	) -> Result<(), ExitError> {
		if len.is_zero() {
			return Ok(());
		}

		let memory_offset = u256_to_usize(memory_offset)?;
		let len = u256_to_usize(len)?;
		let source = if data_offset < U256::from(data.len()) {
			let start = data_offset.as_usize();
			&data[start..min(start.saturating_add(len), data.len())]
		} else {
			&[]
		};

		Ok(self.set(memory_offset, source, Some(len))?)
	}
}

/// Round up to the next multiple of 32, `None` on overflow.
#[inline]
pub fn next_multiple_of_32(x: U256) -> Option<U256> {
	match x.low_u32() % 32 {
		0 => Some(x),
		r => x.checked_add(U256::from(32 - r)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rounds_up_to_words() {
		let cases = [(0u64, 0u64), (1, 32), (31, 32), (32, 32), (33, 64), (1000, 1024)];
		for (value, rounded) in cases {
			assert_eq!(next_multiple_of_32(value.into()), Some(rounded.into()));
		}

		let top = U256::MAX - 31;
		assert_eq!(next_multiple_of_32(top), Some(top));
		assert_eq!(next_multiple_of_32(top + 1), None);
		assert_eq!(next_multiple_of_32(U256::MAX), None);
	}

	#[test]
	fn resize_is_monotonic() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_offset(U256::from(10), U256::from(1)).unwrap();
		assert_eq!(memory.effective_len(), U256::from(32));

		memory.resize_offset(U256::zero(), U256::from(1)).unwrap();
		assert_eq!(memory.effective_len(), U256::from(32));

		memory.resize_offset(U256::from(1000), U256::zero()).unwrap();
		assert_eq!(memory.effective_len(), U256::from(32));

		memory.resize_offset(U256::from(33), U256::from(32)).unwrap();
		assert_eq!(memory.effective_len(), U256::from(96));

		assert_eq!(
			memory.resize_offset(U256::MAX, U256::from(1)),
			Err(ExceptionalHaltReason::OutOfBounds)
		);
	}

	#[test]
	fn copy_large_pads_with_zeros() {
		let mut memory = Memory::new(usize::MAX);
		memory.set(0, &[0xff; 8], None).unwrap();
		memory
			.copy_large(U256::zero(), U256::from(2), U256::from(8), &[1, 2, 3, 4])
			.unwrap();

		assert_eq!(memory.get(0, 8), vec![3, 4, 0, 0, 0, 0, 0, 0]);
		assert_eq!(memory.get(6, 4), vec![0, 0, 0, 0]);
	}
}
