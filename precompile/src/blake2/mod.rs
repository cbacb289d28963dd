mod eip152;

use forkevm_interpreter::{ExceptionalHaltReason, ExitError};

use crate::{GasMutState, PurePrecompile};

pub struct Blake2F;

impl Blake2F {
	const GAS_COST_PER_ROUND: u64 = 1;
}

fn le_words<const N: usize>(bytes: &[u8]) -> [u64; N] {
	let mut words = [0u64; N];
	for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
		let mut buf = [0u8; 8];
		buf.copy_from_slice(chunk);
		*word = u64::from_le_bytes(buf);
	}
	words
}

impl PurePrecompile for Blake2F {
	/// Format of `input`:
	/// [4 bytes for rounds][64 bytes for h][128 bytes for m][8 bytes for t_0][8 bytes for t_1][1 byte for f]
	fn run(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
		const BLAKE2_F_ARG_LEN: usize = 213;

		if input.len() != BLAKE2_F_ARG_LEN {
			return Err(ExceptionalHaltReason::Other(
				"blake2f input must be exactly 213 bytes".into(),
			)
			.into());
		}

		let mut rounds_buf = [0u8; 4];
		rounds_buf.copy_from_slice(&input[0..4]);
		let rounds = u32::from_be_bytes(rounds_buf);

		gasometer.record_gas(u64::from(rounds) * Blake2F::GAS_COST_PER_ROUND)?;

		let f = match input[212] {
			0 => false,
			1 => true,
			_ => {
				return Err(
					ExceptionalHaltReason::Other("blake2f final block flag must be 0 or 1".into())
						.into(),
				)
			}
		};

		let mut h = le_words::<8>(&input[4..68]);
		let m = le_words::<16>(&input[68..196]);
		let t = le_words::<2>(&input[196..212]);

		eip152::compress(&mut h, m, t, f, rounds as usize);

		let mut output = Vec::with_capacity(64);
		for word in h.iter() {
			output.extend_from_slice(&word.to_le_bytes());
		}

		Ok(output)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use forkevm_interpreter::ExitSucceed;
	use crate::tests::Meter;

	// Vector 5 of EIP-152: BLAKE2b of "abc" in 12 rounds.
	const INPUT: &str = "0000000c48c9bdf267e6096a3ba7ca8485ae67bb2bf894fe72f36e3cf1361d5f3af54fa5d182e6ad7f520e511f6c3e2b8c68059b6bbd41fbabd9831f79217e1319cde05b61626300000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000300000000000000000000000000000001";
	const OUTPUT: &str = "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d17d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923";

	#[test]
	fn abc_twelve_rounds() {
		let input = hex::decode(INPUT).unwrap();
		let mut meter = Meter { left: 12 };

		let (result, out) = Blake2F.execute(&input, &mut meter);
		assert_eq!(result, Ok(ExitSucceed::Returned));
		assert_eq!(hex::encode(out), OUTPUT);
		assert_eq!(meter.left, 0);
	}

	#[test]
	fn wrong_length_halts() {
		let mut meter = Meter { left: 12 };
		let (result, _) = Blake2F.execute(&[0u8; 212], &mut meter);
		assert!(result.is_err());
		assert_eq!(meter.left, 12);
	}
}
