use forkevm_interpreter::ExitError;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha2::Digest as _;
use sha3::Keccak256;

use crate::{charge_per_word, right_pad, GasMutState, PurePrecompile};

/// `ecrecover(hash, v, r, s)`: the signer address, left-padded to a word.
/// Anything that does not recover yields empty output, not a failure.
pub struct ECRecover;

impl PurePrecompile for ECRecover {
	fn run(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
		charge_per_word(gasometer, input, 3_000, 0)?;

		let input = right_pad::<128>(input);
		let (hash, rest) = input.split_at(32);
		let (v, signature) = rest.split_at(32);

		// v is a whole word and must read 27 or 28.
		if v[..31].iter().any(|byte| *byte != 0) || !matches!(v[31], 27 | 28) {
			return Ok(Vec::new());
		}

		Ok(recover(hash, v[31] - 27, signature)
			.map(|address| {
				let mut word = vec![0u8; 12];
				word.extend_from_slice(&address);
				word
			})
			.unwrap_or_default())
	}
}

fn recover(hash: &[u8], recovery: u8, signature: &[u8]) -> Option<[u8; 20]> {
	let signature = Signature::from_slice(signature).ok()?;
	let recovery = RecoveryId::from_byte(recovery)?;
	// High s values are accepted here, k256 only recovers from low ones.
	let (signature, recovery) = match signature.normalize_s() {
		Some(low) => (
			low,
			RecoveryId::new(!recovery.is_y_odd(), recovery.is_x_reduced()),
		),
		None => (signature, recovery),
	};
	let key = VerifyingKey::recover_from_prehash(hash, &signature, recovery).ok()?;

	let point = key.to_encoded_point(false);
	let digest = Keccak256::digest(&point.as_bytes()[1..]);
	let mut address = [0u8; 20];
	address.copy_from_slice(&digest[12..]);
	Some(address)
}

pub struct Sha256;

impl PurePrecompile for Sha256 {
	fn run(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
		charge_per_word(gasometer, input, 60, 12)?;
		Ok(sha2::Sha256::digest(input).to_vec())
	}
}

/// RIPEMD-160 digest, left-padded to a word.
pub struct Ripemd160;

impl PurePrecompile for Ripemd160 {
	fn run(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
		charge_per_word(gasometer, input, 600, 120)?;

		let mut output = vec![0u8; 12];
		output.extend_from_slice(&ripemd::Ripemd160::digest(input));
		Ok(output)
	}
}

pub struct Identity;

impl PurePrecompile for Identity {
	fn run(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
		charge_per_word(gasometer, input, 15, 3)?;
		Ok(input.to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::Meter;
	use forkevm_interpreter::ExitSucceed;

	#[test]
	fn ecrecover_recovers_signer() {
		let input = hex::decode(
			"456e9aea5e197a1f1af7a3e85a3212fa4049a3ba34c2289b4c860fc0b0c64ef3\
			 000000000000000000000000000000000000000000000000000000000000001c\
			 9242685bf161793cc25603c231bc2f568eb630ea16aa137d2664ac8038825608\
			 4f8ae3bd7535248d0bd448298cc2e2071e56992d0774dc340c368ae950852ada",
		)
		.unwrap();
		let mut meter = Meter { left: 3000 };

		let (result, out) = ECRecover.execute(&input, &mut meter);
		assert_eq!(result, Ok(ExitSucceed::Returned));
		assert_eq!(
			hex::encode(out),
			"0000000000000000000000007156526fbd7a3c72969b54f64e42c10fbb768c8a"
		);
		assert_eq!(meter.left, 0);
	}

	#[test]
	fn ecrecover_rejects_bad_v() {
		let mut input = [0u8; 128];
		input[63] = 29;
		let mut meter = Meter { left: 5000 };

		let (result, out) = ECRecover.execute(&input, &mut meter);
		assert_eq!(result, Ok(ExitSucceed::Returned));
		assert!(out.is_empty());
		assert_eq!(meter.left, 2000);
	}

	#[test]
	fn short_input_is_zero_padded() {
		let mut meter = Meter { left: 3000 };
		let (result, out) = ECRecover.execute(&[0x01], &mut meter);
		assert_eq!(result, Ok(ExitSucceed::Returned));
		assert!(out.is_empty());
	}
}
