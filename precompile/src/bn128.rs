use bn::{AffineG1, AffineG2, Fq, Fq2, Fr, Group, Gt, G1, G2};
use forkevm_interpreter::{ExceptionalHaltReason, ExitError};

use crate::{right_pad, GasMutState, PurePrecompile};

/// Bytes of an `Fq` element, the base field of BN254.
const FQ_LEN: usize = 32;
/// Bytes of an `Fr` scalar.
const SCALAR_LEN: usize = 32;
const FQ2_LEN: usize = 2 * FQ_LEN;
/// An uncompressed G1 point is two `Fq` coordinates.
const G1_LEN: usize = 2 * FQ_LEN;
/// An uncompressed G2 point is two `Fq2` coordinates.
const G2_LEN: usize = 2 * FQ2_LEN;

const ADD_INPUT_LEN: usize = 2 * G1_LEN;
const MUL_INPUT_LEN: usize = G1_LEN + SCALAR_LEN;
const PAIR_ELEMENT_LEN: usize = G1_LEN + G2_LEN;

fn invalid(reason: &'static str) -> ExitError {
	ExceptionalHaltReason::Other(reason.into()).into()
}

macro_rules! bn128_precompile {
	($name:ident, $run:ident, $($cost:expr),+) => {
		pub struct $name;

		impl PurePrecompile for $name {
			fn run(&self, input: &[u8], gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
				$run(input, $($cost,)+ gasometer)
			}
		}
	};
}

bn128_precompile!(Bn128AddByzantium, run_add, 500);
bn128_precompile!(Bn128AddIstanbul, run_add, 150);
bn128_precompile!(Bn128MulByzantium, run_mul, 40_000);
bn128_precompile!(Bn128MulIstanbul, run_mul, 6_000);
bn128_precompile!(Bn128PairingByzantium, run_pair, 80_000, 100_000);
bn128_precompile!(Bn128PairingIstanbul, run_pair, 34_000, 45_000);

fn run_add(input: &[u8], gas_cost: u64, gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
	gasometer.record_gas(gas_cost)?;

	let input = right_pad::<ADD_INPUT_LEN>(input);
	let p1 = read_g1_point(&input[..G1_LEN])?;
	let p2 = read_g1_point(&input[G1_LEN..])?;

	Ok(encode_g1_point(p1 + p2).to_vec())
}

fn run_mul(input: &[u8], gas_cost: u64, gasometer: &mut dyn GasMutState) -> Result<Vec<u8>, ExitError> {
	gasometer.record_gas(gas_cost)?;

	let input = right_pad::<MUL_INPUT_LEN>(input);
	let p = read_g1_point(&input[..G1_LEN])?;
	let fr = Fr::from_slice(&input[G1_LEN..]).map_err(|_| invalid("invalid bn128 scalar"))?;

	Ok(encode_g1_point(p * fr).to_vec())
}

fn run_pair(
	input: &[u8],
	pair_per_point_cost: u64,
	pair_base_cost: u64,
	gasometer: &mut dyn GasMutState,
) -> Result<Vec<u8>, ExitError> {
	let gas_used = ((input.len() / PAIR_ELEMENT_LEN) as u64)
		.saturating_mul(pair_per_point_cost)
		.saturating_add(pair_base_cost);
	gasometer.record_gas(gas_used)?;

	if input.len() % PAIR_ELEMENT_LEN != 0 {
		return Err(invalid("bn128 pairing input is not a multiple of 192 bytes"));
	}

	let mut pairs = Vec::with_capacity(input.len() / PAIR_ELEMENT_LEN);
	for element in input.chunks(PAIR_ELEMENT_LEN) {
		let g1 = read_g1_point(&element[..G1_LEN])?;
		let g2 = read_g2_point(&element[G1_LEN..])?;

		// Pairs with a point at infinity contribute the identity.
		if !g1.is_zero() && !g2.is_zero() {
			pairs.push((g1, g2));
		}
	}

	let success = pairs.is_empty() || bn::pairing_batch(&pairs) == Gt::one();

	let mut out = vec![0u8; 32];
	if success {
		out[31] = 1;
	}
	Ok(out)
}

fn read_fq(input: &[u8]) -> Result<Fq, ExitError> {
	Fq::from_slice(&input[..FQ_LEN]).map_err(|_| invalid("invalid bn128 field element"))
}

/// The imaginary part comes first on the wire.
fn read_fq2(input: &[u8]) -> Result<Fq2, ExitError> {
	let y = read_fq(&input[..FQ_LEN])?;
	let x = read_fq(&input[FQ_LEN..FQ2_LEN])?;
	Ok(Fq2::new(x, y))
}

/// `(0, 0)` encodes the point at infinity, which `AffineG1` cannot hold.
fn read_g1_point(input: &[u8]) -> Result<G1, ExitError> {
	let px = read_fq(&input[0..FQ_LEN])?;
	let py = read_fq(&input[FQ_LEN..G1_LEN])?;

	if px == Fq::zero() && py == Fq::zero() {
		Ok(G1::zero())
	} else {
		AffineG1::new(px, py)
			.map(Into::into)
			.map_err(|_| invalid("bn128 point not on curve"))
	}
}

fn read_g2_point(input: &[u8]) -> Result<G2, ExitError> {
	let x = read_fq2(&input[0..FQ2_LEN])?;
	let y = read_fq2(&input[FQ2_LEN..G2_LEN])?;

	if x.is_zero() && y.is_zero() {
		Ok(G2::zero())
	} else {
		AffineG2::new(x, y)
			.map(Into::into)
			.map_err(|_| invalid("bn128 point not on curve"))
	}
}

fn encode_g1_point(point: G1) -> [u8; G1_LEN] {
	let mut output = [0u8; G1_LEN];

	if let Some(affine) = AffineG1::from_jacobian(point) {
		// Both slices are exactly one field element long.
		let _ = affine.x().to_big_endian(&mut output[..FQ_LEN]);
		let _ = affine.y().to_big_endian(&mut output[FQ_LEN..]);
	}

	output
}
