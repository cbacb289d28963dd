use forkevm_interpreter::{
	ExceptionalHaltReason, ExitError, RuntimeBackend, Transfer,
};
use primitive_types::{H160, U256};

use crate::standard::gasometer::consts::G_CODEDEPOSIT;
use crate::standard::{Config, GasometerState};

/// All but one 64th of `gas`.
pub fn l64(gas: u64) -> u64 {
	gas - gas / 64
}

/// Set up the account of a new contract inside the create substate.
pub fn make_enter_create<H: RuntimeBackend + ?Sized>(
	config: &Config,
	caller: H160,
	address: H160,
	value: U256,
	handler: &mut H,
) -> Result<(), ExitError> {
	if handler.code_size(address) != U256::zero() || handler.nonce(address) != U256::zero() {
		return Err(ExceptionalHaltReason::ContractAddressCollision.into());
	}

	if config.contract_nonce_starts_at_one {
		handler.inc_nonce(address)?;
	}
	handler.reset_storage(address);

	handler.transfer(Transfer {
		source: caller,
		target: address,
		value,
	})
}

/// Store the code returned by init code, charging the deposit.
pub fn deploy_create_code<H: RuntimeBackend + ?Sized>(
	config: &Config,
	address: H160,
	code: &[u8],
	gasometer: &mut GasometerState<'_>,
	handler: &mut H,
) -> Result<(), ExitError> {
	if let Some(limit) = config.max_code_size {
		if code.len() > limit {
			return Err(ExceptionalHaltReason::CodeSizeExceeded.into());
		}
	}

	// Frontier keeps the account, with empty code, when the deposit cannot be
	// paid.
	let deposit = (code.len() as u64).saturating_mul(G_CODEDEPOSIT);
	if !config.strict_code_deposit && deposit > gasometer.gas64() {
		log::debug!(target: "evm", "code deposit of {} unpaid, {:?} left empty", deposit, address);
		return Ok(());
	}

	gasometer.record_codedeposit(code.len())?;
	handler.set_code(address, code.to_vec())
}
