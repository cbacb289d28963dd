use core::fmt;

use primitive_types::U256;

use super::{BlockProcessor, DaoConfig, DaoPhase, Hardfork};
use crate::standard::{Config, Evm, Invoker, StandardPrecompileSet, TransactionValidator};

/// What a receipt commits to besides gas and logs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReceiptFormat {
	/// Intermediate state root after the transaction.
	StateRoot,
	/// EIP-658 success flag.
	Status,
}

/// Everything needed to process blocks under one fork.
#[derive(Clone)]
pub struct ProtocolSpec {
	hardfork: Hardfork,
	evm: Evm,
	precompiles: StandardPrecompileSet,
	validator: TransactionValidator,
	block_reward: U256,
	receipt_format: ReceiptFormat,
	dao: Option<(DaoPhase, DaoConfig)>,
}

impl ProtocolSpec {
	/// The mainnet rules of `hardfork`. `chain_id` is what replay-protected
	/// transactions must carry.
	pub fn new(hardfork: Hardfork, chain_id: Option<U256>) -> Self {
		let config = hardfork.config();
		Self {
			hardfork,
			precompiles: config.precompiles,
			evm: Evm::new(config),
			validator: TransactionValidator { chain_id },
			block_reward: hardfork.block_reward(),
			receipt_format: hardfork.receipt_format(),
			dao: None,
		}
	}

	/// The same rules, inside the DAO fork window.
	pub fn with_dao(&self, phase: DaoPhase, dao: DaoConfig) -> Self {
		Self {
			dao: Some((phase, dao)),
			..self.clone()
		}
	}

	pub fn hardfork(&self) -> Hardfork {
		self.hardfork
	}

	pub fn evm(&self) -> &Evm {
		&self.evm
	}

	/// The gas calculator.
	pub fn config(&self) -> &Config {
		self.evm.config()
	}

	pub fn precompiles(&self) -> &StandardPrecompileSet {
		&self.precompiles
	}

	pub fn validator(&self) -> &TransactionValidator {
		&self.validator
	}

	pub fn block_reward(&self) -> U256 {
		self.block_reward
	}

	pub fn receipt_format(&self) -> ReceiptFormat {
		self.receipt_format
	}

	pub fn dao(&self) -> Option<(DaoPhase, &DaoConfig)> {
		self.dao.as_ref().map(|(phase, dao)| (*phase, dao))
	}

	pub fn invoker(&self) -> Invoker<'_> {
		Invoker::new(&self.evm, &self.precompiles)
	}

	pub fn block_processor(&self) -> BlockProcessor<'_> {
		BlockProcessor::new(self)
	}
}

impl fmt::Debug for ProtocolSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProtocolSpec")
			.field("hardfork", &self.hardfork)
			.field("precompiles", &self.precompiles)
			.field("validator", &self.validator)
			.field("block_reward", &self.block_reward)
			.field("receipt_format", &self.receipt_format)
			.field("dao", &self.dao)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn spec_bundles_the_fork_rules() {
		let spec = ProtocolSpec::new(Hardfork::Byzantium, Some(U256::one()));

		assert_eq!(spec.config(), &Config::byzantium());
		assert!(spec.precompiles().has_modexp);
		assert!(!spec.precompiles().has_blake2f);
		assert_eq!(spec.validator().chain_id, Some(U256::one()));
		assert_eq!(spec.receipt_format(), ReceiptFormat::Status);
		assert!(spec.dao().is_none());
	}
}
