use forkevm_interpreter::{Log, RuntimeBackend};
use primitive_types::{H160, H256, U256};

use super::dao::DAO_EXTRA_DATA;
use super::{DaoPhase, ProtocolSpec, ReceiptFormat};
use crate::backend::{BlockEnvironment, BlockHashLookup, MutableWorldState, OverlayedBackend};
use crate::standard::{apply_transaction, Transaction, TransactionInvalid};

/// Ommers older than this many generations earn nothing.
const MAX_OMMER_DEPTH: u64 = 6;

/// Header fields the processor reads.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockHeader {
	pub number: u64,
	pub coinbase: H160,
	pub timestamp: U256,
	pub difficulty: U256,
	pub gas_limit: u64,
	pub extra_data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OmmerHeader {
	pub number: u64,
	pub coinbase: H160,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Block {
	pub header: BlockHeader,
	pub transactions: Vec<Transaction>,
	pub ommers: Vec<OmmerHeader>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReceiptOutcome {
	StateRoot(H256),
	Status(bool),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
	pub outcome: ReceiptOutcome,
	pub cumulative_gas_used: u64,
	pub logs: Vec<Log>,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum BlockError {
	#[error("transaction {index} is invalid: {source}")]
	InvalidTransaction {
		index: usize,
		#[source]
		source: TransactionInvalid,
	},
	#[error("block {0} is inside the DAO fork window but lacks the fork marker")]
	MissingDaoMarker(u64),
	#[error("ommer at block {ommer} cannot be included in block {block}")]
	InvalidOmmer { ommer: u64, block: u64 },
}

/// Applies whole blocks under one [ProtocolSpec].
pub struct BlockProcessor<'spec> {
	spec: &'spec ProtocolSpec,
}

impl<'spec> BlockProcessor<'spec> {
	pub fn new(spec: &'spec ProtocolSpec) -> Self {
		Self { spec }
	}

	/// Checks the header fields that depend on the fork.
	pub fn validate_header(&self, header: &BlockHeader) -> Result<(), BlockError> {
		if self.spec.dao().is_some() && header.extra_data != DAO_EXTRA_DATA {
			return Err(BlockError::MissingDaoMarker(header.number));
		}
		Ok(())
	}

	/// Execute `block` on top of `world` and pay the miners. `block_hashes`
	/// serves `BLOCKHASH` lookups.
	pub fn process<W: MutableWorldState, L: BlockHashLookup>(
		&self,
		world: &mut W,
		block: &Block,
		block_hashes: L,
	) -> Result<Vec<Receipt>, BlockError> {
		let header = &block.header;
		self.validate_header(header)?;
		for ommer in &block.ommers {
			if ommer.number >= header.number || header.number - ommer.number > MAX_OMMER_DEPTH {
				return Err(BlockError::InvalidOmmer {
					ommer: ommer.number,
					block: header.number,
				});
			}
		}

		if let Some((DaoPhase::Init, dao)) = self.spec.dao() {
			let mut backend = OverlayedBackend::new(&*world, ());
			dao.apply(&mut backend);
			let (_, changeset) = backend.deconstruct();
			world.apply(changeset);
		}

		let environment = BlockEnvironment {
			number: U256::from(header.number),
			coinbase: header.coinbase,
			timestamp: header.timestamp,
			difficulty: header.difficulty,
			gas_limit: U256::from(header.gas_limit),
			chain_id: self.spec.validator().chain_id.unwrap_or_default(),
			block_hashes,
		};
		let invoker = self.spec.invoker();

		let mut receipts = Vec::with_capacity(block.transactions.len());
		let mut cumulative_gas_used = 0u64;
		for (index, transaction) in block.transactions.iter().enumerate() {
			let (outcome, logs) = apply_transaction(
				&invoker,
				self.spec.validator(),
				transaction,
				world,
				&environment,
				header.gas_limit - cumulative_gas_used,
			)
			.map_err(|source| BlockError::InvalidTransaction { index, source })?;
			cumulative_gas_used += outcome.gas_used;

			let outcome = match self.spec.receipt_format() {
				ReceiptFormat::StateRoot => ReceiptOutcome::StateRoot(world.state_root()),
				ReceiptFormat::Status => ReceiptOutcome::Status(outcome.is_success()),
			};
			receipts.push(Receipt {
				outcome,
				cumulative_gas_used,
				logs,
			});
		}

		self.reward(world, block);
		log::debug!(
			target: "evm",
			"block {} processed under {}, {} transactions, {} gas",
			header.number,
			self.spec.hardfork(),
			receipts.len(),
			cumulative_gas_used
		);

		Ok(receipts)
	}

	/// Block reward plus 1/32 of it per ommer to the miner, and to each ommer
	/// `(8 - depth) / 8` of it.
	fn reward<W: MutableWorldState>(&self, world: &mut W, block: &Block) {
		let reward = self.spec.block_reward();
		let number = block.header.number;
		let mut backend = OverlayedBackend::new(&*world, ());

		let miner_reward = reward + reward / 32 * U256::from(block.ommers.len());
		backend.deposit(block.header.coinbase, miner_reward);
		backend.touch(block.header.coinbase);
		for ommer in &block.ommers {
			let ommer_reward = reward * U256::from(8 + ommer.number - number) / 8;
			backend.deposit(ommer.coinbase, ommer_reward);
			backend.touch(ommer.coinbase);
		}

		let (_, changeset) = backend.deconstruct();
		world.apply(changeset);
	}
}
