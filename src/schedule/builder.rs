use std::collections::BTreeMap;
use std::sync::Arc;

use primitive_types::{H160, U256};

use super::dao::DAO_EXTRA_DATA_RANGE;
use super::{
	DaoConfig, DaoPhase, Hardfork, ProtocolSchedule, ProtocolSpec, ScheduleError,
	MAINNET_DAO_REFUND_CONTRACT,
};

/// Fork activation blocks, as found in a geth genesis `config` object.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
	feature = "serde",
	derive(serde::Serialize, serde::Deserialize),
	serde(rename_all = "camelCase", default)
)]
pub struct ChainConfig {
	pub chain_id: Option<u64>,
	pub homestead_block: Option<u64>,
	pub dao_fork_block: Option<u64>,
	pub dao_fork_support: bool,
	pub eip150_block: Option<u64>,
	pub eip158_block: Option<u64>,
	pub byzantium_block: Option<u64>,
	pub constantinople_block: Option<u64>,
	pub petersburg_block: Option<u64>,
	pub istanbul_block: Option<u64>,
}

impl ChainConfig {
	/// Configured forks with their activation blocks, oldest first.
	pub fn milestones(&self) -> Vec<(Hardfork, u64)> {
		[
			(Hardfork::Homestead, self.homestead_block),
			(Hardfork::TangerineWhistle, self.eip150_block),
			(Hardfork::SpuriousDragon, self.eip158_block),
			(Hardfork::Byzantium, self.byzantium_block),
			(Hardfork::Constantinople, self.constantinople_block),
			(Hardfork::Petersburg, self.petersburg_block),
			(Hardfork::Istanbul, self.istanbul_block),
		]
		.into_iter()
		.filter_map(|(fork, block)| block.map(|block| (fork, block)))
		.collect()
	}
}

/// Assembles a [ProtocolSchedule] from fork activation blocks.
#[derive(Clone, Debug, Default)]
pub struct ProtocolScheduleBuilder {
	chain_id: Option<U256>,
	milestones: BTreeMap<Hardfork, u64>,
	dao: Option<DaoConfig>,
}

impl ProtocolScheduleBuilder {
	pub fn new(chain_id: Option<U256>) -> Self {
		Self {
			chain_id,
			..Default::default()
		}
	}

	/// Builder for a geth-style chain config. A supported DAO fork starts
	/// with an empty drain list, see [Self::dao_drain_list].
	pub fn from_chain_config(config: &ChainConfig) -> Self {
		let mut builder = Self::new(config.chain_id.map(U256::from));
		for (fork, block) in config.milestones() {
			builder = builder.milestone(fork, block);
		}
		if let (Some(block), true) = (config.dao_fork_block, config.dao_fork_support) {
			builder = builder.dao(DaoConfig {
				block,
				refund_contract: MAINNET_DAO_REFUND_CONTRACT,
				drain_list: Vec::new(),
			});
		}
		builder
	}

	/// Builder for forks given by name, as test suites and CLIs do.
	pub fn from_named_milestones<'a, I>(
		chain_id: Option<U256>,
		milestones: I,
	) -> Result<Self, ScheduleError>
	where
		I: IntoIterator<Item = (&'a str, u64)>,
	{
		let mut builder = Self::new(chain_id);
		for (name, block) in milestones {
			builder = builder.milestone(name.parse()?, block);
		}
		Ok(builder)
	}

	/// Activate `fork` at `block`. Frontier is always active from genesis.
	pub fn milestone(mut self, fork: Hardfork, block: u64) -> Self {
		self.milestones.insert(fork, block);
		self
	}

	pub fn dao(mut self, dao: DaoConfig) -> Self {
		self.dao = Some(dao);
		self
	}

	/// Replace the accounts drained at the DAO fork. No effect without a DAO
	/// fork.
	pub fn dao_drain_list(mut self, drain_list: Vec<H160>) -> Self {
		if let Some(dao) = self.dao.as_mut() {
			dao.drain_list = drain_list;
		}
		self
	}

	pub fn build(self) -> Result<ProtocolSchedule, ScheduleError> {
		let mut previous = (Hardfork::Frontier, 0);
		for (&fork, &block) in &self.milestones {
			if block < previous.1 {
				return Err(ScheduleError::ForkOutOfOrder {
					fork,
					block,
					previous: previous.0,
					previous_block: previous.1,
				});
			}
			previous = (fork, block);
		}

		let genesis = Arc::new(ProtocolSpec::new(Hardfork::Frontier, self.chain_id));
		let mut milestones = BTreeMap::new();
		milestones.insert(0, genesis.clone());
		for (&fork, &block) in &self.milestones {
			log::debug!(target: "evm", "{} activates at block {}", fork, block);
			milestones.insert(block, Arc::new(ProtocolSpec::new(fork, self.chain_id)));
		}

		if let Some(dao) = self.dao {
			let active_at = |number: u64| -> Arc<ProtocolSpec> {
				milestones
					.range(..=number)
					.next_back()
					.map(|(_, spec)| spec.clone())
					.unwrap_or_else(|| genesis.clone())
			};
			let transition_block = dao.block.saturating_add(1);
			let restore_block = dao.block.saturating_add(DAO_EXTRA_DATA_RANGE);
			if let Some((&fork, &block)) = self
				.milestones
				.iter()
				.find(|(_, block)| **block > transition_block && **block < restore_block)
			{
				return Err(ScheduleError::ForkInsideDaoWindow {
					fork,
					block,
					dao_block: dao.block,
				});
			}
			let init = active_at(dao.block);
			let transition = active_at(transition_block);
			let restored = active_at(restore_block);

			log::debug!(
				target: "evm",
				"DAO fork at block {}, {} rules restored at block {}",
				dao.block,
				restored.hardfork(),
				restore_block
			);
			milestones.insert(
				dao.block,
				Arc::new(init.with_dao(DaoPhase::Init, dao.clone())),
			);
			milestones.insert(
				transition_block,
				Arc::new(transition.with_dao(DaoPhase::Transition, dao)),
			);
			milestones.insert(restore_block, restored);
		}

		Ok(ProtocolSchedule::new(genesis, milestones, self.chain_id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_takes_latest_milestone_not_above_block() {
		let schedule = ProtocolScheduleBuilder::new(None)
			.milestone(Hardfork::Homestead, 10)
			.milestone(Hardfork::TangerineWhistle, 20)
			.build()
			.unwrap();

		assert_eq!(schedule.spec_for(0).hardfork(), Hardfork::Frontier);
		assert_eq!(schedule.spec_for(9).hardfork(), Hardfork::Frontier);
		assert_eq!(schedule.spec_for(10).hardfork(), Hardfork::Homestead);
		assert_eq!(schedule.spec_for(19).hardfork(), Hardfork::Homestead);
		assert_eq!(schedule.spec_for(u64::MAX).hardfork(), Hardfork::TangerineWhistle);
	}

	#[test]
	fn forks_sharing_a_block_resolve_to_the_latest() {
		let schedule = ProtocolScheduleBuilder::new(None)
			.milestone(Hardfork::Constantinople, 5)
			.milestone(Hardfork::Petersburg, 5)
			.build()
			.unwrap();

		assert_eq!(schedule.spec_for(5).hardfork(), Hardfork::Petersburg);
	}

	#[test]
	fn out_of_order_forks_are_rejected() {
		let err = ProtocolScheduleBuilder::new(None)
			.milestone(Hardfork::Homestead, 100)
			.milestone(Hardfork::Byzantium, 50)
			.build()
			.unwrap_err();

		assert_eq!(
			err,
			ScheduleError::ForkOutOfOrder {
				fork: Hardfork::Byzantium,
				block: 50,
				previous: Hardfork::Homestead,
				previous_block: 100,
			}
		);
	}

	#[test]
	fn forks_cannot_split_the_dao_window() {
		let dao = DaoConfig {
			block: 100,
			refund_contract: MAINNET_DAO_REFUND_CONTRACT,
			drain_list: Vec::new(),
		};

		let err = ProtocolScheduleBuilder::new(None)
			.milestone(Hardfork::Homestead, 50)
			.milestone(Hardfork::TangerineWhistle, 105)
			.dao(dao.clone())
			.build()
			.unwrap_err();
		assert_eq!(
			err,
			ScheduleError::ForkInsideDaoWindow {
				fork: Hardfork::TangerineWhistle,
				block: 105,
				dao_block: 100,
			}
		);

		for block in [101, 110] {
			let schedule = ProtocolScheduleBuilder::new(None)
				.milestone(Hardfork::Homestead, 50)
				.milestone(Hardfork::TangerineWhistle, block)
				.dao(dao.clone())
				.build()
				.unwrap();
			assert_eq!(schedule.spec_for(110).hardfork(), Hardfork::TangerineWhistle);
		}
	}

	#[test]
	fn chain_config_lists_configured_forks() {
		let config = ChainConfig {
			chain_id: Some(1),
			homestead_block: Some(1_150_000),
			eip150_block: Some(2_463_000),
			..Default::default()
		};

		assert_eq!(
			config.milestones(),
			vec![
				(Hardfork::Homestead, 1_150_000),
				(Hardfork::TangerineWhistle, 2_463_000)
			]
		);
		let schedule = ProtocolScheduleBuilder::from_chain_config(&config)
			.build()
			.unwrap();
		assert_eq!(schedule.chain_id(), Some(U256::one()));
	}
}
