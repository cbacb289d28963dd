//! Which rules apply at which block.
//!
//! A [ProtocolSchedule] maps activation blocks to immutable
//! [ProtocolSpec]s. Schedules are assembled by the [ProtocolScheduleBuilder],
//! which rejects inconsistent fork configurations before anything runs.

mod block;
mod builder;
mod dao;
mod spec;

pub use self::block::{
	Block, BlockError, BlockHeader, BlockProcessor, OmmerHeader, Receipt, ReceiptOutcome,
};
pub use self::builder::{ChainConfig, ProtocolScheduleBuilder};
pub use self::dao::{
	DaoConfig, DaoPhase, DAO_EXTRA_DATA, DAO_EXTRA_DATA_RANGE, MAINNET_DAO_REFUND_CONTRACT,
};
pub use self::spec::{ProtocolSpec, ReceiptFormat};

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;
use std::sync::Arc;

use primitive_types::U256;

use crate::standard::Config;

/// Mainnet protocol upgrades, in activation order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hardfork {
	Frontier,
	Homestead,
	TangerineWhistle,
	SpuriousDragon,
	Byzantium,
	Constantinople,
	Petersburg,
	Istanbul,
}

impl Hardfork {
	/// Every fork, oldest first.
	pub const ALL: [Hardfork; 8] = [
		Hardfork::Frontier,
		Hardfork::Homestead,
		Hardfork::TangerineWhistle,
		Hardfork::SpuriousDragon,
		Hardfork::Byzantium,
		Hardfork::Constantinople,
		Hardfork::Petersburg,
		Hardfork::Istanbul,
	];

	pub const fn config(self) -> Config {
		match self {
			Hardfork::Frontier => Config::frontier(),
			Hardfork::Homestead => Config::homestead(),
			Hardfork::TangerineWhistle => Config::tangerine_whistle(),
			Hardfork::SpuriousDragon => Config::spurious_dragon(),
			Hardfork::Byzantium => Config::byzantium(),
			Hardfork::Constantinople => Config::constantinople(),
			Hardfork::Petersburg => Config::petersburg(),
			Hardfork::Istanbul => Config::istanbul(),
		}
	}

	/// Reward for mining a block, in wei.
	pub fn block_reward(self) -> U256 {
		let ether = U256::exp10(18);
		if self >= Hardfork::Constantinople {
			ether * 2
		} else if self >= Hardfork::Byzantium {
			ether * 3
		} else {
			ether * 5
		}
	}

	pub const fn receipt_format(self) -> ReceiptFormat {
		match self {
			Hardfork::Frontier
			| Hardfork::Homestead
			| Hardfork::TangerineWhistle
			| Hardfork::SpuriousDragon => ReceiptFormat::StateRoot,
			_ => ReceiptFormat::Status,
		}
	}

	pub const fn name(self) -> &'static str {
		match self {
			Hardfork::Frontier => "Frontier",
			Hardfork::Homestead => "Homestead",
			Hardfork::TangerineWhistle => "TangerineWhistle",
			Hardfork::SpuriousDragon => "SpuriousDragon",
			Hardfork::Byzantium => "Byzantium",
			Hardfork::Constantinople => "Constantinople",
			Hardfork::Petersburg => "Petersburg",
			Hardfork::Istanbul => "Istanbul",
		}
	}
}

impl fmt::Display for Hardfork {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Hardfork {
	type Err = ScheduleError;

	/// Accepts the fork names and the EIP aliases used by the Ethereum test
	/// suites, ignoring case.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let fork = match s.to_ascii_lowercase().as_str() {
			"frontier" => Hardfork::Frontier,
			"homestead" => Hardfork::Homestead,
			"tangerinewhistle" | "eip150" => Hardfork::TangerineWhistle,
			"spuriousdragon" | "eip158" => Hardfork::SpuriousDragon,
			"byzantium" => Hardfork::Byzantium,
			"constantinople" => Hardfork::Constantinople,
			"petersburg" | "constantinoplefix" => Hardfork::Petersburg,
			"istanbul" => Hardfork::Istanbul,
			_ => return Err(ScheduleError::UnsupportedFork(s.to_owned())),
		};
		Ok(fork)
	}
}

/// Inconsistent schedule configuration.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ScheduleError {
	#[error("{fork} activates at block {block}, before {previous} at block {previous_block}")]
	ForkOutOfOrder {
		fork: Hardfork,
		block: u64,
		previous: Hardfork,
		previous_block: u64,
	},
	#[error("unsupported fork {0:?}")]
	UnsupportedFork(String),
	/// A fork would replace the DAO transition rules before the pre-DAO
	/// rules are restored.
	#[error("{fork} activates at block {block}, inside the DAO fork window starting at block {dao_block}")]
	ForkInsideDaoWindow {
		fork: Hardfork,
		block: u64,
		dao_block: u64,
	},
}

/// Protocol specs by activation block.
#[derive(Clone, Debug)]
pub struct ProtocolSchedule {
	genesis: Arc<ProtocolSpec>,
	milestones: BTreeMap<u64, Arc<ProtocolSpec>>,
	chain_id: Option<U256>,
}

impl ProtocolSchedule {
	pub(crate) fn new(
		genesis: Arc<ProtocolSpec>,
		milestones: BTreeMap<u64, Arc<ProtocolSpec>>,
		chain_id: Option<U256>,
	) -> Self {
		Self {
			genesis,
			milestones,
			chain_id,
		}
	}

	/// The [ProtocolSpec] with the greatest activation block not above `number`.
	pub fn spec_for(&self, number: u64) -> &Arc<ProtocolSpec> {
		self.milestones
			.range(..=number)
			.next_back()
			.map(|(_, spec)| spec)
			.unwrap_or(&self.genesis)
	}

	pub fn chain_id(&self) -> Option<U256> {
		self.chain_id
	}

	/// Activation blocks and their specs, in block order.
	pub fn milestones(&self) -> impl Iterator<Item = (u64, &Arc<ProtocolSpec>)> {
		self.milestones.iter().map(|(block, spec)| (*block, spec))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fork_names_parse_with_aliases() {
		assert_eq!("Istanbul".parse::<Hardfork>(), Ok(Hardfork::Istanbul));
		assert_eq!("EIP150".parse::<Hardfork>(), Ok(Hardfork::TangerineWhistle));
		assert_eq!("ConstantinopleFix".parse::<Hardfork>(), Ok(Hardfork::Petersburg));
		assert_eq!(
			"Berlin".parse::<Hardfork>(),
			Err(ScheduleError::UnsupportedFork("Berlin".into()))
		);
	}

	#[test]
	fn rewards_and_receipts_follow_forks() {
		let ether = U256::exp10(18);
		assert_eq!(Hardfork::Homestead.block_reward(), ether * 5);
		assert_eq!(Hardfork::Byzantium.block_reward(), ether * 3);
		assert_eq!(Hardfork::Petersburg.block_reward(), ether * 2);
		assert_eq!(Hardfork::SpuriousDragon.receipt_format(), ReceiptFormat::StateRoot);
		assert_eq!(Hardfork::Byzantium.receipt_format(), ReceiptFormat::Status);
	}
}
