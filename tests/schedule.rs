
use std::collections::BTreeMap;
use std::sync::Arc;

use forkevm::schedule::{
	Block, BlockError, BlockHeader, DaoConfig, DaoPhase, Hardfork, OmmerHeader,
	ProtocolScheduleBuilder, ReceiptOutcome, ScheduleError, DAO_EXTRA_DATA,
	MAINNET_DAO_REFUND_CONTRACT,
};
use forkevm::standard::{Transaction, TransactionInvalid};
use mock::*;
use primitive_types::{H160, U256};

const DAO_BLOCK: u64 = 100;

fn drained() -> H160 {
	H160::repeat_byte(0xd0)
}

fn dao_builder() -> ProtocolScheduleBuilder {
	ProtocolScheduleBuilder::new(Some(chain_id()))
		.milestone(Hardfork::Homestead, 0)
		.milestone(Hardfork::TangerineWhistle, 1_000)
		.dao(DaoConfig {
			block: DAO_BLOCK,
			refund_contract: MAINNET_DAO_REFUND_CONTRACT,
			drain_list: vec![drained()],
		})
}

fn header(number: u64, extra_data: &[u8]) -> BlockHeader {
	BlockHeader {
		number,
		coinbase: coinbase(),
		gas_limit: 1_000_000,
		extra_data: extra_data.to_vec(),
		..Default::default()
	}
}

fn empty_block(header: BlockHeader) -> Block {
	Block {
		header,
		..Default::default()
	}
}

#[test]
fn named_milestones_reject_unknown_forks() {
	let err = ProtocolScheduleBuilder::from_named_milestones(
		None,
		[("Homestead", 5), ("Berlin", 10)],
	)
	.unwrap_err();
	assert_eq!(err, ScheduleError::UnsupportedFork("Berlin".into()));

	let schedule =
		ProtocolScheduleBuilder::from_named_milestones(None, [("homestead", 5), ("EIP158", 10)])
			.unwrap()
			.build()
			.unwrap();
	assert_eq!(schedule.spec_for(4).hardfork(), Hardfork::Frontier);
	assert_eq!(schedule.spec_for(7).hardfork(), Hardfork::Homestead);
	assert_eq!(schedule.spec_for(10).hardfork(), Hardfork::SpuriousDragon);
}

#[test]
fn forks_must_not_go_backwards() {
	let err = ProtocolScheduleBuilder::new(None)
		.milestone(Hardfork::Byzantium, 10)
		.milestone(Hardfork::Istanbul, 5)
		.build()
		.unwrap_err();

	assert!(matches!(
		err,
		ScheduleError::ForkOutOfOrder {
			fork: Hardfork::Istanbul,
			previous: Hardfork::Byzantium,
			..
		}
	));
}

#[test]
fn dao_window_phases() {
	let schedule = dao_builder().build().unwrap();

	assert!(schedule.spec_for(DAO_BLOCK - 1).dao().is_none());
	assert!(matches!(
		schedule.spec_for(DAO_BLOCK).dao(),
		Some((DaoPhase::Init, _))
	));
	for number in DAO_BLOCK + 1..DAO_BLOCK + 10 {
		let spec = schedule.spec_for(number);
		assert!(matches!(spec.dao(), Some((DaoPhase::Transition, _))));
		assert_eq!(spec.hardfork(), Hardfork::Homestead);
	}
	assert!(schedule.spec_for(DAO_BLOCK + 10).dao().is_none());
	assert!(Arc::ptr_eq(
		schedule.spec_for(DAO_BLOCK - 1),
		schedule.spec_for(DAO_BLOCK + 10)
	));
	assert_eq!(schedule.spec_for(1_000).hardfork(), Hardfork::TangerineWhistle);
}

#[test]
fn dao_fork_block_drains_balances() {
	let schedule = dao_builder().build().unwrap();
	let mut world = world(None);
	world.accounts.entry(drained()).or_default().balance = U256::from(12_345);

	let fork_block = empty_block(header(DAO_BLOCK, DAO_EXTRA_DATA));
	schedule
		.spec_for(DAO_BLOCK)
		.block_processor()
		.process(&mut world, &fork_block, BTreeMap::new())
		.unwrap();

	assert_eq!(balance(&world, drained()), U256::zero());
	assert_eq!(balance(&world, MAINNET_DAO_REFUND_CONTRACT), U256::from(12_345));
	assert_eq!(balance(&world, coinbase()), U256::exp10(18) * 5);

	let unmarked = empty_block(header(DAO_BLOCK + 1, b""));
	assert_eq!(
		schedule
			.spec_for(DAO_BLOCK + 1)
			.block_processor()
			.process(&mut world, &unmarked, BTreeMap::new()),
		Err(BlockError::MissingDaoMarker(DAO_BLOCK + 1))
	);

	let after = empty_block(header(DAO_BLOCK + 10, b""));
	assert!(schedule
		.spec_for(DAO_BLOCK + 10)
		.block_processor()
		.process(&mut world, &after, BTreeMap::new())
		.is_ok());
	assert_eq!(balance(&world, MAINNET_DAO_REFUND_CONTRACT), U256::from(12_345));
}

#[test]
fn miners_and_ommers_are_rewarded() {
	let spec = spec(Hardfork::Byzantium);
	let ommer_miner = H160::repeat_byte(0xee);
	let mut world = world(None);
	let block = Block {
		ommers: vec![OmmerHeader {
			number: 9,
			coinbase: ommer_miner,
		}],
		..empty_block(header(10, b""))
	};

	spec.block_processor()
		.process(&mut world, &block, BTreeMap::new())
		.unwrap();

	let reward = U256::exp10(18) * 3;
	assert_eq!(balance(&world, coinbase()), reward + reward / 32);
	assert_eq!(balance(&world, ommer_miner), reward * 7 / 8);

	let stale = Block {
		ommers: vec![OmmerHeader {
			number: 3,
			coinbase: ommer_miner,
		}],
		..empty_block(header(10, b""))
	};
	assert_eq!(
		spec.block_processor()
			.process(&mut world, &stale, BTreeMap::new()),
		Err(BlockError::InvalidOmmer {
			ommer: 3,
			block: 10
		})
	);
}

fn two_calls() -> Vec<Transaction> {
	vec![
		call(100_000),
		Transaction {
			nonce: U256::one(),
			..call(100_000)
		},
	]
}

#[test]
fn receipts_follow_the_fork_format() {
	let block = Block {
		transactions: two_calls(),
		..empty_block(header(1, b""))
	};

	let mut world_before = world(Some("60006000f3"));
	let receipts = spec(Hardfork::SpuriousDragon)
		.block_processor()
		.process(&mut world_before, &block, BTreeMap::new())
		.unwrap();
	assert_eq!(receipts.len(), 2);
	assert!(matches!(receipts[0].outcome, ReceiptOutcome::StateRoot(_)));
	assert_ne!(receipts[0].outcome, receipts[1].outcome);
	assert_eq!(receipts[1].cumulative_gas_used, 2 * 21_006);

	let mut world_after = world(Some("60006000f3"));
	let receipts = spec(Hardfork::Byzantium)
		.block_processor()
		.process(&mut world_after, &block, BTreeMap::new())
		.unwrap();
	assert_eq!(receipts[0].outcome, ReceiptOutcome::Status(true));
	assert_eq!(receipts[0].cumulative_gas_used, 21_006);
	assert_eq!(receipts[1].cumulative_gas_used, 2 * 21_006);
	assert_eq!(world_after.accounts[&caller()].nonce, U256::from(2));
}

#[test]
fn block_gas_limit_bounds_transactions() {
	let block = Block {
		transactions: two_calls(),
		..empty_block(BlockHeader {
			gas_limit: 120_000,
			..header(1, b"")
		})
	};
	let mut world = world(Some("60006000f3"));

	assert_eq!(
		spec(Hardfork::Istanbul)
			.block_processor()
			.process(&mut world, &block, BTreeMap::new()),
		Err(BlockError::InvalidTransaction {
			index: 1,
			source: TransactionInvalid::BlockGasLimitExceeded {
				gas_limit: 100_000,
				available: 120_000 - 21_006,
			},
		})
	);
}

#[cfg(feature = "serde")]
#[test]
fn geth_chain_config_builds_mainnet_schedule() {
	use forkevm::schedule::ChainConfig;

	let config: ChainConfig = serde_json::from_str(
		r#"{
			"chainId": 1,
			"homesteadBlock": 1150000,
			"daoForkBlock": 1920000,
			"daoForkSupport": true,
			"eip150Block": 2463000,
			"eip150Hash": "0x2086799aeebeae135c246c65021c82b4e15a2c451340993aacfd2751886514f0",
			"eip155Block": 2675000,
			"eip158Block": 2675000,
			"byzantiumBlock": 4370000,
			"constantinopleBlock": 7280000,
			"petersburgBlock": 7280000,
			"istanbulBlock": 9069000
		}"#,
	)
	.unwrap();
	assert_eq!(config.chain_id, Some(1));
	assert!(config.dao_fork_support);

	let schedule = ProtocolScheduleBuilder::from_chain_config(&config)
		.build()
		.unwrap();
	assert_eq!(schedule.chain_id(), Some(U256::one()));
	assert_eq!(schedule.spec_for(1_149_999).hardfork(), Hardfork::Frontier);
	assert_eq!(schedule.spec_for(1_920_000).hardfork(), Hardfork::Homestead);
	assert!(matches!(
		schedule.spec_for(1_920_000).dao(),
		Some((DaoPhase::Init, _))
	));
	assert_eq!(schedule.spec_for(2_675_000).hardfork(), Hardfork::SpuriousDragon);
	assert_eq!(schedule.spec_for(7_280_000).hardfork(), Hardfork::Petersburg);
	assert_eq!(schedule.spec_for(9_069_000).hardfork(), Hardfork::Istanbul);
}
