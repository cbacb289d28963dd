use forkevm_interpreter::RuntimeBackend;
use primitive_types::H160;

/// Extra data every header must carry for the first ten blocks of the DAO
/// fork.
pub const DAO_EXTRA_DATA: &[u8] = b"dao-hard-fork";

/// Number of blocks, starting at the fork block, that must carry
/// [DAO_EXTRA_DATA].
pub const DAO_EXTRA_DATA_RANGE: u64 = 10;

/// Withdrawal contract the drained balances were moved to on mainnet.
pub const MAINNET_DAO_REFUND_CONTRACT: H160 = H160([
	0xbf, 0x4e, 0xd7, 0xb2, 0x7f, 0x1d, 0x66, 0x65, 0x46, 0xe3, 0x0d, 0x74, 0xd5, 0x0d, 0x17, 0x3d,
	0x20, 0xbc, 0xa7, 0x54,
]);

/// The DAO irregular state change.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DaoConfig {
	pub block: u64,
	pub refund_contract: H160,
	/// Accounts whose whole balance moves to `refund_contract`.
	pub drain_list: Vec<H160>,
}

/// Position of a block inside the DAO fork window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DaoPhase {
	/// The fork block, where the balances move.
	Init,
	/// The following blocks that still carry the marker.
	Transition,
}

impl DaoConfig {
	/// Move every drained balance into the refund contract.
	pub fn apply<H: RuntimeBackend + ?Sized>(&self, handler: &mut H) {
		for address in &self.drain_list {
			let balance = handler.balance(*address);
			handler.deposit(self.refund_contract, balance);
			handler.reset_balance(*address);
		}
		log::debug!(
			target: "evm",
			"DAO fork drained {} accounts into {:?}",
			self.drain_list.len(),
			self.refund_contract
		);
	}
}
