//! # Mainnet execution, fork by fork
//!
//! Everything needed to run a transaction the way Ethereum mainnet does: the
//! fork [Config], the gas model, the per-fork [OperationTable], frames, the
//! call and create [Invoker] and the transaction processor.

mod config;
mod evm;
mod frame;
pub mod gasometer;
pub mod invoker;
mod operation;
pub mod transaction;

pub use forkevm_precompile::{PrecompileSet, StandardPrecompileSet};

pub use self::config::{Config, GasTable, SstoreMetering};
pub use self::evm::Evm;
pub use self::frame::{FrameState, FrameType, MessageFrame};
pub use self::gasometer::{DynamicCost, GasometerState, MemoryRegion, PriceFn, TransactionCost};
pub use self::invoker::{Invoker, InvokerControl, InvokerHandler};
pub use self::operation::{Efn, HaltFn, Operation, OperationCost, OperationTable};
pub use self::transaction::{
	apply_transaction, transact, Transaction, TransactionAction, TransactionInvalid,
	TransactionOutcome, TransactionValidator,
};
