pub const G_ZERO: u64 = 0;
pub const G_BASE: u64 = 2;
pub const G_VERYLOW: u64 = 3;
pub const G_LOW: u64 = 5;
pub const G_MID: u64 = 8;
pub const G_HIGH: u64 = 10;
pub const G_JUMPDEST: u64 = 1;
pub const G_BLOCKHASH: u64 = 20;
pub const G_EXP: u64 = 10;
pub const G_SHA3: u64 = 30;
pub const G_SHA3WORD: u64 = 6;
pub const G_COPY: u64 = 3;
pub const G_LOG: u64 = 375;
pub const G_LOGTOPIC: u64 = 375;
pub const G_LOGDATA: u64 = 8;
pub const G_CALLVALUE: u64 = 9000;
pub const G_NEWACCOUNT: u64 = 25000;
pub const G_CREATE: u64 = 32000;
pub const G_CODEDEPOSIT: u64 = 200;
pub const G_MEMORY: u64 = 3;
pub const G_SSET: u64 = 20000;
pub const G_SRESET: u64 = 5000;
pub const G_CALLSTIPEND: u64 = 2300;
pub const G_TRANSACTION: u64 = 21000;
pub const G_TXDATAZERO: u64 = 4;

pub const R_SCLEAR: i64 = 15000;
pub const R_SELFDESTRUCT: i64 = 24000;

/// Refunds are capped at the gas used divided by this.
pub const MAX_REFUND_QUOTIENT: u64 = 2;
