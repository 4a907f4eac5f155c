pub const NETWORK: bitcoin::Network = bitcoin::Network::Regtest;

/// Placeholder written when an output exposes neither addresses nor an `addr()` descriptor.
pub const UNKNOWN_ADDRESS: &str = "unknown";

pub const MINING_LABEL: &str = "Mining Reward";
pub const RECEIVE_LABEL: &str = "Received";

// bitcoind RPC error codes
pub const RPC_WALLET_ERROR: i32 = -4;
pub const RPC_WALLET_ALREADY_LOADED: i32 = -35;
