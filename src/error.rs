//! Error types for the regtest payment report

use bitcoin::{util::amount::ParseAmountError, SignedAmount, Txid};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("rpc error: {0}")]
    Rpc(#[from] bitcoincore_rpc::Error),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("funding output lookup failed for {txid}:{vout}")]
    FundingLookup {
        txid: Txid,
        vout: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Cannot find trader or change output. Check transaction details")]
    MissingOutput,

    #[error("computed fee is negative: {0}")]
    NegativeFee(SignedAmount),

    #[error("transaction {0} is not confirmed in a block")]
    Unconfirmed(Txid),

    #[error("wallet {wallet} has no spendable balance after mining {blocks} blocks")]
    MiningExhausted { wallet: String, blocks: u64 },

    #[error("invalid amount: {0}")]
    Amount(#[from] ParseAmountError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// bitcoind's JSON-RPC error code, when the node answered with one.
    pub fn rpc_code(&self) -> Option<i32> {
        match self {
            Error::Rpc(bitcoincore_rpc::Error::JsonRpc(bitcoincore_rpc::jsonrpc::error::Error::Rpc(
                rpc_err,
            ))) => Some(rpc_err.code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
pub(crate) fn rpc_error(code: i32, message: &str) -> Error {
    Error::Rpc(bitcoincore_rpc::Error::JsonRpc(
        bitcoincore_rpc::jsonrpc::error::Error::Rpc(bitcoincore_rpc::jsonrpc::error::RpcError {
            code,
            message: message.to_owned(),
            data: None,
        }),
    ))
}
