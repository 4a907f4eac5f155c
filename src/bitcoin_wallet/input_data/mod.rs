use bitcoin::{Address, Amount, BlockHash, Txid};

use crate::{
    bitcoin_wallet::constants::{RPC_WALLET_ALREADY_LOADED, RPC_WALLET_ERROR},
    error::{Error, Result},
};

use self::raw_transaction::RawTransaction;

pub mod raw_transaction;
pub mod regtest_call;

/// Read-only node queries the report is built from.
pub trait RpcCall {
    fn raw_transaction(&self, txid: &Txid) -> Result<RawTransaction>;
    fn block_height(&self, block_hash: &BlockHash) -> Result<u64>;
}

/// Wallet provisioning and mining on the node.
pub trait WalletAdmin {
    fn list_wallets(&self) -> Result<Vec<String>>;
    /// Returns the node's warning, if any.
    fn create_wallet(&self, wallet_name: &str) -> Result<Option<String>>;
    fn load_wallet(&self, wallet_name: &str) -> Result<()>;
    fn generate_to_address(&self, block_num: u64, address: &Address) -> Result<Vec<BlockHash>>;
    fn wallet_balance(&self, wallet_name: &str) -> Result<Amount>;

    /// Creates the wallet, or loads it when bitcoind reports that it already exists.
    fn ensure_wallet(&self, wallet_name: &str) -> Result<()> {
        if self.list_wallets()?.iter().any(|name| name == wallet_name) {
            log::info!("wallet '{}' already loaded", wallet_name);
            return Ok(());
        }
        match self.create_wallet(wallet_name) {
            Ok(warning) => {
                log::info!("wallet '{}' created", wallet_name);
                if let Some(msg) = warning.filter(|msg| !msg.is_empty()) {
                    log::warn!("{}", msg);
                }
                return Ok(());
            }
            Err(err) if err.rpc_code() == Some(RPC_WALLET_ERROR) => {
                log::info!("wallet '{}' already exists", wallet_name);
            }
            Err(err) => return Err(err),
        }
        match self.load_wallet(wallet_name) {
            Ok(()) => {
                log::info!("wallet '{}' loaded", wallet_name);
                return Ok(());
            }
            Err(err) if err.rpc_code() == Some(RPC_WALLET_ALREADY_LOADED) => return Ok(()),
            Err(err) => return Err(err),
        }
    }

    /// Mines one block at a time until `wallet_name` reports a positive balance.
    /// Coinbase outputs mature after 100 confirmations, so a fresh chain needs 101.
    fn mine_until_spendable(&self, wallet_name: &str, address: &Address, max_blocks: u64) -> Result<u64> {
        let mut blocks_mined = 0;
        while blocks_mined < max_blocks {
            self.generate_to_address(1, address)?;
            blocks_mined += 1;
            if self.wallet_balance(wallet_name)? > Amount::ZERO {
                log::info!("mined {} blocks before '{}' could spend", blocks_mined, wallet_name);
                return Ok(blocks_mined);
            }
        }
        return Err(Error::MiningExhausted {
            wallet: wallet_name.to_owned(),
            blocks: blocks_mined,
        });
    }
}

/// The output a transaction input spends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundingOutput {
    pub address: String,
    pub value: Amount,
}

pub trait FundingLookup {
    fn funding_output(&self, txid: &Txid, vout: u32) -> Result<FundingOutput>;
}

impl<T: RpcCall> FundingLookup for T {
    fn funding_output(&self, txid: &Txid, vout: u32) -> Result<FundingOutput> {
        let previous_tx = self.raw_transaction(txid)?;
        let output = previous_tx.vout.iter().find(|out| out.n == vout).ok_or_else(|| {
            Error::MalformedTransaction(format!(
                "transaction {} has {} outputs, no output {}",
                txid,
                previous_tx.vout.len(),
                vout
            ))
        })?;
        return Ok(FundingOutput {
            address: output.address(),
            value: output.value,
        });
    }
}
