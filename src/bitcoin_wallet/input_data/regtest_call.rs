use bitcoin::{Address, Amount, BlockHash, Txid};
use bitcoincore_rpc::{
    bitcoincore_rpc_json::{GetBlockchainInfoResult, GetMempoolEntryResult},
    jsonrpc::serde_json::json,
    Auth, Client, RpcApi,
};

use crate::{bitcoin_wallet::constants::NETWORK, error::Result};

use super::{raw_transaction::RawTransaction, RpcCall, WalletAdmin};

/// Node-level connection to a regtest bitcoind; wallet calls go through
/// [`RegtestCall::wallet`].
pub struct RegtestCall {
    url: String,
    auth: Auth,
    client: Client,
}

impl RpcCall for RegtestCall {
    fn raw_transaction(&self, txid: &Txid) -> Result<RawTransaction> {
        // raw call so that `scriptPubKey.desc` survives deserialization
        let raw_tx = self
            .client
            .call::<RawTransaction>("getrawtransaction", &[json!(txid.to_string()), json!(true)])?;
        return Ok(raw_tx);
    }

    fn block_height(&self, block_hash: &BlockHash) -> Result<u64> {
        let block = self.client.get_block_info(block_hash)?;
        return Ok(block.height as u64);
    }
}

impl WalletAdmin for RegtestCall {
    fn list_wallets(&self) -> Result<Vec<String>> {
        return Ok(self.client.list_wallets()?);
    }

    fn create_wallet(&self, wallet_name: &str) -> Result<Option<String>> {
        let created = self.client.create_wallet(wallet_name, None, None, None, None)?;
        return Ok(created.warning);
    }

    fn load_wallet(&self, wallet_name: &str) -> Result<()> {
        self.client.load_wallet(wallet_name)?;
        return Ok(());
    }

    fn generate_to_address(&self, block_num: u64, address: &Address) -> Result<Vec<BlockHash>> {
        return Ok(self.client.generate_to_address(block_num, address)?);
    }

    fn wallet_balance(&self, wallet_name: &str) -> Result<Amount> {
        return Ok(self.wallet(wallet_name)?.get_wallet_info()?.balance);
    }
}

impl RegtestCall {
    pub fn new(url: &str, auth: Auth) -> Result<Self> {
        let client = Client::new(url, auth.clone())?;
        return Ok(RegtestCall {
            url: url.to_owned(),
            auth,
            client,
        });
    }

    /// Client scoped to `/wallet/<name>`.
    pub fn wallet(&self, wallet_name: &str) -> Result<Client> {
        return Ok(Client::new(&wallet_url(&self.url, wallet_name), self.auth.clone())?);
    }

    pub fn blockchain_info(&self) -> Result<GetBlockchainInfoResult> {
        let info = self.client.get_blockchain_info()?;
        if info.chain != NETWORK.to_string() {
            log::warn!("node runs on {} rather than {}", info.chain, NETWORK);
        }
        log::info!("blockchain info: chain {} at height {} ({})", info.chain, info.blocks, info.best_block_hash);
        return Ok(info);
    }

    pub fn new_address(wallet: &Client, label: &str) -> Result<Address> {
        return Ok(wallet.get_new_address(Some(label), None)?);
    }

    pub fn balance(wallet: &Client) -> Result<Amount> {
        return Ok(wallet.get_balance(None, None)?);
    }

    pub fn send_to_address(wallet: &Client, address: &Address, amount: Amount) -> Result<Txid> {
        let txid = wallet.send_to_address(address, amount, None, None, None, None, None, None)?;
        log::info!("sent {} to {} in {}", amount, address, txid);
        return Ok(txid);
    }

    pub fn mempool_entry(&self, txid: &Txid) -> Result<GetMempoolEntryResult> {
        let entry = self.client.get_mempool_entry(txid)?;
        log::info!(
            "mempool transaction {}: vsize {}, base fee {}, height {}",
            txid,
            entry.vsize,
            entry.fees.base,
            entry.height
        );
        return Ok(entry);
    }
}

fn wallet_url(node_url: &str, wallet_name: &str) -> String {
    return format!("{}/wallet/{}", node_url.trim_end_matches('/'), wallet_name);
}
