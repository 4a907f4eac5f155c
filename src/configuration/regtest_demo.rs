use crate::{
    bitcoin_wallet::{
        constants::{MINING_LABEL, RECEIVE_LABEL},
        input_data::{regtest_call::RegtestCall, RpcCall, WalletAdmin},
        report::write_report,
        tx_details::{summarize, TxSummary},
    },
    error::Result,
};

use super::NodeConfig;

/// Miner pays trader on a regtest node, then the confirmed payment is
/// resolved and written to the report file.
pub fn pay_and_report(config: &NodeConfig) -> Result<TxSummary> {
    let amount = config.payment_amount()?;
    let node = RegtestCall::new(&config.rpc_url, config.auth())?;
    node.blockchain_info()?;

    node.ensure_wallet(&config.miner_wallet)?;
    node.ensure_wallet(&config.trader_wallet)?;
    let miner = node.wallet(&config.miner_wallet)?;
    let trader = node.wallet(&config.trader_wallet)?;

    let miner_address = RegtestCall::new_address(&miner, MINING_LABEL)?;
    node.mine_until_spendable(&config.miner_wallet, &miner_address, config.max_blocks)?;
    log::info!("miner balance: {}", RegtestCall::balance(&miner)?);

    let trader_address = RegtestCall::new_address(&trader, RECEIVE_LABEL)?;
    let txid = RegtestCall::send_to_address(&miner, &trader_address, amount)?;
    node.mempool_entry(&txid)?;

    node.generate_to_address(1, &miner_address)?;

    let raw_tx = node.raw_transaction(&txid)?;
    let summary = summarize(&raw_tx, &trader_address.to_string(), &node)?;
    if config.reject_negative_fee {
        summary.details.ensure_non_negative_fee()?;
    }
    log::debug!("{:#?}", summary);

    write_report(&config.output, &summary)?;
    return Ok(summary);
}
