use std::{fs, path::Path};

use bitcoin::{Amount, SignedAmount};

use crate::{bitcoin_wallet::tx_details::TxSummary, error::Result};

const SAT_PER_BTC: u64 = 100_000_000;

/// Ten lines: txid, input address and value, payment address and value,
/// change address and value, fee, block height, block hash.
pub fn render(summary: &TxSummary) -> String {
    let details = &summary.details;
    let lines = [
        summary.txid.to_string(),
        details.input_address.clone(),
        format_btc(details.input_value),
        details.payment_address.clone(),
        format_btc(details.payment_value),
        details.change_address.clone(),
        format_btc(details.change_value),
        format_signed_btc(details.fee),
        summary.block_height.to_string(),
        summary.block_hash.to_string(),
    ];
    return lines.join("\n") + "\n";
}

/// Writes the whole report in one go.
pub fn write_report<P: AsRef<Path>>(path: P, summary: &TxSummary) -> Result<()> {
    fs::write(path.as_ref(), render(summary))?;
    log::info!("transaction details written to {}", path.as_ref().display());
    return Ok(());
}

pub fn format_btc(amount: Amount) -> String {
    let sat = amount.to_sat();
    return format!("{}.{:08}", sat / SAT_PER_BTC, sat % SAT_PER_BTC);
}

pub fn format_signed_btc(amount: SignedAmount) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let sat = amount.to_sat().unsigned_abs();
    return format!("{}{}.{:08}", sign, sat / SAT_PER_BTC, sat % SAT_PER_BTC);
}
