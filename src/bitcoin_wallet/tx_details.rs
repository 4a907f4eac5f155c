use bitcoin::{Amount, BlockHash, SignedAmount, Txid};

use crate::{
    bitcoin_wallet::input_data::{
        raw_transaction::{RawTransaction, RawVout},
        FundingLookup, RpcCall,
    },
    error::{Error, Result},
};

/// Economic breakdown of a one-input, payment-plus-change transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxDetails {
    pub input_address: String,
    pub input_value: Amount,
    pub payment_address: String,
    pub payment_value: Amount,
    pub change_address: String,
    pub change_value: Amount,
    pub fee: SignedAmount,
}

/// Everything written to the report file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxSummary {
    pub txid: Txid,
    pub details: TxDetails,
    pub block_height: u64,
    pub block_hash: BlockHash,
}

impl TxDetails {
    pub fn ensure_non_negative_fee(&self) -> Result<()> {
        if self.fee.is_negative() {
            return Err(Error::NegativeFee(self.fee));
        }
        return Ok(());
    }
}

/// Splits `raw_tx` into payment and change outputs and prices the fee against
/// the output spent by its first input.
pub fn resolve_transaction<L: FundingLookup>(
    raw_tx: &RawTransaction,
    recipient: &str,
    lookup: &L,
) -> Result<TxDetails> {
    let funding_input = raw_tx.vin.first().ok_or_else(|| {
        Error::MalformedTransaction(format!("transaction {} has no inputs", raw_tx.txid))
    })?;
    if raw_tx.vin.len() > 1 {
        log::warn!(
            "transaction {} has {} inputs, only the first is priced",
            raw_tx.txid,
            raw_tx.vin.len()
        );
    }
    let (prev_txid, prev_vout) = match (funding_input.txid, funding_input.vout) {
        (Some(txid), Some(vout)) => (txid, vout),
        _ if funding_input.coinbase.is_some() => {
            return Err(Error::MalformedTransaction(format!(
                "first input of {} is a coinbase",
                raw_tx.txid
            )))
        }
        _ => {
            return Err(Error::MalformedTransaction(format!(
                "first input of {} does not spend a previous output",
                raw_tx.txid
            )))
        }
    };
    if raw_tx.vout.is_empty() {
        return Err(Error::MalformedTransaction(format!(
            "transaction {} has no outputs",
            raw_tx.txid
        )));
    }

    let (payment, change) = classify_outputs(&raw_tx.vout, recipient)?;

    let funding = lookup
        .funding_output(&prev_txid, prev_vout)
        .map_err(|err| match err {
            Error::MalformedTransaction(_) => err,
            err => Error::FundingLookup {
                txid: prev_txid,
                vout: prev_vout,
                source: Box::new(err),
            },
        })?;

    let fee = compute_fee(funding.value, payment.value, change.value)?;
    if fee.is_negative() {
        log::warn!("transaction {} computes to a negative fee of {}", raw_tx.txid, fee);
    }

    return Ok(TxDetails {
        input_address: funding.address,
        input_value: funding.value,
        payment_address: payment.address(),
        payment_value: payment.value,
        change_address: change.address(),
        change_value: change.value,
        fee,
    });
}

/// Resolves the transaction and pins it to the block that confirmed it.
pub fn summarize<N: RpcCall>(raw_tx: &RawTransaction, recipient: &str, node: &N) -> Result<TxSummary> {
    let details = resolve_transaction(raw_tx, recipient, node)?;
    let block_hash = raw_tx.blockhash.ok_or(Error::Unconfirmed(raw_tx.txid))?;
    let block_height = node.block_height(&block_hash)?;
    return Ok(TxSummary {
        txid: raw_tx.txid,
        details,
        block_height,
        block_hash,
    });
}

/// Picks `(payment, change)`. An output paying `recipient` is the payment;
/// otherwise the largest output is. Change is the last other output, or the
/// first one that is not the payment.
fn classify_outputs<'a>(vout: &'a [RawVout], recipient: &str) -> Result<(&'a RawVout, &'a RawVout)> {
    let mut payment = None;
    let mut change = None;
    for (index, out) in vout.iter().enumerate() {
        if out.address() == recipient {
            payment = Some(index);
        } else {
            change = Some(index);
        }
    }

    let payment = match payment {
        Some(index) => Some(index),
        None => {
            log::debug!("no output pays {}, falling back to the largest output", recipient);
            largest_output(vout)
        }
    };

    if change.is_none() || change == payment {
        change = vout.iter().enumerate().map(|(index, _)| index).find(|index| Some(*index) != payment);
    }

    return match (payment, change) {
        (Some(payment), Some(change)) => Ok((&vout[payment], &vout[change])),
        _ => Err(Error::MissingOutput),
    };
}

// first of equal maxima
fn largest_output(vout: &[RawVout]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, out) in vout.iter().enumerate() {
        match best {
            Some(current) if vout[current].value >= out.value => {}
            _ => best = Some(index),
        }
    }
    return best;
}

/// `input - (payment + change)`, refusing amounts that do not fit a signed value.
fn compute_fee(input: Amount, payment: Amount, change: Amount) -> Result<SignedAmount> {
    let outputs = payment
        .to_signed()?
        .checked_add(change.to_signed()?)
        .ok_or_else(|| Error::MalformedTransaction("output values overflow".to_owned()))?;
    return input
        .to_signed()?
        .checked_sub(outputs)
        .ok_or_else(|| Error::MalformedTransaction("fee overflows".to_owned()));
}

#[cfg(test)]
mod tests {
    use crate::bitcoin_wallet::input_data::{raw_transaction::ScriptPubKey, test_node::*};

    use super::*;

    const RECIPIENT: &str = "bcrt1qtrader";
    const CHANGE: &str = "bcrt1qchange";
    const MINER: &str = "bcrt1qminer";

    fn node_with_funding(value: f64) -> TestNode {
        let mut node = TestNode::default();
        node.insert(transaction(1, vec![], vec![output(0, MINER, value)]));
        node
    }

    fn payment_tx(vout: Vec<RawVout>) -> RawTransaction {
        transaction(2, vec![spend(txid(1), 0)], vout)
    }

    #[test]
    fn resolves_payment_change_and_fee() {
        let node = node_with_funding(50.0);
        let tx = payment_tx(vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 29.9999)]);

        let details = resolve_transaction(&tx, RECIPIENT, &node).unwrap();

        assert_eq!(details.input_address, MINER);
        assert_eq!(details.input_value, btc(50.0));
        assert_eq!(details.payment_address, RECIPIENT);
        assert_eq!(details.payment_value, btc(20.0));
        assert_eq!(details.change_address, CHANGE);
        assert_eq!(details.change_value, btc(29.9999));
        assert_eq!(details.fee, SignedAmount::from_sat(10_000));
    }

    #[test]
    fn payment_output_order_does_not_matter() {
        let node = node_with_funding(50.0);
        let tx = payment_tx(vec![output(0, CHANGE, 29.9999), output(1, RECIPIENT, 20.0)]);

        let details = resolve_transaction(&tx, RECIPIENT, &node).unwrap();

        assert_eq!(details.payment_address, RECIPIENT);
        assert_eq!(details.change_address, CHANGE);
    }

    #[test]
    fn fee_matches_input_minus_outputs() {
        let node = node_with_funding(50.0);
        let tx = payment_tx(vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 29.99998590)]);

        let details = resolve_transaction(&tx, RECIPIENT, &node).unwrap();

        let outputs = details.payment_value + details.change_value;
        assert_eq!(
            details.fee.to_sat(),
            details.input_value.to_sat() as i64 - outputs.to_sat() as i64
        );
        assert!((details.fee.to_btc() - (50.0 - (20.0 + 29.9999859))).abs() < 1e-8);
    }

    #[test]
    fn recipient_found_through_descriptor() {
        let node = node_with_funding(50.0);
        let mut payment = output(0, RECIPIENT, 20.0);
        payment.script_pub_key = ScriptPubKey {
            desc: Some(format!("addr({})#qwertyui", RECIPIENT)),
            ..Default::default()
        };
        let tx = payment_tx(vec![payment, output(1, CHANGE, 29.9999)]);

        let details = resolve_transaction(&tx, RECIPIENT, &node).unwrap();

        assert_eq!(details.payment_address, RECIPIENT);
        assert_eq!(details.payment_value, btc(20.0));
    }

    #[test]
    fn unmatched_recipient_falls_back_to_largest_output() {
        let node = node_with_funding(50.0);
        let tx = payment_tx(vec![output(0, "X", 5.0), output(1, "Y", 30.0)]);

        let details = resolve_transaction(&tx, "Z", &node).unwrap();

        assert_eq!(details.payment_address, "Y");
        assert_eq!(details.payment_value, btc(30.0));
        assert_eq!(details.change_address, "X");
        assert_eq!(details.change_value, btc(5.0));
    }

    #[test]
    fn largest_output_prefers_first_on_ties() {
        let vout = vec![output(0, "A", 10.0), output(1, "B", 10.0), output(2, "C", 1.0)];
        assert_eq!(largest_output(&vout), Some(0));
    }

    #[test]
    fn single_output_is_missing_change() {
        let node = node_with_funding(50.0);

        let paid = payment_tx(vec![output(0, RECIPIENT, 49.9999)]);
        assert!(matches!(
            resolve_transaction(&paid, RECIPIENT, &node),
            Err(Error::MissingOutput)
        ));

        let unmatched = payment_tx(vec![output(0, "X", 49.9999)]);
        assert!(matches!(
            resolve_transaction(&unmatched, RECIPIENT, &node),
            Err(Error::MissingOutput)
        ));
    }

    #[test]
    fn transaction_without_inputs_is_malformed() {
        let node = node_with_funding(50.0);
        let tx = transaction(2, vec![], vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 29.0)]);

        assert!(matches!(
            resolve_transaction(&tx, RECIPIENT, &node),
            Err(Error::MalformedTransaction(_))
        ));
    }

    #[test]
    fn transaction_without_outputs_is_malformed() {
        let node = node_with_funding(50.0);
        let tx = payment_tx(vec![]);

        assert!(matches!(
            resolve_transaction(&tx, RECIPIENT, &node),
            Err(Error::MalformedTransaction(_))
        ));
    }

    #[test]
    fn coinbase_input_is_malformed() {
        let node = node_with_funding(50.0);
        let mut tx = payment_tx(vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 29.0)]);
        tx.vin[0].txid = None;
        tx.vin[0].vout = None;
        tx.vin[0].coinbase = Some("510101".to_owned());

        assert!(matches!(
            resolve_transaction(&tx, RECIPIENT, &node),
            Err(Error::MalformedTransaction(_))
        ));
    }

    #[test]
    fn failed_lookup_is_reported_with_outpoint() {
        let node = TestNode::default();
        let tx = payment_tx(vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 29.0)]);

        match resolve_transaction(&tx, RECIPIENT, &node) {
            Err(Error::FundingLookup { txid: prev, vout, .. }) => {
                assert_eq!(prev, txid(1));
                assert_eq!(vout, 0);
            }
            other => panic!("expected lookup failure, got {:?}", other),
        }
    }

    #[test]
    fn negative_fee_is_kept_and_can_be_rejected() {
        let node = node_with_funding(10.0);
        let tx = payment_tx(vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 1.0)]);

        let details = resolve_transaction(&tx, RECIPIENT, &node).unwrap();

        assert_eq!(details.fee, SignedAmount::from_sat(-1_100_000_000));
        assert!(matches!(details.ensure_non_negative_fee(), Err(Error::NegativeFee(_))));
    }

    #[test]
    fn funding_index_out_of_range_is_malformed() {
        let node = node_with_funding(50.0);
        let tx = transaction(
            2,
            vec![spend(txid(1), 4)],
            vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 29.9999)],
        );

        assert!(matches!(
            resolve_transaction(&tx, RECIPIENT, &node),
            Err(Error::MalformedTransaction(_))
        ));
    }

    #[test]
    fn oversized_funding_value_is_rejected() {
        let mut node = TestNode::default();
        let mut funding = output(0, MINER, 0.0);
        funding.value = Amount::from_sat(u64::MAX);
        node.insert(transaction(1, vec![], vec![funding]));
        let tx = payment_tx(vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 1.0)]);

        assert!(matches!(
            resolve_transaction(&tx, RECIPIENT, &node),
            Err(Error::Amount(_))
        ));
    }

    #[test]
    fn fee_arithmetic_stays_exact() {
        assert_eq!(
            compute_fee(btc(50.0), btc(20.0), btc(29.9999)).unwrap(),
            SignedAmount::from_sat(10_000)
        );
        assert_eq!(
            compute_fee(btc(1.0), btc(1.0), btc(0.5)).unwrap(),
            SignedAmount::from_sat(-50_000_000)
        );
    }

    #[test]
    fn summary_carries_confirming_block() {
        let mut node = node_with_funding(50.0);
        node.heights.insert(block_hash(7), 102);
        let mut tx = payment_tx(vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 29.9999)]);
        tx.blockhash = Some(block_hash(7));

        let summary = summarize(&tx, RECIPIENT, &node).unwrap();

        assert_eq!(summary.txid, txid(2));
        assert_eq!(summary.block_height, 102);
        assert_eq!(summary.block_hash, block_hash(7));
        assert_eq!(summary.details.fee, SignedAmount::from_sat(10_000));
    }

    #[test]
    fn unconfirmed_transaction_cannot_be_summarized() {
        let node = node_with_funding(50.0);
        let tx = payment_tx(vec![output(0, RECIPIENT, 20.0), output(1, CHANGE, 29.9999)]);

        assert!(matches!(summarize(&tx, RECIPIENT, &node), Err(Error::Unconfirmed(_))));
    }
}
