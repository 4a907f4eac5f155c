use bitcoin::{Amount, BlockHash, Txid};
use serde::Deserialize;

use crate::bitcoin_wallet::constants::UNKNOWN_ADDRESS;

/// Verbose `getrawtransaction` answer, reduced to the fields the report needs.
#[derive(Clone, Debug, Deserialize)]
pub struct RawTransaction {
    pub txid: Txid,
    pub vin: Vec<RawVin>,
    pub vout: Vec<RawVout>,
    #[serde(default)]
    pub blockhash: Option<BlockHash>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawVin {
    #[serde(default)]
    pub txid: Option<Txid>,
    #[serde(default)]
    pub vout: Option<u32>,
    #[serde(default)]
    pub coinbase: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawVout {
    #[serde(with = "bitcoin::util::amount::serde::as_btc")]
    pub value: Amount,
    pub n: u32,
    #[serde(rename = "scriptPubKey")]
    pub script_pub_key: ScriptPubKey,
}

/// Older nodes list `addresses`, newer ones report `address` and a `desc`
/// descriptor instead.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ScriptPubKey {
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// Where an output pays to, in order of preference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Destination {
    Addresses(Vec<String>),
    Descriptor(String),
    Unknown,
}

impl ScriptPubKey {
    pub fn destination(&self) -> Destination {
        if !self.addresses.is_empty() {
            return Destination::Addresses(self.addresses.clone());
        }
        if let Some(address) = &self.address {
            return Destination::Addresses(vec![address.clone()]);
        }
        return match &self.desc {
            Some(desc) => Destination::Descriptor(desc.clone()),
            None => Destination::Unknown,
        };
    }
}

impl Destination {
    /// Resolves to a single address, falling back to `"unknown"` rather than failing.
    pub fn address(&self) -> String {
        return match self {
            Destination::Addresses(addresses) => addresses
                .first()
                .cloned()
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_owned()),
            Destination::Descriptor(desc) => parse_addr_descriptor(desc)
                .map(str::to_owned)
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_owned()),
            Destination::Unknown => UNKNOWN_ADDRESS.to_owned(),
        };
    }
}

impl RawVout {
    pub fn address(&self) -> String {
        return self.script_pub_key.destination().address();
    }
}

/// Extracts `<address>` from `addr(<address>)`, ignoring a trailing `#checksum`.
pub fn parse_addr_descriptor(desc: &str) -> Option<&str> {
    let body = desc.split('#').next()?.trim();
    let inner = body.strip_prefix("addr(")?.strip_suffix(')')?;
    if inner.is_empty() || inner.contains(|c: char| c == '(' || c == ')' || c.is_whitespace()) {
        return None;
    }
    return Some(inner);
}
