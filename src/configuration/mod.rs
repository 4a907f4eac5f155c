use std::path::PathBuf;

use bitcoin::Amount;
use bitcoincore_rpc::Auth;
use clap::Parser;

pub mod regtest_demo;

/// Command-line arguments
#[derive(Parser)]
#[derive(Clone, Debug)]
#[clap(
    author,
    version,
    name = "regtest-payment-report",
    about = "Funds a regtest wallet, pays another one and reports the confirmed transaction"
)]
pub struct NodeConfig {
    /// bitcoind JSON-RPC endpoint
    #[clap(long, env = "RPC_URL", default_value = "http://127.0.0.1:18443")]
    pub rpc_url: String,

    #[clap(long, env = "RPC_USER", default_value = "alice")]
    pub rpc_user: String,

    #[clap(long, env = "RPC_PASSWORD", default_value = "password", hide_env_values = true)]
    pub rpc_password: String,

    /// Authenticate with a cookie file instead of user and password.
    #[clap(long, env = "RPC_COOKIE")]
    pub rpc_cookie: Option<PathBuf>,

    #[clap(long, default_value = "Miner")]
    pub miner_wallet: String,

    #[clap(long, default_value = "Trader")]
    pub trader_wallet: String,

    /// Amount in BTC the miner sends to the trader.
    #[clap(long, default_value = "20")]
    pub amount: f64,

    /// Give up when the miner still cannot spend after this many blocks.
    #[clap(long, default_value = "200")]
    pub max_blocks: u64,

    /// Report file
    #[clap(short, long, default_value = "out.txt")]
    pub output: PathBuf,

    /// Treat a negative computed fee as an error instead of a warning.
    #[clap(long)]
    pub reject_negative_fee: bool,
}

impl NodeConfig {
    pub fn auth(&self) -> Auth {
        return match &self.rpc_cookie {
            Some(cookie) => Auth::CookieFile(cookie.clone()),
            None => Auth::UserPass(self.rpc_user.clone(), self.rpc_password.clone()),
        };
    }

    pub fn payment_amount(&self) -> Result<Amount, bitcoin::util::amount::ParseAmountError> {
        return Amount::from_btc(self.amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_regtest() {
        let config = NodeConfig::parse_from(["regtest-payment-report"]);
        assert_eq!(config.rpc_url, "http://127.0.0.1:18443");
        assert_eq!(config.miner_wallet, "Miner");
        assert_eq!(config.trader_wallet, "Trader");
        assert_eq!(config.payment_amount().unwrap(), Amount::from_sat(2_000_000_000));
        assert_eq!(config.output, PathBuf::from("out.txt"));
        assert!(!config.reject_negative_fee);
        assert_eq!(
            config.auth(),
            Auth::UserPass("alice".to_owned(), "password".to_owned())
        );
    }

    #[test]
    fn cookie_overrides_user_and_password() {
        let config = NodeConfig::parse_from([
            "regtest-payment-report",
            "--rpc-cookie",
            "/tmp/regtest/.cookie",
            "--amount",
            "1.5",
        ]);
        assert_eq!(config.auth(), Auth::CookieFile(PathBuf::from("/tmp/regtest/.cookie")));
        assert_eq!(config.payment_amount().unwrap(), Amount::from_sat(150_000_000));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let config = NodeConfig::parse_from(["regtest-payment-report", "--amount=-1"]);
        assert!(config.payment_amount().is_err());
    }
}
