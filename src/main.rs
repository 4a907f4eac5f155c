use std::{env, error::Error as _, process};

use clap::Parser;
use configuration::{regtest_demo::pay_and_report, NodeConfig};

pub mod bitcoin_wallet;
pub mod configuration;
pub mod error;

fn main() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let config = NodeConfig::parse();
    if let Err(err) = pay_and_report(&config) {
        log::error!("Error occurred: {}", err);
        let mut source = err.source();
        while let Some(cause) = source {
            log::error!("caused by: {}", cause);
            source = cause.source();
        }
        process::exit(1);
    }
}
