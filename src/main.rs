//! Exchange Core - Binary Entry Point
//!
//! Loads the exchange configuration (path from `EXCHANGE_CONFIG`, defaults
//! otherwise), registers the configured markets and runs a short scenario
//! against the first one. Log level comes from `RUST_LOG` (default `info`).

use std::env;

use exchange_core::exchange::{Exchange, OrderAck};
use exchange_core::types::{price, OrderRequest};
use exchange_core::{EngineError, ExchangeConfig, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SCENARIO: &[&str] = &[
    r#"{"type":"limit","user_id":1,"side":"ask","size":5.0,"price":100.0}"#,
    r#"{"type":"limit","user_id":2,"side":"ask","size":5.0,"price":101.0}"#,
    r#"{"type":"limit","user_id":3,"side":"bid","size":4.0,"price":99.5}"#,
    r#"{"type":"market","user_id":4,"side":"bid","size":8.0}"#,
    r#"{"type":"market","user_id":5,"side":"ask","size":15.0}"#,
    r#"{"type":"cancel","order_id":3}"#,
    r#"{"type":"cancel","order_id":3}"#,
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        error!(error = %err, "exchange demo failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = match env::var("EXCHANGE_CONFIG") {
        Ok(path) => ExchangeConfig::load(path)?,
        Err(_) => ExchangeConfig::default(),
    };
    let exchange = Exchange::from_config(&config)?;
    let market = config
        .markets
        .first()
        .cloned()
        .ok_or_else(|| EngineError::Config("no markets configured".into()))?;

    println!("===========================================");
    println!("  Exchange Core - {market}");
    println!("===========================================");
    println!();

    for raw in SCENARIO {
        let request: OrderRequest =
            serde_json::from_str(raw).map_err(|e| EngineError::Encoding(e.to_string()))?;
        match exchange.submit(&market, request) {
            Ok(OrderAck::Placed { order_id }) => println!("placed   #{order_id}"),
            Ok(OrderAck::Cancelled { order_id }) => println!("cancelled #{order_id}"),
            Ok(OrderAck::Filled(fill)) => {
                println!(
                    "filled   #{} {} {} @ avg {}",
                    fill.order_id,
                    fill.side,
                    price::from_fixed_trimmed(fill.filled()),
                    fill.average_price()
                        .map(price::from_fixed_trimmed)
                        .unwrap_or_default(),
                );
                for m in &fill.matches {
                    println!(
                        "    {} @ {} against #{}",
                        price::from_fixed_trimmed(m.size_filled),
                        price::from_fixed_trimmed(m.price),
                        m.maker_order_id()
                    );
                }
            }
            Err(err) => println!("rejected: {err}"),
        }
    }

    let snapshot = exchange.snapshot(&market)?;
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).map_err(|e| EngineError::Encoding(e.to_string()))?
    );
    info!(
        market = %market,
        state_root = %exchange.state_root_hex(&market)?,
        "scenario complete"
    );

    Ok(())
}
