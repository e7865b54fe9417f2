// src/main.rs

use std::process::exit;
use std::sync::Arc;

use dotenv::dotenv;
use log::{error, info};
use wifi_qos_lib::{Context, LogDiag, QosEvent, run_listener, socket_path};

/// Display heuristic only: rough percent for an RSSI reading. Not part
/// of the wire contract.
fn signal_pct(rssi_dbm: i32) -> i32 {
    (2 * (rssi_dbm + 100)).clamp(0, 100)
}

fn print_sample(ev: &QosEvent, json: bool) {
    if json {
        match serde_json::to_string(ev) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("serialize failed: {e}"),
        }
        return;
    }
    if let QosEvent::Sample { sample, efficiency } = ev {
        println!(
            "{:.3} s  RSSI {} dBm ({} %)  ok {}  retry {}  fail {}  eff {:.2} %",
            sample.ts_ns as f64 / 1e9,
            sample.rssi_dbm,
            signal_pct(sample.rssi_dbm),
            sample.tx_ok,
            sample.tx_retry,
            sample.tx_fail,
            efficiency,
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let json = std::env::args().any(|a| a == "--json");
    let path = socket_path();

    let ctx = Context::new(64);
    let mut rx = ctx.tx.subscribe();

    let listener_path = path.clone();
    tokio::spawn(async move {
        if let Err(e) = run_listener(&listener_path, ctx, Arc::new(LogDiag)).await {
            error!("fatal: {e}");
            exit(1);
        }
    });

    loop {
        match rx.recv().await {
            Ok(QosEvent::Ready { path }) => info!("listening on {path}"),
            Ok(QosEvent::Error { reason }) => {
                error!("fatal: {reason}");
                exit(1);
            }
            Ok(ev) => print_sample(&ev, json),
            Err(e) => {
                error!("event channel closed: {e}");
                exit(1);
            }
        }
    }
}
