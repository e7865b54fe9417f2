// src/main.rs

use std::env;
use std::process::exit;
use std::sync::Arc;

use dotenv::dotenv;
use log::{error, info};
use wifi_qos_lib::{CollectorConfig, LogDiag, Mac, config};

/* sudo RUST_LOG=wifi_qos_lib=debug,wifi_qos_collector=info \
cargo run -p wifi_qos-collector -- wlan0 */

fn usage(argv0: &str) -> ! {
    eprintln!("Usage: {argv0} [-i <ms>] <interface> [peer-mac]");
    eprintln!("  -i <ms>   heartbeat interval (default {} ms). 0 = initial poll only.", config::DEFAULT_INTERVAL_MS);
    eprintln!("Destination socket: $QOS_SOCK, else /run/user/<uid>/wifi_qos.sock");
    exit(2)
}

fn parse_args() -> CollectorConfig {
    let mut args = env::args();
    let argv0 = args.next().unwrap_or_else(|| "wifi_qos-collector".into());

    let mut interval_ms = config::DEFAULT_INTERVAL_MS;
    let mut positional: Vec<String> = Vec::new();
    while let Some(arg) = args.next() {
        if arg == "-i" {
            let Some(ms) = args.next().and_then(|v| v.parse().ok()) else {
                usage(&argv0);
            };
            interval_ms = ms;
        } else {
            positional.push(arg);
        }
    }

    let (iface, peer_arg) = match positional.as_slice() {
        [iface] => (iface.clone(), None),
        [iface, peer] => (iface.clone(), Some(peer.clone())),
        _ => usage(&argv0),
    };
    let peer = peer_arg.map(|p| match p.parse::<Mac>() {
        Ok(mac) => mac,
        Err(e) => {
            eprintln!("{e}");
            exit(2)
        }
    });

    CollectorConfig { iface, peer, interval_ms }
}

// Single-threaded by design: one reactor over the netlink channel and
// the heartbeat, handlers run to completion.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv().ok();

    // initialize logger and panic hook
    env_logger::init();
    std::panic::set_hook(Box::new(|info| {
        error!("Thread panic: {:?}", info);
    }));

    let cfg = parse_args();
    info!(
        "starting collector: iface={}, peer={}, interval={} ms",
        cfg.iface,
        cfg.peer.map(|m| m.to_string()).unwrap_or_else(|| "<associated BSSID>".into()),
        cfg.interval_ms
    );

    #[cfg(target_os = "linux")]
    {
        if let Err(e) = wifi_qos_lib::run_collector(cfg, Arc::new(LogDiag)).await {
            error!("fatal: {e}");
            exit(1);
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        let _ = cfg;
        error!("fatal: the collector needs Linux (nl80211)");
        exit(1);
    }
}
