//! wifi_qos-lib: per-link Wi-Fi QoS collection, binary sample fan-out,
//! and the consumer-side listener.

pub mod config;
pub mod context;
pub mod diag;
pub mod error;
pub mod heartbeat;
pub mod listener;
pub mod mac;
pub mod message;
pub mod netlink;
pub mod publisher;
pub mod station;
pub mod wire;

#[cfg(target_os = "linux")]
pub mod collector;

// re-exports for ergonomic imports:
pub use config::{CollectorConfig, socket_path};
pub use context::Context;
pub use diag::{CountingDiag, Diag, LogDiag, SharedDiag};
pub use error::QosError;
pub use listener::run_listener;
pub use mac::Mac;
pub use message::QosEvent;
pub use publisher::Publisher;
pub use wire::{QosSample, SAMPLE_LEN};

#[cfg(target_os = "linux")]
pub use collector::run as run_collector;
