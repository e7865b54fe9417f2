//! Consumer-side receiver: owns the datagram path and broadcasts
//! decoded samples as [`QosEvent`]s.

use std::io;
use std::path::Path;

use log::{info, warn};
use tokio::net::UnixDatagram;

use crate::context::Context;
use crate::diag::SharedDiag;
use crate::message::QosEvent;
use crate::wire::{QosSample, SAMPLE_LEN};

/// Bind `path` (removing any stale socket file first) and pump decoded
/// samples into the broadcast context until the task is dropped.
///
/// Emits `Ready` once listening, `Sample` per decoded datagram, and
/// `Error` (plus an `Err` return) if the bind fails. Datagrams of the
/// wrong length are dropped without comment beyond the diag hook.
pub async fn run_listener(path: &Path, ctx: Context, diag: SharedDiag) -> io::Result<()> {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            let _ = ctx.tx.send(QosEvent::Error {
                reason: format!("unlink stale {} failed: {e}", path.display()),
            });
            return Err(e);
        }
    }
    let sock = match UnixDatagram::bind(path) {
        Ok(s) => s,
        Err(e) => {
            let _ = ctx.tx.send(QosEvent::Error {
                reason: format!("bind {} failed: {e}", path.display()),
            });
            return Err(e);
        }
    };
    info!("listening on {}", path.display());
    let _ = ctx.tx.send(QosEvent::Ready {
        path: path.display().to_string(),
    });

    let mut buf = [0u8; SAMPLE_LEN * 4];
    loop {
        let n = match sock.recv(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("recv on {} failed: {e}", path.display());
                continue;
            }
        };
        match QosSample::decode(&buf[..n]) {
            Some(sample) => {
                let efficiency = sample.efficiency();
                // No subscribers is fine; samples are best-effort all the way.
                let _ = ctx.tx.send(QosEvent::Sample { sample, efficiency });
            }
            None => diag.frame_skipped(),
        }
    }
}
