//! Publisher → listener over a real Unix datagram path.

use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time::timeout;

use wifi_qos_lib::{Context, CountingDiag, QosEvent, QosSample, run_listener};
use wifi_qos_lib::publisher::Publisher;

fn temp_sock(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("wifi_qos_{tag}_{}.sock", std::process::id()))
}

async fn recv_event(rx: &mut tokio::sync::broadcast::Receiver<QosEvent>) -> QosEvent {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for listener event")
        .expect("listener channel closed")
}

#[tokio::test]
async fn sample_flows_from_publisher_to_listener() {
    let path = temp_sock("e2e");
    let _ = std::fs::remove_file(&path);

    let ctx = Context::new(64);
    let diag: Arc<CountingDiag> = Arc::new(CountingDiag::default());
    let mut rx = ctx.tx.subscribe();

    let listener_path = path.clone();
    let listener_diag = diag.clone();
    let listener = tokio::spawn(async move {
        let _ = run_listener(&listener_path, ctx, listener_diag).await;
    });

    match recv_event(&mut rx).await {
        QosEvent::Ready { path: bound } => assert_eq!(bound, path.display().to_string()),
        other => panic!("expected Ready, got {other:?}"),
    }

    let publisher = Publisher::new(path.clone(), Arc::new(CountingDiag::default())).unwrap();
    let sample = QosSample {
        ts_ns: 1000,
        rssi_dbm: -42,
        tx_ok: 50,
        tx_retry: 3,
        tx_fail: 2,
    };
    publisher.publish(&sample);

    match recv_event(&mut rx).await {
        QosEvent::Sample { sample: got, efficiency } => {
            assert_eq!(got, sample);
            assert_eq!(got.rssi_dbm, -42);
            assert!((efficiency - 90.909).abs() < 0.01);
        }
        other => panic!("expected Sample, got {other:?}"),
    }

    // Exactly once: nothing else is pending.
    assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());

    listener.abort();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn malformed_datagram_is_dropped_without_killing_the_listener() {
    let path = temp_sock("malformed");
    let _ = std::fs::remove_file(&path);

    let ctx = Context::new(64);
    let diag: Arc<CountingDiag> = Arc::new(CountingDiag::default());
    let mut rx = ctx.tx.subscribe();

    let listener_path = path.clone();
    let listener_diag = diag.clone();
    let listener = tokio::spawn(async move {
        let _ = run_listener(&listener_path, ctx, listener_diag).await;
    });
    assert!(matches!(recv_event(&mut rx).await, QosEvent::Ready { .. }));

    let sender = UnixDatagram::unbound().unwrap();
    sender.send_to(&[0u8; 10], &path).unwrap();

    // No sample event for the runt datagram.
    assert!(timeout(Duration::from_millis(300), rx.recv()).await.is_err());
    assert_eq!(diag.skipped.load(Ordering::Relaxed), 1);

    // A valid sample still gets through afterwards.
    let sample = QosSample {
        ts_ns: 7,
        rssi_dbm: -30,
        tx_ok: 1,
        tx_retry: 0,
        tx_fail: 0,
    };
    sender.send_to(&sample.encode(), &path).unwrap();
    match recv_event(&mut rx).await {
        QosEvent::Sample { sample: got, .. } => assert_eq!(got, sample),
        other => panic!("expected Sample, got {other:?}"),
    }

    listener.abort();
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn unremovable_stale_path_reports_an_error_event() {
    let path = temp_sock("blocked");
    let _ = std::fs::remove_file(&path);

    // A directory at the path cannot be unlinked as a stale socket.
    std::fs::create_dir(&path).unwrap();

    let ctx = Context::new(8);
    let mut rx = ctx.tx.subscribe();
    let result = run_listener(&path, ctx, Arc::new(CountingDiag::default())).await;

    assert!(result.is_err());
    match recv_event(&mut rx).await {
        QosEvent::Error { reason } => assert!(reason.contains("unlink stale")),
        other => panic!("expected Error, got {other:?}"),
    }

    let _ = std::fs::remove_dir(&path);
}

#[tokio::test]
async fn stale_socket_file_is_replaced_on_bind() {
    let path = temp_sock("stale");
    let _ = std::fs::remove_file(&path);

    // Leave a dead socket file at the path.
    let stale = UnixDatagram::bind(&path).unwrap();
    drop(stale);
    assert!(path.exists());

    let ctx = Context::new(8);
    let mut rx = ctx.tx.subscribe();
    let listener_path = path.clone();
    let listener = tokio::spawn(async move {
        let _ = run_listener(&listener_path, ctx, Arc::new(CountingDiag::default())).await;
    });

    assert!(matches!(recv_event(&mut rx).await, QosEvent::Ready { .. }));

    listener.abort();
    let _ = std::fs::remove_file(&path);
}
