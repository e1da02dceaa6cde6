// tests/aggregator_tests.rs
use async_trait::async_trait;
use stackwatch::aggregator::{StatusAggregator, StatusSnapshot};
use stackwatch::probe::{ProbeFailure, ProbeResult, Prober, Target};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Prober that takes a fixed time and always passes.
struct SlowProber {
    delay: Duration,
}

#[async_trait]
impl Prober for SlowProber {
    async fn probe(&self, target: &Target) -> ProbeResult {
        tokio::time::sleep(self.delay).await;
        ProbeResult::pass(target.clone(), None, self.delay.as_millis() as u64)
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn test_mixed_health_snapshot() {
    // One healthy HTTP endpoint, one port with nothing listening.
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/health")
        .with_status(200)
        .create_async()
        .await;
    let addr: SocketAddr = server.host_with_port().parse().unwrap();

    let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = unused.local_addr().unwrap().port();
    drop(unused);

    let aggregator = StatusAggregator::new();
    aggregator
        .register(
            Target::new("app", "127.0.0.1", addr.port())
                .unwrap()
                .with_path("/health"),
        )
        .await
        .unwrap();
    aggregator
        .register(
            Target::new("down", "127.0.0.1", dead_port)
                .unwrap()
                .with_timeout_ms(500)
                .unwrap(),
        )
        .await
        .unwrap();

    let snapshot = aggregator.run_once().await;

    assert!(!snapshot.overall_ok);
    assert_eq!(snapshot.exit_code(), 1);
    assert_eq!(snapshot.results.len(), 2);
    assert_eq!(snapshot.results[0].target.name, "app");
    assert!(snapshot.results[0].ok);
    assert_eq!(snapshot.results[1].target.name, "down");
    assert_eq!(
        snapshot.results[1].error,
        Some(ProbeFailure::ConnectionRefused)
    );
}

#[tokio::test]
async fn test_cancel_mid_cycle_still_delivers_snapshot() {
    let aggregator = Arc::new(StatusAggregator::with_prober(Arc::new(SlowProber {
        delay: Duration::from_millis(300),
    })));
    aggregator
        .register(Target::new("slow", "127.0.0.1", 80).unwrap())
        .await
        .unwrap();

    let snapshots: Arc<Mutex<Vec<StatusSnapshot>>> = Arc::new(Mutex::new(Vec::new()));

    let watcher = {
        let aggregator = aggregator.clone();
        let snapshots = snapshots.clone();
        tokio::spawn(async move {
            aggregator
                .run_periodically(Duration::from_millis(50), move |snapshot| {
                    snapshots.lock().unwrap().push(snapshot);
                })
                .await;
        })
    };

    // Cancel while the first cycle is still probing.
    tokio::time::sleep(Duration::from_millis(100)).await;
    aggregator.shutdown();
    watcher.await.unwrap();

    let delivered = snapshots.lock().unwrap();
    assert_eq!(
        delivered.len(),
        1,
        "the in-flight cycle's snapshot must still be delivered"
    );
    assert!(delivered[0].overall_ok);
}

#[tokio::test]
async fn test_no_cycles_start_after_shutdown() {
    let aggregator = Arc::new(StatusAggregator::with_prober(Arc::new(SlowProber {
        delay: Duration::from_millis(10),
    })));
    aggregator
        .register(Target::new("svc", "127.0.0.1", 80).unwrap())
        .await
        .unwrap();

    let snapshots: Arc<Mutex<Vec<StatusSnapshot>>> = Arc::new(Mutex::new(Vec::new()));

    let watcher = {
        let aggregator = aggregator.clone();
        let snapshots = snapshots.clone();
        tokio::spawn(async move {
            aggregator
                .run_periodically(Duration::from_millis(100), move |snapshot| {
                    snapshots.lock().unwrap().push(snapshot);
                })
                .await;
        })
    };

    // Let the first cycle finish, then cancel between cycles.
    tokio::time::sleep(Duration::from_millis(50)).await;
    aggregator.shutdown();
    watcher.await.unwrap();

    let count = snapshots.lock().unwrap().len();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(snapshots.lock().unwrap().len(), count);
    assert_eq!(count, 1);
}
