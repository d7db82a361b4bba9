use std::sync::Arc;
use std::time::Duration;

use hubble::container::Ring;
use hubble::domain::Timestamp;
use hubble::observer::{GetFlowsRequest, Observer};
use hubble::Flow;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn flow(seconds: i64) -> Flow {
    Flow::at(Timestamp::from_secs(seconds))
}

fn observer_with_flows(capacity: usize, count: i64) -> Observer<Flow> {
    let ring = Arc::new(Ring::new(capacity).expect("valid capacity"));
    for i in 0..count {
        ring.write(flow(i));
    }
    Observer::new(ring)
}

async fn recv_seconds(rx: &mut mpsc::Receiver<Arc<Flow>>, n: usize) -> Vec<i64> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        let flow = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a flow")
            .expect("stream ended early");
        out.push(flow.time.seconds);
    }
    out
}

#[tokio::test]
async fn test_get_flows_between_since_and_until() {
    let observer = observer_with_flows(256, 255);
    let request = GetFlowsRequest::all()
        .since(Timestamp::from_secs(2))
        .until(Timestamp::from_secs(7));

    let (tx, mut rx) = mpsc::channel(16);
    let summary = observer
        .get_flows(&request, &tx, &CancellationToken::new())
        .await
        .expect("query failed");
    drop(tx);

    assert_eq!(summary.delivered, 4);
    assert_eq!(recv_seconds(&mut rx, 4).await, vec![3, 4, 5, 6]);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_get_flows_historical_then_follow() {
    let observer = observer_with_flows(16, 5);
    let ring = Arc::clone(observer.ring());
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(16);

    let query = {
        let (observer, cancel) = (observer.clone(), cancel.clone());
        tokio::spawn(async move {
            let request = GetFlowsRequest::last(10).follow(true);
            observer.get_flows(&request, &tx, &cancel).await
        })
    };

    assert_eq!(recv_seconds(&mut rx, 5).await, vec![0, 1, 2, 3, 4]);

    ring.write(flow(5));
    ring.write(flow(6));
    assert_eq!(recv_seconds(&mut rx, 2).await, vec![5, 6]);

    // Nothing beyond what was written
    assert!(tokio::time::timeout(Duration::from_millis(50), rx.recv()).await.is_err());

    cancel.cancel();
    let summary = query.await.expect("query task panicked").expect("query failed");
    assert_eq!(summary.delivered, 7);
    assert_eq!(summary.lost, 0);
}

#[tokio::test]
async fn test_follow_applies_filters() {
    let observer = observer_with_flows(64, 4);
    let ring = Arc::clone(observer.ring());
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(16);

    let query = {
        let (observer, cancel) = (observer.clone(), cancel.clone());
        tokio::spawn(async move {
            let request = GetFlowsRequest::all()
                .follow(true)
                .allow(|f: &Flow| f.time.seconds % 2 == 0)
                .deny(|f: &Flow| f.time.seconds == 8);
            observer.get_flows(&request, &tx, &cancel).await
        })
    };

    // History ends at WC-2 = 2, flow 3 is the first one followed
    assert_eq!(recv_seconds(&mut rx, 2).await, vec![0, 2]);

    for i in 4..12 {
        ring.write(flow(i));
    }
    assert_eq!(recv_seconds(&mut rx, 3).await, vec![4, 6, 10]);
    assert!(tokio::time::timeout(Duration::from_millis(50), rx.recv()).await.is_err());

    cancel.cancel();
    let summary = query.await.unwrap().unwrap();
    assert_eq!(summary.delivered, 5);
}

#[tokio::test]
async fn test_follow_ends_at_until() {
    let observer = observer_with_flows(32, 3);
    let ring = Arc::clone(observer.ring());
    let (tx, mut rx) = mpsc::channel(16);

    let query = {
        let observer = observer.clone();
        tokio::spawn(async move {
            let request = GetFlowsRequest::all().follow(true).until(Timestamp::from_secs(6));
            observer.get_flows(&request, &tx, &CancellationToken::new()).await
        })
    };

    for i in 3..10 {
        ring.write(flow(i));
    }

    assert_eq!(recv_seconds(&mut rx, 6).await, vec![0, 1, 2, 3, 4, 5]);
    let summary = tokio::time::timeout(Duration::from_secs(5), query)
        .await
        .expect("follow did not stop at until")
        .unwrap()
        .unwrap();
    assert_eq!(summary.delivered, 6);
    // The sender was dropped with the task
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_slow_follower_counts_lost_flows() {
    let observer = observer_with_flows(8, 3);
    let ring = Arc::clone(observer.ring());
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel(1);

    let query = {
        let (observer, cancel) = (observer.clone(), cancel.clone());
        tokio::spawn(async move {
            let request = GetFlowsRequest::last(0).follow(true);
            observer.get_flows(&request, &tx, &cancel).await
        })
    };

    // Empty history, so following starts at the most recent write
    assert_eq!(recv_seconds(&mut rx, 1).await, vec![2]);

    // Lap the parked follower several times over
    for i in 3..40 {
        ring.write(flow(i));
    }

    let mut seen = vec![2];
    while seen.last() != Some(&39) {
        seen.extend(recv_seconds(&mut rx, 1).await);
    }
    // Resumes at WC - C + 1 = 33
    assert_eq!(seen, vec![2, 33, 34, 35, 36, 37, 38, 39]);

    cancel.cancel();
    let summary = query.await.unwrap().unwrap();
    assert_eq!(summary.delivered, 8);
    assert_eq!(summary.lost, 30);
}
