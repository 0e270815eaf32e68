//! Integration tests for the runtime facade.
//!
//! These cover the primitives the coordinator leans on: spawning, timeouts,
//! channels, and cooperative cancellation.

use core_async::{runtime, sync, task, time};

#[tokio::test]
async fn test_task_spawn() {
    let handle = task::spawn(async { 42 });
    let result = handle.await.unwrap();
    assert_eq!(result, 42);
}

#[tokio::test]
async fn test_timeout_success() {
    let result = time::timeout(time::Duration::from_millis(100), async {
        time::sleep(time::Duration::from_millis(10)).await;
        42
    })
    .await;

    assert_eq!(result.unwrap(), 42);
}

#[tokio::test]
async fn test_timeout_failure() {
    let result = time::timeout(time::Duration::from_millis(10), async {
        time::sleep(time::Duration::from_millis(100)).await;
        42
    })
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_biased_select_prefers_earlier_branch() {
    let (high_tx, mut high_rx) = sync::mpsc::channel(4);
    let (low_tx, mut low_rx) = sync::mpsc::channel(4);
    low_tx.send("low").await.unwrap();
    high_tx.send("high").await.unwrap();

    let first = core_async::select! {
        biased;
        Some(value) = high_rx.recv() => value,
        Some(value) = low_rx.recv() => value,
    };

    assert_eq!(first, "high");
}

#[tokio::test]
async fn test_select_precondition_disables_branch() {
    let (tx, mut rx) = sync::mpsc::channel::<u32>(1);
    tx.send(1).await.unwrap();
    let accept = false;

    let picked = core_async::select! {
        biased;
        Some(value) = rx.recv(), if accept => value,
        _ = time::sleep(time::Duration::from_millis(5)) => 0,
    };

    assert_eq!(picked, 0);
    assert_eq!(rx.recv().await, Some(1));
}

#[tokio::test]
async fn test_mpsc_preserves_order() {
    let (tx, mut rx) = sync::mpsc::channel(4);

    task::spawn(async move {
        for i in 0..20 {
            tx.send(i).await.unwrap();
        }
    });

    let mut received = Vec::new();
    while let Some(value) = rx.recv().await {
        received.push(value);
    }

    assert_eq!(received, (0..20).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_watch_channel_latest_value() {
    let (tx, mut rx) = sync::watch::channel(0);

    task::spawn(async move {
        for i in 1..=5 {
            time::sleep(time::Duration::from_millis(5)).await;
            tx.send(i).unwrap();
        }
    });

    let mut last_value = 0;
    while rx.changed().await.is_ok() {
        last_value = *rx.borrow_and_update();
        if last_value >= 5 {
            break;
        }
    }

    assert_eq!(last_value, 5);
}

#[tokio::test]
async fn test_cancellation_token_wakes_waiters() {
    let token = sync::CancellationToken::new();
    let child = token.clone();

    let handle = task::spawn(async move {
        child.cancelled().await;
        "cancelled"
    });

    time::sleep(time::Duration::from_millis(10)).await;
    token.cancel();

    assert_eq!(handle.await.unwrap(), "cancelled");
    assert!(token.is_cancelled());
}

#[test]
fn test_block_on_outside_runtime() {
    let value = runtime::block_on(async { 7 * 6 });
    assert_eq!(value, Some(42));
}
