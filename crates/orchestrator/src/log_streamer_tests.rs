use super::*;
use syncoor_adapters::FakeContainerRuntime;

fn fast_backoff(max_retries: u32) -> Backoff {
    Backoff::new(
        Duration::from_millis(1),
        Duration::from_millis(2),
        2.0,
        max_retries,
    )
}

#[tokio::test(start_paused = true)]
async fn run_log_streamer_gives_up_after_exhausting_retries() {
    let runtime = Arc::new(FakeContainerRuntime::default());
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run_log_streamer(
        runtime,
        "geth".to_string(),
        "geth".to_string(),
        "geth".to_string(),
        cancel,
        fast_backoff(3),
    ));
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("streamer did not give up in time")
        .expect("streamer task panicked");
}

#[tokio::test(start_paused = true)]
async fn run_log_streamer_drains_seeded_lines_until_cancelled() {
    let runtime = Arc::new(FakeContainerRuntime::default());
    runtime.set_log_lines("geth", vec!["line1".to_string(), "line2".to_string()]);
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run_log_streamer(
        runtime,
        "geth".to_string(),
        "geth".to_string(),
        "geth".to_string(),
        cancel.clone(),
        fast_backoff(1000),
    ));

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("streamer did not stop after cancellation")
        .expect("streamer task panicked");
}
