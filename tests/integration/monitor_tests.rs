use super::*;
use price_watcher::CycleOutcome;
use tokio::sync::watch;

#[tokio::test]
async fn test_price_above_target_sends_nothing() -> anyhow::Result<()> {
    let server = start_product_server("1,40,000").await;
    let (monitor, webhook) = create_test_monitor(&server).await?;

    assert_eq!(monitor.run_once().await?, CycleOutcome::NoAlert);
    assert!(webhook_payloads(&webhook).await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_price_equal_to_target_alerts() -> anyhow::Result<()> {
    let server = start_product_server("1,32,000").await;
    let (monitor, webhook) = create_test_monitor(&server).await?;

    assert_eq!(monitor.run_once().await?, CycleOutcome::AlertSent);
    assert_eq!(webhook_payloads(&webhook).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_stops_on_shutdown() -> anyhow::Result<()> {
    let server = start_product_server("1,25,000").await;
    let (monitor, webhook) = create_test_monitor(&server).await?;
    let monitor = Arc::new(monitor);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = {
        let monitor = monitor.clone();
        tokio::spawn(async move { monitor.run(shutdown_rx).await })
    };

    // The first cycle runs immediately; the next one is an hour away.
    let webhook_ref = &webhook;
    let delivered = wait_for_condition(|| async move { webhook_payloads(webhook_ref).await.len() == 1 }, 5).await;
    assert!(delivered);

    shutdown_tx.send(true)?;
    let stats = tokio::time::timeout(Duration::from_secs(5), handle).await??;

    assert_eq!(stats.cycles, 1);
    assert_eq!(stats.alerts_sent, 1);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
    Ok(())
}
