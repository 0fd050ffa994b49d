use super::*;
use price_watcher::models::ProductSnapshot;
use price_watcher::plugins::{NotificationEvent, NotifierPlugin};

fn webhook_notifier(webhook: &MockServer) -> DiscordNotifier {
    DiscordNotifier::new(DiscordWebhook {
        webhook_url: format!("{}{}", webhook.uri(), WEBHOOK_PATH),
        username: Some("Price Bot".to_string()),
        avatar_url: None,
    })
}

fn test_event(price: i64) -> NotificationEvent {
    let snapshot = ProductSnapshot::new(
        "Gaming Laptop",
        Some(Decimal::from(price)),
        "https://www.amazon.in/dp/B0TESTLAPTOP",
    );
    NotificationEvent::new(snapshot, Decimal::from(132000), "₹").expect("priced snapshot")
}

#[tokio::test]
async fn test_discord_delivery() -> anyhow::Result<()> {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&webhook)
        .await;

    let result = webhook_notifier(&webhook).notify(&test_event(125000)).await?;
    assert!(result.success);

    let payloads = webhook_payloads(&webhook).await;
    assert_eq!(payloads[0]["username"], "Price Bot");
    assert_eq!(payloads[0]["embeds"][0]["fields"][2]["value"], "₹7,000.00 below target");
    Ok(())
}

#[tokio::test]
async fn test_discord_rejection_is_reported_not_raised() -> anyhow::Result<()> {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&webhook)
        .await;

    let result = webhook_notifier(&webhook).notify(&test_event(125000)).await?;

    assert!(!result.success);
    assert!(result.error.unwrap_or_default().contains("429"));
    Ok(())
}

#[tokio::test]
async fn test_discord_connection_check() -> anyhow::Result<()> {
    let webhook = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"1"}"#))
        .mount(&webhook)
        .await;

    assert!(webhook_notifier(&webhook).test_connection().await?);
    Ok(())
}

#[tokio::test]
async fn test_manager_fans_out_to_webhook() -> anyhow::Result<()> {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(&webhook)
        .await;

    let manager = NotifierManager::new();
    manager.register_notifier(Box::new(webhook_notifier(&webhook))).await?;

    let result = manager.send_notification(&test_event(131999)).await;

    assert!(result.success);
    assert_eq!(webhook_payloads(&webhook).await.len(), 1);
    Ok(())
}
