use super::*;
use price_watcher::models::ExtractionResult;
use price_watcher::scraper::PageFetcher;
use wiremock::matchers::header;

#[tokio::test]
async fn test_fetch_sends_configured_headers() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCT_PATH))
        .and(header("user-agent", "PriceWatcher-Test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_scraper_config();
    let scraper = WebScraper::new(&config)?;
    let body = scraper
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH), &config.headers())
        .await?;

    assert_eq!(body, b"<html>ok</html>");
    Ok(())
}

#[tokio::test]
async fn test_http_error_status_is_transport_error() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let scraper = WebScraper::new(&get_test_scraper_config())?;
    let err = scraper
        .fetch(&format!("{}{}", server.uri(), PRODUCT_PATH), &empty_headers())
        .await
        .unwrap_err();

    assert!(err.is_transport());
    Ok(())
}

#[tokio::test]
async fn test_fetch_and_extract_snapshot() -> anyhow::Result<()> {
    let server = start_product_server("1,32,900").await;
    let scraper = WebScraper::new(&get_test_scraper_config())?;
    let extractor = ProductExtractor::new()?;
    let url = format!("{}{}", server.uri(), PRODUCT_PATH);

    let result = extractor.fetch_and_extract(&scraper, &url, &empty_headers()).await;

    let snapshot = result.snapshot().expect("snapshot");
    assert_eq!(snapshot.title, "Gaming Laptop");
    assert_eq!(snapshot.price, Some(Decimal::from(132900)));
    assert_eq!(snapshot.source_url, url);
    Ok(())
}

#[tokio::test]
async fn test_fetch_and_extract_maps_transport_failure() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let scraper = WebScraper::new(&get_test_scraper_config())?;
    let extractor = ProductExtractor::new()?;

    let result = extractor
        .fetch_and_extract(&scraper, &format!("{}/missing", server.uri()), &empty_headers())
        .await;

    assert!(matches!(result, ExtractionResult::FetchFailed(_)));
    Ok(())
}

#[tokio::test]
async fn test_fetch_and_extract_page_without_price() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><body><span id="productTitle">Sold Out Item</span></body></html>"#),
        )
        .mount(&server)
        .await;

    let scraper = WebScraper::new(&get_test_scraper_config())?;
    let extractor = ProductExtractor::new()?;

    let result = extractor
        .fetch_and_extract(&scraper, &format!("{}{}", server.uri(), PRODUCT_PATH), &empty_headers())
        .await;

    assert_eq!(
        result,
        ExtractionResult::PriceMissing {
            title: "Sold Out Item".to_string()
        }
    );
    Ok(())
}
