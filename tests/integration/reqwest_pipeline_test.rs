// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::test_config;
use agentscrape::application::dto::pipeline_config::PipelineConfig;
use agentscrape::application::use_cases::scrape_pipeline::ScrapePipeline;
use agentscrape::domain::models::cancel_token::CancelToken;
use agentscrape::domain::models::scrape_result::UrlState;
use agentscrape::domain::services::extraction_service::RuleBasedExtractor;
use agentscrape::engines::reqwest_engine::ReqwestEngine;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCT_PAGE: &str = r#"
<html>
    <head>
        <title>Canvas Backpack</title>
        <style>.price { font-weight: bold; }</style>
    </head>
    <body>
        <h1>Canvas Backpack</h1>
        <p>A sturdy canvas backpack with padded straps and a laptop sleeve inside.</p>
        <span class="price">Now 49,90 €</span>
        <script>trackView("backpack");</script>
    </body>
</html>
"#;

#[tokio::test]
async fn test_real_transport_with_rule_based_extraction() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(PRODUCT_PAGE),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = ScrapePipeline::new(
        Arc::new(ReqwestEngine::new().unwrap()),
        Arc::new(RuleBasedExtractor::new()),
    );
    let config = PipelineConfig {
        page_type: Some("product".to_string()),
        ..test_config()
    };
    let urls = vec![
        format!("{}/product", server.uri()),
        format!("{}/flaky", server.uri()),
        format!("{}/missing", server.uri()),
    ];

    let report = pipeline
        .run(&urls, &config, &CancelToken::none())
        .await
        .unwrap();

    let product = &report.results[0];
    assert_eq!(product.status, UrlState::Done);
    assert_eq!(product.extraction_attempts, 1);
    let record = product.record.as_ref().unwrap();
    assert_eq!(record["title"], json!("Canvas Backpack"));
    assert_eq!(record["price"], json!(49.9));
    assert_eq!(
        record["description"],
        json!("A sturdy canvas backpack with padded straps and a laptop sleeve inside.")
    );

    let flaky = &report.results[1];
    assert_eq!(flaky.status, UrlState::FetchFailed);
    assert_eq!(flaky.fetch_attempts, 3);
    assert_eq!(flaky.failure.as_ref().unwrap().category, "http_status_error");

    let missing = &report.results[2];
    assert_eq!(missing.status, UrlState::FetchFailed);
    assert_eq!(missing.fetch_attempts, 1);

    assert_eq!(report.stats.succeeded, 1);
    assert_eq!(report.stats.failed, 2);
}

#[tokio::test]
async fn test_malformed_url_fails_without_retry() {
    let pipeline = ScrapePipeline::new(
        Arc::new(ReqwestEngine::new().unwrap()),
        Arc::new(RuleBasedExtractor::new()),
    );

    let report = pipeline
        .run(
            &["not a url".to_string()],
            &test_config(),
            &CancelToken::none(),
        )
        .await
        .unwrap();

    let result = &report.results[0];
    assert_eq!(result.status, UrlState::FetchFailed);
    assert_eq!(result.fetch_attempts, 1);
    assert_eq!(result.failure.as_ref().unwrap().category, "invalid_url");
}
