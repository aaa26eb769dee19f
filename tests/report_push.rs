use std::time::Duration;

use rss_collector::error::ReportError;
use rss_collector::report::ReportClient;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn posts_target_and_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .and(body_json(json!({ "target": "hk_it", "count": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReportClient::new(format!("{}/report", server.uri()));
    client.send("hk_it", 4).await.unwrap();
}

#[tokio::test]
async fn rejection_is_reported_once_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/report"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = ReportClient::new(format!("{}/report", server.uri()));
    let err = client.send("hk_it", 4).await.unwrap_err();
    assert!(matches!(err, ReportError::Status(400)), "{err:?}");
}

#[tokio::test]
async fn best_effort_swallows_unreachable_endpoint() {
    let client = ReportClient::new("http://127.0.0.1:1/report").with_timeout(Duration::from_secs(1));
    assert!(!client.send_best_effort("mk_economy", 3).await);
}
