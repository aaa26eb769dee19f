use std::time::Duration;

use chrono::{SubsecRound, Utc};
use rss_collector::ingest::providers::ParseStrategy;
use rss_collector::{FeedError, FeedFetcher, FetchError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MK_XML: &str = include_str!("fixtures/mk_economy.xml");
const ATOM_XML: &str = include_str!("fixtures/atom.xml");
const TRUNCATED_XML: &str = include_str!("fixtures/truncated.xml");
const EMPTY_XML: &str = include_str!("fixtures/empty_channel.xml");
const EUC_KR_XML: &[u8] = include_bytes!("fixtures/euc_kr.xml");

async fn serve(body: &str, status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("content-type", "application/rss+xml; charset=utf-8")
                .set_body_string(body),
        )
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn keeps_first_n_items_in_feed_order() {
    let server = serve(MK_XML, 200).await;
    let before = Utc::now();

    let items = FeedFetcher::default()
        .fetch(&format!("{}/rss", server.uri()), 3)
        .await
        .expect("fetch ok");

    let after = Utc::now();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "한은, 기준금리 3.50% 동결");
    assert_eq!(items[1].title, "수출 7개월 연속 증가 & 반도체 호조");
    assert_eq!(items[2].link, "https://www.mk.co.kr/news/economy/3");
    assert_eq!(items[0].pub_date, "Wed, 01 May 2024 09:00:00 +0900");
    for it in &items {
        assert!(it.fetched_at >= before.trunc_subsecs(6));
        assert!(it.fetched_at <= after);
    }
    assert!(items.iter().all(|i| i.fetched_at == items[0].fetched_at));
}

#[tokio::test]
async fn short_feed_returns_everything() {
    let server = serve(MK_XML, 200).await;
    let items = FeedFetcher::default()
        .fetch(&format!("{}/rss", server.uri()), 50)
        .await
        .unwrap();
    assert_eq!(items.len(), 7);
}

#[tokio::test]
async fn both_strategies_agree_on_rss() {
    let server = serve(MK_XML, 200).await;
    let url = format!("{}/rss", server.uri());

    let tolerant = FeedFetcher::default()
        .with_strategy(ParseStrategy::Tolerant)
        .fetch(&url, 5)
        .await
        .unwrap();
    let direct = FeedFetcher::default()
        .with_strategy(ParseStrategy::Direct)
        .fetch(&url, 5)
        .await
        .unwrap();

    let titles = |v: &[rss_collector::Item]| v.iter().map(|i| i.title.clone()).collect::<Vec<_>>();
    pretty_assertions::assert_eq!(titles(&tolerant), titles(&direct));
}

#[tokio::test]
async fn tolerant_reads_atom() {
    let server = serve(ATOM_XML, 200).await;
    let items = FeedFetcher::default()
        .fetch(&format!("{}/rss", server.uri()), 5)
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].link, "https://www.hankyung.com/it/1");
    assert_eq!(items[0].pub_date, "2024-05-01T09:00:00+09:00");
    assert_eq!(items[1].pub_date, "2024-05-01T08:00:00+09:00");
}

#[tokio::test]
async fn upstream_error_status_is_a_fetch_error() {
    let server = serve("boom", 500).await;
    let err = FeedFetcher::default()
        .fetch(&format!("{}/rss", server.uri()), 3)
        .await
        .unwrap_err();
    assert!(
        matches!(err, FeedError::Fetch(FetchError::Status(500))),
        "{err:?}"
    );
}

#[tokio::test]
async fn truncated_document_is_a_parse_error() {
    let server = serve(TRUNCATED_XML, 200).await;
    for strategy in [ParseStrategy::Tolerant, ParseStrategy::Direct] {
        let err = FeedFetcher::default()
            .with_strategy(strategy)
            .fetch(&format!("{}/rss", server.uri()), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)), "{strategy}: {err:?}");
    }
}

#[tokio::test]
async fn html_page_is_a_parse_error() {
    let server = serve("<html><body>maintenance</body></html>", 200).await;
    let err = FeedFetcher::default()
        .fetch(&format!("{}/rss", server.uri()), 3)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Parse(_)), "{err:?}");
}

#[tokio::test]
async fn empty_channel_is_reported_with_url() {
    let server = serve(EMPTY_XML, 200).await;
    let url = format!("{}/rss", server.uri());
    let err = FeedFetcher::default().fetch(&url, 3).await.unwrap_err();
    match err {
        FeedError::EmptyFeed { url: u } => assert_eq!(u, url),
        other => panic!("expected EmptyFeed, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(MK_XML)
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&server)
        .await;

    let err = FeedFetcher::default()
        .with_timeout(Duration::from_millis(100))
        .fetch(&format!("{}/rss", server.uri()), 3)
        .await
        .unwrap_err();
    assert!(
        matches!(err, FeedError::Fetch(FetchError::Timeout(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn unreachable_host_is_a_fetch_error() {
    let err = FeedFetcher::default()
        .with_timeout(Duration::from_secs(2))
        .fetch("http://127.0.0.1:1/rss", 3)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "fetch");
}

#[tokio::test]
async fn euc_kr_feed_is_decoded_from_its_declaration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_bytes(EUC_KR_XML),
        )
        .mount(&server)
        .await;
    let url = format!("{}/rss", server.uri());

    for strategy in [ParseStrategy::Tolerant, ParseStrategy::Direct] {
        let items = FeedFetcher::default()
            .with_strategy(strategy)
            .fetch(&url, 5)
            .await
            .unwrap();
        assert_eq!(items.len(), 2, "{strategy}");
        assert_eq!(items[0].title, "경제 성장률 상향 조정");
        assert_eq!(items[1].title, "수출 증가세 지속");
    }
}
