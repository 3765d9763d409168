mod common;

use axum::http::StatusCode;
use common::mock_upstream::{dead_addr, feed_server};
use html_escaper::Escape;
use news_proto::feed::{HeadlineFeed, HeadlineSource};
use news_proto::headlines::{render_html, FeedView, NOT_FOUND_TEXT, NO_NEWS_TEXT};

fn fifteen_articles() -> String {
    let items: Vec<String> = (0..15)
        .map(|i| format!(r#"{{"title":"Story {i}","source_name":"Wire","url":"https://e.x/{i}"}}"#))
        .collect();
    format!(r#"{{"generated_at_utc":"2024-01-29T10:00:00+00:00","articles":[{}]}}"#, items.join(","))
}

#[tokio::test]
async fn url_source_is_cache_busted_and_capped() {
    let (url, rec, _slot) = feed_server(StatusCode::OK, &fifteen_articles()).await;
    let feed = HeadlineFeed::new(HeadlineSource::parse(&url));

    let view = feed.refresh().await;
    assert_eq!(view.headlines().len(), 10);
    assert_eq!(render_html(&view).matches("<li").count(), 10);

    feed.refresh().await;
    let queries = rec.queries();
    assert_eq!(queries.len(), 2);
    assert!(queries.iter().all(|q| q.contains_key("_")));

    let headers = rec.headers();
    assert_eq!(
        headers[0].get("cache-control").and_then(|v| v.to_str().ok()),
        Some("no-cache")
    );
    assert_eq!(
        headers[0].get("pragma").and_then(|v| v.to_str().ok()),
        Some("no-cache")
    );
}

#[tokio::test]
async fn not_found_and_empty_replace_previous_content() {
    let (url, _rec, slot) = feed_server(StatusCode::OK, &fifteen_articles()).await;
    let feed = HeadlineFeed::new(HeadlineSource::parse(&url));
    assert!(matches!(feed.refresh().await, FeedView::Articles { .. }));

    *slot.lock().unwrap() = (StatusCode::OK, r#"{"items": []}"#.to_string());
    let view = feed.refresh().await;
    assert_eq!(view, FeedView::Empty);
    assert!(render_html(&view).contains(NO_NEWS_TEXT));

    *slot.lock().unwrap() = (StatusCode::NOT_FOUND, "missing".to_string());
    let view = feed.refresh().await;
    assert!(matches!(view, FeedView::NotFound { .. }));
    assert!(render_html(&view).contains(NOT_FOUND_TEXT));
}

#[tokio::test]
async fn unreachable_host_is_not_found() {
    let addr = dead_addr().await;
    let feed = HeadlineFeed::new(HeadlineSource::Url(format!("http://{}/top_news.json", addr)));
    assert!(matches!(feed.refresh().await, FeedView::NotFound { .. }));
}

#[tokio::test]
async fn file_source_with_hostile_titles_renders_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("top_news.json");
    std::fs::write(
        &path,
        r#"{"news": [{"headline": "<script>alert(1)</script>", "publisher": "X & Y"}]}"#,
    )
    .unwrap();

    let feed = HeadlineFeed::new(HeadlineSource::File(path));
    let html = render_html(&feed.refresh().await);
    assert!(!html.contains("<script"));
    assert!(html.contains(&Escape("<script>alert(1)</script>").to_string()));
    assert!(html.contains(&Escape("X & Y").to_string()));
    assert!(!html.contains("X & Y"));
}
