mod common;

use common::mock_upstream::{
    dead_addr, search_server, FAILING_CHANNEL, JUNK_CHANNEL, LIVE_CHANNEL, LIVE_VIDEO, OFF_CHANNEL,
};
use news_proto::protocol::VideoRef;
use news_proto::resolver::{resolve, LiveSearch, YoutubeSearch};

#[tokio::test]
async fn live_channel_resolves_to_first_video() {
    let (url, _rec) = search_server().await;
    let search = YoutubeSearch::new(url, Some("test-key".into()));
    let resolved = resolve(&search, LIVE_CHANNEL).await;
    assert_eq!(resolved.video, Some(VideoRef::new(LIVE_VIDEO)));
}

#[tokio::test]
async fn search_request_carries_required_parameters() {
    let (url, rec) = search_server().await;
    let search = YoutubeSearch::new(url, Some("test-key".into()));
    search.search_live(OFF_CHANNEL).await.expect("search should succeed");

    let queries = rec.queries();
    assert_eq!(queries.len(), 1);
    let q = &queries[0];
    assert_eq!(q.get("part").map(String::as_str), Some("snippet"));
    assert_eq!(q.get("channelId").map(String::as_str), Some(OFF_CHANNEL));
    assert_eq!(q.get("eventType").map(String::as_str), Some("live"));
    assert_eq!(q.get("type").map(String::as_str), Some("video"));
    assert_eq!(q.get("maxResults").map(String::as_str), Some("1"));
    assert_eq!(q.get("key").map(String::as_str), Some("test-key"));
}

#[tokio::test]
async fn empty_items_is_not_live() {
    let (url, _rec) = search_server().await;
    let search = YoutubeSearch::new(url, None);
    assert!(!resolve(&search, OFF_CHANNEL).await.is_live());
}

#[tokio::test]
async fn server_error_and_garbage_are_not_live() {
    let (url, rec) = search_server().await;
    let search = YoutubeSearch::new(url, None);
    assert!(search.search_live(FAILING_CHANNEL).await.is_err());
    assert!(!resolve(&search, FAILING_CHANNEL).await.is_live());
    assert!(!resolve(&search, JUNK_CHANNEL).await.is_live());
    assert!(rec.queries().iter().all(|q| !q.contains_key("key")));
}

#[tokio::test]
async fn unreachable_endpoint_is_not_live() {
    let addr = dead_addr().await;
    let search = YoutubeSearch::new(format!("http://{}/youtube/v3/search", addr), None);
    assert!(!resolve(&search, LIVE_CHANNEL).await.is_live());
}

#[tokio::test]
async fn each_resolution_issues_a_fresh_request() {
    let (url, rec) = search_server().await;
    let search = YoutubeSearch::new(url, None);
    resolve(&search, LIVE_CHANNEL).await;
    resolve(&search, LIVE_CHANNEL).await;
    assert_eq!(rec.queries().len(), 2);
}
