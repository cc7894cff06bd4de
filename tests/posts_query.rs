// Caching behavior of the posts query, driven through the public API.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use tally::config::AppConfig;
use tally::posts::{POSTS_QUERY_KEY, PostPage, parse_page};
use tally::subscription::SubscriptionSource;
use tally::subscription::http::{Fetcher, Query, QueryClient, QueryError, QueryResult};

const BODY: &str = r#"{
    "posts": [
        {"id": 1, "title": "T", "body": "x", "userId": 5, "tags": [],
         "reactions": {"likes": 2, "dislikes": 0}}
    ],
    "total": 1, "skip": 0, "limit": 30
}"#;

/// Serves `BODY` after `latency`, failing the first `failures` calls.
fn fetcher(calls: Arc<AtomicUsize>, failures: usize, latency: Duration) -> Fetcher<PostPage> {
    Arc::new(move || -> BoxFuture<'static, Result<PostPage, QueryError>> {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        Box::pin(async move {
            tokio::time::sleep(latency).await;
            if call <= failures {
                Err(QueryError::Status(503))
            } else {
                parse_page(BODY.as_bytes())
            }
        })
    })
}

fn client() -> Arc<QueryClient> {
    Arc::new(QueryClient::with_config(AppConfig::default().query))
}

fn mount(
    client: &Arc<QueryClient>,
    fetcher: &Fetcher<PostPage>,
) -> BoxStream<'static, QueryResult<PostPage>> {
    Query::from_fetcher(&POSTS_QUERY_KEY, fetcher.clone(), client.clone()).stream()
}

async fn settle(stream: &mut BoxStream<'static, QueryResult<PostPage>>) -> QueryResult<PostPage> {
    loop {
        let result = stream.next().await.expect("stream ended");
        if !result.is_fetching() {
            return result;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_two_subscribers_share_one_call() {
    let client = client();
    let calls = Arc::new(AtomicUsize::new(0));
    let fetcher = fetcher(calls.clone(), 0, Duration::from_millis(200));

    let mut first = mount(&client, &fetcher);
    let mut second = mount(&client, &fetcher);

    let a = settle(&mut first).await;
    let b = settle(&mut second).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.data(), b.data());
    assert_eq!(a.data().map(|page| page.posts[0].user_id), Some(5));
}

#[tokio::test(start_paused = true)]
async fn test_remount_within_stale_time_makes_no_call() {
    let client = client();
    let calls = Arc::new(AtomicUsize::new(0));
    let fetcher = fetcher(calls.clone(), 0, Duration::from_millis(10));

    let mut stream = mount(&client, &fetcher);
    settle(&mut stream).await;
    drop(stream);

    tokio::time::advance(Duration::from_secs(4 * 60)).await;

    let mut stream = mount(&client, &fetcher);
    let cached = stream.next().await.unwrap();
    assert!(cached.is_success());
    assert!(!cached.is_fetching());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_data_is_shown_while_revalidating() {
    let client = client();
    let calls = Arc::new(AtomicUsize::new(0));
    let fetcher = fetcher(calls.clone(), 0, Duration::from_millis(10));

    let mut stream = mount(&client, &fetcher);
    settle(&mut stream).await;
    drop(stream);

    tokio::time::advance(Duration::from_secs(6 * 60)).await;

    let mut stream = mount(&client, &fetcher);
    let stale = stream.next().await.unwrap();
    assert!(stale.is_fetching());
    assert!(stale.data().is_some());

    let fresh = settle(&mut stream).await;
    assert!(fresh.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_evicted_after_gc_time_then_cold_start() {
    let client = client();
    let calls = Arc::new(AtomicUsize::new(0));
    let fetcher = fetcher(calls.clone(), 0, Duration::from_millis(10));

    let mut stream = mount(&client, &fetcher);
    settle(&mut stream).await;
    drop(stream);

    tokio::time::sleep(Duration::from_secs(11 * 60)).await;
    assert!(!client.contains_key(POSTS_QUERY_KEY));

    let mut stream = mount(&client, &fetcher);
    let cold = stream.next().await.unwrap();
    assert!(cold.is_loading(), "no data survives eviction");
    settle(&mut stream).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_error_after_three_retries_is_kept_on_remount() {
    let client = client();
    let calls = Arc::new(AtomicUsize::new(0));
    let fetcher = fetcher(calls.clone(), 4, Duration::from_millis(10));

    let mut stream = mount(&client, &fetcher);
    let failed = settle(&mut stream).await;

    assert!(failed.is_error());
    assert!(failed.data().is_none());
    assert_eq!(failed.error(), Some(&QueryError::Status(503)));
    assert_eq!(failed.retry_count, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    // Remounting does not retry a failed entry on its own.
    drop(stream);
    let mut stream = mount(&client, &fetcher);
    assert!(stream.next().await.unwrap().is_error());
    tokio::task::yield_now().await;
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}
