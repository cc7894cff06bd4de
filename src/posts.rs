//! Posts from the DummyJSON API.
//!
//! [`fetch_posts`] performs exactly one `GET` per call and never retries;
//! retrying is the query client's job.

use serde::{Deserialize, Serialize};

use crate::subscription::http::QueryError;

/// Endpoint listing posts.
pub const POSTS_URL: &str = "https://dummyjson.com/posts";

/// Cache key under which the posts page is stored.
pub const POSTS_QUERY_KEY: &str = "posts-data";

/// A single post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub body: String,
    pub user_id: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub reactions: Reactions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Reactions {
    pub likes: u64,
    pub dislikes: u64,
}

/// One page of posts as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}

/// Decodes a response body.
///
/// # Errors
///
/// Returns [`QueryError::FetchError`] if the body is not a post page or if it
/// holds more posts than its `limit`.
pub fn parse_page(body: &[u8]) -> Result<PostPage, QueryError> {
    let page: PostPage =
        serde_json::from_slice(body).map_err(|e| QueryError::FetchError(e.to_string()))?;

    if page.posts.len() as u64 > page.limit {
        return Err(QueryError::FetchError(format!(
            "page holds {} posts but its limit is {}",
            page.posts.len(),
            page.limit
        )));
    }
    Ok(page)
}

/// Fetches the first page of posts.
///
/// # Errors
///
/// - [`QueryError::NetworkError`] if no response arrives
/// - [`QueryError::Status`] for a non-success status code
/// - [`QueryError::FetchError`] if the body cannot be read or decoded
pub async fn fetch_posts(client: &reqwest::Client) -> Result<PostPage, QueryError> {
    tracing::debug!(url = POSTS_URL, "fetching posts");

    let response = client
        .get(POSTS_URL)
        .send()
        .await
        .map_err(|e| QueryError::NetworkError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(QueryError::Status(status.as_u16()));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| QueryError::FetchError(e.to_string()))?;

    let page = parse_page(&body)?;
    tracing::debug!(posts = page.posts.len(), total = page.total, "posts fetched");
    Ok(page)
}
