//! Cached HTTP queries.
//!
//! This module provides subscription-based data fetching with caching,
//! similar to SWR or TanStack Query.
//!
//! # Features
//!
//! - **Queries**: subscriptions that mount an observer on a cache entry and
//!   receive its projection on every change
//! - **Deduplication**: one in-flight fetch per key, shared by all observers
//! - **Freshness**: fresh data is served without refetching; stale data is
//!   served while a background refetch runs
//! - **Retry**: failed fetches are retried with exponential backoff before
//!   the error is surfaced
//! - **Eviction**: unobserved entries are dropped after `gc_time`
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::prelude::*;
//! use tally::subscription::http::{Query, QueryClient, QueryResult};
//! use std::sync::Arc;
//!
//! struct App {
//!     query_client: Arc<QueryClient>,
//!     posts: QueryResult<PostPage>,
//! }
//!
//! impl Application for App {
//!     fn subscriptions(&self) -> Vec<Subscription<Message>> {
//!         vec![
//!             Subscription::new(Query::new(
//!                 &"posts-data",
//!                 || Box::pin(fetch_posts()),
//!                 self.query_client.clone(),
//!             ))
//!             .map(Message::Posts)
//!         ]
//!     }
//!
//!     fn update(&mut self, msg: Message) -> Command<Message> {
//!         match msg {
//!             Message::Posts(result) => {
//!                 self.posts = result;
//!                 Command::none()
//!             }
//!             Message::Retry => self.query_client.refetch(&"posts-data"),
//!         }
//!     }
//! }
//! ```

mod cache;
mod config;
pub mod query;

// Re-export main types
pub use cache::{CacheEntry, QueryStatus, Retry};
pub use config::QueryConfig;
pub use query::{Fetcher, Query, QueryClient, QueryError, QueryResult};
