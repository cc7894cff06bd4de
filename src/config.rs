use std::time::Duration;

use crate::subscription::http::QueryConfig;

/// Startup settings of the application. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Redraws per second.
    pub frame_rate: u32,
    /// Interval between spinner frames.
    pub spinner_interval_ms: u64,
    /// Cache behavior for every query.
    pub query: QueryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            spinner_interval_ms: 100,
            query: QueryConfig::new(
                Duration::from_secs(5 * 60),  // stale_time
                Duration::from_secs(10 * 60), // gc_time
            )
            .with_retry(3)
            .with_refetch_on_window_focus(false),
        }
    }
}
