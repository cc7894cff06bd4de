//! Rendering of application state.
//!
//! Views are plain [`Widget`](ratatui::widgets::Widget)s built from borrowed
//! state. They never change what they render and hold nothing between frames.

pub mod counter;
pub mod posts;

pub use counter::{AmountPrompt, CounterView};
pub use posts::{Panel, PostsView};

/// Frames of the loading spinner.
pub const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// The spinner frame for `tick`.
pub fn spinner_frame(tick: usize) -> &'static str {
    SPINNER[tick % SPINNER.len()]
}
