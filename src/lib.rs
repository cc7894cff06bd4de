//! # Tally
//!
//! A terminal application showing client state and server state side by
//! side: a counter driven by a reducer [`Store`](store::Store), and a list
//! of posts fetched from a remote API and cached by a
//! [`QueryClient`](subscription::http::QueryClient).
//!
//! It runs on a small Elm Architecture runtime built on
//! [ratatui](https://ratatui.rs/):
//!
//! 1. **Model**: the application state
//! 2. **Message**: events that can change the state
//! 3. **Update**: processes messages and updates the model
//! 4. **View**: renders the UI from the current model
//! 5. **Subscriptions**: external event sources (keyboard, timers, queries)
//! 6. **Commands**: asynchronous operations that produce messages
//!
//! ## Core Components
//!
//! - [`Application`](application::Application): The trait an application implements
//! - [`Runtime`](runtime::Runtime): The event loop
//! - [`Command`](command::Command): Asynchronous side effects
//! - [`Subscription`](subscription::Subscription): Ongoing event sources
//! - [`Query`](subscription::http::Query): A cached, deduplicated fetch
//! - [`Store`](store::Store): Observable state changed through a reducer
//!
//! ## Example
//!
//! ```rust,no_run
//! use tally::app::{App, Flags};
//! use tally::config::AppConfig;
//! use tally::runtime::Runtime;
//!
//! # async fn run() -> color_eyre::eyre::Result<()> {
//! let config = AppConfig::default();
//! let mut terminal = ratatui::init();
//! let result = Runtime::<App>::new(Flags::remote(&config), config.frame_rate)
//!     .run(&mut terminal)
//!     .await;
//! ratatui::restore();
//! result
//! # }
//! ```

pub mod app;
pub mod application;
pub mod command;
pub mod config;
pub mod logging;
pub mod posts;
pub mod prelude;
pub mod runtime;
pub mod store;
pub mod subscription;
pub mod view;

pub use command::Command;
