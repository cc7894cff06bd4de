//! Prelude module for convenient imports.
//!
//! ```
//! use tally::prelude::*;
//! ```
//!
//! # What's included
//!
//! - [`Application`] - The application trait
//! - [`Command`] and [`Action`] - Side effects and what they yield
//! - [`Subscription`] and [`SubscriptionSource`] - Event sources
//! - [`Runtime`] - The event loop
//! - [`Reducer`] and [`Store`] - Client state

pub use crate::application::Application;
pub use crate::command::{Action, Command};
pub use crate::runtime::Runtime;
pub use crate::store::{Reducer, Store};
pub use crate::subscription::{Subscription, SubscriptionSource};
