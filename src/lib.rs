//! Client-side rendering for a small social feed: posts, tags, comments and
//! the session header, driven by a JSON REST backend.
//!
//! Rendering targets the [`dom::Region`] abstraction. The browser crate mounts
//! regions onto real DOM nodes; [`memory`] keeps them in memory for snapshots
//! and tests.

pub mod client;
pub mod config;
pub mod dom;
pub mod error;
pub mod linkify;
pub mod memory;
pub mod model;
pub mod render;
pub mod spawn;
pub mod time_ago;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::Api;
pub use config::{ClientConfig, RenderOptions, ViewConfig};
pub use error::ApiError;
pub use render::{FeedPage, FeedView};
pub use transport::{HttpTransport, Transport};
