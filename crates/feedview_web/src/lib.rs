//! Browser front end for the feed.
//!
//! A stub by default so the workspace builds on native targets without a
//! wasm toolchain. Enable the real app with `--features web` on wasm32.

/// Placeholder function for non-web (or non-wasm) builds.
#[cfg(not(all(feature = "web", target_arch = "wasm32")))]
pub fn placeholder() {}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::start;
