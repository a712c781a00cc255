//! Core types and trait definitions for the song-version survey.
//!
//! This crate is deliberately free of HTTP and spreadsheet dependencies.
//! Storage backends and the HTTP service depend on it; it depends on nothing
//! vendor-specific.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod response;
pub mod store;
pub mod survey;
pub mod table;

pub use error::{Error, Result, StoreError};
