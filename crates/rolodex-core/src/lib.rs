//! Core types and trait definitions for the Rolodex contact store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod association;
pub mod audit;
pub mod contact;
pub mod directory;
pub mod error;
pub mod permission;
pub mod reference;
pub mod related;
pub mod store;
pub mod value;

pub use error::{Error, ErrorKind, Result};

/// Row identifier shared by every table.
pub type Id = i64;
