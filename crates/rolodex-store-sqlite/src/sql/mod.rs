//! Synchronous query functions, one module per table family.
//!
//! Every function takes a plain [`rusqlite::Connection`] (a transaction
//! derefs to one) so that [`crate::SqliteStore`] can compose several of them
//! inside a single `tokio_rusqlite` call.

pub mod associations;
pub mod contacts;
pub mod directory;
pub mod permissions;
pub mod related;
pub mod types;
pub mod values;
