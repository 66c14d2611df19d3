//! The wallet's remote data interfaces.
//!
//! Defines the domain types the wallet caches (balances, unspent outputs,
//! supported trading pairs), the client traits the owning services fetch
//! them through, and a reqwest-backed [`ApiClient`] implementing those
//! traits against the wallet API.

#![warn(missing_docs)]

mod client;
mod config;
mod types;

pub use client::*;
pub use config::*;
pub use types::*;
