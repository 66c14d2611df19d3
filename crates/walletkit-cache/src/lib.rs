//! Caching primitives for the wallet data layer.
//!
//! Every remote value the wallet displays (balances, unspent outputs,
//! supported trading pairs) is owned by a service that wraps a single
//! [`CachedValue`]. The cache holds the last successfully fetched value,
//! refreshes it according to a [`RefreshPolicy`], and coalesces concurrent
//! refreshes into a single in-flight fetch.
//!
//! The building blocks can be used independently:
//!
//! - [`CachedValue`] drives the refresh state machine and request coalescing.
//! - [`Multicast`] is a broadcast channel that retains the last emitted value
//!   and replays it to new subscribers.
//! - [`SessionSignals`] distributes login/logout lifecycle events to caches
//!   whose policy reacts to them.

#![warn(missing_docs)]

mod error;
mod multicast;
mod policy;
mod session;
mod value;

pub use error::{CacheEntry, CacheError};
pub use multicast::{Multicast, Subscription};
pub use policy::{LogoutBehavior, RefreshPolicy};
pub use session::{SessionEvent, SessionSignals};
pub use value::{CachedValue, Status};

#[cfg(any(test, feature = "test"))]
pub(crate) use tokio::time;

#[cfg(not(any(test, feature = "test")))]
pub(crate) use std::time;
