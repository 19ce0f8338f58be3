//! Engine layer for roamdb
//!
//! [`Store`] owns the three tables and both visit indexes and is the only
//! way to read or mutate them. Validation ([`validate`]) and the two read
//! algorithms ([`query`]) are stateless and work off the store.
//!
//! # Lock order
//!
//! Account index, then place index, then a table shard. Readers hold at most
//! one index read guard plus transient shard guards. Nothing in this crate
//! takes a lock in the opposite order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod age;
pub mod query;
pub mod store;
pub mod validate;

pub use query::{AccountVisit, AverageFilter, VisitFilter};
pub use store::{Store, StoreOptions, StoreStats};
