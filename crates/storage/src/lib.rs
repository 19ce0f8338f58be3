//! Storage layer for roamdb
//!
//! Three building blocks, none of which knows about validation or queries:
//! - [`Table`]: id -> record map, DashMap-sharded, whole-record swaps
//! - [`BucketIndex`]: key -> visit ids, one lock for the whole index
//! - [`EmailIndex`]: email -> owning account, claimed atomically
//!
//! Indexes hold ids only. Record values live in exactly one table.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod email;
pub mod table;

pub use bucket::{Bucket, BucketIndex, BucketReader, BucketWriter};
pub use email::EmailIndex;
pub use table::Table;
