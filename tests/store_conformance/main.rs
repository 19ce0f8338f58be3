//! Store conformance suite
//!
//! Exercises the public store API end to end: record merges, the visit
//! listing and average queries, and concurrent writers against readers.
//!
//! ```bash
//! cargo test --test store_conformance
//! ```

mod test_utils;

mod concurrency;
mod merge_update;
mod place_average;
mod visit_listing;
