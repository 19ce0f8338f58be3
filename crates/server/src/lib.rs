//! HTTP gateway, configuration and bulk loader for roamdb.
//!
//! The binary in `main.rs` wires these together: resolve a [`ServerConfig`],
//! open the startup [`Archive`], build the [`Store`](roamdb_engine::Store),
//! load the archive in the background and serve [`router`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod error;
pub mod loader;
pub mod routes;

pub use config::{Cli, ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use loader::{load, load_in_background, Archive, LoadError, LoadReport};
pub use routes::{router, AppState, Collection};
