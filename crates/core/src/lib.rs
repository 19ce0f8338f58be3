//! Core types for roamdb
//!
//! This crate defines the three entity kinds held by the store (accounts,
//! places and visits), the partial-update patches the gateway decodes from
//! request bodies, and the error type shared by every layer.
//!
//! Nothing here owns state. The store lives in `roamdb-engine`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod patch;
pub mod types;

pub use error::{EntityKind, ErrorKind, RoamError, RoamResult};
pub use patch::{AccountPatch, PlacePatch, VisitPatch};
pub use types::{Account, AccountId, Gender, Place, PlaceId, Timestamp, Visit, VisitId};
