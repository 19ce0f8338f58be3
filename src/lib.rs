//! roamdb: an in-memory store of accounts, places and visits served over
//! HTTP.
//!
//! This crate re-exports the pieces most callers need:
//!
//! - record types and patches from `roamdb-core`
//! - [`Store`] and the query filters from `roamdb-engine`
//! - the gateway, loader and configuration from `roamdb-server`
//!
//! ```no_run
//! use roamdb::{Store, VisitFilter};
//!
//! let store = Store::new();
//! let visits = store.visits_for_account(1, &VisitFilter::default());
//! assert!(visits.is_err());
//! ```

pub use roamdb_core::{
    Account, AccountId, AccountPatch, EntityKind, ErrorKind, Gender, Place, PlaceId, PlacePatch,
    RoamError, RoamResult, Timestamp, Visit, VisitId, VisitPatch,
};
pub use roamdb_engine::{
    age::age_at, query::round_half_up, AccountVisit, AverageFilter, Store, StoreOptions,
    StoreStats, VisitFilter,
};
pub use roamdb_server::{load, router, AppState, Archive, LoadReport, ServerConfig};
