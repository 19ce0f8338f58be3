//! Error type shared by all roamdb crates.
//!
//! Every failure a store operation can produce maps onto one of three
//! kinds the gateway cares about: malformed input, a validation failure,
//! or an unknown id.

use std::fmt;

use thiserror::Error;

/// Which table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Account table
    Account,
    /// Place table
    Place,
    /// Visit table
    Visit,
}

impl EntityKind {
    /// Lowercase name used in messages and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Place => "place",
            EntityKind::Visit => "visit",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by store, validation and query operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoamError {
    /// No record with this id exists
    #[error("{entity} {id} not found")]
    NotFound {
        /// Table that was searched
        entity: EntityKind,
        /// Requested id
        id: u32,
    },

    /// Creation with an id that is already taken
    #[error("{entity} {id} already exists")]
    Conflict {
        /// Table that already holds the id
        entity: EntityKind,
        /// Duplicate id
        id: u32,
    },

    /// Well-formed input that violates a field rule or reference
    #[error("invalid {entity}: {reason}")]
    Invalid {
        /// Table the candidate record belongs to
        entity: EntityKind,
        /// Which rule failed
        reason: String,
    },

    /// Input that could not be decoded at all
    #[error("malformed input: {reason}")]
    Malformed {
        /// What was wrong with the input
        reason: String,
    },
}

/// Coarse classification of a [`RoamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unparsable body, bad filter value
    MalformedInput,
    /// Field rule, foreign key, uniqueness or duplicate id
    ValidationFailure,
    /// Unknown id
    NotFound,
}

impl RoamError {
    /// Build a [`RoamError::Invalid`].
    pub fn invalid(entity: EntityKind, reason: impl Into<String>) -> Self {
        RoamError::Invalid {
            entity,
            reason: reason.into(),
        }
    }

    /// Build a [`RoamError::Malformed`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        RoamError::Malformed {
            reason: reason.into(),
        }
    }

    /// Build a [`RoamError::NotFound`].
    pub fn not_found(entity: EntityKind, id: u32) -> Self {
        RoamError::NotFound { entity, id }
    }

    /// Classify this error.
    ///
    /// A duplicate id on creation is reported to clients the same way as
    /// any other rejected write, so `Conflict` is a validation failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RoamError::NotFound { .. } => ErrorKind::NotFound,
            RoamError::Conflict { .. } | RoamError::Invalid { .. } => {
                ErrorKind::ValidationFailure
            }
            RoamError::Malformed { .. } => ErrorKind::MalformedInput,
        }
    }
}

/// Result alias used throughout roamdb.
pub type RoamResult<T> = Result<T, RoamError>;
