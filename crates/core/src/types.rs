//! Entity records.
//!
//! Ids are caller-assigned positive integers. The three id spaces are
//! independent: account 5, place 5 and visit 5 are unrelated records.

use serde::{Deserialize, Serialize};

/// Account identifier
pub type AccountId = u32;
/// Place identifier
pub type PlaceId = u32;
/// Visit identifier
pub type VisitId = u32;
/// Seconds since the Unix epoch (may be negative)
pub type Timestamp = i64;

/// A registered traveller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique id, immutable once assigned
    pub id: AccountId,
    /// Globally unique email address
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// `""`, `"m"` or `"f"`
    pub gender: String,
    /// Birth instant in seconds since the epoch
    pub birth_date: Timestamp,
}

/// A point of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Unique id, immutable once assigned
    pub id: PlaceId,
    /// Distance from the city centre
    pub distance: i32,
    /// City the place is in
    pub city: String,
    /// Human readable name
    #[serde(alias = "place")]
    pub place_name: String,
    /// Country the place is in
    pub country: String,
}

/// One account visiting one place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// Unique id, immutable once assigned
    pub id: VisitId,
    /// Visiting account
    #[serde(alias = "user")]
    pub account_id: AccountId,
    /// Visited place
    #[serde(alias = "location")]
    pub place_id: PlaceId,
    /// When the visit happened
    pub visited_at: Timestamp,
    /// Rating between 0 and 5 inclusive
    pub mark: i32,
}

/// Gender accepted by the average-mark filter.
///
/// Stored accounts may also carry an empty gender; that value can never be
/// filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    /// `"m"`
    Male,
    /// `"f"`
    Female,
}

impl Gender {
    /// Parse a filter value. Only `"m"` and `"f"` are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "m" => Some(Gender::Male),
            "f" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
        }
    }

    /// Whether a stored gender string equals this value.
    pub fn matches(&self, stored: &str) -> bool {
        self.as_str() == stored
    }
}
