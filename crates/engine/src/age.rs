//! Whole-year age computation.

use chrono::{DateTime, Datelike, Timelike, Utc};
use roamdb_core::Timestamp;

/// Completed calendar years between `birth` and `reference`.
///
/// Calendar-year difference, minus one when the birthday has not come round
/// yet in the reference year. Births after the reference give negative ages.
/// `None` when either instant lies outside the representable calendar.
pub fn age_at(birth: Timestamp, reference: Timestamp) -> Option<i32> {
    let birth = DateTime::<Utc>::from_timestamp(birth, 0)?;
    let reference = DateTime::<Utc>::from_timestamp(reference, 0)?;

    let mut years = reference.year() - birth.year();
    let birthday = (birth.month(), birth.day(), birth.num_seconds_from_midnight());
    let today = (
        reference.month(),
        reference.day(),
        reference.num_seconds_from_midnight(),
    );
    if today < birthday {
        years -= 1;
    }
    Some(years)
}
