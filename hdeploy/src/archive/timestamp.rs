//! Conversion of file modification times to ZIP timestamps.
//!
//! ZIP entries carry MS-DOS timestamps: two-second resolution, no time zone,
//! and years 1980 to 2107 only. Times are recorded in UTC and clamped to the
//! representable range.

use std::time::{SystemTime, UNIX_EPOCH};
use zip::DateTime;

const SECONDS_PER_DAY: u64 = 86_400;
const FIRST_YEAR: u32 = 1980;
const LAST_YEAR: u32 = 2107;

/// Convert a modification time to the closest representable ZIP timestamp.
///
/// Times before 1980 map to 1980-01-01 00:00:00. Times after 2107 map to the
/// last representable second.
#[must_use]
pub fn zip_timestamp(modified: SystemTime) -> DateTime {
    let Ok(elapsed) = modified.duration_since(UNIX_EPOCH) else {
        return DateTime::default();
    };
    let secs = elapsed.as_secs();
    let (year, month, day) = civil_from_epoch(secs);
    if year < FIRST_YEAR {
        return DateTime::default();
    }
    if year > LAST_YEAR {
        return latest();
    }

    let of_day = secs % SECONDS_PER_DAY;
    let (Ok(year), Ok(month), Ok(day), Ok(hour), Ok(minute), Ok(second)) = (
        u16::try_from(year),
        u8::try_from(month),
        u8::try_from(day),
        u8::try_from(of_day / 3_600),
        u8::try_from(of_day % 3_600 / 60),
        u8::try_from(of_day % 60),
    ) else {
        return DateTime::default();
    };
    DateTime::from_date_and_time(year, month, day, hour, minute, second).unwrap_or_default()
}

fn latest() -> DateTime {
    DateTime::from_date_and_time(2107, 12, 31, 23, 59, 58).unwrap_or_default()
}

/// Convert seconds since the Unix epoch to a civil (year, month, day) date.
///
/// Uses Howard Hinnant's days-from-civil inverse, valid for all post-epoch
/// dates.
fn civil_from_epoch(epoch_secs: u64) -> (u32, u32, u32) {
    let z = i64::try_from(epoch_secs / SECONDS_PER_DAY).unwrap_or(i64::MAX - 719_468) + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097); // day of era [0, 146_096]
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // day of year
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (
        u32::try_from(y).unwrap_or(u32::MAX),
        u32::try_from(m).unwrap_or(1),
        u32::try_from(d).unwrap_or(1),
    )
}
