//! Calendar date/time conversions using O(1) algorithms
//!
//! Implements Howard Hinnant's civil_from_days and days_from_civil
//! algorithms (http://howardhinnant.github.io/date_algorithms.html): no
//! year iteration, correct leap handling, valid for the whole 1970-2105
//! range this firmware can express.

/// Broken-down civil date and time. No offset information: whether this is
/// UTC or local depends on what produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Break a Unix timestamp into civil fields.
    pub fn from_unix(unix_secs: u64) -> Self {
        const SECONDS_PER_DAY: u64 = 86_400;

        let days = (unix_secs / SECONDS_PER_DAY) as i64;
        let secs_today = unix_secs % SECONDS_PER_DAY;
        let (year, month, day) = civil_from_days(days);

        Self {
            year,
            month,
            day,
            hour: (secs_today / 3_600) as u8,
            minute: ((secs_today % 3_600) / 60) as u8,
            second: (secs_today % 60) as u8,
        }
    }

    /// Rebuild the Unix timestamp. Dates before 1970 clamp to zero.
    pub fn to_unix(&self) -> u64 {
        let days = days_from_civil(self.year, self.month, self.day).max(0) as u64;
        days * 86_400 + self.hour as u64 * 3_600 + self.minute as u64 * 60 + self.second as u64
    }
}

/// Gregorian leap year test.
pub(crate) fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Length of a month in days.
pub(crate) fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Day of week for a day count since the Unix epoch, 0 = Sunday.
/// Day 0 (1970-01-01) was a Thursday.
pub(crate) fn weekday_from_days(days: i64) -> u8 {
    (days + 4).rem_euclid(7) as u8
}

/// Days since the Unix epoch to (year, month, day).
fn civil_from_days(days_since_epoch: i64) -> (u16, u8, u8) {
    // Shift the epoch to 0000-03-01 so the leap day lands at year end.
    let z = days_since_epoch + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = (z - era * 146_097) as u32; // day of era [0, 146096]
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153; // [0, 11], 0 = March
    let d = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = if m <= 2 { y + 1 } else { y };
    (year as u16, m, d)
}

/// (year, month, day) to days since the Unix epoch.
pub(crate) fn days_from_civil(year: u16, month: u8, day: u8) -> i64 {
    let y = year as i64;
    let m = month as i64;
    let d = day as i64;

    let (y, m) = if m <= 2 { (y - 1, m + 9) } else { (y, m - 3) };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32; // [0, 399]
    let doy = (153 * m as u32 + 2) / 5 + d as u32 - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146_097 + doe as i64 - 719_468
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_years() {
        assert!(is_leap_year(2000)); // divisible by 400
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900)); // divisible by 100, not 400
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(2100));
    }

    #[test]
    fn unix_epoch() {
        let dt = DateTime::from_unix(0);
        assert_eq!(
            dt,
            DateTime {
                year: 1970,
                month: 1,
                day: 1,
                hour: 0,
                minute: 0,
                second: 0
            }
        );
    }

    #[test]
    fn round_trips() {
        let samples = [
            0u64,          // 1970-01-01 00:00:00
            946_684_800,   // 2000-01-01 00:00:00
            1_609_459_200, // 2021-01-01 00:00:00
            1_767_225_600, // 2026-01-01 00:00:00
            2_147_483_647, // 2038-01-19 03:14:07, 32-bit limit
            4_102_444_800, // 2100-01-01 00:00:00
        ];
        for unix_secs in samples {
            let dt = DateTime::from_unix(unix_secs);
            assert_eq!(dt.to_unix(), unix_secs, "round trip for {}", unix_secs);
        }
    }

    #[test]
    fn leap_day_2024() {
        // 2024-02-29 12:30:45
        let dt = DateTime::from_unix(1_709_209_845);
        assert_eq!((dt.year, dt.month, dt.day), (2024, 2, 29));
        assert_eq!((dt.hour, dt.minute, dt.second), (12, 30, 45));
    }

    #[test]
    fn weekdays() {
        // Day 0 is a Thursday.
        assert_eq!(weekday_from_days(0), 4);
        // 2026-03-01 and 2026-11-01 are both Sundays.
        assert_eq!(weekday_from_days(days_from_civil(2026, 3, 1)), 0);
        assert_eq!(weekday_from_days(days_from_civil(2026, 11, 1)), 0);
        // 2026-08-29 is a Saturday.
        assert_eq!(weekday_from_days(days_from_civil(2026, 8, 29)), 6);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2026, 10), 31);
        assert_eq!(days_in_month(2026, 11), 30);
    }
}
