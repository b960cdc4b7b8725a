//! Date normalization to the agreement's "Month D, YYYY" format.
//!
//! Source documents mix ISO dates, month words and locale-ambiguous numeric
//! forms such as `3/11/26`. Numeric dates where both parts could be a month
//! are resolved against "today": listing and signing dates are almost always
//! in the near future, so the closest upcoming reading wins.

use chrono::{Local, NaiveDate};

use super::patterns::{DATE_DAY_MONTH_WORD, DATE_FULL, DATE_NUMERIC, DATE_SHORT_MONTH, DATE_YMD};

const MONTHS_SHORT: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Format a date as "February 11, 2026".
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Parse a "Month D, YYYY" date.
pub fn parse_long_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_FULL.captures(s.trim())?;
    let month = month_from_name(&caps[1])?;
    ymd(&caps[3], month, &caps[2])
}

/// Normalize a raw date against the system clock's current date.
pub fn normalize_date(raw: &str) -> String {
    normalize_date_with_today(raw, Local::now().date_naive())
}

/// Normalize a raw date, resolving ambiguous numeric forms against `today`.
///
/// Returns the trimmed input unchanged when no supported shape matches or the
/// date does not exist on the calendar. Year-first dates only need a month
/// in 1-12: the day is copied as written.
pub fn normalize_date_with_today(raw: &str, today: NaiveDate) -> String {
    DateNormalizer::new(today).normalize(raw)
}

/// Date normalizer bound to a reference date.
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    today: NaiveDate,
}

impl DateNormalizer {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Normalizer using the system clock.
    pub fn now() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn normalize(&self, raw: &str) -> String {
        let s = raw.trim();
        match self.resolve(s) {
            Some(date) => format_long_date(date),
            None => ymd_without_calendar_check(s).unwrap_or_else(|| s.to_string()),
        }
    }

    /// Resolve a trimmed date string to a calendar date.
    pub fn resolve(&self, s: &str) -> Option<NaiveDate> {
        // "February 11, 2026"
        if let Some(caps) = DATE_FULL.captures(s) {
            if let Some(date) = month_from_name(&caps[1]).and_then(|m| ymd(&caps[3], m, &caps[2])) {
                return Some(date);
            }
        }

        // "Feb 11, 2026" / "Feb 11 2026"
        if let Some(caps) = DATE_SHORT_MONTH.captures(s) {
            if let Some(date) = month_from_name(&caps[1]).and_then(|m| ymd(&caps[3], m, &caps[2])) {
                return Some(date);
            }
        }

        // "11 Feb 2026"
        if let Some(caps) = DATE_DAY_MONTH_WORD.captures(s) {
            if let Some(date) = month_from_name(&caps[2]).and_then(|m| ymd(&caps[3], m, &caps[1])) {
                return Some(date);
            }
        }

        // "2026-02-11"
        if let Some(caps) = DATE_YMD.captures(s) {
            let month: u32 = caps[2].parse().ok()?;
            if (1..=12).contains(&month) {
                if let Some(date) = ymd(&caps[1], month, &caps[3]) {
                    return Some(date);
                }
            }
        }

        // "11/2/26", "02.11.2026"
        if let Some(caps) = DATE_NUMERIC.captures(s) {
            let a: u32 = caps[1].parse().ok()?;
            let b: u32 = caps[2].parse().ok()?;
            let mut year: i32 = caps[3].parse().ok()?;
            if year < 100 {
                year += 2000;
            }
            return self.resolve_numeric(year, a, b);
        }

        None
    }

    fn resolve_numeric(&self, year: i32, a: u32, b: u32) -> Option<NaiveDate> {
        if a > 12 && b <= 12 {
            return NaiveDate::from_ymd_opt(year, b, a);
        }
        if b > 12 && a <= 12 {
            return NaiveDate::from_ymd_opt(year, a, b);
        }
        if a > 12 && b > 12 {
            return None;
        }

        let month_first = NaiveDate::from_ymd_opt(year, a, b);
        let day_first = NaiveDate::from_ymd_opt(year, b, a);
        match (month_first, day_first) {
            (Some(x), Some(y)) => Some(self.closest_upcoming(x, y)),
            (Some(x), None) | (None, Some(x)) => Some(x),
            (None, None) => None,
        }
    }

    /// Pick between two readings of an ambiguous date.
    ///
    /// Upcoming dates beat past ones; among two upcoming (or two past) dates
    /// the one nearer to today wins. Ties go to `month_first`.
    fn closest_upcoming(&self, month_first: NaiveDate, day_first: NaiveDate) -> NaiveDate {
        let diff_a = (month_first - self.today).num_days();
        let diff_b = (day_first - self.today).num_days();

        match (diff_a >= 0, diff_b >= 0) {
            (true, true) if diff_a <= diff_b => month_first,
            (true, true) => day_first,
            (true, false) => month_first,
            (false, true) => day_first,
            (false, false) if diff_a >= diff_b => month_first,
            (false, false) => day_first,
        }
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::now()
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    MONTHS_SHORT
        .iter()
        .position(|m| *m == prefix)
        .map(|idx| idx as u32 + 1)
}

/// Year-first dates are spelled out as written once the month is in range,
/// so "2026-02-31" becomes "February 31, 2026".
fn ymd_without_calendar_check(s: &str) -> Option<String> {
    let caps = DATE_YMD.captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(format!("{} {}, {}", first.format("%B"), day, year))
}

fn ymd(year: &str, month: u32, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, day.parse().ok()?)
}
