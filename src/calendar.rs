//! Ordinal-day helpers
//!
//! CCD results and classification records express dates as proleptic-Gregorian
//! ordinals where day 1 is 0001-01-01. chrono counts the same way through
//! `num_days_from_ce`, so the conversions are exact.

use crate::types::{MapifyError, MapifyResult, Ordinal};
use chrono::{Datelike, NaiveDate};

/// Ordinal of 1982-01-01, the start of the Landsat time series used by CCD
pub const SERIES_EPOCH: Ordinal = 723_546;

/// Convert an ordinal to a calendar date
pub fn date_from_ordinal(ordinal: Ordinal) -> Option<NaiveDate> {
    let days = i32::try_from(ordinal).ok()?;
    NaiveDate::from_num_days_from_ce_opt(days)
}

/// Convert a calendar date to its ordinal
pub fn ordinal_from_date(date: NaiveDate) -> Ordinal {
    Ordinal::from(date.num_days_from_ce())
}

/// Ordinal for a year/month/day triple
pub fn ordinal_from_ymd(year: i32, month: u32, day: u32) -> MapifyResult<Ordinal> {
    NaiveDate::from_ymd_opt(year, month, day)
        .map(ordinal_from_date)
        .ok_or_else(|| MapifyError::DataFormat(format!("Invalid date: {}-{:02}-{:02}", year, month, day)))
}

/// Parse an ISO `YYYY-MM-DD` string into an ordinal
pub fn ordinal_from_iso(text: &str) -> MapifyResult<Ordinal> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map(ordinal_from_date)
        .map_err(|e| MapifyError::DataFormat(format!("Invalid date '{}': {}", text, e)))
}

/// Calendar year of an ordinal; None for ordinals chrono cannot represent
pub fn year_of(ordinal: Ordinal) -> Option<i32> {
    date_from_ordinal(ordinal).map(|d| d.year())
}

/// Day of year (1..=366) of an ordinal
pub fn day_of_year(ordinal: Ordinal) -> Option<u16> {
    date_from_ordinal(ordinal).and_then(|d| u16::try_from(d.ordinal()).ok())
}

/// Same calendar date one year earlier; February 29 falls back to February 28
pub fn one_year_prior(ordinal: Ordinal) -> Option<Ordinal> {
    let date = date_from_ordinal(ordinal)?;
    let year = date.year() - 1;
    let prior = NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), date.day() - 1))?;
    Some(ordinal_from_date(prior))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_matches_proleptic_gregorian() {
        assert_eq!(ordinal_from_ymd(1, 1, 1).unwrap(), 1);
        assert_eq!(ordinal_from_ymd(1982, 1, 1).unwrap(), SERIES_EPOCH);
        assert_eq!(date_from_ordinal(730_000), NaiveDate::from_ymd_opt(1999, 9, 3));
        assert_eq!(ordinal_from_iso("2002-05-30").unwrap(), 731_000);
    }

    #[test]
    fn test_day_of_year() {
        assert_eq!(day_of_year(731_000), Some(150));
        assert_eq!(year_of(731_000), Some(2002));
    }

    #[test]
    fn test_one_year_prior_handles_leap_day() {
        let leap = ordinal_from_ymd(2004, 2, 29).unwrap();
        assert_eq!(one_year_prior(leap), Some(ordinal_from_ymd(2003, 2, 28).unwrap()));
        let plain = ordinal_from_ymd(2005, 7, 4).unwrap();
        assert_eq!(one_year_prior(plain), Some(ordinal_from_ymd(2004, 7, 4).unwrap()));
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        assert!(ordinal_from_ymd(2001, 2, 29).is_err());
        assert!(ordinal_from_iso("not-a-date").is_err());
        assert_eq!(date_from_ordinal(i64::MAX), None);
    }
}
