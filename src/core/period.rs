//! Reporting periods - inclusive calendar-date ranges used to scope queries.
//!
//! Three ways of picking a month are supported:
//!
//! - [`PeriodPolicy::ClampedMonth`] (default): `YYYY-MM` runs from day 1 to the
//!   real last day of that month.
//! - [`PeriodPolicy::LegacyLexicalMonth`]: `YYYY-MM` runs from day 1 to the
//!   literal bound `YYYY-MM-31`. For months shorter than 31 days that bound is
//!   not a calendar date; inclusion is decided by comparing ISO strings, so the
//!   tail past the last real day is empty instead of being clamped. Kept for
//!   compatibility with dashboards that built their bounds this way.
//! - [`Period::from_selector`]: a `(month, year)` pair resolved as "day 0 of the
//!   following month", which lands on the last day of the selected month.

use crate::errors::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

const ISO_DATE: &str = "%Y-%m-%d";

/// How a `YYYY-MM` month string becomes a date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodPolicy {
    /// Day 1 through the month's actual last day
    #[default]
    ClampedMonth,
    /// Day 1 through the literal day `31`, compared lexically
    LegacyLexicalMonth,
}

/// Inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
    /// Literal upper bound sent to the backend in legacy mode
    lexical_end: Option<String>,
}

impl Period {
    /// Builds an explicit inclusive range.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPeriod`] when `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidPeriod {
                message: format!("start {start} is after end {end}"),
            });
        }
        Ok(Self {
            start,
            end,
            lexical_end: None,
        })
    }

    /// Builds the range for `year`-`month` under `policy`.
    pub fn for_month(year: i32, month: u32, policy: PeriodPolicy) -> Result<Self> {
        let start = first_of_month(year, month)?;
        let end = last_of_month(year, month)?;
        let lexical_end = match policy {
            PeriodPolicy::ClampedMonth => None,
            PeriodPolicy::LegacyLexicalMonth => Some(format!("{year:04}-{month:02}-31")),
        };
        Ok(Self {
            start,
            end,
            lexical_end,
        })
    }

    /// Parses a `YYYY-MM` month string and builds its range under `policy`.
    pub fn parse_month(month: &str, policy: PeriodPolicy) -> Result<Self> {
        let invalid = || Error::InvalidPeriod {
            message: format!("expected YYYY-MM, got {month:?}"),
        };
        let (year, month_part) = month.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month_part.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month_num: u32 = month_part.parse().map_err(|_| invalid())?;
        Self::for_month(year, month_num, policy)
    }

    /// Builds the range for an explicit month/year selector: the first of the
    /// month through day 0 of the following month.
    pub fn from_selector(month: u32, year: i32) -> Result<Self> {
        let start = first_of_month(year, month)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = first_of_month(next_year, next_month)?
            .pred_opt()
            .ok_or_else(|| Error::InvalidPeriod {
                message: format!("no day before {next_year:04}-{next_month:02}-01"),
            })?;
        Self::new(start, end)
    }

    /// The month containing `date`, under `policy`.
    pub fn month_containing(date: NaiveDate, policy: PeriodPolicy) -> Result<Self> {
        Self::for_month(date.year(), date.month(), policy)
    }

    /// First day of the range.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last real calendar day covered by the range.
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether this period uses the legacy lexical upper bound.
    #[must_use]
    pub const fn is_lexical(&self) -> bool {
        self.lexical_end.is_some()
    }

    /// Lower bound as sent to the backend.
    #[must_use]
    pub fn lower_bound(&self) -> String {
        self.start.format(ISO_DATE).to_string()
    }

    /// Upper bound as sent to the backend. In legacy mode this is the literal
    /// `YYYY-MM-31`, which may not be a real date.
    #[must_use]
    pub fn upper_bound(&self) -> String {
        self.lexical_end
            .clone()
            .unwrap_or_else(|| self.end.format(ISO_DATE).to_string())
    }

    /// Whether `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        match &self.lexical_end {
            Some(upper) => {
                let key = date.format(ISO_DATE).to_string();
                date >= self.start && key.as_str() <= upper.as_str()
            }
            None => date >= self.start && date <= self.end,
        }
    }
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| Error::InvalidPeriod {
        message: format!("{year:04}-{month:02} is not a valid month"),
    })
}

fn last_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    (28..=31)
        .rev()
        .find_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .ok_or_else(|| Error::InvalidPeriod {
            message: format!("{year:04}-{month:02} is not a valid month"),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_clamped_june_ends_on_the_30th() {
        let period = Period::parse_month("2024-06", PeriodPolicy::ClampedMonth).unwrap();

        assert_eq!(period.start(), date(2024, 6, 1));
        assert_eq!(period.end(), date(2024, 6, 30));
        assert_eq!(period.upper_bound(), "2024-06-30");
        assert!(period.contains(date(2024, 6, 30)));
        assert!(!period.contains(date(2024, 7, 1)));
        assert!(!period.contains(date(2024, 5, 31)));
    }

    #[test]
    fn test_legacy_june_uses_literal_31_bound() {
        let period = Period::parse_month("2024-06", PeriodPolicy::LegacyLexicalMonth).unwrap();

        assert!(period.is_lexical());
        assert_eq!(period.lower_bound(), "2024-06-01");
        assert_eq!(period.upper_bound(), "2024-06-31");
        // The literal bound is not a calendar date
        assert!(NaiveDate::parse_from_str(&period.upper_bound(), ISO_DATE).is_err());
        // Nothing past the month's last real day exists to be matched
        assert!(period.contains(date(2024, 6, 30)));
        assert!(!period.contains(date(2024, 7, 1)));
    }

    #[test]
    fn test_april_clamped_includes_the_30th() {
        let period = Period::for_month(2023, 4, PeriodPolicy::ClampedMonth).unwrap();
        assert!(period.contains(date(2023, 4, 30)));
        assert_eq!(period.end(), date(2023, 4, 30));
    }

    #[test]
    fn test_february_leap_year() {
        let period = Period::for_month(2024, 2, PeriodPolicy::ClampedMonth).unwrap();
        assert_eq!(period.end(), date(2024, 2, 29));

        let period = Period::for_month(2023, 2, PeriodPolicy::ClampedMonth).unwrap();
        assert_eq!(period.end(), date(2023, 2, 28));
    }

    #[test]
    fn test_selector_lands_on_last_day_of_month() {
        let june = Period::from_selector(6, 2024).unwrap();
        assert_eq!(june.start(), date(2024, 6, 1));
        assert_eq!(june.end(), date(2024, 6, 30));

        let december = Period::from_selector(12, 2024).unwrap();
        assert_eq!(december.end(), date(2024, 12, 31));

        let february = Period::from_selector(2, 2024).unwrap();
        assert_eq!(february.end(), date(2024, 2, 29));
    }

    #[test]
    fn test_selector_agrees_with_clamped_policy() {
        for month in 1..=12 {
            let selector = Period::from_selector(month, 2025).unwrap();
            let clamped = Period::for_month(2025, month, PeriodPolicy::ClampedMonth).unwrap();
            assert_eq!(selector, clamped, "month {month}");
        }
    }

    #[test]
    fn test_parse_month_rejects_garbage() {
        assert!(Period::parse_month("2024-13", PeriodPolicy::ClampedMonth).is_err());
        assert!(Period::parse_month("2024/06", PeriodPolicy::ClampedMonth).is_err());
        assert!(Period::parse_month("24-06", PeriodPolicy::ClampedMonth).is_err());
        assert!(Period::parse_month("", PeriodPolicy::ClampedMonth).is_err());
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let result = Period::new(date(2024, 6, 2), date(2024, 6, 1));
        assert!(matches!(result, Err(Error::InvalidPeriod { .. })));
        assert!(Period::new(date(2024, 6, 1), date(2024, 6, 1)).is_ok());
    }
}
