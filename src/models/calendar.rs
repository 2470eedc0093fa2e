//! Working-day calendar.
//!
//! Decides which calendar dates are working days and performs
//! calendar-aware date arithmetic.
//!
//! # Time Model
//! Dates are `chrono::NaiveDate` (no time of day, no time zone).
//! Durations and lags are whole working days.
//!
//! # Zero Offsets
//! `add_work_days(d, 0)` returns `d` unchanged, even when `d` itself is a
//! non-working day. Only non-zero offsets skip non-working days. Tasks are
//! kept off non-working days by snapping their start with
//! [`WorkCalendar::work_day_on_or_after`] when they are committed.
//!
//! # Range
//! Arithmetic that could leave the range of `NaiveDate` returns `Option`.

use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Weekly working-day calendar.
///
/// Stores one working flag per weekday, indexed from Monday.
/// The default calendar works Monday to Friday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCalendar {
    working: [bool; 7],
}

impl WorkCalendar {
    /// Creates the default Monday–Friday calendar.
    pub fn new() -> Self {
        Self {
            working: [true, true, true, true, true, false, false],
        }
    }

    /// Creates a calendar where every day is a working day.
    pub fn all_days() -> Self {
        Self { working: [true; 7] }
    }

    /// Builds a calendar from a weekday → working map.
    ///
    /// Weekdays missing from the map keep the Monday–Friday default.
    ///
    /// # Errors
    /// `InvalidCalendar` if the result has no working day at all.
    pub fn from_weekdays(days: &HashMap<Weekday, bool>) -> Result<Self> {
        let mut calendar = Self::new();
        for (&weekday, &working) in days {
            calendar = calendar.with_day(weekday, working);
        }
        calendar.ensure_working_days()?;
        Ok(calendar)
    }

    /// Sets the working flag of one weekday.
    pub fn with_day(mut self, weekday: Weekday, working: bool) -> Self {
        self.working[weekday.num_days_from_monday() as usize] = working;
        self
    }

    /// Number of working days per week.
    pub fn working_days_per_week(&self) -> i64 {
        self.working.iter().filter(|&&w| w).count() as i64
    }

    /// Fails when no weekday is a working day.
    pub fn ensure_working_days(&self) -> Result<()> {
        if self.working_days_per_week() == 0 {
            return Err(Error::InvalidCalendar(
                "calendar must have at least one working weekday".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `date` is a working day.
    #[inline]
    pub fn is_work_day(&self, date: NaiveDate) -> bool {
        self.working[date.weekday().num_days_from_monday() as usize]
    }

    /// Smallest working day strictly after `date`.
    ///
    /// A calendar without working days returns `date + 1`. `None` past the
    /// last representable date.
    pub fn next_work_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.step(date, 1)
    }

    /// Largest working day strictly before `date`.
    pub fn previous_work_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.step(date, -1)
    }

    /// `date` itself if it is a working day, otherwise the next working day.
    pub fn work_day_on_or_after(&self, date: NaiveDate) -> Option<NaiveDate> {
        if self.is_work_day(date) || self.working_days_per_week() == 0 {
            Some(date)
        } else {
            self.next_work_day(date)
        }
    }

    /// Advances (or, for negative `n`, retreats) by exactly `n` working days.
    ///
    /// `None` if the result falls outside the range `NaiveDate` can
    /// represent.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use u_plan::models::WorkCalendar;
    ///
    /// let cal = WorkCalendar::new();
    /// let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    /// let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
    /// assert_eq!(cal.add_work_days(friday, 1), Some(monday));
    /// assert_eq!(cal.add_work_days(monday, -1), Some(friday));
    /// assert_eq!(cal.add_work_days(monday, i64::MAX), None);
    /// ```
    pub fn add_work_days(&self, date: NaiveDate, n: i64) -> Option<NaiveDate> {
        if n == 0 {
            return Some(date);
        }
        let per_week = self.working_days_per_week();
        if per_week == 0 {
            return Some(date);
        }

        let direction = n.signum();
        let mut remaining = n.unsigned_abs() - 1;

        // First step lands on a working day; from there, `per_week` working
        // days in one direction is exactly seven calendar days.
        let mut current = self.step(date, direction)?;

        let weeks = remaining / per_week as u64;
        if weeks > 0 {
            let days = i64::try_from(weeks).ok()?.checked_mul(7 * direction)?;
            current = current.checked_add_signed(TimeDelta::try_days(days)?)?;
            remaining -= weeks * per_week as u64;
        }

        while remaining > 0 {
            current = self.step(current, direction)?;
            remaining -= 1;
        }
        Some(current)
    }

    /// Counts working days in `[from, to)`.
    ///
    /// Negative when `to < from`. For a working day `from`,
    /// `work_days_between(from, add_work_days(from, n)) == n`.
    pub fn work_days_between(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        if to < from {
            return -self.work_days_between(to, from);
        }
        let total_days = (to - from).num_days();
        let weeks = total_days / 7;
        let mut count = weeks * self.working_days_per_week();

        // Both stay within [from, to], so the iteration cannot overflow.
        let mut current = from + TimeDelta::days(weeks * 7);
        while current < to {
            if self.is_work_day(current) {
                count += 1;
            }
            current = current.succ_opt().unwrap_or(to);
        }
        count
    }

    /// Moves one day at a time in `direction` until a working day is found.
    fn step(&self, date: NaiveDate, direction: i64) -> Option<NaiveDate> {
        let one = TimeDelta::days(direction);
        let mut current = date.checked_add_signed(one)?;
        if self.working_days_per_week() == 0 {
            return Some(current);
        }
        while !self.is_work_day(current) {
            current = current.checked_add_signed(one)?;
        }
        Some(current)
    }
}

impl Default for WorkCalendar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // 2024-01-01 is a Monday.

    #[test]
    fn test_default_weekdays() {
        let cal = WorkCalendar::new();
        assert!(cal.is_work_day(d(2024, 1, 1))); // Mon
        assert!(cal.is_work_day(d(2024, 1, 5))); // Fri
        assert!(!cal.is_work_day(d(2024, 1, 6))); // Sat
        assert!(!cal.is_work_day(d(2024, 1, 7))); // Sun
        assert_eq!(cal.working_days_per_week(), 5);
    }

    #[test]
    fn test_friday_plus_one_is_monday() {
        let cal = WorkCalendar::new();
        assert_eq!(cal.add_work_days(d(2024, 1, 5), 1), Some(d(2024, 1, 8)));
    }

    #[test]
    fn test_zero_offset_does_not_skip() {
        let cal = WorkCalendar::new();
        assert_eq!(cal.add_work_days(d(2024, 1, 6), 0), Some(d(2024, 1, 6))); // Sat stays Sat
        assert_eq!(cal.add_work_days(d(2024, 1, 3), 0), Some(d(2024, 1, 3)));
    }

    #[test]
    fn test_negative_offset() {
        let cal = WorkCalendar::new();
        assert_eq!(cal.add_work_days(d(2024, 1, 8), -1), Some(d(2024, 1, 5)));
        assert_eq!(cal.add_work_days(d(2024, 1, 10), -3), Some(d(2024, 1, 5)));
        // From a weekend day, the first step retreats to Friday.
        assert_eq!(cal.add_work_days(d(2024, 1, 7), -1), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_week_skip_matches_day_by_day() {
        let cal = WorkCalendar::new().with_day(Weekday::Wed, false);
        let start = d(2024, 1, 6);
        for n in -40i64..=40 {
            let mut expected = start;
            for _ in 0..n.abs() {
                expected = if n > 0 {
                    cal.next_work_day(expected).unwrap()
                } else {
                    cal.previous_work_day(expected).unwrap()
                };
            }
            assert_eq!(cal.add_work_days(start, n), Some(expected), "n = {n}");
        }
    }

    #[test]
    fn test_out_of_range_is_none() {
        let cal = WorkCalendar::new();
        assert_eq!(cal.add_work_days(d(2024, 1, 1), 1_000_000_000), None);
        assert_eq!(cal.add_work_days(d(2024, 1, 1), i64::MAX), None);
        assert_eq!(cal.add_work_days(d(2024, 1, 1), i64::MIN), None);
        assert_eq!(cal.next_work_day(NaiveDate::MAX), None);
        assert_eq!(cal.previous_work_day(NaiveDate::MIN), None);
        // Large but representable offsets still work.
        assert_eq!(cal.add_work_days(d(2024, 1, 1), 5_000), Some(d(2043, 3, 2)));
    }

    #[test]
    fn test_work_day_on_or_after() {
        let cal = WorkCalendar::new();
        assert_eq!(cal.work_day_on_or_after(d(2024, 1, 6)), Some(d(2024, 1, 8))); // Sat
        assert_eq!(cal.work_day_on_or_after(d(2024, 1, 7)), Some(d(2024, 1, 8))); // Sun
        assert_eq!(cal.work_day_on_or_after(d(2024, 1, 3)), Some(d(2024, 1, 3)));
    }

    #[test]
    fn test_next_and_previous_work_day() {
        let cal = WorkCalendar::new();
        assert_eq!(cal.next_work_day(d(2024, 1, 5)), Some(d(2024, 1, 8)));
        assert_eq!(cal.next_work_day(d(2024, 1, 1)), Some(d(2024, 1, 2)));
        assert_eq!(cal.previous_work_day(d(2024, 1, 8)), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_work_days_between() {
        let cal = WorkCalendar::new();
        assert_eq!(cal.work_days_between(d(2024, 1, 1), d(2024, 1, 5)), 4);
        assert_eq!(cal.work_days_between(d(2024, 1, 1), d(2024, 1, 15)), 10);
        assert_eq!(cal.work_days_between(d(2024, 1, 5), d(2024, 1, 8)), 1);
        assert_eq!(cal.work_days_between(d(2024, 1, 8), d(2024, 1, 1)), -5);
        assert_eq!(cal.work_days_between(d(2024, 1, 3), d(2024, 1, 3)), 0);

        for n in 0..30 {
            let end = cal.add_work_days(d(2024, 1, 2), n).unwrap();
            assert_eq!(cal.work_days_between(d(2024, 1, 2), end), n);
        }
    }

    #[test]
    fn test_all_days_calendar() {
        let cal = WorkCalendar::all_days();
        assert_eq!(cal.add_work_days(d(2024, 1, 5), 2), Some(d(2024, 1, 7)));
        assert_eq!(cal.work_days_between(d(2024, 1, 1), d(2024, 1, 8)), 7);
    }

    #[test]
    fn test_from_weekdays() {
        let mut days = HashMap::new();
        days.insert(Weekday::Sat, true);
        days.insert(Weekday::Mon, false);
        let cal = WorkCalendar::from_weekdays(&days).unwrap();
        assert!(cal.is_work_day(d(2024, 1, 6)));
        assert!(!cal.is_work_day(d(2024, 1, 1)));
        assert!(cal.is_work_day(d(2024, 1, 2)));
    }

    #[test]
    fn test_no_working_days_rejected() {
        let days: HashMap<Weekday, bool> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ]
        .into_iter()
        .map(|w| (w, false))
        .collect();
        assert!(matches!(
            WorkCalendar::from_weekdays(&days),
            Err(Error::InvalidCalendar(_))
        ));
    }
}
