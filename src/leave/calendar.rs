use chrono::{Datelike, Duration, NaiveDate, Weekday};
use derive_more::Display;

use crate::error::AppError;

/// Inclusive calendar range. Construction guarantees `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "{}..={}", start, end)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range covering both dates regardless of their order. Used for rows
    /// the store already constrains with `start_date <= end_date`.
    pub fn spanning(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// `NOT (other.end < self.start OR other.start > self.end)`
    pub fn intersects(&self, other: &DateRange) -> bool {
        !(other.end < self.start || other.start > self.end)
    }

    pub fn calendar_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Number of Monday–Friday days in the range, both ends included.
    pub fn working_days(&self) -> i32 {
        let total = self.calendar_days();
        let full_weeks = total / 7;
        let mut count = full_weeks * 5;

        // Walk the remainder (< 7 days) that follows the full weeks.
        let mut day = self.start + Duration::days(full_weeks * 7);
        while day <= self.end {
            if is_working_day(day) {
                count += 1;
            }
            day += Duration::days(1);
        }

        count as i32
    }
}

pub fn is_working_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_rejects_inverted_range() {
        let err = DateRange::new(d(2024, 2, 5), d(2024, 2, 1)).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange { .. }));
    }

    #[rstest]
    // Thu 1 Feb 2024 .. Mon 5 Feb 2024: Thu, Fri, Mon
    #[case(d(2024, 2, 1), d(2024, 2, 5), 3)]
    #[case(d(2024, 2, 3), d(2024, 2, 4), 0)]
    #[case(d(2024, 2, 5), d(2024, 2, 5), 1)]
    #[case(d(2024, 2, 5), d(2024, 2, 16), 10)]
    #[case(d(2024, 1, 1), d(2024, 12, 31), 262)]
    // crosses the 29 Feb leap day
    #[case(d(2024, 2, 26), d(2024, 3, 1), 5)]
    fn test_working_days(#[case] start: NaiveDate, #[case] end: NaiveDate, #[case] expected: i32) {
        let range = DateRange::new(start, end).unwrap();
        assert_eq!(range.working_days(), expected);
    }

    #[test]
    fn test_intersects_is_inclusive_at_edges() {
        let a = DateRange::new(d(2024, 2, 1), d(2024, 2, 5)).unwrap();
        let touching = DateRange::new(d(2024, 2, 5), d(2024, 2, 9)).unwrap();
        let after = DateRange::new(d(2024, 2, 6), d(2024, 2, 9)).unwrap();
        let inside = DateRange::new(d(2024, 2, 3), d(2024, 2, 4)).unwrap();

        assert!(a.intersects(&touching));
        assert!(a.intersects(&inside));
        assert!(inside.intersects(&a));
        assert!(!a.intersects(&after));
    }

    #[test]
    fn test_display() {
        let range = DateRange::new(d(2024, 2, 1), d(2024, 2, 5)).unwrap();
        assert_eq!(range.to_string(), "2024-02-01..=2024-02-05");
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        (0i64..3650).prop_map(|offset| d(2020, 1, 1) + Duration::days(offset))
    }

    proptest! {
        #[test]
        fn prop_working_days_matches_day_by_day_count(start in arb_date(), len in 0i64..120) {
            let end = start + Duration::days(len);
            let range = DateRange::new(start, end).unwrap();

            let mut expected = 0;
            let mut day = start;
            while day <= end {
                if is_working_day(day) {
                    expected += 1;
                }
                day += Duration::days(1);
            }

            prop_assert_eq!(range.working_days(), expected);
            prop_assert!(i64::from(range.working_days()) <= range.calendar_days());
        }

        #[test]
        fn prop_intersects_is_symmetric(
            a in arb_date(),
            a_len in 0i64..30,
            b in arb_date(),
            b_len in 0i64..30,
        ) {
            let x = DateRange::new(a, a + Duration::days(a_len)).unwrap();
            let y = DateRange::new(b, b + Duration::days(b_len)).unwrap();
            prop_assert_eq!(x.intersects(&y), y.intersects(&x));
        }
    }
}
