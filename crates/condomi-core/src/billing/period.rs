use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

/// `dt` shifted by `months` calendar months, clamping to the last day of
/// shorter months. `None` only on calendar overflow.
pub fn add_months(dt: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    dt.checked_add_months(Months::new(months))
}

/// First and last day of the month containing `today`.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    (first, last)
}

/// Period covered by an ad-hoc invoice issued at `now`.
pub fn adhoc_period(now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    add_months(now, 1).map(|end| (now, end))
}

/// Billing period after a rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodAdvance {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub months: u32,
}

/// Move `[start, end)` forward one month at a time until `end >= now`.
///
/// Returns `None` when the period has not ended yet or the calendar
/// overflows.
pub fn advance_period(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<PeriodAdvance> {
    if end >= now {
        return None;
    }
    let (mut start, mut end) = (start, end);
    let mut months = 0u32;
    while end < now {
        start = end;
        end = add_months(start, 1)?;
        months += 1;
    }
    Some(PeriodAdvance { start, end, months })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_month_bounds_leap_february() {
        let (first, last) = month_bounds(NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_month_bounds_december() {
        let (first, last) = month_bounds(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(first, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }

    #[test]
    fn test_advance_single_month() {
        let advance = advance_period(at(2024, 1, 1), at(2024, 2, 1), at(2024, 2, 3)).unwrap();
        assert_eq!(advance.start, at(2024, 2, 1));
        assert_eq!(advance.end, at(2024, 3, 1));
        assert_eq!(advance.months, 1);
    }

    #[test]
    fn test_advance_skips_missed_months() {
        let advance = advance_period(at(2024, 1, 1), at(2024, 2, 1), at(2024, 5, 10)).unwrap();
        assert_eq!(advance.start, at(2024, 5, 1));
        assert_eq!(advance.end, at(2024, 6, 1));
        assert_eq!(advance.months, 4);
    }

    #[test]
    fn test_current_period_is_not_advanced() {
        assert!(advance_period(at(2024, 1, 1), at(2024, 2, 1), at(2024, 1, 20)).is_none());
    }

    #[test]
    fn test_adhoc_period_is_one_month() {
        let (start, end) = adhoc_period(at(2024, 1, 31)).unwrap();
        assert_eq!(start, at(2024, 1, 31));
        assert_eq!(end, at(2024, 2, 29));
    }
}
