use chrono::NaiveDate;

/// Calendar-day count between two dates, sign ignored. Weekends and holidays
/// count like any other day.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days().abs()
}
