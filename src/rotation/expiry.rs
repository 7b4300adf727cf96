use chrono::{Days, NaiveDate};

/// An entry expires once `effective_date + threshold_days` is strictly before
/// `today`. An entry exactly at the threshold stays one more day.
pub fn should_archive(effective_date: NaiveDate, threshold_days: u32, today: NaiveDate) -> bool {
    effective_date
        .checked_add_days(Days::new(u64::from(threshold_days)))
        .is_some_and(|deadline| deadline < today)
}
