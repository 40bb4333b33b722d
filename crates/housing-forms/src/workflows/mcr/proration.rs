use chrono::{Datelike, NaiveDate};

/// Prorated payment owed through an intended-vacate date.
///
/// Divides the monthly amount by the day count of the vacate month and pays
/// days 1 through the vacate day inclusive, rounded half-up to cents. Absent
/// inputs are the normal no-proration case and produce `None` rather than an
/// error, as does a negative or non-finite monthly amount.
pub fn prorated_amount(monthly_amount: Option<f64>, vacate_date: Option<NaiveDate>) -> Option<f64> {
    let amount = monthly_amount?;
    let vacate = vacate_date?;

    if !amount.is_finite() || amount < 0.0 {
        return None;
    }

    let daily_rate = amount / f64::from(days_in_month(vacate));
    let days_to_pay = f64::from(vacate.day());
    Some(round_to_cents(daily_rate * days_to_pay))
}

/// Day count of the month containing `date`.
pub fn days_in_month(date: NaiveDate) -> u32 {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    // Day 1 of both months always exists.
    let first_of_month = NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date);
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or(date);

    (first_of_next - first_of_month).num_days() as u32
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
