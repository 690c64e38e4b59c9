//! Derived total-income computation
//!
//! The total is the annual income scaled by the calendar-aware fractional
//! length of the employment span. Any internal failure collapses to zero;
//! nothing here propagates an error to the caller.

mod debounce;

pub use debounce::Debouncer;

use chrono::{Local, Months, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Fractional years between two dates, anniversary-aware.
///
/// Whole years are counted by stepping the start date forward twelve months
/// at a time (chrono clamps Feb 29 to Feb 28 in non-leap years, so
/// Feb-to-Feb spans count as whole years). The remainder is the elapsed
/// days of the final partial year over that year's actual length.
pub fn fractional_years(start: NaiveDate, end: NaiveDate) -> Option<Decimal> {
    if end < start {
        return None;
    }

    let mut whole_years: i64 = 0;
    let mut anniversary = start;
    loop {
        let next = anniversary.checked_add_months(Months::new(12))?;
        if next <= end {
            whole_years += 1;
            anniversary = next;
        } else {
            let span_days = (next - anniversary).num_days();
            let elapsed_days = (end - anniversary).num_days();
            if span_days <= 0 {
                return None;
            }
            let fraction =
                Decimal::from(elapsed_days) / Decimal::from(span_days);
            return Some(Decimal::from(whole_years) + fraction);
        }
    }
}

/// Total gross income over the employment span, rounded to two decimals.
///
/// Returns zero when the income is not finite or not positive, when the
/// start date is absent, or when the end date precedes the start date. An
/// absent end date means "still employed": today is used.
pub fn calculate_total_income(
    annual_income: f64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Decimal {
    total_income_inner(annual_income, start, end).unwrap_or_else(|| {
        tracing::debug!("total income computation degraded to zero");
        Decimal::ZERO
    })
}

fn total_income_inner(
    annual_income: f64,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Option<Decimal> {
    if !annual_income.is_finite() {
        return Some(Decimal::ZERO);
    }
    let start = match start {
        Some(d) => d,
        None => return Some(Decimal::ZERO),
    };
    if annual_income <= 0.0 {
        return Some(Decimal::ZERO);
    }
    let end = end.unwrap_or_else(|| Local::now().date_naive());
    if end < start {
        return Some(Decimal::ZERO);
    }

    let years = fractional_years(start, end)?;
    let income = Decimal::from_f64(annual_income)?;
    Some((income * years).round_dp(2))
}
