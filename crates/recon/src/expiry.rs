//! Expiry date interpretation for AI 17 (`YYMMDD`).
//!
//! Years use a sliding window anchored to the current century: `00..=49`
//! land in the current century, `50..=99` in the previous one. A day of `00`
//! means the last day of the month.
//!
//! An expiry date is compared as the start of that day, so a unit is already
//! expired on its expiry date.

use chrono::{Datelike, Local, Months, NaiveDate};

use crate::model::ExpiryState;

/// Default look-ahead for "expires soon".
pub const SOON_MONTHS: u32 = 6;

/// German numeric date, no zero padding (`31.12.2026`, `1.3.2027`).
pub const DISPLAY_FORMAT: &str = "%-d.%-m.%Y";

pub fn current_century() -> i32 {
    Local::now().year().div_euclid(100) * 100
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Decode a six-digit `YYMMDD` field relative to the current century.
pub fn decode_date(field: &str) -> Option<NaiveDate> {
    decode_date_in_century(field, current_century())
}

/// Decode `YYMMDD` with an explicit century base (e.g. `2000`).
pub fn decode_date_in_century(field: &str, century: i32) -> Option<NaiveDate> {
    if field.len() != 6 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let yy: i32 = field[0..2].parse().ok()?;
    let mm: u32 = field[2..4].parse().ok()?;
    let dd: u32 = field[4..6].parse().ok()?;

    let year = if yy < 50 { century + yy } else { century - 100 + yy };

    if dd == 0 {
        last_day_of_month(year, mm)
    } else {
        NaiveDate::from_ymd_opt(year, mm, dd)
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// Absent dates never count as expired.
pub fn is_expired(date: Option<NaiveDate>, today: NaiveDate) -> bool {
    date.is_some_and(|d| d <= today)
}

/// Within the default six-month window and not yet expired.
pub fn expires_soon(date: Option<NaiveDate>, today: NaiveDate) -> bool {
    expires_within(date, today, SOON_MONTHS)
}

pub fn expires_within(date: Option<NaiveDate>, today: NaiveDate, months: u32) -> bool {
    let Some(d) = date else {
        return false;
    };
    let horizon = today.checked_add_months(Months::new(months)).unwrap_or(NaiveDate::MAX);
    d <= horizon && !is_expired(date, today)
}

pub fn classify_expiry(date: NaiveDate, today: NaiveDate, soon_months: u32) -> ExpiryState {
    if is_expired(Some(date), today) {
        ExpiryState::Expired
    } else if expires_within(Some(date), today, soon_months) {
        ExpiryState::ExpiresSoon
    } else {
        ExpiryState::Valid
    }
}

/// Empty string for an absent date.
pub fn format_for_display(date: Option<NaiveDate>) -> String {
    format_with(date, DISPLAY_FORMAT)
}

pub fn format_with(date: Option<NaiveDate>, format: &str) -> String {
    date.map(|d| d.format(format).to_string()).unwrap_or_default()
}
