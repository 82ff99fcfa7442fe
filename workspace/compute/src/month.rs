//! Month-key arithmetic.
//!
//! Budget periods are identified by a canonical "YYYY-MM" string. This
//! module converts those keys to calendar boundaries and to the previous
//! month's key. All ranges are half-open, so every day of a month,
//! including the 31st, lies inside its own range.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ComputeError, Result};

/// Parse a strict "YYYY-MM" month key into (year, month).
///
/// The year must be four digits and the month two zero-padded digits in
/// 01..=12; anything else is an `InvalidMonthKey`.
pub fn parse_month_key(key: &str) -> Result<(i32, u32)> {
    let bytes = key.as_bytes();
    let well_formed = bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(|b| b.is_ascii_digit())
        && bytes[5..].iter().all(|b| b.is_ascii_digit());
    if !well_formed {
        return Err(ComputeError::InvalidMonthKey(key.to_string()));
    }

    let year: i32 = key[..4]
        .parse()
        .map_err(|_| ComputeError::InvalidMonthKey(key.to_string()))?;
    let month: u32 = key[5..]
        .parse()
        .map_err(|_| ComputeError::InvalidMonthKey(key.to_string()))?;
    if !(1..=12).contains(&month) {
        return Err(ComputeError::InvalidMonthKey(key.to_string()));
    }

    Ok((year, month))
}

/// The month key immediately before `key`. January wraps into December
/// of the previous year.
pub fn previous_month(key: &str) -> Result<String> {
    let (year, month) = parse_month_key(key)?;
    let (prev_year, prev_month) = if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    };
    Ok(format!("{prev_year:04}-{prev_month:02}"))
}

/// Calendar boundaries of a month as the half-open interval
/// `[first-of-month 00:00, first-of-next-month 00:00)`.
///
/// December's end bound is January 1st of the following year, so the
/// range stays correct across the year wrap.
pub fn month_bounds(key: &str) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let (year, month) = parse_month_key(key)?;
    let start = first_of_month(year, month)?;
    let end = if month == 12 {
        first_of_month(year + 1, 1)?
    } else {
        first_of_month(year, month + 1)?
    };
    Ok((start, end))
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ComputeError::InvalidMonthKey(format!("{year:04}-{month:02}")))
}
