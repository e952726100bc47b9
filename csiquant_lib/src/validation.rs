//! Input validation for user-supplied codes, dates, and ranges.
//!
//! Validation failures abort the requested operation before any effect; the
//! messages name the expected format so they can be shown to the user as-is.

use chrono::NaiveDate;

use crate::error::CsiQuantError;
use crate::statements::Quarter;

/// Exchanges accepted in instrument codes.
const VALID_EXCHANGES: &[&str] = &["sh", "sz", "bj"];

/// Validate an exchange-qualified instrument code (e.g. `sh.600000`),
/// normalized to lowercase.
pub fn validate_code(input: &str) -> Result<String, CsiQuantError> {
    let trimmed = input.trim().to_lowercase();
    let valid = matches!(
        trimmed.split_once('.'),
        Some((exchange, digits))
            if VALID_EXCHANGES.contains(&exchange)
                && digits.len() == 6
                && digits.chars().all(|c| c.is_ascii_digit())
    );
    if valid {
        Ok(trimmed)
    } else {
        Err(CsiQuantError::InvalidInput(format!(
            "invalid instrument code '{}'. Expected format: sh.600000 or sz.000001",
            input
        )))
    }
}

/// Validate a comma-separated code list.
pub fn validate_code_list(input: &str) -> Result<Vec<String>, CsiQuantError> {
    let codes: Vec<String> = input
        .split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(validate_code)
        .collect::<Result<_, _>>()?;
    if codes.is_empty() {
        return Err(CsiQuantError::InvalidInput(
            "code list is empty".to_string(),
        ));
    }
    Ok(codes)
}

/// Validate a YYYY-MM-DD date string.
pub fn validate_date(input: &str) -> Result<NaiveDate, CsiQuantError> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        CsiQuantError::InvalidInput(format!(
            "invalid date '{}'. Expected format: YYYY-MM-DD (e.g. 2024-06-01)",
            trimmed
        ))
    })
}

/// Validate that a date range runs forward.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), CsiQuantError> {
    if start > end {
        return Err(CsiQuantError::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    Ok(())
}

/// Validate a YYYYQn quarter string.
pub fn validate_quarter(input: &str) -> Result<Quarter, CsiQuantError> {
    input.parse()
}

/// Validate that a quarter range runs forward.
pub fn validate_quarter_range(start: Quarter, end: Quarter) -> Result<(), CsiQuantError> {
    if start > end {
        return Err(CsiQuantError::InvalidInput(format!(
            "start quarter {} is after end quarter {}",
            start, end
        )));
    }
    Ok(())
}

/// Validate a trailing window in trading days (1..=3650, about 10 years).
pub fn validate_window(days: usize) -> Result<usize, CsiQuantError> {
    if !(1..=3650).contains(&days) {
        return Err(CsiQuantError::InvalidInput(format!(
            "days must be between 1 and 3650, got {}",
            days
        )));
    }
    Ok(days)
}

/// Validate a limit-move threshold: a decimal strictly between 0 and 1
/// (0.098 = 9.8%). The sign is supplied by the scan direction.
pub fn validate_threshold(threshold: f64) -> Result<f64, CsiQuantError> {
    if !threshold.is_finite() || threshold <= 0.0 || threshold >= 1.0 {
        return Err(CsiQuantError::InvalidInput(format!(
            "threshold must be a decimal between 0 and 1 (e.g. 0.098), got {}",
            threshold
        )));
    }
    Ok(threshold)
}

/// Validate a top-N bound (1..=500).
pub fn validate_top_n(top_n: usize) -> Result<usize, CsiQuantError> {
    if !(1..=500).contains(&top_n) {
        return Err(CsiQuantError::InvalidInput(format!(
            "top must be between 1 and 500, got {}",
            top_n
        )));
    }
    Ok(top_n)
}
