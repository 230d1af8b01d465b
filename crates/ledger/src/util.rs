//! Internal helpers for request validation and model conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! field checks so every kind strategy reports the same per-field errors.

use uuid::Uuid;

use crate::{LedgerError, ResultLedger};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultLedger<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| LedgerError::Integrity(format!("invalid {label} id: {value}")))
}

/// Reject anything that is not a finite number strictly above zero.
pub(crate) fn require_positive(field: &str, value: f64) -> ResultLedger<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(LedgerError::validation(field, "must be positive"));
    }
    Ok(value)
}

/// Reject negative or non-finite numbers; zero is allowed.
pub(crate) fn require_non_negative(field: &str, value: f64) -> ResultLedger<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(LedgerError::validation(field, "must not be negative"));
    }
    Ok(value)
}

pub(crate) fn require_non_empty<T>(field: &str, values: &[T]) -> ResultLedger<()> {
    if values.is_empty() {
        return Err(LedgerError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Trim `value` and reject it when nothing is left.
pub(crate) fn require_text(field: &str, value: &str) -> ResultLedger<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

/// Field path of the `index`-th entry of a list field, e.g. `items[2].qty`.
pub(crate) fn line_field(list: &str, index: usize, field: &str) -> String {
    format!("{list}[{index}].{field}")
}
