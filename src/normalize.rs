use crate::cell::CellValue;
use crate::error::NormalizeError;
use crate::notice::Notices;

/// Convert a cell into a number
///
/// Text is read with both `,` and `.` treated as thousands separators: every
/// occurrence is removed before parsing. `"1.234,56"` therefore becomes
/// `123456.0`; decimal precision in text values is discarded. Text that is
/// blank after removing the separators is `0.0`.
///
/// # Errors
/// * `Unparsable` for text that is not a number after removing separators
/// * `Unsupported` for empty cells and non-numeric cell types
pub fn try_clean_number(value: &CellValue) -> Result<f64, NormalizeError> {
    match value {
        CellValue::Int(i) => Ok(*i as f64),
        CellValue::Float(v) => Ok(*v),
        CellValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        CellValue::Text(text) => parse_text(text),
        other => Err(NormalizeError::Unsupported {
            kind: other.kind(),
            value: other.to_string(),
        }),
    }
}

/// Convert a cell into a number, falling back to `0.0`
///
/// Never fails: conversion errors are reported through `notices` and the
/// value degrades to zero.
pub fn clean_number(value: &CellValue, notices: &mut Notices) -> f64 {
    match try_clean_number(value) {
        Ok(v) => v,
        Err(e) => {
            notices.error(e.to_string());
            0.0
        }
    }
}

fn parse_text(text: &str) -> Result<f64, NormalizeError> {
    let cleaned: String = text.chars().filter(|c| *c != ',' && *c != '.').collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Ok(0.0);
    }

    cleaned
        .parse::<f64>()
        .map_err(|_| NormalizeError::Unparsable(text.to_string()))
}
