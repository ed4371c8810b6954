//! Uploaded recipient filters.
//!
//! Staff can narrow a trigger or resend to a subset of companies by
//! uploading a CSV whose first column holds company external IDs.

use csv::ReaderBuilder;
use validator::ValidateEmail;

use crate::error::CoreError;

/// Header cell recognised (case-insensitively) as a column title and skipped.
pub const EXTERNAL_ID_HEADER: &str = "external_id";

/// Upper bound on the number of IDs accepted in a single upload.
pub const MAX_FILTER_IDS: usize = 10_000;

/// Parse the external IDs out of an uploaded CSV file.
///
/// Reads the first column of every record. A first row titled
/// [`EXTERNAL_ID_HEADER`] is skipped; blank cells are ignored and duplicates
/// are collapsed keeping the first occurrence.
pub fn parse_external_ids(data: &[u8]) -> Result<Vec<String>, CoreError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let mut ids: Vec<String> = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record =
            record.map_err(|e| CoreError::Validation(format!("Invalid CSV at row {}: {e}", row + 1)))?;
        let Some(cell) = record.get(0) else {
            continue;
        };
        let cell = cell.trim_start_matches('\u{feff}');
        if cell.is_empty() {
            continue;
        }
        if row == 0 && cell.eq_ignore_ascii_case(EXTERNAL_ID_HEADER) {
            continue;
        }
        if !ids.iter().any(|existing| existing == cell) {
            ids.push(cell.to_string());
        }
    }

    if ids.is_empty() {
        return Err(CoreError::Validation(
            "The uploaded file does not contain any external IDs".to_string(),
        ));
    }
    if ids.len() > MAX_FILTER_IDS {
        return Err(CoreError::Validation(format!(
            "The uploaded file contains {} external IDs (maximum {MAX_FILTER_IDS})",
            ids.len()
        )));
    }
    Ok(ids)
}

/// Normalize and validate a single recipient address (test sends).
pub fn validate_recipient_email(email: &str) -> Result<String, CoreError> {
    let email = email.trim();
    if !email.validate_email() {
        return Err(CoreError::Validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(email.to_string())
}
