use crate::error::AppError;

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Reject table names that are not part of the fetched catalogue.
pub fn require_known_table(table: &str, available: &[String]) -> Result<(), AppError> {
    if available.iter().any(|t| t == table) {
        return Ok(());
    }
    Err(AppError::Validation(format!(
        "Unknown table \"{table}\"; pick one of the available tables"
    )))
}
