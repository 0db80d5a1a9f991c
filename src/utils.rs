use crate::error::{GatewayError, GatewayResult};

/// Country calling code for the Burkina Faso market.
pub const COUNTRY_CALLING_CODE: &str = "226";

/// Prefixes `phone` with the country calling code exactly once.
///
/// Idempotent: a number that already carries the prefix is returned
/// unchanged. A leading `+` and surrounding whitespace are stripped first.
pub fn normalize_msisdn(phone: &str, calling_code: &str) -> String {
    let trimmed = phone.trim().trim_start_matches('+');
    if trimmed.starts_with(calling_code) {
        trimmed.to_string()
    } else {
        format!("{}{}", calling_code, trimmed)
    }
}

pub fn ensure_non_empty(value: &str, field: &str) -> GatewayResult<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::Configuration {
            message: format!("{} must not be empty", field),
            field: Some(field.to_string()),
        });
    }
    Ok(())
}

pub fn ensure_positive(amount: u64, field: &str) -> GatewayResult<()> {
    if amount == 0 {
        return Err(GatewayError::Configuration {
            message: format!("{} must be greater than zero", field),
            field: Some(field.to_string()),
        });
    }
    Ok(())
}
