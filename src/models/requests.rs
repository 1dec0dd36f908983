use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Query parameters of `GET /api/marketplace/plans`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PlanSearchQuery {
    #[validate(
        required(code = "invalid_zip", message = "Invalid zip"),
        custom(function = "validate_search_zip")
    )]
    pub zip: Option<String>,
    #[validate(
        required(code = "missing_state", message = "Missing state"),
        length(min = 1, code = "missing_state", message = "Missing state")
    )]
    pub state: Option<String>,
    #[validate(
        required(code = "missing_household_size", message = "Missing householdSize"),
        length(min = 1, code = "missing_household_size", message = "Missing householdSize")
    )]
    #[serde(alias = "household_size", rename = "householdSize")]
    pub household_size: Option<String>,
    pub income: Option<String>,
    pub ages: Option<String>,
}

/// Query parameters of `GET /api/marketplace/counties`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CountyQuery {
    #[validate(
        required(code = "invalid_zip", message = "Invalid zip"),
        custom(function = "validate_lookup_zip")
    )]
    pub zip: Option<String>,
    pub year: Option<String>,
}

/// Digits of a ZIP input with everything else removed
pub fn zip_digits(zip: &str) -> String {
    zip.chars().filter(char::is_ascii_digit).collect()
}

/// Plan search requires exactly five digits
pub fn is_valid_zip(zip: &str) -> bool {
    zip_digits(zip).len() == 5
}

fn invalid_zip() -> ValidationError {
    let mut err = ValidationError::new("invalid_zip");
    err.message = Some("Invalid zip".into());
    err
}

fn validate_search_zip(zip: &str) -> Result<(), ValidationError> {
    if is_valid_zip(zip) {
        Ok(())
    } else {
        Err(invalid_zip())
    }
}

// County lookup tolerates ZIP+4 input
fn validate_lookup_zip(zip: &str) -> Result<(), ValidationError> {
    if zip_digits(zip).len() >= 5 {
        Ok(())
    } else {
        Err(invalid_zip())
    }
}
