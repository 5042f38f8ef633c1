//! Input validation for the request layer.
//!
//! The managers assume validated input; everything arriving as raw strings from
//! a host passes through here first.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{ClinicalStatus, Department, HandoverStatus, Sex};

/// A rejected input field.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// A non-blank value, trimmed.
pub fn required(field: &'static str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(trimmed.to_string())
}

/// A calendar date in `YYYY-MM-DD` form.
pub fn date(field: &'static str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, format!("expected YYYY-MM-DD, got {value:?}")))
}

pub fn sex(value: &str) -> ValidationResult<Sex> {
    Sex::from_code(value.trim())
        .ok_or_else(|| ValidationError::new("sex", format!("must be one of M, F, O, got {value:?}")))
}

pub fn department(value: &str) -> ValidationResult<Department> {
    Department::from_code(value.trim()).ok_or_else(|| {
        let codes: Vec<&str> = Department::ALL.iter().map(|d| d.code()).collect();
        ValidationError::new(
            "department",
            format!("must be one of {}, got {value:?}", codes.join(", ")),
        )
    })
}

pub fn clinical_status(value: &str) -> ValidationResult<ClinicalStatus> {
    ClinicalStatus::from_str_opt(value.trim()).ok_or_else(|| {
        ValidationError::new(
            "status",
            format!("must be one of Stable, Critical, Monitoring, Discharge, got {value:?}"),
        )
    })
}

pub fn handover_status(value: &str) -> ValidationResult<HandoverStatus> {
    HandoverStatus::from_str_opt(value.trim()).ok_or_else(|| {
        ValidationError::new("status", format!("must be pending or completed, got {value:?}"))
    })
}

/// Optional variant of a validator: `None` passes through.
pub fn optional<T, F>(value: Option<&str>, validate: F) -> ValidationResult<Option<T>>
where
    F: FnOnce(&str) -> ValidationResult<T>,
{
    value.map(validate).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert_eq!(required("name", "  Jane "), Ok("Jane".to_string()));
        let err = required("name", "   ").unwrap_err();
        assert_eq!(err.field, "name");
    }

    #[test]
    fn test_date() {
        assert_eq!(
            date("doa", "2024-01-31"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
        );
        assert!(date("doa", "31/01/2024").is_err());
        assert!(date("doa", "2024-02-30").is_err());
    }

    #[test]
    fn test_enumerations() {
        assert_eq!(sex("F"), Ok(Sex::Female));
        assert!(sex("female").is_err());
        assert_eq!(department("PVT"), Ok(Department::Private));
        assert!(department("ICU").unwrap_err().reason.contains("MW, PVT, GW, SW, ER"));
        assert_eq!(clinical_status("Critical"), Ok(ClinicalStatus::Critical));
        assert!(clinical_status("critical").is_err());
        assert_eq!(handover_status("completed"), Ok(HandoverStatus::Completed));
    }

    #[test]
    fn test_optional() {
        assert_eq!(optional(None, sex), Ok(None));
        assert_eq!(optional(Some("M"), sex), Ok(Some(Sex::Male)));
        assert!(optional(Some("X"), sex).is_err());
    }
}
