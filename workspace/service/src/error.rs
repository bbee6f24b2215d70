use model::Role;
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::content_store::StoreError;

/// Error types for the account and delivery workflows
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A required input field was absent or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// An input field was present but unusable
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// The phone number is already registered for this role
    #[error("Phone number {phone_number} already in use for role {role}")]
    PhoneTaken { phone_number: String, role: Role },

    /// Phone number / password / role did not identify an account.
    /// Deliberately carries no detail about which check failed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No account with the given id
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// Error from the content store
    #[error("Content store error: {0}")]
    ContentStore(#[from] StoreError),

    /// Error from the password hasher
    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    /// Runtime error for unexpected situations
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ServiceError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ServiceError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Reports the alphabetically first failing field, named the way clients
/// send it (`phone_number` becomes `phoneNumber`).
impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut violations: Vec<(String, String)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .first()
                    .map(|err| {
                        let mut params: Vec<String> = err
                            .params
                            .iter()
                            .filter(|(name, _)| name.to_string() != "value")
                            .map(|(name, value)| format!("{}={}", name, value))
                            .collect();
                        params.sort();
                        if params.is_empty() {
                            format!("failed {} check", err.code)
                        } else {
                            format!("failed {} check ({})", err.code, params.join(", "))
                        }
                    })
                    .unwrap_or_else(|| "invalid value".to_string());
                (camel_case(&field.to_string()), reason)
            })
            .collect();
        violations.sort();

        match violations.into_iter().next() {
            Some((field, reason)) => ServiceError::InvalidField { field, reason },
            None => ServiceError::invalid("form", "invalid input"),
        }
    }
}

impl From<argon2::password_hash::Error> for ServiceError {
    fn from(error: argon2::password_hash::Error) -> Self {
        ServiceError::PasswordHash(error.to_string())
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(error: tokio::task::JoinError) -> Self {
        ServiceError::Runtime(format!("Blocking task failed: {}", error))
    }
}

/// Type alias for Result with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1, max = 10))]
        phone_number: String,
        #[validate(length(min = 1))]
        firstname: String,
    }

    #[test]
    fn test_validation_errors_name_the_first_field() {
        let probe = Probe {
            phone_number: "012345678901".to_string(),
            firstname: String::new(),
        };

        match ServiceError::from(probe.validate().unwrap_err()) {
            ServiceError::InvalidField { field, reason } => {
                assert_eq!(field, "firstname");
                assert!(reason.contains("length"));
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("phone_number"), "phoneNumber");
        assert_eq!(camel_case("firstname"), "firstname");
    }
}
