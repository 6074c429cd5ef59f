//! Error types for the marketplace client.
//!
//! # Design
//! Three families share one enum so every page can funnel failures into a
//! single toast: client-side validation (`Validation`, `NotSignedIn`,
//! `InvalidTransition`) caught before any request is built, transport
//! failures reported by the host, and non-2xx responses. `NotFound` gets a
//! dedicated variant because callers branch on it (profile bootstrap creates
//! the user record on 404).

use crate::validate::ValidationErrors;

/// Message shown when the server gave no usable `message` field.
pub const GENERIC_FAILURE: &str = "Something went wrong";

/// Errors returned by the client, the API facade, and the session context.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Input rejected before any network call.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// An ownership-scoped operation was attempted without a session.
    #[error("not signed in")]
    NotSignedIn,

    /// The interest is already resolved and cannot change status again.
    #[error("interest is already {from} and cannot become {to}")]
    InvalidTransition { from: String, to: String },

    /// The server returned 404.
    #[error("not found: {message}")]
    NotFound { message: String },

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The host could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Human-readable text suitable for an error toast.
    ///
    /// Server-provided messages are passed through verbatim; everything the
    /// user cannot act on collapses to [`GENERIC_FAILURE`].
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(errors) => errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ApiError::NotSignedIn => "Please log in to continue".to_string(),
            ApiError::InvalidTransition { from, .. } => {
                format!("This interest has already been {from}")
            }
            ApiError::NotFound { message } | ApiError::Http { message, .. } => message.clone(),
            ApiError::Transport(_) | ApiError::Serialization(_) | ApiError::Deserialization(_) => {
                GENERIC_FAILURE.to_string()
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ValidationError;

    #[test]
    fn http_error_surfaces_server_message() {
        let err = ApiError::Http {
            status: 403,
            message: "You can only edit your own crops".to_string(),
        };
        assert_eq!(err.user_message(), "You can only edit your own crops");
    }

    #[test]
    fn transport_error_falls_back_to_generic() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert_eq!(err.to_string(), "transport failed: connection refused");
    }

    #[test]
    fn validation_error_uses_first_field_message() {
        let mut errors = ValidationErrors::default();
        errors.push(ValidationError::new("name", "Crop name is required"));
        errors.push(ValidationError::new("location", "Location is required"));
        let err = ApiError::from(errors);
        assert_eq!(err.user_message(), "Crop name is required");
    }

    #[test]
    fn not_found_is_detectable() {
        let err = ApiError::NotFound {
            message: "User not found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!ApiError::NotSignedIn.is_not_found());
    }
}
