use thiserror::Error;

use crate::domain::errors::{DomainError, RemoteError, ValidationError};

pub const GENERIC_REMOTE_MESSAGE: &str = "The marketplace could not be reached, please try again";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Session expired or unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Remote(RemoteError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text fit for showing to the person at the terminal.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound => "Not found".to_string(),
            AppError::Unauthorized => "Your session has expired, please sign in again".to_string(),
            AppError::Validation(e) => e.to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Remote(e) => e
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_REMOTE_MESSAGE.to_string()),
            AppError::Config(msg) => format!("Configuration error: {}", msg),
            AppError::Internal(_) => "Something went wrong".to_string(),
        }
    }
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Unauthorized => AppError::Unauthorized,
            e if e.is_not_found() => AppError::NotFound,
            e => AppError::Remote(e),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::InvalidInput(msg) => AppError::InvalidInput(msg),
            DomainError::Validation(e) => AppError::Validation(e),
            DomainError::Remote(e) => e.into(),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        assert_eq!(AppError::NotFound.to_string(), "Not found");
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }

    #[test]
    fn internal_details_stay_out_of_user_message() {
        let err = AppError::Internal("disk I/O error".to_string());
        assert_eq!(err.user_message(), "Something went wrong");
    }

    #[test]
    fn domain_not_found_maps_to_app_not_found() {
        let app_err: AppError = DomainError::NotFound.into();
        assert!(matches!(app_err, AppError::NotFound));
    }

    #[test]
    fn domain_invalid_input_keeps_message() {
        let app_err: AppError = DomainError::InvalidInput("bad value".to_string()).into();
        assert_eq!(app_err.user_message(), "bad value");
    }

    #[test]
    fn unauthorized_through_domain_maps_to_app_unauthorized() {
        let app_err: AppError = DomainError::Remote(RemoteError::Unauthorized).into();
        assert!(matches!(app_err, AppError::Unauthorized));
    }

    #[test]
    fn remote_404_maps_to_not_found() {
        let app_err: AppError = RemoteError::Status {
            status: 404,
            message: Some("Produit introuvable".to_string()),
        }
        .into();
        assert!(matches!(app_err, AppError::NotFound));
    }

    #[test]
    fn server_message_is_shown_to_user() {
        let app_err: AppError = RemoteError::Status {
            status: 409,
            message: Some("Stock insuffisant".to_string()),
        }
        .into();
        assert_eq!(app_err.user_message(), "Stock insuffisant");

        let app_err: AppError = RemoteError::Transport("refused".to_string()).into();
        assert_eq!(app_err.user_message(), GENERIC_REMOTE_MESSAGE);
    }

    #[test]
    fn validation_message_is_shown_as_is() {
        let app_err: AppError =
            DomainError::Validation(ValidationError::MissingAddressField("city")).into();
        assert_eq!(
            app_err.user_message(),
            "Delivery address field 'city' is required"
        );
    }
}
