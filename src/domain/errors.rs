use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Problems caught locally, before anything is sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Delivery address field '{0}' is required")]
    MissingAddressField(&'static str),
    #[error("A phone number is required for mobile money payments")]
    MissingPhoneNumber,
    #[error("The cart is empty")]
    EmptyCart,
    #[error("Cannot {action} while the payment is at step '{step}'")]
    InvalidStep {
        action: &'static str,
        step: &'static str,
    },
}

/// Failure of a call to the marketplace backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// 401 from the backend. The stored token has already been discarded.
    #[error("Session expired or unauthorized")]
    Unauthorized,
    #[error("Backend returned status {status}")]
    Status { status: u16, message: Option<String> },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl RemoteError {
    /// The `message` the server put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            RemoteError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::Status { status: 404, .. })
    }
}
