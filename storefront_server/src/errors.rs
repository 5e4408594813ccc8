use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use storefront_engine::{AuthApiError, OrderFlowError, StorageError, StoreApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Could not create access token. {0}")]
    CouldNotSerializeAccessToken(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UnprocessableRequest(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingToken => StatusCode::UNAUTHORIZED,
                AuthError::ValidationError(_) => StatusCode::UNAUTHORIZED,
                AuthError::PoorlyFormattedToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::UnprocessableRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Backend details stay in the log; clients get a generic message.
        let message = if status.is_server_error() {
            error!("💥️ {self}");
            "An internal error occurred. Please try again later.".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": message }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Invalid username or password.")]
    InvalidCredentials,
}

fn storage_error(e: StorageError) -> ServerError {
    match e {
        StorageError::NotFound(what) => ServerError::NoRecordFound(format!("{what} does not exist")),
        StorageError::AlreadyExists(what) => ServerError::Conflict(format!("{what} already exists")),
        StorageError::InvalidData(msg) => ServerError::ValidationError(msg),
        StorageError::InsufficientStock { .. } => ServerError::Conflict(e.to_string()),
        e => ServerError::BackendError(e.to_string()),
    }
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::DatabaseError(e) => storage_error(e),
            AuthApiError::ValidationError(msg) => Self::ValidationError(msg),
            AuthApiError::UsernameTaken(_) | AuthApiError::EmailTaken(_) => Self::Conflict(e.to_string()),
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::RoleNotAllowed(_) => Self::InsufficientPermissions(e.to_string()),
            AuthApiError::UserNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::Forbidden(msg) => Self::InsufficientPermissions(msg),
            AuthApiError::PasswordHashError(msg) => Self::BackendError(msg),
        }
    }
}

impl From<StoreApiError> for ServerError {
    fn from(e: StoreApiError) -> Self {
        match e {
            StoreApiError::DatabaseError(e) => storage_error(e),
            StoreApiError::NotFound(_) => Self::NoRecordFound(e.to_string()),
            StoreApiError::Forbidden(msg) => Self::InsufficientPermissions(msg),
            StoreApiError::ValidationError(msg) => Self::ValidationError(msg),
            StoreApiError::AlreadyExists(_) => Self::Conflict(e.to_string()),
            StoreApiError::InsufficientStock { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(e) => storage_error(e),
            OrderFlowError::EmptyCart => Self::ValidationError(e.to_string()),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::Forbidden(msg) => Self::InsufficientPermissions(msg),
            OrderFlowError::ValidationError(msg) => Self::ValidationError(msg),
            OrderFlowError::ProductUnavailable(_) | OrderFlowError::InsufficientStock { .. } => {
                Self::Conflict(e.to_string())
            },
            OrderFlowError::InvalidTransition { .. } | OrderFlowError::NotCancellable(_) => {
                Self::UnprocessableRequest(e.to_string())
            },
        }
    }
}
