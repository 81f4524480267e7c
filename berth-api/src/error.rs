use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use berth_core::{CoreError, ErrorKind};
use serde_json::json;

const GENERIC_MESSAGE: &str = "Internal Server Error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(CoreError),
    #[error(transparent)]
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Core(err) => err.kind(),
            AppError::Anyhow(_) => ErrorKind::Unexpected,
        }
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest | ErrorKind::CapacityExceeded | ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::InternalConfig | ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        let body = match self {
            AppError::Core(err) => {
                let mut body = json!({ "error": err.to_string(), "kind": kind });
                match &err {
                    CoreError::CapacityExceeded { available, .. } => {
                        body["availableSeats"] = json!(available);
                    }
                    CoreError::InternalConfig(_) | CoreError::Unexpected(_) => {
                        tracing::error!(%kind, "Internal Server Error: {}", err);
                        body["error"] = json!(GENERIC_MESSAGE);
                    }
                    _ => {}
                }
                body
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                json!({ "error": GENERIC_MESSAGE, "kind": kind })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Core(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Core(CoreError::invalid(rejection.body_text()))
    }
}
