use api_types::ErrorBody;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::{EngineError, IdentityError, Rejection};

pub use server::{Caller, ServerState, router, run_with_listener};

mod entry;
mod server;
mod user;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthenticated(IdentityError::Issue(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Rejected(_)
        | EngineError::ExistingKey(_)
        | EngineError::InvalidCredentials
        | EngineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        EngineError::Database(_) | EngineError::Password(_) | EngineError::Corrupted(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn body_for_engine_error(status: StatusCode, err: EngineError) -> ErrorBody {
    if status.is_server_error() {
        tracing::error!("request failed: {err}");
        return ErrorBody {
            message: "internal server error".to_string(),
            error: Some(err.to_string()),
        };
    }
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("unauthenticated request: {err}");
    } else {
        tracing::warn!("request rejected: {err}");
    }

    ErrorBody {
        message: err.to_string(),
        error: None,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                (status, body_for_engine_error(status, err))
            }
            ServerError::Generic(message) => {
                tracing::warn!("bad request: {message}");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        message,
                        error: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<Rejection> for ServerError {
    fn from(value: Rejection) -> Self {
        Self::Engine(value.into())
    }
}

impl From<IdentityError> for ServerError {
    fn from(value: IdentityError) -> Self {
        Self::Engine(value.into())
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

/// `Json` body extractor whose failures answer with an [`ErrorBody`] like
/// every other error, instead of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
