//! Handler errors and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::response::json_error;
use crate::instances::{PoolError, StoreError};
use crate::vms::VmsError;

/// Errors a handler may return instead of a response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Vms(#[from] VmsError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::Pool(PoolError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Pool(PoolError::Vms(e)) | ApiError::Vms(e) => vms_status(e),
            ApiError::Pool(PoolError::Store(_)) | ApiError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn vms_status(error: &VmsError) -> StatusCode {
    match error {
        VmsError::ChannelNotFound => StatusCode::NOT_FOUND,
        VmsError::Connection(_) => StatusCode::BAD_GATEWAY,
        VmsError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.to_string())
    }
}
