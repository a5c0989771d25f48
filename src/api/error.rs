//! HTTP error mapping

use crate::errors::StockApiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Stock(#[from] StockApiError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Stock(err) => match err {
                StockApiError::DataUnavailable { .. }
                | StockApiError::RequestError(_)
                | StockApiError::JsonError(_) => StatusCode::BAD_GATEWAY,
                StockApiError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                // 上游数据缺少必需列，按服务端错误处理
                StockApiError::MissingColumn(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed with {}: {}", status, self);
        }

        let body = Json(json!({
            "detail": self.to_string(),
        }));

        (status, body).into_response()
    }
}
