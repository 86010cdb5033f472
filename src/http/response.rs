//! Response shaping.
//!
//! Every response body is JSON. Failures carry `{"error": message}`:
//! - validation problems → 400
//! - out-of-range article index or unknown route → 404
//! - any other chain failure → 500 with the error text
//! - request outlived the HTTP timeout → 408

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::blockchain::types::{BlockchainError, SubmittedTx};

pub const OUT_OF_BOUNDS_MESSAGE: &str = "Article ID out of bounds";

/// Body returned by the two submitting endpoints.
#[derive(Debug, Serialize)]
pub struct TxResponse {
    pub tx_hash: String,
}

impl From<SubmittedTx> for TxResponse {
    fn from(tx: SubmittedTx) -> Self {
        Self {
            tx_hash: tx.tx_hash_hex(),
        }
    }
}

/// Gateway error, rendered as a JSON error body.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Chain(BlockchainError),
    Timeout,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Chain(BlockchainError::ArticleOutOfBounds { .. }) => StatusCode::NOT_FOUND,
            ApiError::Chain(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Chain(BlockchainError::ArticleOutOfBounds { .. }) => {
                OUT_OF_BOUNDS_MESSAGE.to_string()
            }
            ApiError::Chain(e) => e.to_string(),
            ApiError::Timeout => "Request timed out".to_string(),
        }
    }
}

impl From<BlockchainError> for ApiError {
    fn from(e: BlockchainError) -> Self {
        ApiError::Chain(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Chain(BlockchainError::ArticleOutOfBounds { index: 5, total: 5 }).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Chain(BlockchainError::Rpc("nonce too low".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Timeout.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_chain_error_message_passes_through() {
        let err = ApiError::Chain(BlockchainError::Rpc("nonce too low".into()));
        assert_eq!(err.message(), "RPC error: nonce too low");

        let err = ApiError::Chain(BlockchainError::ArticleOutOfBounds { index: 9, total: 2 });
        assert_eq!(err.message(), OUT_OF_BOUNDS_MESSAGE);
    }
}
