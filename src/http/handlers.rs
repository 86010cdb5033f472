//! Endpoint handlers.
//!
//! Input shape is checked here, before anything reaches the chain.

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::blockchain::types::Article;
use crate::http::request::{non_empty_str, parse_article_id, parse_upvote};
use crate::http::response::{ApiError, TxResponse, OUT_OF_BOUNDS_MESSAGE};
use crate::http::server::AppState;

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    match body {
        Ok(Json(value)) if value.is_object() => Ok(value),
        Ok(_) => Err(ApiError::BadRequest("Request body must be a JSON object".to_string())),
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    }
}

/// `POST /submit-article`
pub async fn submit_article(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TxResponse>, ApiError> {
    let body = json_body(body)?;

    let (Some(title), Some(article_hash)) = (
        non_empty_str(&body, "title"),
        non_empty_str(&body, "article_hash"),
    ) else {
        return Err(ApiError::BadRequest("Missing title or article_hash".to_string()));
    };

    let tx = state.ledger.submit_article(title, article_hash).await?;
    Ok(Json(tx.into()))
}

/// `POST /vote-article`
pub async fn vote_article(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<TxResponse>, ApiError> {
    let invalid = || ApiError::BadRequest("Invalid input data".to_string());
    let body = json_body(body).map_err(|_| invalid())?;

    let article_id = parse_article_id(body.get("article_id")).ok_or_else(invalid)?;
    let upvote = parse_upvote(body.get("upvote")).ok_or_else(invalid)?;

    let tx = state.ledger.vote_article(article_id, upvote).await?;
    Ok(Json(tx.into()))
}

/// `GET /get-article/{article_id}`
pub async fn get_article(
    State(state): State<AppState>,
    article_id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Article>, ApiError> {
    // A non-integer segment does not name an article
    let Path(article_id) =
        article_id.map_err(|_| ApiError::NotFound(OUT_OF_BOUNDS_MESSAGE.to_string()))?;

    let article = state.ledger.get_article(article_id).await?;
    Ok(Json(article))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    if state.ledger.is_healthy().await {
        (
            StatusCode::OK,
            Json(json!({ "status": "ok", "chain_reachable": true })),
        )
            .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "chain_reachable": false })),
        )
            .into_response()
    }
}

/// Unknown route.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// Known route, wrong method.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
        .into_response()
}
