//! HTTP request handlers

use super::types::*;
use super::AppState;
use crate::views::Reply;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/users/:user_id/command", post(send_command))
        .route("/api/users/:user_id/action", post(send_action))
        .route("/api/users/:user_id/reply", post(send_reply))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Inbound user input
// ============================================================

async fn send_command(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<Reply>, AppError> {
    let user_id = require("user id", &user_id)?;
    let command = require("command", &req.command)?;
    let reply = state
        .router
        .handle_command(user_id, command, req.first_name.as_deref())
        .await;
    Ok(Json(reply))
}

async fn send_action(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<Reply>, AppError> {
    let user_id = require("user id", &user_id)?;
    let action = require("action", &req.action)?;
    Ok(Json(state.router.handle_action(user_id, action).await))
}

async fn send_reply(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<TextReplyRequest>,
) -> Result<Json<Reply>, AppError> {
    let user_id = require("user id", &user_id)?;
    Ok(Json(state.router.handle_text_reply(user_id, &req.text).await))
}

async fn get_version() -> &'static str {
    concat!("fitness-tracker ", env!("CARGO_PKG_VERSION"))
}

fn require<'a>(what: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{what} must not be empty")));
    }
    Ok(value)
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
