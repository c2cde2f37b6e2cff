//! # nb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the backup service.

use crate::body::{self, BodyEncoding, DecodedBody};
use crate::error::ApiError;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use chrono::{Local, NaiveDateTime};
use nb_core::error::AppError;
use nb_core::models::{BoardSave, Category};
use nb_core::traits::PruneOutcome;
use nb_core::BackupService;
use serde_json::json;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub service: BackupService,
}

type ApiResult = Result<HttpResponse, ApiError>;

/// Peer IP of the connection; forwarding headers are ignored.
fn origin_host(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn parse_board_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::ValidationError(format!("board id must be an integer: {raw:?}")))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn decode_request(req: &HttpRequest, payload: &[u8]) -> Result<DecodedBody, AppError> {
    let encoding = BodyEncoding::from_mime(req.content_type());
    if encoding == BodyEncoding::Unrecognized {
        log::warn!("unexpected request type {:?} on {}", req.content_type(), req.path());
    }
    let decoded = body::decode(encoding, payload)?;
    if let Some(full) = &decoded.full {
        let text = full.to_string();
        log::debug!("[data] {}...", text.chars().take(150).collect::<String>());
    }
    Ok(decoded)
}

/// PUT /board/{id}
pub async fn save_board(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    payload: web::Bytes,
) -> ApiResult {
    let board_id = parse_board_id(&path)?;
    let decoded = decode_request(&req, &payload)?;

    let report = data
        .service
        .save_board(BoardSave {
            board_id,
            full_document: decoded.full,
            board_document: decoded.board,
            origin_host: origin_host(&req),
            now: now(),
        })
        .await?;

    let failed = report
        .pruned
        .iter()
        .filter(|(_, outcome)| matches!(outcome, PruneOutcome::Failed(_)))
        .count();
    log::info!(
        "board {}: wrote {}, pruned {} ({} failed)",
        board_id,
        report.written.len(),
        report.pruned.len() - failed,
        failed
    );

    Ok(HttpResponse::Ok().json(json!({})))
}

/// PUT /stash-board/{id}
pub async fn stash_board(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    payload: web::Bytes,
) -> ApiResult {
    let board_id = parse_board_id(&path)?;
    let decoded = decode_request(&req, &payload)?;

    data.service
        .stash_board(board_id, decoded.board, &origin_host(&req))
        .await?;

    Ok(HttpResponse::Ok().json(json!({})))
}

/// GET /unstash-board
pub async fn unstash_board(data: web::Data<AppState>) -> ApiResult {
    match data.service.unstash_board().await? {
        Some(entry) => Ok(HttpResponse::Ok().json(entry.payload)),
        None => Ok(HttpResponse::NotFound().json(json!({}))),
    }
}

/// PUT /config
pub async fn save_config(
    data: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Bytes,
) -> ApiResult {
    let decoded = decode_request(&req, &payload)?;
    let category = Category::new("config")?;

    data.service
        .save_other(category, None, decoded.full, &origin_host(&req), now())
        .await?;

    Ok(HttpResponse::Ok().json(json!({})))
}

/// PUT /board without an id. Nullboard uses it to test the connection and wants a 204.
pub async fn connection_check() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

/// OPTIONS, and DELETEs that have nothing to delete.
pub async fn acknowledge() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// DELETE /board/{id}. Backups are never removed on request.
pub async fn ignore_board_delete(path: web::Path<String>) -> HttpResponse {
    log::info!("[delete] ignoring delete request for board {}", path.as_str());
    HttpResponse::Ok().finish()
}

/// DELETE /config
pub async fn ignore_config_delete() -> HttpResponse {
    log::info!("[other] ignoring delete request for config");
    HttpResponse::Ok().finish()
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().finish()
}
