//! Previously generated decks, read from the SQLite history.
//!
//! - `GET /api/history?limit=50&offset=0`: newest first.
//! - `GET /api/history/{id}`: one deck with its stored research, pitch and services.
//!
//! Both answer 503 when the server runs without a database.

use actix_web::web::{get, scope, Data, Path, Query};
use actix_web::{HttpResponse, Responder, ResponseError, Scope};
use common::responses::HistoryPage;
use serde::Deserialize;

use crate::error::AppError;
use crate::history::{DeckDetail, HistoryStore};

const API_PATH: &str = "/api/history";
const MAX_PAGE: u32 = 500;

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list))
        .route("/{deck_id}", get().to(detail))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_limit() -> u32 {
    50
}

fn store(history: &Option<HistoryStore>) -> Result<HistoryStore, AppError> {
    history
        .clone()
        .ok_or_else(|| AppError::Unavailable("Database not configured".to_string()))
}

async fn list(query: Query<PageQuery>, history: Data<Option<HistoryStore>>) -> impl Responder {
    match list_decks(query.into_inner(), &history).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => e.error_response(),
    }
}

async fn list_decks(query: PageQuery, history: &Option<HistoryStore>) -> Result<HistoryPage, AppError> {
    let store = store(history)?;
    let limit = query.limit.min(MAX_PAGE);
    let offset = query.offset;
    let (total, decks) = tokio::task::spawn_blocking(move || store.list(limit, offset)).await??;
    Ok(HistoryPage {
        total,
        limit,
        offset,
        decks,
    })
}

async fn detail(deck_id: Path<i64>, history: Data<Option<HistoryStore>>) -> impl Responder {
    match get_deck(deck_id.into_inner(), &history).await {
        Ok(deck) => HttpResponse::Ok().json(deck),
        Err(e) => e.error_response(),
    }
}

async fn get_deck(deck_id: i64, history: &Option<HistoryStore>) -> Result<DeckDetail, AppError> {
    let store = store(history)?;
    tokio::task::spawn_blocking(move || store.get(deck_id))
        .await??
        .ok_or_else(|| AppError::NotFound("Deck not found".to_string()))
}
