use actix_web::web::{get, scope, Data};
use actix_web::{HttpResponse, Responder, ResponseError, Scope};
use common::responses::ThemeList;

use crate::error::AppError;
use crate::pipeline::DeckBuilder;

const API_PATH: &str = "/api/themes";

/// `GET /api/themes` lists the deck API's themes so a `GAMMA_THEME_ID` can be picked.
pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

async fn process(deck_builder: Data<dyn DeckBuilder>) -> impl Responder {
    match deck_builder.list_themes().await {
        Ok(themes) => HttpResponse::Ok().json(ThemeList::new(themes)),
        Err(e) => AppError::BadGateway(format!("Failed to fetch themes from Gamma: {}", e)).error_response(),
    }
}
