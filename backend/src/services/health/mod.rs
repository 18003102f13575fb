use actix_web::web::{get, scope, Data};
use actix_web::{HttpResponse, Responder, Scope};
use serde_json::json;

use crate::config::Settings;

const API_PATH: &str = "/api/health";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

async fn process(settings: Data<Settings>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": settings.app_title,
    }))
}
