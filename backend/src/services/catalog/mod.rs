use actix_web::web::{get, post, scope, Data};
use actix_web::{HttpResponse, Responder, ResponseError, Scope};
use serde_json::json;

use crate::error::AppError;
use crate::pipeline::catalog::CatalogStore;

const API_PATH: &str = "/api/catalog";

/// Routes for inspecting and reloading the service catalog.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list))
        .route("/reload", post().to(reload))
}

async fn list(catalog: Data<CatalogStore>) -> impl Responder {
    match catalog.get().await {
        Ok(services) => HttpResponse::Ok().json(json!({
            "services": services.as_slice(),
            "count": services.len(),
        })),
        Err(e) => AppError::from(e).error_response(),
    }
}

async fn reload(catalog: Data<CatalogStore>) -> impl Responder {
    match catalog.reload().await {
        Ok(services) => HttpResponse::Ok().json(json!({
            "services": services.as_slice(),
            "count": services.len(),
        })),
        Err(e) => AppError::from(e).error_response(),
    }
}
