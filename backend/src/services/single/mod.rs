//! One prospect entered by hand, processed as a one-row job.
//!
//! - `POST /api/single`: JSON `SingleProspect`; `client_name`, `company` and
//!   `role` are required.
//! - `GET /api/single/status/{job_id}`: `SingleJobStatus`, with the progress
//!   taken from the row's current stage.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod create;
mod get_status;

const API_PATH: &str = "/api/single";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(create::process))
        .route("/status/{job_id}", get().to(get_status::process))
}
