//! Batch job progress and the finished spreadsheet.
//!
//! - `GET /api/status/{job_id}`: the job's `JobStatus`, including every row.
//! - `GET /api/download/{job_id}`: the output spreadsheet once the job is done.
//!   The download starts the job's grace period, after which the janitor
//!   forgets the job and deletes its files.

use actix_web::web::{get, scope};
use actix_web::Scope;

mod download;
mod get_status;

const API_PATH: &str = "/api/status";
const DOWNLOAD_PATH: &str = "/api/download";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("/{job_id}", get().to(get_status::process))
}

pub fn configure_download_routes() -> Scope {
    scope(DOWNLOAD_PATH).route("/{job_id}", get().to(download::process))
}
