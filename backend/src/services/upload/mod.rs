//! Spreadsheet upload: the entry point of a batch job.
//!
//! `POST /api/upload` takes a multipart form with a `file` field holding an
//! `.xlsx`, `.xls`, `.xlsm` or `.csv` prospect list. The file is saved under
//! the upload directory as `{job_id}_{name}`, parsed, and every prospect row is
//! queued for the worker pool. Progress is then polled through
//! `GET /api/status/{job_id}`.
//!
//! The upload is rejected with 400 (and the saved file removed) when the
//! extension is wrong, the company column is missing, no row has a company
//! name, or there are more rows than `MAX_ROWS_PER_UPLOAD`.

use actix_web::web::{post, scope};
use actix_web::Scope;

mod receive;

const API_PATH: &str = "/api/upload";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", post().to(receive::process))
}
