use crate::error::AppError;
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder, ResponseError};

pub(crate) async fn process(job_id: web::Path<String>, state: web::Data<JobsState>) -> impl Responder {
    let job_id = job_id.into_inner();
    match state.snapshot(&job_id).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => AppError::NotFound(format!("Job '{}' not found.", job_id)).error_response(),
    }
}
