use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use common::jobs::JobKind;

use crate::error::AppError;
use crate::job_controller::state::{JobUpdate, JobsState};

pub(crate) async fn process(
    req: HttpRequest,
    job_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> HttpResponse {
    match open_output(&job_id.into_inner(), &state).await {
        Ok(file) => file.into_response(&req),
        Err(e) => e.error_response(),
    }
}

async fn open_output(job_id: &str, state: &JobsState) -> Result<NamedFile, AppError> {
    let record = state
        .get(job_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job '{}' not found.", job_id)))?;

    let not_ready = || {
        AppError::BadRequest("Output file not ready yet. Job may still be processing.".to_string())
    };
    if record.kind == JobKind::Single {
        return Err(AppError::BadRequest(
            "Single-prospect jobs have no output spreadsheet.".to_string(),
        ));
    }
    let path = record.output_file.ok_or_else(not_ready)?;
    if !path.exists() {
        return Err(not_ready());
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{}.xlsx", job_id));
    let file = NamedFile::open_async(&path).await?;

    let _ = state
        .tx
        .send(JobUpdate::Downloaded {
            job_id: job_id.to_string(),
        })
        .await;

    Ok(file.set_content_disposition(ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(filename)],
    }))
}
