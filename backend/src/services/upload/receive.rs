use actix_multipart::Multipart;
use actix_web::web::Data;
use actix_web::{HttpResponse, Responder, ResponseError};
use common::jobs::JobState;
use common::responses::UploadResponse;
use futures_util::StreamExt;
use log::info;
use regex::Regex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::AppError;
use crate::job_controller::queue::{RowTask, WorkQueue};
use crate::job_controller::state::{JobRecord, JobsState};
use crate::services::new_job_id;
use crate::spreadsheet::{is_supported_file_name, parse_prospects};

pub(crate) async fn process(
    payload: Multipart,
    settings: Data<Settings>,
    jobs: Data<JobsState>,
    queue: Data<WorkQueue>,
) -> impl Responder {
    match upload_spreadsheet(payload, &settings, &jobs, &queue).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) => e.error_response(),
    }
}

/// Keeps letters, digits, `.`, `-` and `_`; anything else (path separators included) becomes `_`.
fn sanitize_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    match Regex::new(r"[^A-Za-z0-9._-]") {
        Ok(re) => re.replace_all(base, "_").into_owned(),
        Err(_) => base.to_string(),
    }
}

fn discard(path: &Path) {
    let _ = std::fs::remove_file(path);
}

async fn save_file_field(mut payload: Multipart, upload_dir: &Path, job_id: &str) -> Result<PathBuf, AppError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_default();
        if !is_supported_file_name(&filename) {
            return Err(AppError::BadRequest(
                "Please upload a spreadsheet (.xlsx, .xls, .xlsm or .csv)".to_string(),
            ));
        }

        let path = upload_dir.join(format!("{}_{}", job_id, sanitize_file_name(&filename)));
        let mut writer = BufWriter::new(File::create(&path)?);
        while let Some(chunk) = field.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(writer);
                    discard(&path);
                    return Err(AppError::BadRequest(format!("Upload interrupted: {}", e)));
                }
            };
            writer.write_all(&chunk)?;
        }
        writer.flush()?;
        return Ok(path);
    }

    Err(AppError::BadRequest("Missing 'file' field".to_string()))
}

async fn upload_spreadsheet(
    payload: Multipart,
    settings: &Settings,
    jobs: &JobsState,
    queue: &WorkQueue,
) -> Result<UploadResponse, AppError> {
    std::fs::create_dir_all(&settings.upload_dir)?;
    let job_id = new_job_id();
    let saved_path = save_file_field(payload, &settings.upload_dir, &job_id).await?;

    let parse_path = saved_path.clone();
    let prospects = match tokio::task::spawn_blocking(move || parse_prospects(&parse_path)).await? {
        Ok(prospects) => prospects,
        Err(e) => {
            discard(&saved_path);
            return Err(AppError::BadRequest(e.to_string()));
        }
    };

    if prospects.len() > settings.max_rows_per_upload {
        discard(&saved_path);
        return Err(AppError::BadRequest(format!(
            "Too many rows ({}). Maximum is {}.",
            prospects.len(),
            settings.max_rows_per_upload
        )));
    }
    if prospects.is_empty() {
        discard(&saved_path);
        return Err(AppError::BadRequest(
            "No valid prospect rows found in the spreadsheet.".to_string(),
        ));
    }

    let total_rows = prospects.len() as u32;
    jobs.insert(JobRecord::new_batch(job_id.clone(), saved_path.clone(), &prospects))
        .await;

    for prospect in prospects {
        let pushed = queue.push(RowTask {
            job_id: job_id.clone(),
            prospect,
        });
        if let Err(e) = pushed {
            jobs.remove(&job_id).await;
            discard(&saved_path);
            return Err(AppError::Unavailable(e));
        }
    }
    info!("Job {}: queued {} rows", job_id, total_rows);

    Ok(UploadResponse {
        message: format!(
            "Processing {} prospects. Track progress at /api/status/{}",
            total_rows, job_id
        ),
        job_id,
        total_rows,
        status: JobState::Pending,
    })
}
