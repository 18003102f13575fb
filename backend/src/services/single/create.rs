use actix_web::web::{Data, Json};
use actix_web::{HttpResponse, Responder, ResponseError};
use common::jobs::JobState;
use common::model::prospect::ProspectRow;
use common::requests::SingleProspect;
use common::responses::SingleJobAccepted;

use crate::error::AppError;
use crate::job_controller::queue::{RowTask, WorkQueue};
use crate::job_controller::state::{JobRecord, JobsState};
use crate::services::new_job_id;

pub(crate) async fn process(
    body: Json<SingleProspect>,
    jobs: Data<JobsState>,
    queue: Data<WorkQueue>,
) -> impl Responder {
    match schedule_single(body.into_inner(), &jobs, &queue).await {
        Ok(accepted) => HttpResponse::Ok().json(accepted),
        Err(e) => e.error_response(),
    }
}

async fn schedule_single(
    request: SingleProspect,
    jobs: &JobsState,
    queue: &WorkQueue,
) -> Result<SingleJobAccepted, AppError> {
    let required = [&request.client_name, &request.company, &request.role];
    if required.iter().any(|v| v.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "Client name, company, and role are required.".to_string(),
        ));
    }

    let job_id = new_job_id();
    let prospect = ProspectRow::from_single(&request);
    jobs.insert(JobRecord::new_single(job_id.clone(), &prospect)).await;

    let company_name = prospect.company_name.clone();
    if let Err(e) = queue.push(RowTask {
        job_id: job_id.clone(),
        prospect,
    }) {
        jobs.remove(&job_id).await;
        return Err(AppError::Unavailable(e));
    }

    Ok(SingleJobAccepted {
        message: format!(
            "Processing pitch deck. Track progress at /api/single/status/{}",
            job_id
        ),
        job_id,
        company_name,
        status: JobState::Pending,
    })
}
