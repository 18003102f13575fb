use common::jobs::{JobState, JobStatus};
use common::responses::UploadResponse;
use gloo_console::error;
use gloo_net::http::Request;
use gloo_timers::callback::Interval;
use web_sys::FormData;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::helpers::{error_detail, show_toast};

use super::messages::Msg;
use super::state::UploadComponent;

const POLL_INTERVAL_MS: u32 = 3000;

pub fn update(component: &mut UploadComponent, ctx: &Context<UploadComponent>, msg: Msg) -> bool {
    match msg {
        Msg::FileChosen(file) => {
            component.selected_file = file;
            component.error = None;
            true
        }
        Msg::Submit => {
            let Some(file) = component.selected_file.clone() else {
                show_toast("Choose a spreadsheet first.");
                return false;
            };
            let form = match FormData::new() {
                Ok(form) => form,
                Err(_) => return false,
            };
            if form.append_with_blob_and_filename("file", &file, &file.name()).is_err() {
                show_toast("Could not read the selected file.");
                return false;
            }

            component.uploading = true;
            component.error = None;
            component.status = None;
            component.job_id = None;
            component.poller = None;

            let link = ctx.link().clone();
            spawn_local(async move {
                let request = match Request::post("/api/upload").body(form) {
                    Ok(request) => request,
                    Err(e) => {
                        link.send_message(Msg::UploadFailed(e.to_string()));
                        return;
                    }
                };
                match request.send().await {
                    Ok(resp) if resp.ok() => match resp.json::<UploadResponse>().await {
                        Ok(accepted) => link.send_message(Msg::Uploaded(accepted)),
                        Err(e) => link.send_message(Msg::UploadFailed(e.to_string())),
                    },
                    Ok(resp) => link.send_message(Msg::UploadFailed(error_detail(resp).await)),
                    Err(e) => link.send_message(Msg::UploadFailed(e.to_string())),
                }
            });
            true
        }
        Msg::Uploaded(accepted) => {
            component.uploading = false;
            show_toast(&format!("Processing {} prospects.", accepted.total_rows));
            component.job_id = Some(accepted.job_id);

            let link = ctx.link().clone();
            component.poller = Some(Interval::new(POLL_INTERVAL_MS, move || link.send_message(Msg::Poll)));
            ctx.link().send_message(Msg::Poll);
            true
        }
        Msg::UploadFailed(message) => {
            component.uploading = false;
            show_toast(&message);
            component.error = Some(message);
            true
        }
        Msg::Poll => {
            if let Some(job_id) = component.job_id.clone() {
                let link = ctx.link().clone();
                spawn_local(async move {
                    match Request::get(&format!("/api/status/{}", job_id)).send().await {
                        Ok(resp) if resp.ok() => match resp.json::<JobStatus>().await {
                            Ok(status) => link.send_message(Msg::StatusLoaded(status)),
                            Err(e) => link.send_message(Msg::StatusFailed(e.to_string())),
                        },
                        Ok(resp) => link.send_message(Msg::StatusFailed(error_detail(resp).await)),
                        Err(e) => link.send_message(Msg::StatusFailed(e.to_string())),
                    }
                });
            }
            false
        }
        Msg::StatusLoaded(status) => {
            if status.status.is_finished() && component.is_tracking() {
                component.poller = None;
                match status.status {
                    JobState::Done => show_toast(&format!(
                        "Job finished: {} decks created, {} failed.",
                        status.completed, status.failed
                    )),
                    _ => show_toast("Job failed."),
                }
            }
            component.status = Some(status);
            true
        }
        Msg::StatusFailed(message) => {
            error!(format!("status poll failed: {}", message));
            component.poller = None;
            component.error = Some(message);
            true
        }
        Msg::Reset => {
            *component = UploadComponent::new();
            true
        }
    }
}
