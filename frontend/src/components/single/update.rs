use common::jobs::{JobState, SingleJobStatus};
use common::responses::SingleJobAccepted;
use gloo_console::error;
use gloo_net::http::Request;
use gloo_timers::callback::Interval;
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::helpers::{error_detail, show_toast};

use super::messages::Msg;
use super::state::SingleProspectComponent;

const POLL_INTERVAL_MS: u32 = 3000;

pub fn update(
    component: &mut SingleProspectComponent,
    ctx: &Context<SingleProspectComponent>,
    msg: Msg,
) -> bool {
    match msg {
        Msg::SetField(field, value) => {
            component.set_field(field, value);
            true
        }
        Msg::Submit => {
            if !component.is_complete() {
                show_toast("Client name, company, and role are required.");
                return false;
            }
            component.submitting = true;
            component.error = None;
            component.status = None;

            let form = component.form.clone();
            let link = ctx.link().clone();
            spawn_local(async move {
                let request = match Request::post("/api/single").json(&form) {
                    Ok(request) => request,
                    Err(e) => {
                        link.send_message(Msg::SubmitFailed(e.to_string()));
                        return;
                    }
                };
                match request.send().await {
                    Ok(resp) if resp.ok() => match resp.json::<SingleJobAccepted>().await {
                        Ok(accepted) => link.send_message(Msg::Accepted(accepted)),
                        Err(e) => link.send_message(Msg::SubmitFailed(e.to_string())),
                    },
                    Ok(resp) => link.send_message(Msg::SubmitFailed(error_detail(resp).await)),
                    Err(e) => link.send_message(Msg::SubmitFailed(e.to_string())),
                }
            });
            true
        }
        Msg::Accepted(accepted) => {
            component.submitting = false;
            show_toast(&format!("Building a deck for {}.", accepted.company_name));
            component.job_id = Some(accepted.job_id);

            let link = ctx.link().clone();
            component.poller = Some(Interval::new(POLL_INTERVAL_MS, move || link.send_message(Msg::Poll)));
            ctx.link().send_message(Msg::Poll);
            true
        }
        Msg::SubmitFailed(message) => {
            component.submitting = false;
            show_toast(&message);
            component.error = Some(message);
            true
        }
        Msg::Poll => {
            if let Some(job_id) = component.job_id.clone() {
                let link = ctx.link().clone();
                spawn_local(async move {
                    match Request::get(&format!("/api/single/status/{}", job_id)).send().await {
                        Ok(resp) if resp.ok() => match resp.json::<SingleJobStatus>().await {
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
            if status.status.is_finished() && component.poller.is_some() {
                component.poller = None;
                match status.status {
                    JobState::Done => show_toast("Deck ready."),
                    _ => show_toast("Deck generation failed."),
                }
            }
            component.status = Some(status);
            true
        }
        Msg::StatusFailed(message) => {
            error!(format!("single status poll failed: {}", message));
            component.poller = None;
            component.error = Some(message);
            true
        }
        Msg::Reset => {
            *component = SingleProspectComponent::new();
            true
        }
    }
}
