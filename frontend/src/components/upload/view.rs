use common::jobs::{JobStatus, RowResult, RowStage};
use web_sys::HtmlInputElement;
use yew::html::Scope;
use yew::prelude::*;

use crate::helpers::{stage_label, state_label};

use super::messages::Msg;
use super::state::UploadComponent;

pub fn view(component: &UploadComponent, ctx: &Context<UploadComponent>) -> Html {
    let link = ctx.link();

    html! {
        <section class="panel upload-panel">
            <h2>{"Upload prospects"}</h2>
            <p class="hint">
                {"Spreadsheet (.xlsx, .xls, .xlsm or .csv) with a Company Name column. \
                  Industry, Website, Contact Name and Contact Title are used when present."}
            </p>
            { build_form(component, link) }
            {
                if let Some(error) = &component.error {
                    html! { <p class="error">{ error }</p> }
                } else {
                    html! {}
                }
            }
            {
                match &component.status {
                    Some(status) => build_status(status, link),
                    None => match &component.job_id {
                        Some(job_id) => html! { <p>{ format!("Job {} queued…", job_id) }</p> },
                        None => html! {},
                    },
                }
            }
        </section>
    }
}

fn build_form(component: &UploadComponent, link: &Scope<UploadComponent>) -> Html {
    let onchange = link.callback(|e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        Msg::FileChosen(input.files().and_then(|files| files.get(0)))
    });
    let busy = component.uploading || component.is_tracking();

    html! {
        <div class="upload-form">
            <input
                type="file"
                accept=".xlsx,.xls,.xlsm,.csv"
                ref={component.file_input_ref.clone()}
                onchange={onchange}
                disabled={busy}
            />
            <button
                class="primary"
                onclick={link.callback(|_| Msg::Submit)}
                disabled={busy || component.selected_file.is_none()}
            >
                { if component.uploading { "Uploading…" } else { "Generate decks" } }
            </button>
        </div>
    }
}

fn build_status(status: &JobStatus, link: &Scope<UploadComponent>) -> Html {
    let finished = status.status.is_finished();

    html! {
        <div class="job-status">
            <div class="job-summary">
                <span>{ format!("Job {}: {}", status.job_id, state_label(status.status)) }</span>
                <span>{ format!("{} of {} complete, {} failed", status.completed, status.total_rows, status.failed) }</span>
            </div>
            <progress max="100" value={status.progress_percent.to_string()} />
            {
                if let Some(error) = &status.error {
                    html! { <p class="error">{ error }</p> }
                } else {
                    html! {}
                }
            }
            <table class="rows-table">
                <thead>
                    <tr>
                        <th>{"Row"}</th>
                        <th>{"Company"}</th>
                        <th>{"Stage"}</th>
                        <th>{"Deck"}</th>
                    </tr>
                </thead>
                <tbody>
                    { for status.rows.iter().map(build_row) }
                </tbody>
            </table>
            {
                if finished {
                    html! {
                        <div class="actions">
                            {
                                if status.output_file.is_some() {
                                    html! {
                                        <a class="button primary" href={format!("/api/download/{}", status.job_id)} download="">
                                            {"Download spreadsheet"}
                                        </a>
                                    }
                                } else {
                                    html! {}
                                }
                            }
                            <button onclick={link.callback(|_| Msg::Reset)}>{"New upload"}</button>
                        </div>
                    }
                } else {
                    html! {}
                }
            }
        </div>
    }
}

fn build_row(row: &RowResult) -> Html {
    let deck = match row.status {
        RowStage::Complete if !row.deck_url.is_empty() => html! {
            <>
                <a href={row.deck_url.clone()} target="_blank">{"Open"}</a>
                {
                    if row.pptx_url.is_empty() {
                        html! {}
                    } else {
                        html! { <>{" · "}<a href={row.pptx_url.clone()} target="_blank">{"PPTX"}</a></> }
                    }
                }
            </>
        },
        RowStage::Failed => html! { <span class="error" title={row.error.clone()}>{ row.error.clone() }</span> },
        _ => html! {},
    };

    html! {
        <tr class={classes!("row", row.status.as_str())}>
            <td>{ row.row_index }</td>
            <td>{ row.company_name.clone() }</td>
            <td>{ stage_label(row.status) }</td>
            <td>{ deck }</td>
        </tr>
    }
}
