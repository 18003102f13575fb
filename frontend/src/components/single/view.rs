use common::jobs::{JobState, RowStage, SingleJobStatus};
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::html::Scope;
use yew::prelude::*;

use crate::helpers::stage_label;

use super::messages::{Field, Msg};
use super::state::SingleProspectComponent;

const STAGES: [RowStage; 4] = [
    RowStage::Researching,
    RowStage::GeneratingContent,
    RowStage::CreatingDeck,
    RowStage::Complete,
];

pub fn view(component: &SingleProspectComponent, ctx: &Context<SingleProspectComponent>) -> Html {
    let link = ctx.link();

    html! {
        <section class="panel single-panel">
            <h2>{"Single prospect"}</h2>
            { build_form(component, link) }
            {
                if let Some(error) = &component.error {
                    html! { <p class="error">{ error }</p> }
                } else {
                    html! {}
                }
            }
            {
                if let Some(status) = &component.status {
                    build_progress(status, link)
                } else {
                    html! {}
                }
            }
        </section>
    }
}

fn text_input(
    component: &SingleProspectComponent,
    link: &Scope<SingleProspectComponent>,
    field: Field,
    label: &'static str,
    required: bool,
) -> Html {
    let oninput = link.callback(move |e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        Msg::SetField(field, input.value())
    });

    html! {
        <label class="field">
            <span>{ label }{ if required { " *" } else { "" } }</span>
            <input
                type="text"
                value={component.field(field).to_string()}
                oninput={oninput}
                disabled={component.is_busy()}
            />
        </label>
    }
}

fn build_form(component: &SingleProspectComponent, link: &Scope<SingleProspectComponent>) -> Html {
    let onsubmit = link.callback(|e: SubmitEvent| {
        e.prevent_default();
        Msg::Submit
    });
    let notes_input = link.callback(|e: InputEvent| {
        let input: HtmlTextAreaElement = e.target_unchecked_into();
        Msg::SetField(Field::Notes, input.value())
    });

    html! {
        <form class="single-form" onsubmit={onsubmit}>
            { text_input(component, link, Field::ClientName, "Client name", true) }
            { text_input(component, link, Field::Company, "Company", true) }
            { text_input(component, link, Field::Role, "Role", true) }
            { text_input(component, link, Field::LinkedIn, "LinkedIn URL", false) }
            { text_input(component, link, Field::Email, "Email", false) }
            { text_input(component, link, Field::Phone, "Phone", false) }
            <label class="field">
                <span>{"Notes"}</span>
                <textarea
                    rows="3"
                    value={component.form.notes.clone()}
                    oninput={notes_input}
                    disabled={component.is_busy()}
                />
            </label>
            <button class="primary" type="submit" disabled={component.is_busy() || !component.is_complete()}>
                { if component.submitting { "Submitting…" } else { "Generate deck" } }
            </button>
        </form>
    }
}

fn build_progress(status: &SingleJobStatus, link: &Scope<SingleProspectComponent>) -> Html {
    let reached = |stage: RowStage| {
        let current = STAGES.iter().position(|s| *s == status.current_stage);
        let target = STAGES.iter().position(|s| *s == stage);
        match (current, target) {
            (Some(current), Some(target)) => target <= current,
            _ => false,
        }
    };

    html! {
        <div class="single-status">
            <p>{ format!("{}: {}", status.company_name, stage_label(status.current_stage)) }</p>
            <progress max="100" value={status.progress_percent.to_string()} />
            <ol class="stages">
                {
                    for STAGES.iter().map(|stage| html! {
                        <li class={classes!(reached(*stage).then_some("reached"))}>{ stage_label(*stage) }</li>
                    })
                }
            </ol>
            {
                match status.status {
                    JobState::Done => html! {
                        <div class="actions">
                            <a class="button primary" href={status.deck_url.clone()} target="_blank">{"Open deck"}</a>
                            {
                                if status.pptx_url.is_empty() {
                                    html! {}
                                } else {
                                    html! { <a class="button" href={status.pptx_url.clone()} target="_blank">{"Download PPTX"}</a> }
                                }
                            }
                            <button onclick={link.callback(|_| Msg::Reset)}>{"New prospect"}</button>
                        </div>
                    },
                    JobState::Failed => html! {
                        <div class="actions">
                            <p class="error">{ status.error.clone() }</p>
                            <button onclick={link.callback(|_| Msg::Reset)}>{"Try again"}</button>
                        </div>
                    },
                    _ => html! {},
                }
            }
        </div>
    }
}
