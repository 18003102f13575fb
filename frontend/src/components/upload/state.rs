use common::jobs::JobStatus;
use gloo_timers::callback::Interval;
use yew::prelude::*;

pub struct UploadComponent {
    pub file_input_ref: NodeRef,
    pub selected_file: Option<web_sys::File>,
    pub uploading: bool,
    pub job_id: Option<String>,
    pub status: Option<JobStatus>,
    pub error: Option<String>,
    /// Dropping the interval stops polling.
    pub poller: Option<Interval>,
}

impl UploadComponent {
    pub fn new() -> Self {
        Self {
            file_input_ref: NodeRef::default(),
            selected_file: None,
            uploading: false,
            job_id: None,
            status: None,
            error: None,
            poller: None,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.poller.is_some()
    }
}
