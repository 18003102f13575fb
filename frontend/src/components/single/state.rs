use common::jobs::SingleJobStatus;
use common::requests::SingleProspect;
use gloo_timers::callback::Interval;

use super::messages::Field;

pub struct SingleProspectComponent {
    pub form: SingleProspect,
    pub submitting: bool,
    pub job_id: Option<String>,
    pub status: Option<SingleJobStatus>,
    pub error: Option<String>,
    pub poller: Option<Interval>,
}

impl SingleProspectComponent {
    pub fn new() -> Self {
        Self {
            form: SingleProspect::default(),
            submitting: false,
            job_id: None,
            status: None,
            error: None,
            poller: None,
        }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::ClientName => &self.form.client_name,
            Field::Company => &self.form.company,
            Field::Role => &self.form.role,
            Field::LinkedIn => &self.form.linkedin_url,
            Field::Email => &self.form.email,
            Field::Phone => &self.form.phone,
            Field::Notes => &self.form.notes,
        }
    }

    pub fn set_field(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::ClientName => &mut self.form.client_name,
            Field::Company => &mut self.form.company,
            Field::Role => &mut self.form.role,
            Field::LinkedIn => &mut self.form.linkedin_url,
            Field::Email => &mut self.form.email,
            Field::Phone => &mut self.form.phone,
            Field::Notes => &mut self.form.notes,
        };
        *slot = value;
    }

    /// Name, company and role are required by the server as well.
    pub fn is_complete(&self) -> bool {
        [&self.form.client_name, &self.form.company, &self.form.role]
            .iter()
            .all(|v| !v.trim().is_empty())
    }

    pub fn is_busy(&self) -> bool {
        self.submitting || self.poller.is_some()
    }
}
