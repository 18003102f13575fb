use common::jobs::JobStatus;
use common::responses::UploadResponse;

pub enum Msg {
    FileChosen(Option<web_sys::File>),
    Submit,
    Uploaded(UploadResponse),
    UploadFailed(String),
    Poll,
    StatusLoaded(JobStatus),
    StatusFailed(String),
    Reset,
}
