use common::jobs::SingleJobStatus;
use common::responses::SingleJobAccepted;

#[derive(Clone, Copy, PartialEq)]
pub enum Field {
    ClientName,
    Company,
    Role,
    LinkedIn,
    Email,
    Phone,
    Notes,
}

pub enum Msg {
    SetField(Field, String),
    Submit,
    Accepted(SingleJobAccepted),
    SubmitFailed(String),
    Poll,
    StatusLoaded(SingleJobStatus),
    StatusFailed(String),
    Reset,
}
