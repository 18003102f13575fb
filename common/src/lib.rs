//! Wire types shared by the backend and the browser frontend.

pub mod jobs;
pub mod model;
pub mod requests;
pub mod responses;
