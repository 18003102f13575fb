pub mod single;
pub mod upload;
