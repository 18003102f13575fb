pub mod history;
pub mod prospect;
