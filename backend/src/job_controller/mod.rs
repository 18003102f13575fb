pub mod finalize;
pub mod queue;
pub mod state;
