//! Application layer - CLI and the periodic scheduler

pub mod commands;
pub mod scheduler;

pub use commands::{Cli, Commands};
pub use scheduler::Scheduler;
