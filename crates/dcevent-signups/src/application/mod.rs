//! Application services of the signup context.

pub mod orchestrator;
