//! DCEvent Core — shared abstractions.
//!
//! This crate defines the completion primitive, the error taxonomy and the
//! transport contract that the signup orchestration layer builds on. It
//! contains no network code.

pub mod deferred;
pub mod endpoints;
pub mod error;
pub mod fetch;
