//! DCEvent — signup request orchestration.
//!
//! Responsible for fetching an event's contest directory, resolving contest
//! names against it, fetching signups and caching every request for the
//! lifetime of one orchestrator.

pub mod application;
pub mod domain;
