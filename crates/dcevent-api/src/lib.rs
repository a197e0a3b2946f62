//! DCEvent API — HTTP surface of the signup widget.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
