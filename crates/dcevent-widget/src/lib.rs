//! DCEvent — widget rendering.
//!
//! Reads container configuration from `data-*` attributes, decides which
//! signup list each container shows and renders the lists as HTML.

pub mod container;
pub mod error;
pub mod format;
pub mod page;
