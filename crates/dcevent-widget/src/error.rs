//! Widget error types.

use dcevent_core::error::ApiError;
use thiserror::Error;

/// Why a container could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    /// The container has no event id.
    #[error("container has no data-dcevent attribute")]
    MissingEvent,

    /// The attribute combination does not select any list.
    #[error("container for event {0} does not select a signup list")]
    NothingToRender(String),

    /// The container names an item hook the host never registered.
    #[error("no format hook named {0}")]
    UnknownFormatHook(String),

    /// Fetching the signups failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The page was dropped before the data arrived.
    #[error("rendering abandoned before the data arrived")]
    Abandoned,
}
