//! Container configuration read from `data-*` attributes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::WidgetError;

/// Event id of the container.
pub const ATTR_EVENT: &str = "data-dcevent";
/// Contest name (or id) of the container.
pub const ATTR_CONTEST: &str = "data-contest";
/// Selection filter, e.g. `leaders`, `followers`, `couples`, `signups`.
pub const ATTR_SELECT: &str = "data-select";
/// Name of the item hook applied to this container's list.
pub const ATTR_FORMAT_HOOK: &str = "data-format-hook";

/// Selection that asks for every signup of the event.
pub const EVENT_SIGNUPS_SELECTION: &str = "signups";

/// One element to populate with a signup list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub event_id: String,
    pub contest: Option<String>,
    pub select: Option<String>,
    /// Overrides the page's default item hook.
    #[serde(default)]
    pub format_hook: Option<String>,
}

/// Which list a container shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRequest<'a> {
    /// Signups of one contest with a selection filter.
    ContestSignups { contest: &'a str, selection: &'a str },
    /// Every signup of the event.
    EventSignups,
}

fn non_empty<'a>(attributes: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    attributes
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

impl Container {
    /// Reads a container from its element attributes.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::MissingEvent` if `data-dcevent` is absent or
    /// empty.
    pub fn from_attributes(attributes: &HashMap<String, String>) -> Result<Self, WidgetError> {
        let event_id = non_empty(attributes, ATTR_EVENT).ok_or(WidgetError::MissingEvent)?;
        Ok(Self {
            event_id: event_id.to_owned(),
            contest: non_empty(attributes, ATTR_CONTEST).map(str::to_owned),
            select: non_empty(attributes, ATTR_SELECT).map(str::to_owned),
            format_hook: non_empty(attributes, ATTR_FORMAT_HOOK).map(str::to_owned),
        })
    }

    /// Decides which list this container shows.
    ///
    /// A contest with a selection shows that contest's signups; no contest
    /// with the `signups` selection shows the whole event.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError::NothingToRender` for any other combination.
    pub fn request(&self) -> Result<ContainerRequest<'_>, WidgetError> {
        match (self.contest.as_deref(), self.select.as_deref()) {
            (Some(contest), Some(selection)) => Ok(ContainerRequest::ContestSignups {
                contest,
                selection,
            }),
            (None, Some(EVENT_SIGNUPS_SELECTION)) => Ok(ContainerRequest::EventSignups),
            _ => Err(WidgetError::NothingToRender(self.event_id.clone())),
        }
    }
}
