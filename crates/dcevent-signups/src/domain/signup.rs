//! Signup records and their derived display fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A person's name split from the API's combined `"Last First"` field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    /// First token of the combined field.
    pub last: String,
    /// Second token of the combined field, or empty.
    pub first: String,
}

impl PersonName {
    /// Splits a combined name. Runs of whitespace count as a single
    /// separator; tokens after the second are dropped.
    #[must_use]
    pub fn parse(combined: &str) -> Self {
        let mut tokens = combined.split_whitespace();
        Self {
            last: tokens.next().unwrap_or_default().to_owned(),
            first: tokens.next().unwrap_or_default().to_owned(),
        }
    }
}

/// One signup as returned by the signup endpoints, plus derived fields.
///
/// The derived fields are filled in once by [`Signup::derive_fields`] when a
/// fetch completes; readers never recompute them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    /// Combined participant name, `"Last First"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_name: Option<String>,
    /// Combined partner name for couple contests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_and_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_city: Option<String>,

    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Alias of `city_and_state`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_last_name: Option<String>,

    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Signup {
    /// Fills the derived name and city fields from the raw ones.
    pub fn derive_fields(&mut self) {
        if let Some(participant) = &self.participant_name {
            let name = PersonName::parse(participant);
            self.first_name = name.first;
            self.last_name = name.last;
        }
        self.city.clone_from(&self.city_and_state);
        if let Some(partner) = self.partner_name.as_deref().filter(|p| !p.trim().is_empty()) {
            let name = PersonName::parse(partner);
            self.partner_first_name = Some(name.first);
            self.partner_last_name = Some(name.last);
        }
    }

    /// Whether this signup has a partner to display.
    #[must_use]
    pub fn has_partner(&self) -> bool {
        self.partner_last_name.as_deref().is_some_and(|n| !n.is_empty())
            || self.partner_first_name.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// Deserializes a signup list and derives every record's display fields.
///
/// # Errors
///
/// Returns the deserialization error if `body` is not a list of objects.
pub fn signups_from_json(body: Value) -> Result<Vec<Signup>, serde_json::Error> {
    let mut signups: Vec<Signup> = serde_json::from_value(body)?;
    for signup in &mut signups {
        signup.derive_fields();
    }
    Ok(signups)
}
