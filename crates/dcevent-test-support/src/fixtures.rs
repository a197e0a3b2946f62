//! Canned API payloads shared across test suites.

use dcevent_core::endpoints::Endpoints;
use serde_json::{Value, json};

/// Base URL used by every test suite.
pub const TEST_API_BASE: &str = "https://api.test/rest/";

/// Endpoints rooted at [`TEST_API_BASE`] without a language suffix.
///
/// # Panics
///
/// Never; [`TEST_API_BASE`] is a valid base URL.
#[must_use]
pub fn test_endpoints() -> Endpoints {
    Endpoints::new(TEST_API_BASE).expect("TEST_API_BASE is a valid base URL")
}

/// A contest directory with two contests: `Jack and Jill` (id 1) and
/// `Open Strictly Swing` (id 2).
#[must_use]
pub fn contest_directory_json() -> Value {
    json!([
        { "id": 1, "name": "Jack and Jill", "division": "novice" },
        { "id": 2, "name": "Open Strictly Swing" }
    ])
}

/// Two event signups with combined `Last First` participant names.
#[must_use]
pub fn event_signups_json() -> Value {
    json!([
        { "participantName": "Smith  John", "cityAndState": "Boston", "role": "leader" },
        { "participantName": "Doe Jane", "cityAndState": "Moscow" }
    ])
}
