//! Contest descriptors and the per-event contest directory.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One contest of an event, as listed by the contests endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contest {
    /// Contest identifier. The API sends a number; it is kept as a string key.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    /// Human-readable contest name.
    pub name: String,
    /// Fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(serde_json::Number),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Contests of one event, addressable both by id and by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestDirectory {
    contests: Vec<Contest>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl ContestDirectory {
    /// Builds the directory. When two contests share an id or a name, the one
    /// listed first wins.
    #[must_use]
    pub fn new(contests: Vec<Contest>) -> Self {
        let mut by_id = HashMap::with_capacity(contests.len());
        let mut by_name = HashMap::with_capacity(contests.len());
        for (index, contest) in contests.iter().enumerate() {
            by_id.entry(contest.id.clone()).or_insert(index);
            by_name.entry(contest.name.clone()).or_insert(index);
        }
        Self {
            contests,
            by_id,
            by_name,
        }
    }

    /// Looks a contest up by name, falling back to its id.
    #[must_use]
    pub fn get(&self, name_or_id: &str) -> Option<&Contest> {
        self.by_name(name_or_id).or_else(|| self.by_id(name_or_id))
    }

    /// Looks a contest up by exact name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Contest> {
        self.by_name.get(name).map(|&i| &self.contests[i])
    }

    /// Looks a contest up by id.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&Contest> {
        self.by_id.get(id).map(|&i| &self.contests[i])
    }

    /// All contests in the order the API listed them.
    #[must_use]
    pub fn contests(&self) -> &[Contest] {
        &self.contests
    }

    /// Number of contests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contests.len()
    }

    /// Whether the event has no contests.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contests.is_empty()
    }
}
