use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Profile, Relation};

#[derive(Clone, Debug, Deserialize)]
struct RawProfile {
    name: String,
    #[serde(default)]
    relations: Option<Value>,
}

impl RawProfile {
    /// Relation records as given; `null`, absent or non-array values count as none.
    fn relation_values(&mut self) -> Vec<Value> {
        match self.relations.take() {
            Some(Value::Array(values)) => values,
            None | Some(Value::Null) => Vec::new(),
            Some(_) => {
                debug!(profile = %self.name, "relations is not an array, treating as empty");
                Vec::new()
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct RawRelation {
    #[serde(default)]
    relation: Option<String>,
    #[serde(default)]
    entities: Option<Vec<String>>,
    #[serde(default)]
    status: Option<RawStatus>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawStatus {
    One(String),
    Many(Vec<String>),
}

impl RawStatus {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl RawRelation {
    fn into_relation(self) -> Option<Relation> {
        let relation_type = self.relation?;
        let entities = self.entities?;
        Some(Relation {
            relation_type,
            entities,
            status: self.status.map(RawStatus::into_vec).unwrap_or_default(),
        })
    }
}

/// Parses a `{ "profile": [...] }` document into raw, not yet normalized profiles.
///
/// Profile entries without a name, and relation records that cannot be read or
/// lack a type or an entity list, are dropped without failing the document.
pub fn parse_profiles(raw: &str) -> Result<Vec<Profile>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid profile JSON")?;
    let object = parsed
        .as_object()
        .ok_or_else(|| anyhow!("profile document must be a JSON object"))?;
    let entries = object
        .get("profile")
        .ok_or_else(|| anyhow!("profile document has no \"profile\" array"))?
        .as_array()
        .ok_or_else(|| anyhow!("\"profile\" must be an array"))?;

    let mut profiles = Vec::with_capacity(entries.len());
    for (position, entry) in entries.iter().enumerate() {
        let mut raw_profile = match RawProfile::deserialize(entry) {
            Ok(raw_profile) => raw_profile,
            Err(error) => {
                warn!(index = position, %error, "skipping malformed profile entry");
                continue;
            }
        };

        let values = raw_profile.relation_values();
        let mut relations = Vec::with_capacity(values.len());
        for value in values {
            match RawRelation::deserialize(&value).ok().and_then(RawRelation::into_relation) {
                Some(relation) => relations.push(relation),
                None => debug!(profile = %raw_profile.name, "skipping malformed relation record"),
            }
        }

        profiles.push(Profile {
            name: raw_profile.name,
            relations,
        });
    }

    if profiles.is_empty() {
        warn!("profile document contains no profiles");
    }

    Ok(profiles)
}

pub fn load_profiles(path: &Path) -> Result<Vec<Profile>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read data file {}", path.display()))?;
    parse_profiles(&raw).with_context(|| format!("failed to parse {}", path.display()))
}
