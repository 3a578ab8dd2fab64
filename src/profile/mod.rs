mod normalize;
mod parse;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

use normalize::normalize;
use parse::load_profiles;
#[cfg(test)]
pub(crate) use parse::parse_profiles;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Relation {
    #[serde(rename = "relation")]
    pub relation_type: String,
    pub entities: Vec<String>,
    pub status: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub name: String,
    pub relations: Vec<Relation>,
}

/// The canonical, immutable profile set the graph is composed from.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    profiles: Vec<Profile>,
    index_by_name: HashMap<String, usize>,
}

impl Dataset {
    /// Normalizes raw profiles and indexes them by name.
    ///
    /// A name that appears twice keeps its first profile; later ones are dropped.
    pub fn from_raw(raw: &[Profile]) -> Self {
        let canonical = normalize(raw);
        let mut profiles = Vec::with_capacity(canonical.len());
        let mut index_by_name = HashMap::with_capacity(canonical.len());

        for profile in canonical {
            if index_by_name.contains_key(&profile.name) {
                warn!(name = %profile.name, "duplicate profile name, keeping the first one");
                continue;
            }
            index_by_name.insert(profile.name.clone(), profiles.len());
            profiles.push(profile);
        }

        Self {
            profiles,
            index_by_name,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = load_profiles(path)?;
        let dataset = Self::from_raw(&raw);
        info!(
            path = %path.display(),
            profiles = dataset.len(),
            relations = dataset.relation_count(),
            "loaded profile dataset"
        );
        Ok(dataset)
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.index_by_name
            .get(name)
            .and_then(|&index| self.profiles.get(index))
    }

    pub fn is_profile(&self, name: &str) -> bool {
        self.index_by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn relation_count(&self) -> usize {
        self.profiles
            .iter()
            .map(|profile| profile.relations.len())
            .sum()
    }

    /// Names of profiles whose relations reference at least one profile.
    pub fn linked_profiles(&self) -> HashSet<&str> {
        self.profiles
            .iter()
            .filter(|profile| {
                profile.relations.iter().any(|relation| {
                    relation
                        .entities
                        .iter()
                        .any(|entity| self.is_profile(entity))
                })
            })
            .map(|profile| profile.name.as_str())
            .collect()
    }
}
