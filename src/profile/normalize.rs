use indexmap::{IndexMap, IndexSet};

use super::{Profile, Relation};

/// Collapses relation records that share a type into one relation per type.
///
/// Entities and status values are unioned in first-seen order, and the relation
/// types keep the order of their first occurrence.
pub fn normalize(profiles: &[Profile]) -> Vec<Profile> {
    profiles.iter().map(normalize_profile).collect()
}

fn normalize_profile(profile: &Profile) -> Profile {
    let mut grouped: IndexMap<&str, (IndexSet<&str>, IndexSet<&str>)> = IndexMap::new();
    for relation in &profile.relations {
        let (entities, status) = grouped.entry(relation.relation_type.as_str()).or_default();
        entities.extend(relation.entities.iter().map(String::as_str));
        status.extend(relation.status.iter().map(String::as_str));
    }

    let relations = grouped
        .into_iter()
        .map(|(relation_type, (entities, status))| Relation {
            relation_type: relation_type.to_owned(),
            entities: entities.into_iter().map(str::to_owned).collect(),
            status: status.into_iter().map(str::to_owned).collect(),
        })
        .collect();

    Profile {
        name: profile.name.clone(),
        relations,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn relation(relation_type: &str, entities: &[&str], status: &[&str]) -> Relation {
        Relation {
            relation_type: relation_type.to_owned(),
            entities: entities.iter().map(|value| value.to_string()).collect(),
            status: status.iter().map(|value| value.to_string()).collect(),
        }
    }

    #[test]
    fn merges_records_sharing_a_type() {
        let raw = vec![Profile {
            name: "Alice".into(),
            relations: vec![
                relation("born_in", &["Paris"], &["confirmed"]),
                relation("alias", &["Al"], &[]),
                relation("born_in", &["Paris", "Lyon"], &["disputed", "confirmed"]),
            ],
        }];

        let canonical = normalize(&raw);
        assert_eq!(
            canonical[0].relations,
            vec![
                relation("born_in", &["Paris", "Lyon"], &["confirmed", "disputed"]),
                relation("alias", &["Al"], &[]),
            ]
        );
    }

    #[test]
    fn removes_duplicates_inside_one_record() {
        let raw = vec![Profile {
            name: "Bob".into(),
            relations: vec![relation("lives_in", &["Rome", "Rome"], &["x", "x"])],
        }];
        assert_eq!(
            normalize(&raw)[0].relations,
            vec![relation("lives_in", &["Rome"], &["x"])]
        );
    }

    #[test]
    fn keeps_profile_order_and_empty_profiles() {
        let raw = vec![
            Profile {
                name: "Zed".into(),
                relations: Vec::new(),
            },
            Profile {
                name: "Amy".into(),
                relations: vec![relation("title", &["Dr"], &[])],
            },
        ];
        let canonical = normalize(&raw);
        assert_eq!(canonical[0].name, "Zed");
        assert!(canonical[0].relations.is_empty());
        assert_eq!(canonical[1].name, "Amy");
    }

    fn relation_strategy() -> impl Strategy<Value = Relation> {
        (
            prop::sample::select(vec!["born_in", "alias", "has_son", "lives_in"]),
            prop::collection::vec("[a-d]{1,2}", 0..4),
            prop::collection::vec(prop::sample::select(vec!["confirmed", "rumour"]), 0..3),
        )
            .prop_map(|(relation_type, entities, status)| Relation {
                relation_type: relation_type.to_owned(),
                entities,
                status: status.into_iter().map(str::to_owned).collect(),
            })
    }

    fn profiles_strategy() -> impl Strategy<Value = Vec<Profile>> {
        prop::collection::vec(
            ("[A-Z][a-z]{2,5}", prop::collection::vec(relation_strategy(), 0..6))
                .prop_map(|(name, relations)| Profile { name, relations }),
            0..5,
        )
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(profiles in profiles_strategy()) {
            let once = normalize(&profiles);
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_relation_types_are_unique(profiles in profiles_strategy()) {
            for profile in normalize(&profiles) {
                let types = profile
                    .relations
                    .iter()
                    .map(|relation| relation.relation_type.as_str())
                    .collect::<std::collections::HashSet<_>>();
                prop_assert_eq!(types.len(), profile.relations.len());
            }
        }

        #[test]
        fn merged_entities_are_the_union(profiles in profiles_strategy()) {
            for (raw, canonical) in profiles.iter().zip(normalize(&profiles)) {
                for relation in &canonical.relations {
                    let expected = raw
                        .relations
                        .iter()
                        .filter(|candidate| candidate.relation_type == relation.relation_type)
                        .flat_map(|candidate| candidate.entities.iter().cloned())
                        .collect::<IndexSet<_>>();
                    prop_assert_eq!(relation.entities.clone(), expected.into_iter().collect::<Vec<_>>());
                }
            }
        }
    }
}
