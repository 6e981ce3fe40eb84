//! Exploration-tree construction from BFS bookkeeping.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::db::Db;
use crate::error::{KinmatchError, Result};
use crate::matchsearch::traversal::Traversal;
use crate::matchsearch::Connection;
use crate::model::Gender;
use crate::store::persons;

/// One node of the exploration tree returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub person_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub religion_id: Option<String>,
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
    pub address: Option<String>,
    pub is_match: bool,
    pub depth: usize,
    /// Parent connection; None only for the seeker.
    pub from_person: Option<Connection>,
    /// Connections explored from this node during traversal.
    pub to_persons: Vec<Connection>,
}

/// Build the person-keyed exploration tree for a finished traversal.
///
/// Attributes are resolved with one batched store call. `to_persons` and
/// `from_person` both come from the same BFS bookkeeping, so the parent and
/// child views of every edge agree by construction.
pub async fn build_tree(db: &Db, traversal: &Traversal) -> Result<HashMap<String, GraphNode>> {
    let ids: Vec<String> = traversal.depths.keys().cloned().collect();
    let attributes = persons::load_persons(db, ids.clone()).await?;
    let match_set: HashSet<&String> = traversal.matches.iter().collect();

    let mut tree = HashMap::with_capacity(ids.len());
    for id in ids {
        // every visited id was resolvable during traversal; losing one now
        // means the store failed underneath us
        let person = attributes
            .get(&id)
            .cloned()
            .ok_or_else(|| KinmatchError::PersonNotFound(id.clone()))?;

        tree.insert(
            id.clone(),
            GraphNode {
                person_id: person.person_id,
                first_name: person.first_name,
                last_name: person.last_name,
                gender: person.gender,
                birth_year: person.birth_year,
                death_year: person.death_year,
                religion_id: person.religion_id,
                category_id: person.category_id,
                sub_category_id: person.sub_category_id,
                address: person.address,
                is_match: match_set.contains(&id),
                depth: traversal.depths[&id],
                from_person: traversal.inbound.get(&id).cloned(),
                to_persons: traversal.outbound.get(&id).cloned().unwrap_or_default(),
            },
        );
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchsearch::eligibility::tests::open_filters;
    use crate::matchsearch::traversal::tests::family_with_aunt;
    use crate::matchsearch::traversal::traverse;
    use crate::model::Gender;

    #[tokio::test]
    async fn test_tree_structure() {
        let (db, _temp) = family_with_aunt().await;
        let traversal = traverse(&db, "s", 3, &open_filters(Gender::Female))
            .await
            .unwrap();
        let tree = build_tree(&db, &traversal).await.unwrap();

        assert_eq!(tree.len(), 3);

        let seeker = &tree["s"];
        assert_eq!(seeker.depth, 0);
        assert!(seeker.from_person.is_none());
        assert!(!seeker.is_match);

        let aunt = &tree["a"];
        assert!(aunt.is_match);
        assert_eq!(aunt.depth, 2);
        assert_eq!(aunt.from_person.as_ref().unwrap().person_id, "f");
        assert_eq!(aunt.first_name, "First-a");
    }

    #[tokio::test]
    async fn test_tree_integrity_invariants() {
        let (db, _temp) = family_with_aunt().await;
        let traversal = traverse(&db, "s", 3, &open_filters(Gender::Female))
            .await
            .unwrap();
        let tree = build_tree(&db, &traversal).await.unwrap();

        for (id, node) in &tree {
            // to_persons only references nodes in the tree, and agrees with
            // the child's from_person
            for conn in &node.to_persons {
                let child = tree.get(&conn.person_id).expect("dangling to_persons");
                let from = child.from_person.as_ref().unwrap();
                assert_eq!(&from.person_id, id);
                assert_eq!(from.relationship, conn.relationship);
            }

            // from_person chain walks back to the seeker with strictly
            // decreasing depth
            let mut current = node;
            let mut depth = node.depth;
            while let Some(from) = &current.from_person {
                let parent = tree.get(&from.person_id).expect("dangling from_person");
                assert!(parent.depth < depth);
                depth = parent.depth;
                current = parent;
            }
            assert_eq!(current.person_id, "s");
        }
    }

    #[tokio::test]
    async fn test_tree_for_isolated_seeker() {
        let (db, _temp) = crate::store::persons::tests::test_db().await;
        crate::store::persons::create_person(
            &db,
            crate::store::persons::tests::fixture_person("solo", Gender::Male, None),
        )
        .await
        .unwrap();
        let traversal = traverse(&db, "solo", 3, &open_filters(Gender::Female))
            .await
            .unwrap();
        let tree = build_tree(&db, &traversal).await.unwrap();

        assert_eq!(tree.len(), 1);
        let node = &tree["solo"];
        assert_eq!(node.depth, 0);
        assert!(node.from_person.is_none());
        assert!(node.to_persons.is_empty());
    }
}
