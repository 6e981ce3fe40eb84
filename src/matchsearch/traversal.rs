//! Bounded BFS over the relationship graph.
//!
//! Family graphs contain cycles (marriage loops joining branches), so the
//! visited set is the termination mechanism: a person is claimed before
//! enqueue, and first discovery wins the minimum-hop depth. Ineligible
//! persons are still expanded as hubs; eligibility only decides whether a
//! node lands on the match list.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::db::Db;
use crate::error::Result;
use crate::matchsearch::eligibility::{self, EligibilityFilters};
use crate::matchsearch::Connection;
use crate::store::{persons, relations};

/// Per-invocation BFS bookkeeping. Never shared across searches.
#[derive(Debug)]
pub struct Traversal {
    pub seeker_id: String,
    /// Hop count from the seeker; seeker = 0.
    pub depths: HashMap<String, usize>,
    /// Inbound connection: parent id + what the person is to the parent.
    /// Absent only for the seeker.
    pub inbound: HashMap<String, Connection>,
    /// Outbound connections explored from each person (tree edges only).
    pub outbound: HashMap<String, Vec<Connection>>,
    /// Eligible persons in discovery (non-decreasing depth) order.
    pub matches: Vec<String>,
}

/// Run a breadth-first search from `seeker_id` out to `max_depth` hops,
/// evaluating eligibility on every newly discovered person.
///
/// Fails with `PersonNotFound` if the seeker does not exist, or with the
/// underlying store error if any accessor call fails mid-walk; no partial
/// traversal is ever returned.
pub async fn traverse(
    db: &Db,
    seeker_id: &str,
    max_depth: usize,
    filters: &EligibilityFilters,
) -> Result<Traversal> {
    persons::require_person(db, seeker_id).await?;

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    let mut traversal = Traversal {
        seeker_id: seeker_id.to_string(),
        depths: HashMap::new(),
        inbound: HashMap::new(),
        outbound: HashMap::new(),
        matches: Vec::new(),
    };

    visited.insert(seeker_id.to_string());
    traversal.depths.insert(seeker_id.to_string(), 0);
    queue.push_back((seeker_id.to_string(), 0));

    while let Some((person_id, depth)) = queue.pop_front() {
        // Nodes at the boundary are recorded and evaluated but not expanded
        if depth >= max_depth {
            continue;
        }

        let neighbors = relations::related_persons(db, &person_id).await?;
        for (related_id, label) in neighbors {
            if !visited.insert(related_id.clone()) {
                continue;
            }

            traversal.depths.insert(related_id.clone(), depth + 1);
            traversal.inbound.insert(
                related_id.clone(),
                Connection {
                    person_id: person_id.clone(),
                    relationship: label,
                },
            );
            traversal
                .outbound
                .entry(person_id.clone())
                .or_default()
                .push(Connection {
                    person_id: related_id.clone(),
                    relationship: label,
                });
            queue.push_back((related_id.clone(), depth + 1));

            // A person reachable through an edge must resolve; a missing
            // row is a collaborator failure and aborts the search.
            let person = persons::require_person(db, &related_id).await?;
            if eligibility::is_eligible(db, &person, filters).await? {
                traversal.matches.push(related_id);
            }
        }
    }

    log::debug!(
        "Traversal from {} visited {} persons, {} matches (max_depth {})",
        seeker_id,
        traversal.depths.len(),
        traversal.matches.len(),
        max_depth
    );

    Ok(traversal)
}
