//! Tree pruning: keep only nodes on some seeker-to-match path.

use std::collections::{HashMap, HashSet};

use crate::matchsearch::tree::GraphNode;

/// Reduce `tree` to the seeker plus every node lying on a `from_person`
/// walk from a match back to the seeker. Retained nodes get their
/// `to_persons` filtered to the keep-set so the output never dangles.
///
/// With zero matches only the seeker survives, with an empty `to_persons`
/// list. The walk per match is linear and bounded by the traversal depth.
pub fn prune_tree(
    tree: &HashMap<String, GraphNode>,
    matches: &[String],
    seeker_id: &str,
) -> HashMap<String, GraphNode> {
    let mut keep: HashSet<String> = HashSet::new();
    keep.insert(seeker_id.to_string());

    for match_id in matches {
        let mut current = match_id.as_str();
        while keep.insert(current.to_string()) {
            match tree.get(current).and_then(|n| n.from_person.as_ref()) {
                Some(from) => current = &from.person_id,
                None => break,
            }
        }
    }

    let mut pruned = HashMap::with_capacity(keep.len());
    for id in &keep {
        if let Some(node) = tree.get(id) {
            let mut node = node.clone();
            node.to_persons.retain(|conn| keep.contains(&conn.person_id));
            pruned.insert(id.clone(), node);
        }
    }

    pruned
}
