//! Match-search engine: request validation, bounded BFS traversal,
//! eligibility evaluation, exploration-tree assembly, and pruning.

pub mod eligibility;
pub mod prune;
pub mod traversal;
pub mod tree;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::MatchingConfig;
use crate::db::Db;
use crate::error::{KinmatchError, Result};
use crate::model::{Gender, RelationshipLabel};

pub use eligibility::EligibilityFilters;
pub use tree::GraphNode;

/// A directed connection in the exploration tree: the person on the other
/// end of an edge plus the label describing what they are to this node's
/// parent (inbound) or to this node (outbound).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub person_id: String,
    pub relationship: RelationshipLabel,
}

/// Match-search request as received over HTTP or built by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub seeker_person_id: String,
    pub target_gender_code: String,
    #[serde(default)]
    pub birth_year_min: Option<i32>,
    #[serde(default)]
    pub birth_year_max: Option<i32>,
    #[serde(default)]
    pub include_religion_ids: Vec<String>,
    #[serde(default)]
    pub include_category_ids: Vec<String>,
    #[serde(default)]
    pub include_sub_category_ids: Vec<String>,
    #[serde(default)]
    pub exclude_sub_category_ids: Vec<String>,
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Defaults to true when omitted.
    #[serde(default)]
    pub prune_graph: Option<bool>,
}

/// Match-search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    pub seeker_id: String,
    pub total_matches: usize,
    /// Person ids in discovery order.
    pub matches: Vec<String>,
    pub exploration_graph: HashMap<String, GraphNode>,
}

/// Validate the request against the matching configuration and resolve the
/// effective traversal depth. No accessor calls happen here; a rejected
/// request never touches the store.
fn validate(request: &MatchRequest, matching: &MatchingConfig) -> Result<(Gender, usize)> {
    let target_gender: Gender = request.target_gender_code.parse()?;

    if let (Some(min), Some(max)) = (request.birth_year_min, request.birth_year_max) {
        if min > max {
            return Err(KinmatchError::InvalidInput(format!(
                "birth_year_min ({}) exceeds birth_year_max ({})",
                min, max
            )));
        }
    }

    let requested = request.max_depth.unwrap_or(matching.default_max_depth);
    if requested == 0 {
        return Err(KinmatchError::InvalidInput(
            "max_depth must be a positive integer".to_string(),
        ));
    }

    let max_depth = if requested > matching.max_depth_ceiling {
        if matching.strict_depth {
            return Err(KinmatchError::InvalidInput(format!(
                "max_depth {} exceeds the configured ceiling of {}",
                requested, matching.max_depth_ceiling
            )));
        }
        log::warn!(
            "Requested max_depth {} exceeds ceiling {}, clamping",
            requested,
            matching.max_depth_ceiling
        );
        matching.max_depth_ceiling
    } else {
        requested
    };

    Ok((target_gender, max_depth))
}

/// Run a full match search: validate, traverse, build the exploration
/// tree, and prune it unless the request disabled pruning.
pub async fn find_matches(
    db: &Db,
    matching: &MatchingConfig,
    request: &MatchRequest,
) -> Result<MatchResponse> {
    let (target_gender, max_depth) = validate(request, matching)?;

    let filters = EligibilityFilters {
        target_gender,
        birth_year_min: request.birth_year_min,
        birth_year_max: request.birth_year_max,
        include_religion_ids: request.include_religion_ids.clone(),
        include_category_ids: request.include_category_ids.clone(),
        include_sub_category_ids: request.include_sub_category_ids.clone(),
        exclude_sub_category_ids: request.exclude_sub_category_ids.clone(),
    };

    let traversal =
        traversal::traverse(db, &request.seeker_person_id, max_depth, &filters).await?;
    let full_tree = tree::build_tree(db, &traversal).await?;

    let exploration_graph = if request.prune_graph.unwrap_or(true) {
        prune::prune_tree(&full_tree, &traversal.matches, &request.seeker_person_id)
    } else {
        full_tree
    };

    log::info!(
        "Match search for {}: {} matches, {} nodes returned",
        request.seeker_person_id,
        traversal.matches.len(),
        exploration_graph.len()
    );

    Ok(MatchResponse {
        seeker_id: request.seeker_person_id.clone(),
        total_matches: traversal.matches.len(),
        matches: traversal.matches,
        exploration_graph,
    })
}
