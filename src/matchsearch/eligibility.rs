//! Per-candidate eligibility evaluation.
//!
//! A short-circuiting conjunction in a fixed order: the cheap attribute
//! comparisons run first, the relationship-table probe last. Evaluation has
//! no side effects and is safe to run concurrently for different persons.

use crate::db::Db;
use crate::error::Result;
use crate::model::{Gender, Person};
use crate::store::relations;

/// The filter set a search request resolves to.
#[derive(Debug, Clone)]
pub struct EligibilityFilters {
    pub target_gender: Gender,
    pub birth_year_min: Option<i32>,
    pub birth_year_max: Option<i32>,
    pub include_religion_ids: Vec<String>,
    pub include_category_ids: Vec<String>,
    pub include_sub_category_ids: Vec<String>,
    pub exclude_sub_category_ids: Vec<String>,
}

/// Empty allow-list means the check is skipped, not "match nothing".
fn in_allow_list(attr: Option<&String>, list: &[String]) -> bool {
    if list.is_empty() {
        return true;
    }
    attr.map_or(false, |a| list.iter().any(|x| x == a))
}

/// A birth-year bound with an unknown birth year fails the bound. This is
/// deliberate policy, not an oversight; see the unknown-birth-year tests.
fn within_birth_bounds(birth_year: Option<i32>, min: Option<i32>, max: Option<i32>) -> bool {
    if let Some(min) = min {
        match birth_year {
            Some(y) if y >= min => {}
            _ => return false,
        }
    }
    if let Some(max) = max {
        match birth_year {
            Some(y) if y <= max => {}
            _ => return false,
        }
    }
    true
}

/// Evaluate all eligibility predicates for one person.
///
/// Order: gender, living, birth-year bounds, religion allow-lists, lineage
/// exclusion, then the spousal-or-child edge probe (the only database hit).
pub async fn is_eligible(db: &Db, person: &Person, filters: &EligibilityFilters) -> Result<bool> {
    if person.gender != filters.target_gender {
        return Ok(false);
    }

    if person.death_year.is_some() {
        return Ok(false);
    }

    if !within_birth_bounds(
        person.birth_year,
        filters.birth_year_min,
        filters.birth_year_max,
    ) {
        return Ok(false);
    }

    if !in_allow_list(person.religion_id.as_ref(), &filters.include_religion_ids) {
        return Ok(false);
    }
    if !in_allow_list(person.category_id.as_ref(), &filters.include_category_ids) {
        return Ok(false);
    }
    if !in_allow_list(
        person.sub_category_id.as_ref(),
        &filters.include_sub_category_ids,
    ) {
        return Ok(false);
    }

    if let Some(sub) = person.sub_category_id.as_ref() {
        if filters.exclude_sub_category_ids.iter().any(|x| x == sub) {
            return Ok(false);
        }
    }

    if relations::has_spousal_or_child_edge(db, &person.person_id).await? {
        return Ok(false);
    }

    Ok(true)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::RelationshipLabel;
    use crate::store::persons::tests::{fixture_person, test_db};
    use crate::store::persons::create_person;
    use crate::store::relations::add_relationship;

    pub(crate) fn open_filters(target_gender: Gender) -> EligibilityFilters {
        EligibilityFilters {
            target_gender,
            birth_year_min: None,
            birth_year_max: None,
            include_religion_ids: vec![],
            include_category_ids: vec![],
            include_sub_category_ids: vec![],
            exclude_sub_category_ids: vec![],
        }
    }

    #[tokio::test]
    async fn test_eligible_with_open_filters() {
        let (db, _temp) = test_db().await;
        let p = create_person(&db, fixture_person("p", Gender::Female, Some(1995)))
            .await
            .unwrap();
        assert!(is_eligible(&db, &p, &open_filters(Gender::Female))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_wrong_gender_rejected() {
        let (db, _temp) = test_db().await;
        let p = create_person(&db, fixture_person("p", Gender::Male, Some(1995)))
            .await
            .unwrap();
        assert!(!is_eligible(&db, &p, &open_filters(Gender::Female))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_deceased_rejected() {
        let (db, _temp) = test_db().await;
        let mut new = fixture_person("p", Gender::Female, Some(1950));
        new.death_year = Some(2010);
        let p = create_person(&db, new).await.unwrap();
        assert!(!is_eligible(&db, &p, &open_filters(Gender::Female))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_birth_year_bounds() {
        let (db, _temp) = test_db().await;
        let p = create_person(&db, fixture_person("p", Gender::Female, Some(1995)))
            .await
            .unwrap();

        let mut filters = open_filters(Gender::Female);
        filters.birth_year_min = Some(1990);
        filters.birth_year_max = Some(2000);
        assert!(is_eligible(&db, &p, &filters).await.unwrap());

        filters.birth_year_min = Some(1996);
        assert!(!is_eligible(&db, &p, &filters).await.unwrap());

        filters.birth_year_min = None;
        filters.birth_year_max = Some(1994);
        assert!(!is_eligible(&db, &p, &filters).await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_birth_year_fails_specified_bound() {
        let (db, _temp) = test_db().await;
        let p = create_person(&db, fixture_person("p", Gender::Female, None))
            .await
            .unwrap();

        // No bounds: unknown birth year passes vacuously
        assert!(is_eligible(&db, &p, &open_filters(Gender::Female))
            .await
            .unwrap());

        // Any bound specified: unknown birth year fails it
        let mut filters = open_filters(Gender::Female);
        filters.birth_year_min = Some(1990);
        assert!(!is_eligible(&db, &p, &filters).await.unwrap());

        let mut filters = open_filters(Gender::Female);
        filters.birth_year_max = Some(2000);
        assert!(!is_eligible(&db, &p, &filters).await.unwrap());
    }

    #[tokio::test]
    async fn test_religion_allow_lists() {
        let (db, _temp) = test_db().await;
        // fixture persons carry religion r1, category c1, sub-category g1
        let p = create_person(&db, fixture_person("p", Gender::Female, Some(1995)))
            .await
            .unwrap();

        let mut filters = open_filters(Gender::Female);
        filters.include_religion_ids = vec!["r1".to_string(), "r2".to_string()];
        filters.include_category_ids = vec!["c1".to_string()];
        filters.include_sub_category_ids = vec!["g1".to_string()];
        assert!(is_eligible(&db, &p, &filters).await.unwrap());

        filters.include_religion_ids = vec!["r2".to_string()];
        assert!(!is_eligible(&db, &p, &filters).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_attribute_fails_nonempty_allow_list() {
        let (db, _temp) = test_db().await;
        let mut new = fixture_person("p", Gender::Female, Some(1995));
        new.religion_id = None;
        let p = create_person(&db, new).await.unwrap();

        let mut filters = open_filters(Gender::Female);
        filters.include_religion_ids = vec!["r1".to_string()];
        assert!(!is_eligible(&db, &p, &filters).await.unwrap());
    }

    #[tokio::test]
    async fn test_lineage_exclusion() {
        let (db, _temp) = test_db().await;
        let p = create_person(&db, fixture_person("p", Gender::Female, Some(1995)))
            .await
            .unwrap();

        let mut filters = open_filters(Gender::Female);
        filters.exclude_sub_category_ids = vec!["g1".to_string()];
        assert!(!is_eligible(&db, &p, &filters).await.unwrap());

        filters.exclude_sub_category_ids = vec!["g9".to_string()];
        assert!(is_eligible(&db, &p, &filters).await.unwrap());
    }

    #[tokio::test]
    async fn test_married_person_rejected() {
        let (db, _temp) = test_db().await;
        let p = create_person(&db, fixture_person("p", Gender::Female, Some(1995)))
            .await
            .unwrap();
        create_person(&db, fixture_person("h", Gender::Male, Some(1990)))
            .await
            .unwrap();
        add_relationship(&db, "p", "h", RelationshipLabel::Husband)
            .await
            .unwrap();

        assert!(!is_eligible(&db, &p, &open_filters(Gender::Female))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_person_with_children_rejected() {
        let (db, _temp) = test_db().await;
        let p = create_person(&db, fixture_person("p", Gender::Female, Some(1970)))
            .await
            .unwrap();
        create_person(&db, fixture_person("kid", Gender::Male, Some(2000)))
            .await
            .unwrap();
        // kid is p's Son
        add_relationship(&db, "p", "kid", RelationshipLabel::Son)
            .await
            .unwrap();

        assert!(!is_eligible(&db, &p, &open_filters(Gender::Female))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_nonspousal_edges_do_not_reject() {
        let (db, _temp) = test_db().await;
        let p = create_person(&db, fixture_person("p", Gender::Female, Some(1995)))
            .await
            .unwrap();
        create_person(&db, fixture_person("b", Gender::Male, Some(1992)))
            .await
            .unwrap();
        add_relationship(&db, "p", "b", RelationshipLabel::Brother)
            .await
            .unwrap();

        assert!(is_eligible(&db, &p, &open_filters(Gender::Female))
            .await
            .unwrap());
    }
}
