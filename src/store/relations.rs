//! Relationship accessor: bidirectional edge store over the relationships
//! table. Every insert writes the forward and inverse rows in one
//! transaction, so readers never have to consider edge direction.

use rusqlite::params;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::Db;
use crate::error::{KinmatchError, Result};
use crate::model::RelationshipLabel;
use crate::store::persons;

/// SQL fragment matching the marital/parental exclusion label set.
const SPOUSAL_OR_CHILD_LABELS: &str = "('Husband', 'Wife', 'Spouse', 'Son', 'Daughter')";

/// Create a relationship pair: `related_person` is `label` to `person`,
/// plus the inverse row derived from `person`'s gender.
///
/// Both persons must exist; self-edges are rejected before touching the
/// database. Re-inserting an existing pair is a no-op.
pub async fn add_relationship(
    db: &Db,
    person_id: &str,
    related_person_id: &str,
    label: RelationshipLabel,
) -> Result<()> {
    if person_id == related_person_id {
        return Err(KinmatchError::InvalidInput(format!(
            "Self-relationship not allowed for person {}",
            person_id
        )));
    }

    let person = persons::require_person(db, person_id).await?;
    persons::require_person(db, related_person_id).await?;

    let inverse = label.inverse(person.gender);
    let forward_id = Uuid::new_v4().to_string();
    let inverse_id = Uuid::new_v4().to_string();
    let (pid, rid) = (person_id.to_string(), related_person_id.to_string());

    db.with_connection(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO relationships \
             (relationship_id, person_id, related_person_id, relationship) \
             VALUES (?1, ?2, ?3, ?4)",
            params![forward_id, pid, rid, label.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO relationships \
             (relationship_id, person_id, related_person_id, relationship) \
             VALUES (?1, ?2, ?3, ?4)",
            params![inverse_id, rid, pid, inverse.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// All persons directly related to `person_id`, with the label describing
/// what the related person is to the queried person. Row order is stable
/// for a given database (insertion order) but is not a contract.
pub async fn related_persons(
    db: &Db,
    person_id: &str,
) -> Result<Vec<(String, RelationshipLabel)>> {
    let id = person_id.to_string();
    db.with_connection(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT related_person_id, relationship FROM relationships \
             WHERE person_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map([&id], |row| {
            let related: String = row.get(0)?;
            let label_str: String = row.get(1)?;
            Ok((related, label_str))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (related, label_str) = row?;
            let label = RelationshipLabel::from_str(&label_str).map_err(|_| {
                KinmatchError::Internal(format!(
                    "Stored relationship row carries unknown label: {}",
                    label_str
                ))
            })?;
            out.push((related, label));
        }
        Ok(out)
    })
    .await
}

/// Eligibility probe: does the person have any Husband/Wife/Spouse/Son/
/// Daughter edge? Single EXISTS query against the (person, label) index.
pub async fn has_spousal_or_child_edge(db: &Db, person_id: &str) -> Result<bool> {
    let id = person_id.to_string();
    let query = format!(
        "SELECT EXISTS(SELECT 1 FROM relationships \
         WHERE person_id = ?1 AND relationship IN {})",
        SPOUSAL_OR_CHILD_LABELS
    );
    db.with_connection(move |conn| {
        let exists: i64 = conn.query_row(&query, [&id], |row| row.get(0))?;
        Ok(exists != 0)
    })
    .await
}

pub async fn count_relationships(db: &Db) -> Result<i64> {
    db.with_connection(|conn| {
        conn.query_row("SELECT COUNT(*) FROM relationships", [], |row| row.get(0))
            .map_err(KinmatchError::from)
    })
    .await
}

/// (label, count) pairs for stats reporting, most common first.
pub async fn label_distribution(db: &Db) -> Result<Vec<(String, i64)>> {
    db.with_connection(|conn| {
        let mut stmt = conn.prepare(
            "SELECT relationship, COUNT(*) FROM relationships \
             GROUP BY relationship ORDER BY COUNT(*) DESC, relationship",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    })
    .await
}
