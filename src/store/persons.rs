//! Person attribute accessor backed by the persons table.

use rusqlite::{params, Row};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::Db;
use crate::error::{KinmatchError, Result};
use crate::model::{Gender, Person};

const PERSON_COLUMNS: &str = "person_id, first_name, last_name, gender, birth_year, \
     death_year, religion_id, category_id, sub_category_id, address";

/// Input shape for creating a person. The id is generated when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
    #[serde(default)]
    pub person_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub religion_id: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub sub_category_id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

fn person_from_row(row: &Row<'_>) -> rusqlite::Result<Person> {
    let gender_code: String = row.get(3)?;
    let gender = gender_code.parse::<Gender>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Person {
        person_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        gender,
        birth_year: row.get(4)?,
        death_year: row.get(5)?,
        religion_id: row.get(6)?,
        category_id: row.get(7)?,
        sub_category_id: row.get(8)?,
        address: row.get(9)?,
    })
}

/// Insert a person, generating a v4 uuid when no id is supplied.
pub async fn create_person(db: &Db, new: NewPerson) -> Result<Person> {
    let person = Person {
        person_id: new
            .person_id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        first_name: new.first_name,
        last_name: new.last_name,
        gender: new.gender,
        birth_year: new.birth_year,
        death_year: new.death_year,
        religion_id: new.religion_id,
        category_id: new.category_id,
        sub_category_id: new.sub_category_id,
        address: new.address,
    };

    let inserted = person.clone();
    db.with_connection(move |conn| {
        conn.execute(
            "INSERT INTO persons (person_id, first_name, last_name, gender, birth_year, \
             death_year, religion_id, category_id, sub_category_id, address) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                inserted.person_id,
                inserted.first_name,
                inserted.last_name,
                inserted.gender.as_code(),
                inserted.birth_year,
                inserted.death_year,
                inserted.religion_id,
                inserted.category_id,
                inserted.sub_category_id,
                inserted.address,
            ],
        )?;
        Ok(())
    })
    .await?;

    Ok(person)
}

/// Fetch a person by id.
pub async fn get_person(db: &Db, person_id: &str) -> Result<Option<Person>> {
    let id = person_id.to_string();
    db.with_connection(move |conn| {
        let query = format!("SELECT {} FROM persons WHERE person_id = ?1", PERSON_COLUMNS);
        let mut stmt = conn.prepare(&query)?;
        let mut rows = stmt.query_map([&id], person_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    })
    .await
}

/// Fetch a person by id, failing with PersonNotFound when absent.
pub async fn require_person(db: &Db, person_id: &str) -> Result<Person> {
    get_person(db, person_id)
        .await?
        .ok_or_else(|| KinmatchError::PersonNotFound(person_id.to_string()))
}

/// Batched lookup for the tree builder: one connection, one prepared
/// statement, one probe per id. Ids missing from the table are simply
/// absent from the result map.
pub async fn load_persons(db: &Db, person_ids: Vec<String>) -> Result<HashMap<String, Person>> {
    db.with_connection(move |conn| {
        let query = format!("SELECT {} FROM persons WHERE person_id = ?1", PERSON_COLUMNS);
        let mut stmt = conn.prepare(&query)?;
        let mut out = HashMap::with_capacity(person_ids.len());
        for id in &person_ids {
            let mut rows = stmt.query_map([id], person_from_row)?;
            if let Some(row) = rows.next() {
                let person = row?;
                out.insert(person.person_id.clone(), person);
            }
        }
        Ok(out)
    })
    .await
}

/// Case-insensitive substring listing over first/last name.
pub async fn find_by_name(db: &Db, name_query: &str) -> Result<Vec<Person>> {
    let pattern = format!("%{}%", name_query);
    db.with_connection(move |conn| {
        let query = format!(
            "SELECT {} FROM persons \
             WHERE first_name LIKE ?1 OR last_name LIKE ?1 \
             ORDER BY last_name, first_name",
            PERSON_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([&pattern], person_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    })
    .await
}

pub async fn count_persons(db: &Db) -> Result<i64> {
    db.with_connection(|conn| {
        conn.query_row("SELECT COUNT(*) FROM persons", [], |row| row.get(0))
            .map_err(KinmatchError::from)
    })
    .await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::migrate;
    use tempfile::TempDir;

    /// Fresh migrated database for store/engine tests.
    pub(crate) async fn test_db() -> (Db, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Db::new(temp_dir.path().join("test.db"));
        db.with_connection(|conn| migrate::run_migrations(conn))
            .await
            .unwrap();
        (db, temp_dir)
    }

    /// Shorthand person used across test fixtures: living, optional lineage.
    pub(crate) fn fixture_person(id: &str, gender: Gender, birth_year: Option<i32>) -> NewPerson {
        NewPerson {
            person_id: Some(id.to_string()),
            first_name: format!("First-{}", id),
            last_name: format!("Last-{}", id),
            gender,
            birth_year,
            death_year: None,
            religion_id: Some("r1".to_string()),
            category_id: Some("c1".to_string()),
            sub_category_id: Some("g1".to_string()),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_person() {
        let (db, _temp) = test_db().await;
        let created = create_person(&db, fixture_person("p1", Gender::Female, Some(1995)))
            .await
            .unwrap();
        assert_eq!(created.person_id, "p1");

        let fetched = get_person(&db, "p1").await.unwrap().unwrap();
        assert_eq!(fetched.first_name, "First-p1");
        assert_eq!(fetched.gender, Gender::Female);
        assert_eq!(fetched.birth_year, Some(1995));
        assert_eq!(fetched.death_year, None);
    }

    #[tokio::test]
    async fn test_create_generates_id_when_absent() {
        let (db, _temp) = test_db().await;
        let mut new = fixture_person("ignored", Gender::Male, None);
        new.person_id = None;
        let created = create_person(&db, new).await.unwrap();
        assert!(!created.person_id.is_empty());
        assert!(get_person(&db, &created.person_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_person_missing() {
        let (db, _temp) = test_db().await;
        assert!(get_person(&db, "nope").await.unwrap().is_none());
        let err = require_person(&db, "nope").await.unwrap_err();
        assert!(matches!(err, KinmatchError::PersonNotFound(_)));
    }

    #[tokio::test]
    async fn test_load_persons_batched() {
        let (db, _temp) = test_db().await;
        for id in ["a", "b", "c"] {
            create_person(&db, fixture_person(id, Gender::Male, None))
                .await
                .unwrap();
        }
        let loaded = load_persons(
            &db,
            vec!["a".to_string(), "c".to_string(), "missing".to_string()],
        )
        .await
        .unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains_key("a"));
        assert!(loaded.contains_key("c"));
        assert!(!loaded.contains_key("missing"));
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let (db, _temp) = test_db().await;
        create_person(&db, fixture_person("x1", Gender::Female, None))
            .await
            .unwrap();
        let results = find_by_name(&db, "x1").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].person_id, "x1");
        assert!(find_by_name(&db, "zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_persons() {
        let (db, _temp) = test_db().await;
        assert_eq!(count_persons(&db).await.unwrap(), 0);
        create_person(&db, fixture_person("p1", Gender::Male, None))
            .await
            .unwrap();
        assert_eq!(count_persons(&db).await.unwrap(), 1);
    }
}
