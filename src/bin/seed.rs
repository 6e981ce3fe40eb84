//! Seed the database from a JSON graph file.
//!
//! File shape:
//! ```json
//! {
//!   "persons": [{ "person_id": "s", "first_name": "...", "gender": "M", ... }],
//!   "relationships": [
//!     { "person_id": "s", "related_person_id": "f", "relationship": "Father" }
//!   ]
//! }
//! ```
//! Each relationship entry means related_person is `relationship` to person;
//! the inverse edge is derived and written automatically.

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

use kinmatch::db::{migrate, Db};
use kinmatch::model::RelationshipLabel;
use kinmatch::store::{persons, relations};
use kinmatch::Config;

#[derive(Parser, Debug)]
#[command(name = "seed", about = "Import persons and relationships from a JSON file")]
struct Args {
    /// Path to the seed JSON file
    file: PathBuf,

    /// Delete all existing persons and relationships first
    #[arg(long)]
    reset: bool,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    persons: Vec<persons::NewPerson>,
    #[serde(default)]
    relationships: Vec<SeedRelationship>,
}

#[derive(Debug, Deserialize)]
struct SeedRelationship {
    person_id: String,
    related_person_id: String,
    relationship: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let db = Db::new(config.db_path());
    db.with_connection(|conn| migrate::run_migrations(conn)).await?;

    let content = std::fs::read_to_string(&args.file)?;
    let seed: SeedFile = serde_json::from_str(&content)?;

    if args.reset {
        log::info!("Clearing existing persons and relationships");
        db.with_connection(|conn| {
            conn.execute("DELETE FROM relationships", [])?;
            conn.execute("DELETE FROM persons", [])?;
            Ok(())
        })
        .await?;
    }

    let mut person_count = 0;
    for new_person in seed.persons {
        persons::create_person(&db, new_person).await?;
        person_count += 1;
    }

    let mut relationship_count = 0;
    for rel in seed.relationships {
        let label = RelationshipLabel::from_str(&rel.relationship)?;
        relations::add_relationship(&db, &rel.person_id, &rel.related_person_id, label).await?;
        relationship_count += 1;
    }

    println!(
        "Imported {} persons and {} relationship pairs from {}",
        person_count,
        relationship_count,
        args.file.display()
    );
    println!(
        "Database now holds {} persons, {} relationship rows",
        persons::count_persons(&db).await?,
        relations::count_relationships(&db).await?
    );

    Ok(())
}
