use rusqlite::{params, Connection};

use crate::error::Result;

/// Migrations are embedded at compile time so binaries don't depend on a
/// migrations directory at runtime. Keep this list sorted by version.
const MIGRATIONS: &[(u32, &str, &str)] = &[
    (
        1,
        "001_core_tables",
        include_str!("../../migrations/001_core_tables.sql"),
    ),
    (
        2,
        "002_indexes",
        include_str!("../../migrations/002_indexes.sql"),
    ),
];

/// Create schema_migrations table if it doesn't exist
fn ensure_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get list of applied migration names
pub fn get_applied_migrations(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM schema_migrations ORDER BY version")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(names)
}

/// Run all pending migrations
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    ensure_migrations_table(conn)?;

    let applied = get_applied_migrations(conn)?;

    for &(version, name, sql) in MIGRATIONS {
        if applied.iter().any(|a| a.as_str() == name) {
            log::debug!("Migration {} already applied, skipping", name);
            continue;
        }

        log::info!("Applying migration: {} (version {})", name, version);

        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![version, name],
        )?;
        tx.commit()?;
    }

    log::debug!("All migrations applied");
    Ok(())
}
