use anyhow::Result;
use kinmatch::db::{migrate, Db};
use kinmatch::http::HttpServer;
use kinmatch::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger from environment variable or default to info level
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("verify");

    match command {
        "serve" => run_server().await?,
        "verify" | _ => run_schema_verification().await?,
    }

    Ok(())
}

/// Run the HTTP API server
async fn run_server() -> Result<()> {
    log::info!("Starting kinmatch HTTP server v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    if !config.http_server.enabled {
        anyhow::bail!("http_server.enabled is false in config.toml; enable it to serve");
    }

    let db = Db::new(config.db_path());
    db.with_connection(|conn| migrate::run_migrations(conn)).await?;
    log::info!("Database initialized successfully");

    let server = HttpServer::new(db, config)?;
    server.run().await?;

    Ok(())
}

/// Run database schema verification
async fn run_schema_verification() -> Result<()> {
    log::info!("Starting kinmatch v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    log::info!("Database path: {}", config.db_path().display());
    log::info!(
        "Matching: default depth {}, ceiling {}, strict {}",
        config.matching.default_max_depth,
        config.matching.max_depth_ceiling,
        config.matching.strict_depth
    );

    let db = Db::new(config.db_path());
    db.with_connection(|conn| migrate::run_migrations(conn)).await?;
    verify_database_schema(&db).await?;

    log::info!("Database ready");
    Ok(())
}

/// Verify that all expected database objects exist
async fn verify_database_schema(db: &Db) -> Result<()> {
    use kinmatch::KinmatchError;

    db.with_connection(|conn| {
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;

        for table in ["persons", "relationships", "schema_migrations"] {
            if !tables.iter().any(|t| t == table) {
                return Err(KinmatchError::Config(format!("Missing table: {}", table)));
            }
            log::debug!("Table exists: {}", table);
        }

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%'")?;
        let indexes: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        for index in ["idx_relationships_person", "idx_relationships_person_label"] {
            if !indexes.iter().any(|i| i == index) {
                log::warn!("Index not found: {} (migration 002 may not be applied)", index);
            }
        }

        let journal_mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if journal_mode.to_uppercase() != "WAL" {
            return Err(KinmatchError::Config(format!(
                "Journal mode is not WAL: {}",
                journal_mode
            )));
        }

        let foreign_keys: i32 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        if foreign_keys != 1 {
            return Err(KinmatchError::Config("Foreign keys not enabled".to_string()));
        }

        let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        if integrity != "ok" {
            return Err(KinmatchError::Config(format!(
                "Database integrity check failed: {}",
                integrity
            )));
        }

        Ok(())
    })
    .await?;

    log::info!("Database schema verification complete");
    Ok(())
}
