use kinmatch::db::{migrate, Db};
use kinmatch::error::KinmatchError;
use kinmatch::store::{persons, relations};
use kinmatch::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    let db = Db::new(config.db_path());
    db.with_connection(|conn| migrate::run_migrations(conn)).await?;

    println!("\n=== Kinmatch Graph Statistics ===");
    println!("Generated: {}\n", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

    let person_count = persons::count_persons(&db).await?;
    let relationship_count = relations::count_relationships(&db).await?;

    println!("Persons:            {}", person_count);
    println!("Relationship rows:  {}", relationship_count);
    if person_count > 0 {
        println!(
            "Avg edges/person:   {:.2}",
            relationship_count as f64 / person_count as f64
        );
    }

    let living: i64 = db
        .with_connection(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM persons WHERE death_year IS NULL",
                [],
                |row| row.get(0),
            )
            .map_err(KinmatchError::from)
        })
        .await?;
    println!("Living persons:     {}", living);

    let distribution = relations::label_distribution(&db).await?;
    if !distribution.is_empty() {
        println!("\nRelationship label distribution:");
        println!("{:-<40}", "");
        println!("{:<20} {:>10}", "Label", "Count");
        println!("{:-<40}", "");
        for (label, count) in &distribution {
            println!("{:<20} {:>10}", label, count);
        }
        println!("{:-<40}", "");
    }

    println!();
    Ok(())
}
