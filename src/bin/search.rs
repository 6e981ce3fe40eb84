use kinmatch::matchsearch::{find_matches, MatchRequest};
use kinmatch::{db::migrate, db::Db, Config};
use std::time::Instant;

/// Parse CLI args: first positional is the seeker id, flags tune the filters.
fn parse_search_args() -> anyhow::Result<MatchRequest> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut seeker = None;
    let mut gender = "F".to_string();
    let mut birth_year_min = None;
    let mut birth_year_max = None;
    let mut max_depth = None;
    let mut prune = true;
    let mut exclude_sub_category_ids = Vec::new();
    let mut include_religion_ids = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--gender" => {
                gender = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--gender requires a value"))?
                    .clone();
            }
            "--min-year" => {
                birth_year_min = Some(
                    iter.next()
                        .ok_or_else(|| anyhow::anyhow!("--min-year requires a value"))?
                        .parse()?,
                );
            }
            "--max-year" => {
                birth_year_max = Some(
                    iter.next()
                        .ok_or_else(|| anyhow::anyhow!("--max-year requires a value"))?
                        .parse()?,
                );
            }
            "--depth" => {
                max_depth = Some(
                    iter.next()
                        .ok_or_else(|| anyhow::anyhow!("--depth requires a value"))?
                        .parse()?,
                );
            }
            "--exclude-gotra" => {
                exclude_sub_category_ids.push(
                    iter.next()
                        .ok_or_else(|| anyhow::anyhow!("--exclude-gotra requires a value"))?
                        .clone(),
                );
            }
            "--religion" => {
                include_religion_ids.push(
                    iter.next()
                        .ok_or_else(|| anyhow::anyhow!("--religion requires a value"))?
                        .clone(),
                );
            }
            "--no-prune" => prune = false,
            other if other.starts_with("--") => {
                anyhow::bail!("Unknown flag: {}", other);
            }
            positional => {
                if seeker.is_none() {
                    seeker = Some(positional.to_string());
                }
            }
        }
    }

    let seeker = seeker.ok_or_else(|| {
        anyhow::anyhow!(
            "Usage: search <seeker-id> [--gender M|F] [--min-year N] [--max-year N] \
             [--depth N] [--religion ID]... [--exclude-gotra ID]... [--no-prune]"
        )
    })?;

    Ok(MatchRequest {
        seeker_person_id: seeker,
        target_gender_code: gender,
        birth_year_min,
        birth_year_max,
        include_religion_ids,
        include_category_ids: vec![],
        include_sub_category_ids: vec![],
        exclude_sub_category_ids,
        max_depth,
        prune_graph: Some(prune),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::load()?;
    let db = Db::new(config.db_path());
    db.with_connection(|conn| migrate::run_migrations(conn)).await?;

    let request = parse_search_args()?;

    let start = Instant::now();
    let response = find_matches(&db, &config.matching, &request).await?;
    let duration = start.elapsed();

    println!("\nMatch search for seeker: {}", response.seeker_id);
    println!("{:-<70}", "");

    if response.matches.is_empty() {
        println!("No matches found.");
    } else {
        for match_id in &response.matches {
            let node = &response.exploration_graph[match_id];
            println!(
                "{} {} ({}, born {})",
                node.first_name,
                node.last_name,
                node.person_id,
                node.birth_year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "?".to_string())
            );

            // walk the from_person chain back to the seeker; each step is
            // annotated with what that person is to the previous one
            let mut chain = Vec::new();
            let mut current = node;
            loop {
                match &current.from_person {
                    Some(from) => {
                        chain.push(format!("{} ({})", current.person_id, from.relationship));
                        current = &response.exploration_graph[&from.person_id];
                    }
                    None => {
                        chain.push(current.person_id.clone());
                        break;
                    }
                }
            }
            chain.reverse();
            println!("  path: {}", chain.join(" -> "));
        }
    }

    println!("{:-<70}", "");
    println!("Matches: {}", response.total_matches);
    println!("Nodes returned: {}", response.exploration_graph.len());
    println!("Latency: {:?}", duration);

    Ok(())
}
