use super::super::args::ConfigArgs;
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use sqljudge_core::load_config;

pub fn run(args: ConfigArgs) -> anyhow::Result<i32> {
    let cfg = load_config(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config.display()))?;

    println!("config OK: {}", args.config.display());
    println!("  main_db: {}", cfg.main_db.path.display());
    for (name, db) in &cfg.selection_dbs {
        let mode = if db.read_only { "read-only" } else { "read-write" };
        println!("  selection_db {}: {} ({})", name, db.path.display(), mode);
    }
    println!("  fetch_period_ms: {}", cfg.checking.fetch_period_ms);
    Ok(SUCCESS)
}
