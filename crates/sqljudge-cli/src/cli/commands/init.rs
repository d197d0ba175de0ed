use super::super::args::ConfigArgs;
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use sqljudge_core::load_config;
use sqljudge_core::storage::{Database, SqliteJudgeStore};
use std::sync::Arc;

pub fn run(args: ConfigArgs) -> anyhow::Result<i32> {
    let cfg = load_config(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config.display()))?;
    if cfg.main_db.read_only {
        anyhow::bail!("main_db is configured read-only; cannot create tables");
    }

    let db = Database::create("main", &cfg.main_db)?;
    let store = SqliteJudgeStore::new(db, Arc::new(cfg.catalog.clone()));
    store
        .init_schema()
        .context("failed to create judge tables")?;

    println!("initialized judge tables in {}", cfg.main_db.path.display());
    Ok(SUCCESS)
}
