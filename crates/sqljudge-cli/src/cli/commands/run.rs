use super::super::args::RunArgs;
use super::logging::init_tracing;
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use sqljudge_core::{load_config, Pipeline, RunSummary};
use tracing::{info, warn};

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let path = &args.config.config;
    let cfg = load_config(path)
        .with_context(|| format!("failed to load configuration {}", path.display()))?;
    init_tracing(&cfg.logging)?;

    let pipeline = Pipeline::from_config(&cfg).context("failed to create pipeline")?;

    let summary = if args.once {
        pipeline.run_once().await
    } else {
        let handle = pipeline.stop_handle();
        tokio::spawn(async move {
            wait_for_shutdown().await;
            handle.stop();
        });
        pipeline.start().await
    };

    print_summary(&summary);
    Ok(SUCCESS)
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM, waiting for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}

fn print_summary(summary: &RunSummary) {
    println!(
        "checked {} submission(s), {} not persisted",
        summary.processed, summary.persist_failures
    );
    for (verdict, count) in &summary.verdicts {
        println!("  {:<24} {}", verdict.as_str(), count);
    }
}
