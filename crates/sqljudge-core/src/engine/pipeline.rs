use super::provider::{spawn_provider, InFlight, TickMode};
use super::stage::spawn_stage;
use crate::checkers::{Checker, RestrictionChecker, SelectionChecker};
use crate::config::Config;
use crate::model::{Submission, Verdict};
use crate::storage::{
    Database, JudgeStore, QueryCatalog, SelectionPool, SelectionRunner, SqliteJudgeStore,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// What one `start`/`run_once` call processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub persist_failures: usize,
    pub verdicts: BTreeMap<Verdict, usize>,
}

impl RunSummary {
    fn record(&mut self, verdict: Verdict, persisted: bool) {
        self.processed += 1;
        if !persisted {
            self.persist_failures += 1;
        }
        *self.verdicts.entry(verdict).or_default() += 1;
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.verdicts.get(&verdict).copied().unwrap_or_default()
    }
}

/// Stops a pipeline from anywhere. Cloneable, and calling `stop` more than
/// once or after the pipeline finished is harmless.
#[derive(Clone, Debug)]
pub struct StopHandle {
    token: CancellationToken,
}

impl StopHandle {
    pub fn stop(&self) {
        if !self.token.is_cancelled() {
            info!("pipeline stop requested");
        }
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Provider → restriction → selection → verdict write-back.
pub struct Pipeline {
    store: Arc<dyn JudgeStore>,
    restriction: Arc<dyn Checker>,
    selection: Arc<dyn Checker>,
    fetch_period: Duration,
    stop: CancellationToken,
}

impl Pipeline {
    /// Open every configured database and wire the default checkers.
    ///
    /// The config is expected to be validated already (see
    /// [`crate::config::load_config`]).
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let catalog = Arc::new(cfg.catalog.clone());
        let main = Database::open("main", &cfg.main_db)?;
        let store: Arc<dyn JudgeStore> = Arc::new(SqliteJudgeStore::new(main, catalog.clone()));

        let mut pool = SelectionPool::new();
        for (name, db_cfg) in &cfg.selection_dbs {
            pool.insert(Database::open(name.as_str(), db_cfg)?);
        }
        info!(
            selection_dbs = ?pool.names().collect::<Vec<_>>(),
            "opened databases"
        );

        Ok(Self::new(
            store,
            Arc::new(pool),
            catalog,
            cfg.checking.fetch_period(),
        ))
    }

    pub fn new(
        store: Arc<dyn JudgeStore>,
        runner: Arc<dyn SelectionRunner>,
        catalog: Arc<QueryCatalog>,
        fetch_period: Duration,
    ) -> Self {
        let restriction = Arc::new(RestrictionChecker::new(store.clone()));
        let selection = Arc::new(SelectionChecker::new(store.clone(), runner, catalog));
        Self::with_checkers(store, restriction, selection, fetch_period)
    }

    pub fn with_checkers(
        store: Arc<dyn JudgeStore>,
        restriction: Arc<dyn Checker>,
        selection: Arc<dyn Checker>,
        fetch_period: Duration,
    ) -> Self {
        Self {
            store,
            restriction,
            selection,
            fetch_period,
            stop: CancellationToken::new(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            token: self.stop.clone(),
        }
    }

    /// Signal shutdown and return immediately.
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    /// Poll and check until [`Pipeline::stop`] is called and every emitted
    /// submission has been persisted.
    pub async fn start(&self) -> RunSummary {
        self.run(TickMode::Continuous).await
    }

    /// Check the submissions pending right now, then return.
    pub async fn run_once(&self) -> RunSummary {
        self.run(TickMode::Once).await
    }

    async fn run(&self, mode: TickMode) -> RunSummary {
        info!(?mode, "pipeline started");

        let in_flight = InFlight::default();
        let submissions = spawn_provider(
            self.store.clone(),
            self.fetch_period,
            mode,
            self.stop.clone(),
            in_flight.clone(),
        );
        let restricted = spawn_stage(self.restriction.clone(), submissions);
        let mut checked = spawn_stage(self.selection.clone(), restricted);

        let mut summary = RunSummary::default();
        while let Some(submission) = checked.recv().await {
            let id = submission.id;
            let verdict = submission.status;
            let persisted = self.persist(submission).await;
            summary.record(verdict, persisted);
            in_flight.release(id);
        }

        info!(
            processed = summary.processed,
            persist_failures = summary.persist_failures,
            "pipeline stopped"
        );
        summary
    }

    async fn persist(&self, submission: Submission) -> bool {
        let id = submission.id;
        let verdict = submission.status;
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.update_submission(&submission)).await {
            Ok(Ok(())) => {
                info!(submission_id = id, %verdict, "submission checked");
                true
            }
            Ok(Err(e)) => {
                error!(submission_id = id, error = %e, "failed to update submission");
                false
            }
            Err(e) => {
                error!(submission_id = id, error = %e, "submission update task failed");
                false
            }
        }
    }
}
