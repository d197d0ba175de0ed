use super::stage::STAGE_CAPACITY;
use crate::model::Submission;
use crate::storage::JudgeStore;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickMode {
    /// Poll every period until stopped. The first tick fires one period in.
    Continuous,
    /// Emit one batch immediately, then close.
    Once,
}

/// Ids emitted by the provider and not yet persisted by the orchestrator.
///
/// A slow pipeline must not see the same pending row twice just because it
/// was still pending in the database when the next tick fired.
#[derive(Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<i64>>>,
}

impl InFlight {
    /// `false` if `id` is already in the pipeline.
    pub fn claim(&self, id: i64) -> bool {
        match self.ids.lock() {
            Ok(mut ids) => ids.insert(id),
            Err(poisoned) => poisoned.into_inner().insert(id),
        }
    }

    pub fn release(&self, id: i64) {
        match self.ids.lock() {
            Ok(mut ids) => ids.remove(&id),
            Err(poisoned) => poisoned.into_inner().remove(&id),
        };
    }

    pub fn len(&self) -> usize {
        self.ids.lock().map(|ids| ids.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Spawn the polling source that feeds the first checker stage.
///
/// `stop` is only looked at when a tick starts; a batch that is already
/// being emitted is emitted in full.
pub fn spawn_provider(
    store: Arc<dyn JudgeStore>,
    period: Duration,
    mode: TickMode,
    stop: CancellationToken,
    in_flight: InFlight,
) -> mpsc::Receiver<Submission> {
    let (tx, submissions) = mpsc::channel(STAGE_CAPACITY);

    tokio::spawn(async move {
        let start = match mode {
            TickMode::Continuous => Instant::now() + period,
            TickMode::Once => Instant::now(),
        };
        let mut ticker = interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        'ticks: loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            for submission in fetch_batch(&store).await {
                if !in_flight.claim(submission.id) {
                    debug!(submission_id = submission.id, "submission already in pipeline");
                    continue;
                }
                if tx.send(submission).await.is_err() {
                    break 'ticks;
                }
            }

            if mode == TickMode::Once {
                break;
            }
        }
        info!("stopped submission provider");
    });

    info!(period_ms = period.as_millis() as u64, "started submission provider");
    submissions
}

async fn fetch_batch(store: &Arc<dyn JudgeStore>) -> Vec<Submission> {
    let store = Arc::clone(store);
    let fetched = tokio::task::spawn_blocking(move || store.fetch_pending_submissions()).await;

    let batch = match fetched {
        Ok(Ok(batch)) => batch,
        Ok(Err(e)) => {
            error!(error = %e, "failed to fetch unchecked submissions");
            return Vec::new();
        }
        Err(e) => {
            error!(error = %e, "submission fetch task failed");
            return Vec::new();
        }
    };

    batch
        .into_iter()
        .filter_map(|row| match row {
            Ok(submission) => Some(submission),
            Err(e) => {
                error!(error = %e, "failed to decode submission row");
                None
            }
        })
        .collect()
}
