use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{Duration, Utc};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::catalog::Satellite;
use crate::propagation::PropagationContext;

use super::aggregate::{save_summary, summarize, AnalysisSummary};
use super::error::AnalysisError;
use super::scanner::{scan, ScanParams};
use super::scorer::RiskModel;
use super::types::{ConjunctionCandidate, PairOutcome, RiskLevel};

const MAX_TLE_AGE_DAYS: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Snapshot returned to polling callers. Progress counters are monotonically
/// non-decreasing for the duration of one run and `processed_pairs` never
/// exceeds `total_pairs`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobStatus {
    pub state: JobState,
    pub progress_percent: u8,
    pub processed_pairs: usize,
    pub total_pairs: usize,
    pub message: String,
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus {
            state: JobState::Idle,
            progress_percent: 0,
            processed_pairs: 0,
            total_pairs: 0,
            message: "idle".to_string(),
        }
    }
}

/// Everything one run needs, captured at start so the worker never touches
/// shared stores mid-run.
pub struct AnalysisRequest {
    pub user: Vec<Satellite>,
    pub catalog: Vec<Satellite>,
    pub model_path: PathBuf,
    pub params: ScanParams,
    /// Where to persist the summary after a successful run, if anywhere.
    pub results_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct Shared {
    status: JobStatus,
    summary: Option<AnalysisSummary>,
}

struct WorkerHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

/// Owns the single long-running analysis task: start, stop, progress
/// accounting, result caching, cancellation. Exactly one job runs at a time.
pub struct AnalysisController {
    shared: Arc<StdMutex<Shared>>,
    worker: Option<WorkerHandle>,
}

impl Default for AnalysisController {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisController {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(StdMutex::new(Shared::default())),
            worker: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.shared.lock().unwrap().status.clone()
    }

    /// The most recent completed run's results, if any.
    pub fn summary(&self) -> Option<AnalysisSummary> {
        self.shared.lock().unwrap().summary.clone()
    }

    /// Begin a run. Rejected with `Busy` while another run is in progress;
    /// a previous terminal state is cleared. Non-positive scan steps are
    /// rejected up front since the scan cursor would never advance.
    pub fn start(&mut self, request: AnalysisRequest) -> Result<(), AnalysisError> {
        if request.params.coarse_step <= Duration::zero()
            || request.params.fine_step <= Duration::zero()
        {
            return Err(AnalysisError::NonPositiveStep);
        }
        {
            let locked = self.shared.lock().unwrap();
            if locked.status.state == JobState::Running {
                return Err(AnalysisError::Busy);
            }
        }
        // Any previous worker already reached a terminal state.
        self.worker = None;

        let total = request.user.len() * request.catalog.len();
        {
            let mut locked = self.shared.lock().unwrap();
            locked.summary = None;
            locked.status = JobStatus {
                state: JobState::Running,
                progress_percent: 0,
                processed_pairs: 0,
                total_pairs: total,
                message: format!("0/{total} pairs"),
            };
        }

        let shared = self.shared.clone();
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_analysis(shared, request, stop_rx));
        self.worker = Some(WorkerHandle { stop_tx, join });
        Ok(())
    }

    /// Request cooperative cancellation and wait for the worker to reach a
    /// terminal state. Returns the state the job ended in.
    pub async fn stop(&mut self) -> JobState {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.join.await;
        }
        self.status().state
    }

    /// Return to a clean idle state indistinguishable from process start.
    /// Ignored while a run is in progress.
    pub fn reset(&mut self) {
        let mut locked = self.shared.lock().unwrap();
        if locked.status.state == JobState::Running {
            log::warn!("reset requested while a run is in progress, ignoring");
            return;
        }
        *locked = Shared::default();
    }
}

async fn run_analysis(
    shared: Arc<StdMutex<Shared>>,
    request: AnalysisRequest,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let model = match RiskModel::load(&request.model_path) {
        Ok(model) => model,
        Err(e) => {
            fail(&shared, format!("risk scoring unavailable: {e}"));
            return;
        }
    };
    if request.catalog.is_empty() {
        fail(&shared, "reference catalog is empty".to_string());
        return;
    }

    let now = Utc::now();
    let stale = request
        .user
        .iter()
        .chain(request.catalog.iter())
        .filter(|s| !s.tle.is_recent(now, MAX_TLE_AGE_DAYS))
        .count();
    if stale > 0 {
        log::warn!("{stale} element sets are older than {MAX_TLE_AGE_DAYS} days");
    }

    let user_ctx = build_contexts(&request.user);
    let catalog_ctx = build_contexts(&request.catalog);

    let mut candidates: Vec<ConjunctionCandidate> = Vec::new();
    let mut unscored = 0usize;

    let mut pairs = scan(&user_ctx, &catalog_ctx, &request.params);
    loop {
        // Cancellation is checked at pair boundaries only; a pair that has
        // started scanning runs to completion.
        if stop_rx.try_recv().is_ok() {
            cancel(&shared);
            return;
        }
        let Some(pair) = pairs.next() else { break };

        match pair.outcome {
            PairOutcome::Hit(hit) => {
                let score = model.score(&hit);
                candidates.push(ConjunctionCandidate {
                    user_satellite: request.user[pair.user].name.clone(),
                    catalog_satellite: request.catalog[pair.catalog].name.clone(),
                    time_of_closest_approach: hit.time_of_min,
                    min_distance_km: hit.min_distance_km,
                    relative_velocity_km_s: hit.relative_velocity_km_s,
                    risk_value: score.risk_value,
                    collision_probability: score.collision_probability,
                    risk_level: RiskLevel::from_probability(score.collision_probability),
                });
            }
            PairOutcome::Clear => {}
            PairOutcome::Unscored => unscored += 1,
        }

        {
            let mut locked = shared.lock().unwrap();
            let status = &mut locked.status;
            status.processed_pairs += 1;
            status.progress_percent = percent(status.processed_pairs, status.total_pairs);
            status.message = format!("{}/{} pairs", status.processed_pairs, status.total_pairs);
        }
        tokio::task::yield_now().await;
    }

    let (total, threshold) = {
        let locked = shared.lock().unwrap();
        (locked.status.total_pairs, request.params.threshold_km)
    };
    let summary = summarize(candidates, total, unscored, threshold);

    if let Some(path) = &request.results_path {
        if let Err(e) = save_summary(path, &summary) {
            log::warn!("failed to persist results to {}: {}", path.display(), e);
        }
    }

    log::info!(
        "analysis complete: {} pairs, {} conjunctions, {} unscored",
        summary.total_pairs,
        summary.conjunction_count,
        summary.unscored_pairs
    );

    let mut locked = shared.lock().unwrap();
    locked.status.state = JobState::Completed;
    locked.status.progress_percent = 100;
    locked.status.message = format!(
        "analysis complete: {}/{} pairs",
        locked.status.processed_pairs, locked.status.total_pairs
    );
    locked.summary = Some(summary);
}

fn build_contexts(satellites: &[Satellite]) -> Vec<Option<PropagationContext>> {
    satellites
        .iter()
        .map(|sat| match PropagationContext::from_satellite(sat) {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                log::warn!("satellite '{}' cannot be propagated: {}", sat.name, e);
                None
            }
        })
        .collect()
}

fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        0
    } else {
        ((processed * 100) / total) as u8
    }
}

fn fail(shared: &Arc<StdMutex<Shared>>, message: String) {
    log::error!("analysis failed: {message}");
    let mut locked = shared.lock().unwrap();
    locked.status.state = JobState::Failed;
    locked.status.message = message;
    locked.summary = None;
}

fn cancel(shared: &Arc<StdMutex<Shared>>) {
    // Partial results are discarded, not partially reported.
    log::info!("analysis cancelled");
    let mut locked = shared.lock().unwrap();
    locked.status.state = JobState::Cancelled;
    locked.status.message = "analysis cancelled".to_string();
    locked.summary = None;
}
