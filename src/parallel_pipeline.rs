use crate::core_modules::{
    border_tracer::border_tracer,
    color_binner::{ColorBinKey, ColorBins, QuantizationSteps},
    component_extractor::ComponentExtractor,
    error::{ShadowError, ShadowResult},
    lab_planes::{LabPlanes, PixelCoordinate},
    observer::{BinObserver, BinReport},
    shadow_classifier::ShadowClassifier,
    shadow_points::ShadowPointSet,
};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, mpsc};

/// How bin tasks are handed to workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheduling {
    /// A fixed set of long-lived workers drains one bounded queue. A worker picks
    /// up the next bin as soon as it finishes the previous one.
    #[default]
    ContinuousRefill,
    /// Up to `worker_count` bins are launched together and the whole batch must
    /// finish before the next one starts.
    Waves,
}

/// Everything a bin task reads, plus the one collection it writes.
pub struct BinContext {
    pub planes: Arc<LabPlanes>,
    pub steps: QuantizationSteps,
    pub extractor: ComponentExtractor,
    pub observer: Arc<dyn BinObserver>,
    pub shadow_points: Arc<ShadowPointSet>,
}

/// A color bin waiting to be processed.
#[derive(Debug, Clone)]
pub struct BinTask {
    pub key: ColorBinKey,
    pub pixels: Vec<PixelCoordinate>,
}

/// A bin that could not be processed. It contributed no shadow pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinFailure {
    pub key: ColorBinKey,
    pub error: ShadowError,
}

/// Per-bin results of one pool run.
#[derive(Debug, Clone, Default)]
pub struct PoolSummary {
    pub reports: Vec<BinReport>,
    pub failures: Vec<BinFailure>,
}

impl PoolSummary {
    fn record(&mut self, outcome: Result<BinReport, BinFailure>) {
        match outcome {
            Ok(report) => self.reports.push(report),
            Err(failure) => self.failures.push(failure),
        }
    }

    fn merge(&mut self, other: PoolSummary) {
        self.reports.extend(other.reports);
        self.failures.extend(other.failures);
    }
}

/// Extracts, traces and classifies every component of one bin, appending shadow
/// components to the shared set. All components are extracted and validated before
/// the first append, so a failing bin never leaves partial output behind.
pub fn process_bin(
    context: &BinContext,
    key: ColorBinKey,
    pixels: &[PixelCoordinate],
) -> ShadowResult<BinReport> {
    let start = Instant::now();
    let (width, height) = context.planes.dimensions();

    let components = context.extractor.extract(pixels, width, height)?;
    let classifier = ShadowClassifier::new(&context.planes, &context.steps);

    let mut shadow_component_count = 0;
    let mut shadow_pixel_count = 0;
    for component in &components {
        let border = border_tracer::trace_border(&component.pixels, width, height);
        if classifier.is_shadow(key, &border) {
            context.shadow_points.append_component(&component.pixels);
            shadow_component_count += 1;
            shadow_pixel_count += component.len();
        }
    }

    Ok(BinReport {
        key,
        pixel_count: pixels.len(),
        component_count: components.len(),
        shadow_component_count,
        shadow_pixel_count,
        elapsed: start.elapsed(),
    })
}

/// Runs bin tasks with at most `worker_count` of them in flight.
///
/// A panic inside a bin task, including one raised by the observer, never
/// propagates to the caller. The remaining bins still run, and the whole call then
/// returns `ShadowError::WorkerPanicked`. Both scheduling policies behave the same.
#[derive(Debug, Clone)]
pub struct BinWorkerPool {
    worker_count: usize,
    scheduling: Scheduling,
}

impl BinWorkerPool {
    pub fn new(worker_count: usize, scheduling: Scheduling) -> ShadowResult<Self> {
        if worker_count == 0 {
            return Err(ShadowError::InvalidWorkerCount);
        }
        Ok(Self {
            worker_count,
            scheduling,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn scheduling(&self) -> Scheduling {
        self.scheduling
    }

    /// Processes every bin exactly once. Bins are dispatched in key order.
    pub async fn run(
        &self,
        bins: ColorBins,
        context: Arc<BinContext>,
    ) -> ShadowResult<PoolSummary> {
        let mut tasks: Vec<BinTask> = bins
            .into_iter()
            .map(|(key, pixels)| BinTask { key, pixels })
            .collect();
        tasks.sort_unstable_by_key(|task| task.key);

        let observer = context.observer.clone();
        let job = move |task: BinTask| execute(context.clone(), task);
        self.run_with(tasks, job, observer.as_ref()).await
    }

    /// Drives `job` over `tasks` under the pool's scheduling policy.
    async fn run_with<J, F>(
        &self,
        tasks: Vec<BinTask>,
        job: J,
        observer: &dyn BinObserver,
    ) -> ShadowResult<PoolSummary>
    where
        J: Fn(BinTask) -> F + Clone + Send + Sync + 'static,
        F: Future<Output = Result<BinReport, BinFailure>> + Send + 'static,
    {
        match self.scheduling {
            Scheduling::ContinuousRefill => self.run_continuous(tasks, job, observer).await,
            Scheduling::Waves => self.run_waves(tasks, job).await,
        }
    }

    async fn run_continuous<J, F>(
        &self,
        tasks: Vec<BinTask>,
        job: J,
        observer: &dyn BinObserver,
    ) -> ShadowResult<PoolSummary>
    where
        J: Fn(BinTask) -> F + Clone + Send + Sync + 'static,
        F: Future<Output = Result<BinReport, BinFailure>> + Send + 'static,
    {
        let (task_sender, task_receiver) = mpsc::channel::<BinTask>(self.worker_count);
        let task_receiver = Arc::new(Mutex::new(task_receiver));

        let mut workers = Vec::with_capacity(self.worker_count);
        for _ in 0..self.worker_count {
            let receiver = task_receiver.clone();
            let job = job.clone();
            let worker = tokio::spawn(async move {
                let mut summary = PoolSummary::default();
                loop {
                    let next = receiver.lock().await.recv().await;
                    let Some(task) = next else { break };
                    summary.record(job(task).await);
                }
                summary
            });
            workers.push(worker);
        }
        drop(task_receiver);

        let mut summary = PoolSummary::default();
        let mut pending = tasks.into_iter();
        while let Some(task) = pending.next() {
            if let Err(mpsc::error::SendError(task)) = task_sender.send(task).await {
                // Every worker is gone. Report what could not be dispatched.
                for lost in std::iter::once(task).chain(pending.by_ref()) {
                    let failure = BinFailure {
                        key: lost.key,
                        error: ShadowError::worker_panicked("no bin worker left"),
                    };
                    observer.bin_failed(failure.key, &failure.error);
                    summary.failures.push(failure);
                }
                break;
            }
        }
        drop(task_sender);

        let mut panicked: Option<ShadowError> = None;
        for joined in join_all(workers).await {
            match joined {
                Ok(worker_summary) => summary.merge(worker_summary),
                Err(e) => {
                    panicked.get_or_insert_with(|| ShadowError::worker_panicked(e.to_string()));
                }
            }
        }
        panicked.map_or(Ok(summary), Err)
    }

    async fn run_waves<J, F>(&self, tasks: Vec<BinTask>, job: J) -> ShadowResult<PoolSummary>
    where
        J: Fn(BinTask) -> F + Clone + Send + Sync + 'static,
        F: Future<Output = Result<BinReport, BinFailure>> + Send + 'static,
    {
        let mut summary = PoolSummary::default();
        let mut panicked: Option<ShadowError> = None;
        let mut pending = tasks.into_iter().peekable();
        while pending.peek().is_some() {
            let wave: Vec<_> = pending
                .by_ref()
                .take(self.worker_count)
                .map(|task| tokio::spawn(job(task)))
                .collect();
            for joined in join_all(wave).await {
                match joined {
                    Ok(outcome) => summary.record(outcome),
                    Err(e) => {
                        panicked
                            .get_or_insert_with(|| ShadowError::worker_panicked(e.to_string()));
                    }
                }
            }
        }
        panicked.map_or(Ok(summary), Err)
    }
}

/// Runs one bin on the blocking pool and notifies the observer.
async fn execute(context: Arc<BinContext>, task: BinTask) -> Result<BinReport, BinFailure> {
    let key = task.key;
    let worker_context = context.clone();
    let joined = tokio::task::spawn_blocking(move || {
        process_bin(&worker_context, task.key, &task.pixels)
    })
    .await;
    let result = joined.unwrap_or_else(|e| Err(ShadowError::worker_panicked(e.to_string())));

    match result {
        Ok(report) => {
            context.observer.bin_completed(&report);
            Ok(report)
        }
        Err(error) => {
            context.observer.bin_failed(key, &error);
            Err(BinFailure { key, error })
        }
    }
}
