use crate::app::import_use_case::{BatchSummary, ImportUseCase};
use crate::common::error::{ImportError, Result};
use std::sync::Arc;
use tracing::{error, info, Instrument};

/// Aggregate outcome of one coordinated import run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportSummary {
    pub workers: u32,
    pub addresses: usize,
    pub connections: usize,
    pub stations: usize,
}

impl ImportSummary {
    fn absorb(&mut self, batch: BatchSummary) {
        self.addresses += batch.addresses;
        self.connections += batch.connections;
        self.stations += batch.stations;
    }
}

/// Fans out `concurrency` workers, each running one batch pass, and joins
/// their outcomes. The first failure becomes the run's error, but siblings
/// already in flight are not cancelled: their commits stand and their
/// results are discarded. A worker that panics or is aborted surfaces as a
/// distinguished "stopped unexpectedly" failure.
pub struct ImportCoordinator {
    use_case: Arc<ImportUseCase>,
    concurrency: u32,
    batch_size: u32,
}

impl ImportCoordinator {
    pub fn new(use_case: Arc<ImportUseCase>, concurrency: u32, batch_size: u32) -> Self {
        Self {
            use_case,
            concurrency,
            batch_size,
        }
    }

    pub async fn run(&self) -> Result<ImportSummary> {
        info!(
            concurrency = self.concurrency,
            batch_size = self.batch_size,
            "starting concurrent import"
        );

        let handles: Vec<_> = (0..self.concurrency)
            .map(|worker_id| {
                let use_case = Arc::clone(&self.use_case);
                let batch_size = self.batch_size;
                let span = tracing::info_span!("import_worker", worker = worker_id);
                tokio::spawn(
                    async move { use_case.run_batch(batch_size).await }.instrument(span),
                )
            })
            .collect();

        let mut summary = ImportSummary {
            workers: self.concurrency,
            ..Default::default()
        };
        let mut first_error: Option<ImportError> = None;

        // Join every worker; no cancellation on first failure.
        for (worker_id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(batch)) => summary.absorb(batch),
                Ok(Err(e)) => {
                    error!(worker = worker_id, "worker failed: {e}");
                    first_error.get_or_insert(e);
                }
                Err(join_err) => {
                    error!(worker = worker_id, "worker stopped unexpectedly: {join_err}");
                    first_error.get_or_insert(ImportError::Worker(format!(
                        "worker {worker_id} stopped unexpectedly: {join_err}"
                    )));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(
                    workers = summary.workers,
                    stations = summary.stations,
                    "import completed"
                );
                Ok(summary)
            }
        }
    }
}
