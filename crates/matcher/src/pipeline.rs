//! Resumable standardization run.
//!
//! Each record key ends in exactly one terminal state: decided in a prior
//! run (skipped, never re-queried) or decided in this run. After every
//! decision the whole accumulator, the recomputed non-match report and the
//! checkpoint are written, so an interruption loses at most the record in
//! flight.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::MatchError;
use crate::key::RecordKey;
use crate::model::{AnnotatedRecord, Catalog, MatchOutcome, MatchStatus, RawRecord};
use crate::oracle::{MatchAdapter, Oracle};
use crate::store::{Checkpoint, OutputFiles, OutputStore};
use crate::summary::{aggregate_non_matches, RunStats};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Pause after each oracle call.
    pub rate_limit: Duration,
    /// Treat prior `api_error` / `exception` records as unprocessed.
    pub retry_failed: bool,
    /// Log a progress roll-up every N records (0 disables).
    pub progress_every: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rate_limit: Duration::from_millis(100),
            retry_failed: false,
            progress_every: 50,
        }
    }
}

/// Accumulated state of the session being extended.
#[derive(Debug)]
pub struct Session {
    pub files: OutputFiles,
    pub records: Vec<AnnotatedRecord>,
    pub processed: HashSet<RecordKey>,
    /// Prior failures dropped for retry.
    pub requeued: usize,
}

impl Session {
    /// Resume the checkpointed session, or start a fresh one.
    ///
    /// A fresh session gets a new timestamped output pair and its
    /// checkpoint is written immediately. Prior transport failures whose
    /// key is in `retry` are dropped so they get queued again; every other
    /// stored record is kept.
    pub fn open(store: &OutputStore, retry: Option<&HashSet<RecordKey>>) -> Result<Self, MatchError> {
        store.ensure_dir()?;

        if let Some(checkpoint) = store.load_checkpoint()? {
            let files = checkpoint.output_files;
            if let Some(mut records) = store.load_standardized(&files)? {
                let before = records.len();
                if let Some(retry) = retry {
                    records.retain(|r| {
                        !(r.product_match_status.is_transport_failure() && retry.contains(&r.key()))
                    });
                }
                let requeued = before - records.len();
                let processed = records.iter().map(AnnotatedRecord::key).collect();
                log::info!(
                    "resuming {}: {} records already processed",
                    files.standardized.display(),
                    records.len()
                );
                if requeued > 0 {
                    log::info!("re-queued {requeued} records that previously failed");
                }
                return Ok(Self { files, records, processed, requeued });
            }
            log::warn!(
                "checkpoint points at missing {}; starting a new session",
                files.standardized.display()
            );
        }

        let files = store.fresh_files();
        store.save_checkpoint(&Checkpoint::now(files.clone()))?;
        log::info!("starting new session: {}", files.standardized.display());
        Ok(Self { files, records: Vec::new(), processed: HashSet::new(), requeued: 0 })
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub stats: RunStats,
    pub files: OutputFiles,
    /// Every record in the session, prior and new.
    pub records: Vec<AnnotatedRecord>,
    /// Records that were already processed when the run started.
    pub resumed: usize,
    /// Unprocessed records found in the input (after de-duplication).
    pub pending: usize,
}

impl RunOutcome {
    pub fn already_complete(&self) -> bool {
        self.pending == 0
    }
}

pub struct Pipeline<'a> {
    store: OutputStore,
    catalog: &'a Catalog,
    oracle: &'a dyn Oracle,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: OutputStore, catalog: &'a Catalog, oracle: &'a dyn Oracle, options: PipelineOptions) -> Self {
        Self { store, catalog, oracle, options }
    }

    /// Process every input record whose key is not yet in the session.
    pub fn run(&self, input: &[RawRecord]) -> Result<RunOutcome, MatchError> {
        let retry: Option<HashSet<RecordKey>> =
            self.options.retry_failed.then(|| input.iter().map(RawRecord::key).collect());
        let mut session = Session::open(&self.store, retry.as_ref())?;
        let resumed = session.records.len();

        let mut queued: HashSet<RecordKey> = HashSet::new();
        let pending: Vec<&RawRecord> = input
            .iter()
            .filter(|r| {
                let key = r.key();
                !session.processed.contains(&key) && queued.insert(key)
            })
            .collect();

        log::info!("will process {} new records out of {} total", pending.len(), input.len());

        let mut stats = RunStats::default();
        if pending.is_empty() {
            log::info!("all records already processed");
            return Ok(RunOutcome {
                stats,
                files: session.files,
                records: session.records,
                resumed,
                pending: 0,
            });
        }

        let adapter = MatchAdapter::new(self.oracle, self.options.rate_limit);
        let total = resumed + pending.len();

        for (i, raw) in pending.iter().enumerate() {
            let position = resumed + i + 1;
            log::info!(
                "[{position}/{total}] Processing: {} | {}",
                raw.brand().unwrap_or("(no brand)"),
                raw.product().chars().take(30).collect::<String>()
            );

            let annotated = self.process(&adapter, raw);
            stats.record(annotated.product_match_status);

            session.processed.insert(annotated.key());
            session.records.push(annotated);

            let non_matches = aggregate_non_matches(&session.records);
            self.store.save_all(&session.files, &session.records, &non_matches)?;

            let every = self.options.progress_every;
            if every > 0 && (i + 1) % every == 0 {
                log::info!(
                    "progress: {position}/{total} (oracle calls: {}, errors: {}, skipped: {})",
                    stats.oracle_calls,
                    stats.exceptions + stats.api_errors,
                    stats.skipped_no_brand
                );
            }
        }

        Ok(RunOutcome {
            stats,
            files: session.files,
            records: session.records,
            resumed,
            pending: pending.len(),
        })
    }

    fn process(&self, adapter: &MatchAdapter<'_>, raw: &RawRecord) -> AnnotatedRecord {
        let outcome = match raw.brand() {
            Some(_) if !raw.product().is_empty() => {
                adapter.match_product(raw.product(), raw.brand(), raw.shade(), self.catalog)
            }
            Some(_) => MatchOutcome::unmatched(MatchStatus::EmptyInput),
            None => MatchOutcome::unmatched(MatchStatus::NoBrand),
        };
        AnnotatedRecord::new(raw.clone(), outcome)
    }
}
