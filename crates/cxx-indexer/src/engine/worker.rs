//! The single writer. Drains the job queue, re-parses units through the
//! front-end with the shared lock released, publishes include edges, then
//! rebuilds the name index for everything the batch touched.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::engine::queue::IndexJob;
use crate::engine::state::EngineState;
use crate::engine::{Inner, Shared};
use crate::frontend::{BuildConfig, FrontEnd, MacroEnv, ParseOutcome};
use crate::progress::BatchProgress;

pub(crate) fn run(shared: Arc<Shared>) {
    let mut inner = shared.lock();
    assert!(
        matches!(inner.machine.state(), EngineState::Starting | EngineState::Indexing),
        "worker started in state {}",
        inner.machine.state()
    );
    if inner.queue.is_empty() {
        shared.set_state(&mut inner, EngineState::Idle);
    }

    loop {
        while inner.queue.is_empty() && !inner.shutdown {
            assert_eq!(inner.machine.state(), EngineState::Idle, "worker parked outside idle");
            inner = shared.jobs_available.wait(inner).unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        if inner.shutdown {
            debug!("indexer worker shutting down");
            return;
        }

        let mut batch: HashSet<PathBuf> = HashSet::new();
        let mut progress = BatchProgress::start(shared.progress_every);
        shared.set_state(&mut inner, EngineState::Indexing);

        while let Some(job) = inner.queue.pop() {
            let envs: Vec<(BuildConfig, Arc<MacroEnv>)> = job
                .effective_builds()
                .into_iter()
                .map(|config| {
                    let env = inner.define_cache.get_or_insert(&config, &job.path);
                    (config, env)
                })
                .collect();
            drop(inner);

            let outcomes = process_job(shared.front_end.as_ref(), &job, &envs);

            inner = shared.lock();
            let local_files = publish(&mut inner, &job, &outcomes, &mut batch);
            let remaining = inner.queue.len();
            if let Some(line) = progress.job_done(&job.path, remaining, local_files) {
                info!("{line}");
            }
            if remaining == 0 {
                info!("{}", progress.finish());
            }
            if inner.shutdown {
                return;
            }
        }

        shared.set_state(&mut inner, EngineState::CollectingNames);
        assert!(inner.queue.is_empty(), "collecting names with jobs queued");
        let names = inner.names.clone();
        drop(inner);

        let snapshot = shared.front_end.snapshot();
        let documents: Vec<_> = batch
            .iter()
            .filter_map(|path| {
                let document = snapshot.get(path);
                if document.is_none() {
                    error!("no document for {} while collecting names", path.display());
                }
                document
            })
            .collect();
        let next = names.rebuild(&batch, documents.iter().map(|document| document.as_ref()));
        debug!("name index rebuilt: {} keys after {} files", next.len(), batch.len());

        inner = shared.lock();
        inner.names = Arc::new(next);
        if !inner.queue.is_empty() {
            continue;
        }
        shared.set_state(&mut inner, EngineState::Idle);
    }
}

/// Parses the job once per configuration. A failed configuration is logged
/// and leaves the previous documents in place.
fn process_job(
    front_end: &dyn FrontEnd,
    job: &IndexJob,
    envs: &[(BuildConfig, Arc<MacroEnv>)],
) -> Vec<ParseOutcome> {
    envs.iter()
        .filter_map(|(config, env)| match front_end.parse_or_update(&job.path, config, env) {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                warn!("{err}");
                None
            },
        })
        .collect()
}

/// Records include edges and touched paths. Returns how many files the
/// unit pulled in, itself included.
fn publish(
    inner: &mut Inner,
    job: &IndexJob,
    outcomes: &[ParseOutcome],
    batch: &mut HashSet<PathBuf>,
) -> usize {
    batch.insert(job.path.clone());
    let mut local: HashSet<&PathBuf> = HashSet::from([&job.path]);
    for outcome in outcomes {
        for (included, includer) in &outcome.includes {
            inner.include_graph.record(included.clone(), includer.clone());
        }
        for document in &outcome.documents {
            batch.insert(document.path().to_path_buf());
        }
        if let Some(unit) = outcome.unit() {
            local.extend(unit.includes().iter().filter_map(|include| include.resolved.as_ref()));
        }
    }
    local.len()
}
