//! One curation round for one shard.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::broadcast;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::CuratorConfig;
use crate::error::CuratorError;
use crate::lifecycle::{LifecycleMachine, LifecycleStore, StoreDelta};
use crate::observability::metrics;
use crate::probe::{ProbeScheduler, Prober};
use crate::round::job::ShardJob;
use crate::round::outage::OutageGuard;
use crate::round::summary::RoundSummary;
use crate::rules::source::{load_previous, load_shard};
use crate::rules::writer::write_retained;
use crate::rules::Rule;

/// Probe a shard, advance its lifecycle records and write the retained set.
///
/// Nothing is written when the round fails, including on a suspected
/// resolver outage. Rules left unprobed by `shutdown` or the batch deadline
/// are retained with their records untouched apart from `last_seen`.
pub async fn run_shard(
    config: &CuratorConfig,
    job: &ShardJob,
    prober: Arc<dyn Prober>,
    shutdown: Option<broadcast::Receiver<()>>,
) -> Result<RoundSummary, CuratorError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("round", shard = job.shard, run_id = %run_id);
    run_round(config, job, prober, shutdown, run_id)
        .instrument(span)
        .await
}

async fn run_round(
    config: &CuratorConfig,
    job: &ShardJob,
    prober: Arc<dyn Prober>,
    shutdown: Option<broadcast::Receiver<()>>,
    run_id: Uuid,
) -> Result<RoundSummary, CuratorError> {
    let started = Instant::now();

    let shard_rules = load_shard(&job.input)?;
    let previous = load_previous(&job.previous)?;
    let candidates: BTreeSet<Rule> = shard_rules.union(&previous).cloned().collect();
    tracing::info!(
        input = %job.input.display(),
        shard_rules = shard_rules.len(),
        previous = previous.len(),
        candidates = candidates.len(),
        "Candidates loaded"
    );

    let store = LifecycleStore::for_shard(&config.store, job.shard);
    let base = store.load()?;
    let machine = LifecycleMachine::new(config.lifecycle.clone());
    let plan = machine.plan(&base, &candidates);
    tracing::info!(
        to_probe = plan.to_probe.len(),
        skipped = plan.skipped.len(),
        records = base.len(),
        "Round planned"
    );

    let scheduler = ProbeScheduler::new(prober, &config.probe);
    let report = scheduler.probe_all(&plan.to_probe, shutdown).await;
    OutageGuard::from_config(&config.outage).check(&report)?;

    let now = unix_now();
    let round = machine.advance(&base, &report.outcomes, &candidates, now);

    let delta = StoreDelta {
        upserts: round.next,
        evictions: round.evicted,
    };
    let merge = store.merge(&base, &delta, now)?;

    // The store kept another run's record for these rules; keep the output
    // consistent with it.
    let mut retained = round.retained;
    let mut tally = round.tally;
    for rule in merge.conflicts.intersection(&delta.evictions) {
        tracing::warn!(rule = %rule, "Eviction lost to a concurrent run, rule stays in output");
        retained.insert(rule.clone());
        tally.evicted -= 1;
    }
    write_retained(&job.output, &retained)?;

    let added = retained.difference(&previous).count();
    let summary = RoundSummary {
        run_id,
        shard: job.shard,
        candidates: candidates.len(),
        probed: report.completed,
        non_domain: report.non_domain,
        resolved: tally.resolved,
        failed: tally.failed,
        skipped: tally.skipped,
        recovered: tally.recovered,
        deferred: tally.deferred,
        added,
        evicted: tally.evicted,
        retained: retained.len(),
        conflicts: merge.conflicts.len(),
        elapsed: started.elapsed(),
    };

    metrics::record_round(
        job.shard,
        &tally,
        summary.retained,
        summary.conflicts,
        summary.elapsed,
    );
    tracing::info!(
        output = %job.output.display(),
        retained = summary.retained,
        added = summary.added,
        evicted = summary.evicted,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Round complete"
    );
    Ok(summary)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
