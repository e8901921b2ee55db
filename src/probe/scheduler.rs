//! Concurrent probe scheduler.
//!
//! # Responsibilities
//! - Map rules to domains; rules without a domain are resolved by convention
//! - Probe each distinct domain once with bounded parallelism
//! - Retry unresolved domains per the retry policy
//! - Report progress periodically
//! - Stop at the batch deadline or on shutdown, leaving the rest unprobed
//!
//! # Design Decisions
//! - Returns an immutable outcome map keyed by rule; completion order is
//!   irrelevant and no shared state is mutated by in-flight lookups
//! - One rule's lookup error never aborts the batch

use std::collections::HashMap;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::config::{FailurePolicy, ProbeConfig};
use crate::observability::metrics;
use crate::probe::prober::{ProbeOutcome, Prober};
use crate::resilience::RetryPolicy;
use crate::rules::{extract_domain, Rule};

/// Outcome of one scheduling pass.
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    /// Outcome per rule. Rules missing here were not probed (deadline or
    /// shutdown) and must be treated as deferred.
    pub outcomes: HashMap<Rule, ProbeOutcome>,
    /// Rules without a probe-able domain.
    pub non_domain: usize,
    /// Distinct domains submitted to the pool.
    pub submitted: usize,
    /// Domains whose lookup completed.
    pub completed: usize,
    /// Completed domains classified as resolved.
    pub resolved: usize,
    /// Domains left unprobed when the batch was cut short.
    pub cancelled: usize,
}

impl ProbeReport {
    /// Resolved share of completed lookups, if any completed.
    pub fn success_ratio(&self) -> Option<f64> {
        (self.completed > 0).then(|| self.resolved as f64 / self.completed as f64)
    }
}

/// Runs a prober over a rule set with bounded parallelism.
#[derive(Debug, Clone)]
pub struct ProbeScheduler {
    prober: Arc<dyn Prober>,
    concurrency: usize,
    progress_interval: usize,
    deadline: Option<Duration>,
    failure_policy: FailurePolicy,
    retry: RetryPolicy,
}

impl ProbeScheduler {
    pub fn new(prober: Arc<dyn Prober>, config: &ProbeConfig) -> Self {
        Self {
            prober,
            concurrency: config.concurrency.max(1),
            progress_interval: config.progress_interval.max(1),
            deadline: (config.batch_deadline_secs > 0)
                .then(|| Duration::from_secs(config.batch_deadline_secs)),
            failure_policy: config.failure_policy,
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Probe every rule. Cancellation is cooperative: when `shutdown` fires or
    /// the deadline passes, outstanding lookups are dropped.
    pub async fn probe_all(
        &self,
        rules: &[Rule],
        mut shutdown: Option<broadcast::Receiver<()>>,
    ) -> ProbeReport {
        let mut report = ProbeReport::default();

        // Group rules by domain so each name is queried once.
        let mut by_domain: HashMap<String, Vec<Rule>> = HashMap::new();
        for rule in rules {
            match extract_domain(rule) {
                Some(domain) => by_domain
                    .entry(domain.to_ascii_lowercase())
                    .or_default()
                    .push(rule.clone()),
                None => {
                    report.non_domain += 1;
                    report.outcomes.insert(rule.clone(), ProbeOutcome::Resolved);
                }
            }
        }
        report.submitted = by_domain.len();

        tracing::info!(
            rules = rules.len(),
            domains = report.submitted,
            non_domain = report.non_domain,
            concurrency = self.concurrency,
            "Starting probes"
        );

        let total = report.submitted;
        let lookups = stream::iter(by_domain)
            .map(|(domain, rules)| async move {
                let outcome = self.probe_domain(&domain).await;
                (rules, outcome)
            })
            .buffer_unordered(self.concurrency);
        let mut lookups = std::pin::pin!(lookups);

        // A deadline past what the clock can represent means no deadline.
        let deadline = self.deadline.and_then(|d| Instant::now().checked_add(d));
        let expired = async {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => pending::<()>().await,
            }
        };
        let mut expired = std::pin::pin!(expired);

        loop {
            tokio::select! {
                next = lookups.next() => {
                    let Some((rules, outcome)) = next else { break };
                    report.completed += 1;
                    if outcome == ProbeOutcome::Resolved {
                        report.resolved += 1;
                    }
                    metrics::record_probe(outcome);
                    for rule in rules {
                        report.outcomes.insert(rule, outcome);
                    }

                    if report.completed % self.progress_interval == 0 {
                        tracing::info!(
                            done = report.completed,
                            total,
                            resolved = report.resolved,
                            "Probe progress"
                        );
                    }
                }
                _ = &mut expired => {
                    tracing::warn!(
                        done = report.completed,
                        total,
                        "Batch deadline reached, remaining lookups deferred"
                    );
                    break;
                }
                _ = wait_for_shutdown(&mut shutdown) => {
                    tracing::warn!(
                        done = report.completed,
                        total,
                        "Shutdown requested, remaining lookups deferred"
                    );
                    break;
                }
            }
        }

        report.cancelled = total - report.completed;
        tracing::info!(
            done = report.completed,
            total,
            resolved = report.resolved,
            cancelled = report.cancelled,
            "Probes finished"
        );
        report
    }

    async fn probe_domain(&self, domain: &str) -> ProbeOutcome {
        let mut retries = 0;
        loop {
            let result = self.prober.lookup(domain).await;
            let outcome = self.failure_policy.classify(&result);
            if let Err(e) = &result {
                tracing::trace!(domain, error = %e, outcome = outcome.as_str(), "Lookup failed");
            }

            if !self.retry.should_retry(retries, outcome) {
                return outcome;
            }
            retries += 1;
            tokio::time::sleep(self.retry.delay(retries)).await;
        }
    }
}

async fn wait_for_shutdown(shutdown: &mut Option<broadcast::Receiver<()>>) {
    match shutdown {
        Some(rx) => match rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            // Sender gone without a signal: nobody can ask us to stop.
            Err(broadcast::error::RecvError::Closed) => pending::<()>().await,
        },
        None => pending::<()>().await,
    }
}
