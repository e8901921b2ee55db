//! End-to-end shard rounds against a scripted prober.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use rule_curator::config::StoreLayout;
use rule_curator::lifecycle::{LifecycleRecord, LifecycleStore, StoreDelta};
use rule_curator::probe::{LookupError, Prober};
use rule_curator::{run_shard, CuratorError, Shutdown, ShardJob};

mod common;

use common::{read_lines, test_config, write_file, ScriptedProber};

#[tokio::test]
async fn test_dead_rule_evicted_on_fourth_round() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let job = ShardJob::from_config(&config.shards, 0);
    write_file(
        &job.input,
        &["! comment", "||alive.example.com^", "||dead.example.com^", "##.banner"],
    );
    let prober = Arc::new(ScriptedProber::with_dead(&["dead.example.com"]));
    let store = LifecycleStore::for_shard(&config.store, 0);

    for round in 1..=3u32 {
        let summary = run_shard(&config, &job, prober.clone(), None).await.unwrap();
        assert_eq!(summary.evicted, 0, "round {round}");
        assert_eq!(summary.retained, 3);
        assert_eq!(store.load().unwrap()["||dead.example.com^"].failures, round);
    }

    let summary = run_shard(&config, &job, prober.clone(), None).await.unwrap();
    assert_eq!(summary.evicted, 1);
    assert_eq!(summary.retained, 2);
    assert_eq!(summary.commit_stats_line(), "COMMIT_STATS: total 2, added 0, removed 1");
    assert_eq!(
        read_lines(&job.output),
        vec!["##.banner".to_string(), "||alive.example.com^".to_string()]
    );
    assert!(!store.load().unwrap().contains_key("||dead.example.com^"));
}

#[tokio::test]
async fn test_first_round_counts_everything_added() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let job = ShardJob::from_config(&config.shards, 7);
    write_file(&job.input, &["||a.example.com^", "||b.example.com^", "/banner/"]);

    let summary = run_shard(&config, &job, Arc::new(ScriptedProber::new()), None)
        .await
        .unwrap();

    assert_eq!(summary.candidates, 3);
    assert_eq!(summary.probed, 2);
    assert_eq!(summary.non_domain, 1);
    assert_eq!(summary.added, 3);
    let written = fs::read_to_string(&job.output).unwrap();
    assert_eq!(written, "/banner/\n||a.example.com^\n||b.example.com^\n");
}

#[tokio::test]
async fn test_previously_retained_rule_still_evaluated() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let job = ShardJob::from_config(&config.shards, 1);
    write_file(&job.input, &["||fresh.example.com^"]);
    write_file(&job.previous, &["||legacy.example.com^", "||gone.example.com^"]);
    let prober = Arc::new(ScriptedProber::with_dead(&["gone.example.com"]));

    let summary = run_shard(&config, &job, prober, None).await.unwrap();

    assert_eq!(summary.candidates, 3);
    assert_eq!(summary.added, 1);
    let output = read_lines(&job.output);
    assert!(output.contains(&"||legacy.example.com^".to_string()));
    assert!(output.contains(&"||gone.example.com^".to_string()));
    let records = LifecycleStore::for_shard(&config.store, 1).load().unwrap();
    assert_eq!(records["||gone.example.com^"].failures, 1);
    assert_eq!(records["||legacy.example.com^"].failures, 0);
}

#[tokio::test]
async fn test_flaky_rule_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let job = ShardJob::from_config(&config.shards, 2);
    write_file(&job.input, &["||flaky.example.com^"]);
    let prober = Arc::new(ScriptedProber::with_dead(&["flaky.example.com"]));
    let store = LifecycleStore::for_shard(&config.store, 2);

    for _ in 0..3 {
        run_shard(&config, &job, prober.clone(), None).await.unwrap();
    }
    assert_eq!(store.load().unwrap()["||flaky.example.com^"].failures, 3);

    prober.set_dead(&[]);
    let summary = run_shard(&config, &job, prober, None).await.unwrap();

    assert_eq!(summary.evicted, 0);
    assert_eq!(store.load().unwrap()["||flaky.example.com^"].failures, 0);
    assert_eq!(read_lines(&job.output), vec!["||flaky.example.com^".to_string()]);
}

#[tokio::test]
async fn test_outage_aborts_without_writes() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let job = ShardJob::from_config(&config.shards, 4);
    let rules: Vec<String> = (0..250).map(|i| format!("||host{i}.example.com^")).collect();
    let refs: Vec<&str> = rules.iter().map(String::as_str).collect();
    write_file(&job.input, &refs);
    write_file(&job.previous, &["||host0.example.com^"]);
    let before = fs::read_to_string(&job.previous).unwrap();

    let prober = Arc::new(ScriptedProber::new());
    prober.set_down(true);
    let err = run_shard(&config, &job, prober.clone(), None).await.unwrap_err();

    assert!(matches!(
        err,
        CuratorError::ResolverOutage { resolved: 0, completed: 250, .. }
    ));
    assert_eq!(fs::read_to_string(&job.output).unwrap(), before);
    let store = LifecycleStore::for_shard(&config.store, 4);
    assert!(!store.path().exists());

    // Resolver back: the next round sees a clean slate.
    prober.set_down(false);
    let summary = run_shard(&config, &job, prober, None).await.unwrap();
    assert_eq!(summary.retained, 250);
    assert!(store.load().unwrap().values().all(|r| r.failures == 0));
}

#[tokio::test]
async fn test_shutdown_defers_unprobed_rules() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let job = ShardJob::from_config(&config.shards, 5);
    write_file(&job.input, &["||slow.example.com^", "||slower.example.com^", "##.ad"]);
    let prober = Arc::new(ScriptedProber::new());
    prober.set_delay(Duration::from_secs(30));

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    shutdown.trigger();
    let summary = run_shard(&config, &job, prober, Some(receiver)).await.unwrap();

    assert_eq!(summary.probed, 0);
    assert_eq!(summary.deferred, 2);
    assert_eq!(summary.retained, 3);
    assert_eq!(summary.evicted, 0);
    // Unseen rules that were not probed get no record.
    let records = LifecycleStore::for_shard(&config.store, 5).load().unwrap();
    assert!(!records.contains_key("||slow.example.com^"));
}

#[tokio::test]
async fn test_missing_shard_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let job = ShardJob::from_config(&config.shards, 9);

    let err = run_shard(&config, &job, Arc::new(ScriptedProber::new()), None)
        .await
        .unwrap_err();

    assert!(matches!(err, CuratorError::MissingShard(path) if path == job.input));
    assert!(!job.output.exists());
}

#[tokio::test]
async fn test_shards_keep_separate_stores() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let prober = Arc::new(ScriptedProber::with_dead(&["dead.example.com"]));

    for shard in [0u32, 1] {
        let job = ShardJob::from_config(&config.shards, shard);
        write_file(&job.input, &["||dead.example.com^"]);
        run_shard(&config, &job, prober.clone(), None).await.unwrap();
    }

    for shard in [0u32, 1] {
        let records = LifecycleStore::for_shard(&config.store, shard).load().unwrap();
        assert_eq!(records["||dead.example.com^"].failures, 1);
    }
    assert_eq!(prober.calls(), 2);
}

/// Marks the rule healthy in the store while the round is probing, the way a
/// concurrent run sharing the store would.
#[derive(Debug)]
struct RacingProber {
    store: LifecycleStore,
    rule: String,
}

#[async_trait::async_trait]
impl Prober for RacingProber {
    async fn lookup(&self, _domain: &str) -> Result<(), LookupError> {
        let base = self.store.load().unwrap();
        let delta = StoreDelta {
            upserts: [(self.rule.clone(), LifecycleRecord::healthy(1))].into_iter().collect(),
            evictions: Default::default(),
        };
        self.store.merge(&base, &delta, 1).unwrap();
        Err(LookupError::NxDomain)
    }
}

#[tokio::test]
async fn test_eviction_lost_to_concurrent_run_keeps_rule() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.store.layout = StoreLayout::Shared;
    config.store.retention_days = 0;
    let job = ShardJob::from_config(&config.shards, 6);
    let rule = "||contested.example.com^";
    write_file(&job.input, &[rule]);

    let store = LifecycleStore::for_shard(&config.store, 6);
    let seed = StoreDelta {
        upserts: [(
            rule.to_string(),
            LifecycleRecord {
                failures: 3,
                ..Default::default()
            },
        )]
        .into_iter()
        .collect(),
        evictions: Default::default(),
    };
    store.merge(&Default::default(), &seed, 1).unwrap();

    let prober = Arc::new(RacingProber {
        store: store.clone(),
        rule: rule.to_string(),
    });
    let summary = run_shard(&config, &job, prober, None).await.unwrap();

    assert_eq!(summary.conflicts, 1);
    assert_eq!(summary.evicted, 0);
    assert_eq!(read_lines(&job.output), vec![rule.to_string()]);
    assert_eq!(store.load().unwrap()[rule].failures, 0);
}
