//! Shared fixtures for shard round tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rule_curator::probe::{LookupError, Prober};
use rule_curator::CuratorConfig;

/// Prober whose answers are scripted per round.
#[derive(Debug, Default)]
pub struct ScriptedProber {
    dead: Mutex<HashSet<String>>,
    /// Every lookup returns NXDOMAIN, as a hijacking or broken resolver would.
    down: AtomicBool,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dead(domains: &[&str]) -> Self {
        let prober = Self::new();
        prober.set_dead(domains);
        prober
    }

    pub fn set_dead(&self, domains: &[&str]) {
        *self.dead.lock().unwrap() = domains.iter().map(|d| d.to_string()).collect();
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn lookup(&self, domain: &str) -> Result<(), LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.down.load(Ordering::SeqCst) || self.dead.lock().unwrap().contains(domain) {
            Err(LookupError::NxDomain)
        } else {
            Ok(())
        }
    }
}

/// Defaults with every path under `root`.
pub fn test_config(root: &Path) -> CuratorConfig {
    let mut config = CuratorConfig::default();
    config.shards.input_dir = root.join("tmp").to_string_lossy().into_owned();
    config.shards.output_dir = root.join("dist").to_string_lossy().into_owned();
    config.store.path = root
        .join("dist/delete_counter.json")
        .to_string_lossy()
        .into_owned();
    config.probe.concurrency = 8;
    config
}

pub fn write_file(path: &Path, lines: &[&str]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, lines.join("\n")).unwrap();
}

pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
