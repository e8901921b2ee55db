//! Resolver-outage guard.
//!
//! A broken upstream resolver makes every lookup fail, which would advance
//! every rule toward eviction at once. When too few completed lookups resolve
//! the round is aborted before anything is written.

use crate::config::OutageConfig;
use crate::error::CuratorError;
use crate::probe::ProbeReport;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutageGuard {
    enabled: bool,
    min_probes: usize,
    min_success_ratio: f64,
}

impl OutageGuard {
    pub fn from_config(config: &OutageConfig) -> Self {
        Self {
            enabled: config.enabled,
            min_probes: config.min_probes,
            min_success_ratio: config.min_success_ratio,
        }
    }

    /// Err when the sample is large enough and the resolved share is too low.
    pub fn check(&self, report: &ProbeReport) -> Result<(), CuratorError> {
        if !self.enabled || report.completed < self.min_probes {
            return Ok(());
        }
        let ratio = report.success_ratio().unwrap_or(1.0);
        if ratio < self.min_success_ratio {
            tracing::error!(
                resolved = report.resolved,
                completed = report.completed,
                ratio,
                floor = self.min_success_ratio,
                "Resolver outage suspected"
            );
            return Err(CuratorError::ResolverOutage {
                resolved: report.resolved,
                completed: report.completed,
                floor: self.min_success_ratio,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(completed: usize, resolved: usize) -> ProbeReport {
        ProbeReport {
            completed,
            resolved,
            submitted: completed,
            ..ProbeReport::default()
        }
    }

    #[test]
    fn test_small_sample_never_trips() {
        let guard = OutageGuard::from_config(&OutageConfig::default());
        assert!(guard.check(&report(199, 0)).is_ok());
    }

    #[test]
    fn test_trips_below_floor() {
        let guard = OutageGuard::from_config(&OutageConfig::default());
        let err = guard.check(&report(400, 10)).unwrap_err();
        assert!(matches!(
            err,
            CuratorError::ResolverOutage { resolved: 10, completed: 400, .. }
        ));
        // 20/400 = 0.05 is exactly the floor and passes.
        assert!(guard.check(&report(400, 20)).is_ok());
    }

    #[test]
    fn test_disabled_guard() {
        let config = OutageConfig {
            enabled: false,
            ..OutageConfig::default()
        };
        assert!(OutageGuard::from_config(&config).check(&report(1000, 0)).is_ok());
    }
}
