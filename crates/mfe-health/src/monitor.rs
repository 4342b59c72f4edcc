//! Recurring health checks.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use futures::future;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use mfe_core::Participant;

use crate::probe::{EndpointProbe, HttpProbe};

/// Last observed availability of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfeStatus {
    pub name: Participant,
    pub endpoint: String,
    pub is_active: bool,
    /// Unix epoch seconds of the last probe or observation.
    pub last_checked: Option<i64>,
}

/// Monitor timing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause between probe rounds.
    pub interval: Duration,
    /// Per-probe deadline.
    pub probe_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(2),
        }
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Periodically probes each remote participant's manifest endpoint and
/// exposes a status map for diagnostics.
///
/// Results overwrite prior status with no hysteresis; a flapping
/// participant shows status thrashing. The map is never consulted for
/// routing decisions.
pub struct HealthMonitor {
    local: Participant,
    probe: Arc<dyn EndpointProbe>,
    statuses: RwLock<HashMap<Participant, MfeStatus>>,
    interval: Duration,
}

impl HealthMonitor {
    /// Create a monitor over the given participant endpoints. The local
    /// participant is always reported active without a probe.
    #[must_use]
    pub fn new(
        local: Participant,
        endpoints: impl IntoIterator<Item = (Participant, String)>,
        probe: Arc<dyn EndpointProbe>,
        config: &MonitorConfig,
    ) -> Self {
        let statuses = endpoints
            .into_iter()
            .map(|(name, endpoint)| {
                (
                    name,
                    MfeStatus {
                        name,
                        endpoint,
                        is_active: name == local,
                        last_checked: None,
                    },
                )
            })
            .collect();

        Self {
            local,
            probe,
            statuses: RwLock::new(statuses),
            interval: config.interval,
        }
    }

    /// Convenience constructor wiring the HTTP probe with the
    /// configured timeout.
    ///
    /// # Errors
    /// Returns the HTTP client construction error.
    pub fn with_http_probe(
        local: Participant,
        endpoints: impl IntoIterator<Item = (Participant, String)>,
        config: &MonitorConfig,
    ) -> Result<Self, reqwest::Error> {
        let probe = Arc::new(HttpProbe::new(config.probe_timeout)?);
        Ok(Self::new(local, endpoints, probe, config))
    }

    /// Probe every remote participant once and return the refreshed
    /// status map.
    pub async fn check_all(&self) -> HashMap<Participant, MfeStatus> {
        let targets: Vec<(Participant, String)> = self
            .statuses
            .read()
            .unwrap()
            .values()
            .filter(|s| s.name != self.local)
            .map(|s| (s.name, s.endpoint.clone()))
            .collect();

        let results = future::join_all(targets.into_iter().map(|(name, endpoint)| {
            let probe = Arc::clone(&self.probe);
            async move { (name, probe.probe(&endpoint).await) }
        }))
        .await;

        let checked_at = now();
        {
            let mut statuses = self.statuses.write().unwrap();
            for (name, is_active) in results {
                if let Some(status) = statuses.get_mut(&name) {
                    status.is_active = is_active;
                    status.last_checked = Some(checked_at);
                }
            }
            if let Some(local) = statuses.get_mut(&self.local) {
                local.is_active = true;
            }
        }

        self.statuses()
    }

    /// Current status map without probing.
    #[must_use]
    pub fn statuses(&self) -> HashMap<Participant, MfeStatus> {
        self.statuses.read().unwrap().clone()
    }

    /// Fold in a load outcome observed by the fragment loader.
    pub fn record_observation(&self, participant: Participant, is_active: bool) {
        let mut statuses = self.statuses.write().unwrap();
        match statuses.get_mut(&participant) {
            Some(status) => {
                status.is_active = is_active;
                status.last_checked = Some(now());
            }
            None => tracing::warn!(%participant, "Observation for unmonitored participant ignored"),
        }
    }

    /// Run `check_all` once eagerly, then on a fixed interval.
    #[must_use]
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.interval);
            loop {
                // First tick resolves immediately: the eager check.
                ticker.tick().await;
                monitor.check_all().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    struct StubProbe {
        active: Mutex<Vec<String>>,
        probed: Mutex<Vec<String>>,
    }

    impl StubProbe {
        fn up(endpoints: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                active: Mutex::new(endpoints.iter().map(ToString::to_string).collect()),
                probed: Mutex::new(Vec::new()),
            })
        }

        fn set_up(&self, endpoints: &[&str]) {
            *self.active.lock().unwrap() = endpoints.iter().map(ToString::to_string).collect();
        }
    }

    #[async_trait]
    impl EndpointProbe for StubProbe {
        async fn probe(&self, endpoint: &str) -> bool {
            self.probed.lock().unwrap().push(endpoint.to_owned());
            self.active.lock().unwrap().iter().any(|e| e == endpoint)
        }
    }

    fn endpoints() -> Vec<(Participant, String)> {
        vec![
            (Participant::Shell, "http://localhost:4200/remoteEntry.json".into()),
            (Participant::Header, "http://localhost:4201/remoteEntry.json".into()),
            (Participant::Products, "http://localhost:4202/remoteEntry.json".into()),
            (Participant::Cart, "http://localhost:4203/remoteEntry.json".into()),
        ]
    }

    #[tokio::test]
    async fn test_local_is_active_without_probing() {
        let probe = StubProbe::up(&[]);
        let monitor = HealthMonitor::new(
            Participant::Shell,
            endpoints(),
            Arc::clone(&probe) as Arc<dyn EndpointProbe>,
            &MonitorConfig::default(),
        );

        let statuses = monitor.check_all().await;

        assert!(statuses[&Participant::Shell].is_active);
        assert!(
            !probe
                .probed
                .lock()
                .unwrap()
                .iter()
                .any(|e| e.contains("4200"))
        );
    }

    #[tokio::test]
    async fn test_unreachable_remotes_marked_inactive() {
        let probe = StubProbe::up(&["http://localhost:4201/remoteEntry.json"]);
        let monitor = HealthMonitor::new(
            Participant::Shell,
            endpoints(),
            probe,
            &MonitorConfig::default(),
        );

        let statuses = monitor.check_all().await;

        assert!(statuses[&Participant::Header].is_active);
        assert!(!statuses[&Participant::Products].is_active);
        assert!(!statuses[&Participant::Cart].is_active);
        assert!(statuses[&Participant::Cart].last_checked.is_some());
    }

    #[tokio::test]
    async fn test_results_overwrite_without_hysteresis() {
        let probe = StubProbe::up(&["http://localhost:4201/remoteEntry.json"]);
        let monitor = HealthMonitor::new(
            Participant::Shell,
            endpoints(),
            Arc::clone(&probe) as Arc<dyn EndpointProbe>,
            &MonitorConfig::default(),
        );

        monitor.check_all().await;
        assert!(monitor.statuses()[&Participant::Header].is_active);

        // Endpoint goes down: the next round flips the status with no
        // grace period.
        probe.set_up(&[]);
        let statuses = monitor.check_all().await;
        assert!(!statuses[&Participant::Header].is_active);
    }

    #[tokio::test]
    async fn test_record_observation_updates_map() {
        let monitor = HealthMonitor::new(
            Participant::Shell,
            endpoints(),
            StubProbe::up(&[]),
            &MonitorConfig::default(),
        );

        monitor.record_observation(Participant::Header, true);

        let statuses = monitor.statuses();
        assert!(statuses[&Participant::Header].is_active);
        assert!(statuses[&Participant::Header].last_checked.is_some());
    }
}
