use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::app::backend::ResourceClient;
use crate::app::constants::{
    PING_HISTORY_CAPACITY, STAGGER_MAX_MS, STAGGER_MIN_MS, STAGGER_SHARE_OF_INTERVAL,
};
use crate::app::message::{Effect, Message};
use crate::model::{PingHistory, ServerStatus, now_epoch};

/// Delay between consecutive probe launches, spreading half of the refresh
/// interval across all connections.
pub(crate) fn stagger_delay(interval: Duration, count: usize) -> Duration {
    if count == 0 {
        return Duration::from_millis(STAGGER_MIN_MS);
    }
    let share = interval.as_millis() as f64 * STAGGER_SHARE_OF_INTERVAL / count as f64;
    let ms = share.clamp(STAGGER_MIN_MS as f64, STAGGER_MAX_MS as f64);
    Duration::from_millis(ms as u64)
}

/// One probe effect per connection; probe `i` waits `i * stagger` first.
pub(crate) fn plan_probes(round: u64, connection_ids: &[String], stagger: Duration) -> Vec<Effect> {
    connection_ids
        .iter()
        .enumerate()
        .map(|(index, id)| Effect::Probe {
            round,
            connection_id: id.clone(),
            delay: stagger.saturating_mul(index as u32),
        })
        .collect()
}

/// Blocking status probe; failures become an offline status.
pub(crate) fn probe(
    client: Result<Arc<dyn ResourceClient>, String>,
    connection_id: String,
    delay: Duration,
) -> ServerStatus {
    let client = match client {
        Ok(client) => client,
        Err(err) => return ServerStatus::offline(connection_id, err),
    };
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    let started = Instant::now();
    match client.server_status() {
        Ok(info) => ServerStatus {
            connection_id,
            online: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            version: Some(info.version),
            error: None,
            checked_at: now_epoch(),
        },
        Err(err) => ServerStatus::offline(connection_id, format!("{err:#}")),
    }
}

#[derive(Debug)]
struct ProbeRound {
    id: u64,
    expected: usize,
    manual: bool,
    results: Vec<ServerStatus>,
}

#[derive(Debug, Default)]
pub(crate) struct HealthState {
    pub(crate) statuses: HashMap<String, ServerStatus>,
    pub(crate) histories: HashMap<String, PingHistory>,
    pub(crate) loading: bool,
    pub(crate) last_poll: Option<Instant>,
    pub(crate) cursor: usize,
    round: Option<ProbeRound>,
    next_round: u64,
}

impl HealthState {
    pub(crate) fn in_flight(&self) -> bool {
        self.round.is_some()
    }

    pub(crate) fn due(&self, now: Instant, interval: Duration) -> bool {
        match self.last_poll {
            Some(last) => now.saturating_duration_since(last) >= interval,
            None => true,
        }
    }

    /// Starts a fan-out over `connection_ids`. Returns `None` while a previous
    /// round is still collecting results.
    pub(crate) fn begin_round(
        &mut self,
        connection_ids: &[String],
        interval: Duration,
        manual: bool,
        now: Instant,
    ) -> Option<Vec<Effect>> {
        if self.round.is_some() {
            return None;
        }
        self.last_poll = Some(now);
        if connection_ids.is_empty() {
            return Some(vec![]);
        }
        self.next_round += 1;
        self.round = Some(ProbeRound {
            id: self.next_round,
            expected: connection_ids.len(),
            manual,
            results: Vec::with_capacity(connection_ids.len()),
        });
        if manual {
            self.loading = true;
        }
        let stagger = stagger_delay(interval, connection_ids.len());
        Some(plan_probes(self.next_round, connection_ids, stagger))
    }

    /// Fan-in: yields the single `StatusesUpdated` message once the last
    /// probe of the active round has reported.
    pub(crate) fn record(&mut self, round: u64, status: ServerStatus) -> Option<Message> {
        let active = self.round.as_mut().filter(|active| active.id == round)?;
        active.results.push(status);
        if active.results.len() < active.expected {
            return None;
        }
        let finished = self.round.take()?;
        Some(Message::StatusesUpdated {
            statuses: finished.results,
            manual: finished.manual,
        })
    }

    /// Folds a finished round into the latest statuses and ping histories.
    /// Offline probes add no latency sample.
    pub(crate) fn apply(&mut self, statuses: Vec<ServerStatus>, manual: bool) {
        if manual {
            self.loading = false;
        }
        for status in statuses {
            if let Some(latency) = status.latency_ms.filter(|_| status.online) {
                self.histories
                    .entry(status.connection_id.clone())
                    .or_insert_with(|| PingHistory::with_capacity(PING_HISTORY_CAPACITY))
                    .push(latency, status.checked_at);
            }
            self.statuses.insert(status.connection_id.clone(), status);
        }
    }

    pub(crate) fn forget(&mut self, connection_id: &str) {
        self.statuses.remove(connection_id);
        self.histories.remove(connection_id);
    }

    /// Drops the active round so a connection-list edit can start a new one.
    pub(crate) fn abandon_round(&mut self) {
        if self.round.take().is_some_and(|round| round.manual) {
            self.loading = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::backend::MockResourceClient;

    fn ids(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("conn-{i}")).collect()
    }

    fn online(id: &str, latency: u64) -> ServerStatus {
        ServerStatus {
            connection_id: id.to_string(),
            online: true,
            latency_ms: Some(latency),
            version: Some("2.25.0".to_string()),
            error: None,
            checked_at: latency,
        }
    }

    #[test]
    fn stagger_spreads_half_the_interval() {
        assert_eq!(
            stagger_delay(Duration::from_secs(10), 3),
            Duration::from_millis(1666)
        );
        assert_eq!(
            stagger_delay(Duration::from_secs(30), 1),
            Duration::from_millis(2000)
        );
        assert_eq!(
            stagger_delay(Duration::from_secs(5), 100),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn plan_probes_offsets_each_launch() {
        let effects = plan_probes(7, &ids(3), Duration::from_millis(1666));
        let delays: Vec<_> = effects
            .iter()
            .map(|effect| match effect {
                Effect::Probe { round, delay, .. } => {
                    assert_eq!(*round, 7);
                    delay.as_millis()
                }
                other => panic!("unexpected effect {other:?}"),
            })
            .collect();
        assert_eq!(delays, vec![0, 1666, 3332]);
    }

    #[test]
    fn round_emits_once_after_all_probes() {
        let mut health = HealthState::default();
        let now = Instant::now();
        let effects = health
            .begin_round(&ids(3), Duration::from_secs(10), true, now)
            .unwrap();
        assert_eq!(effects.len(), 3);
        assert!(health.loading);
        assert!(health.record(1, online("conn-0", 5)).is_none());
        assert!(health.record(99, online("conn-1", 5)).is_none());
        assert!(
            health
                .record(1, ServerStatus::offline("conn-1", "refused"))
                .is_none()
        );
        let Some(Message::StatusesUpdated { statuses, manual }) =
            health.record(1, online("conn-2", 7))
        else {
            panic!("expected statuses update");
        };
        assert_eq!(statuses.len(), 3);
        assert!(manual);
        assert!(!health.in_flight());
    }

    #[test]
    fn refresh_is_skipped_while_in_flight() {
        let mut health = HealthState::default();
        let now = Instant::now();
        assert!(
            health
                .begin_round(&ids(2), Duration::from_secs(10), false, now)
                .is_some()
        );
        assert!(!health.loading);
        assert!(
            health
                .begin_round(&ids(2), Duration::from_secs(10), true, now)
                .is_none()
        );
    }

    #[test]
    fn apply_bounds_history_and_skips_offline_samples() {
        let mut health = HealthState::default();
        for latency in 0..(PING_HISTORY_CAPACITY as u64 + 10) {
            health.apply(
                vec![
                    online("a", latency),
                    ServerStatus::offline("b", "timeout"),
                ],
                false,
            );
        }
        let history = &health.histories["a"];
        assert_eq!(history.len(), PING_HISTORY_CAPACITY);
        assert_eq!(history.last(), Some(PING_HISTORY_CAPACITY as u64 + 9));
        assert!(!health.histories.contains_key("b"));
        assert!(!health.statuses["b"].online);
    }

    #[test]
    fn probe_reports_failure_as_offline() {
        let client = Arc::new(MockResourceClient::default());
        client.set_status_error(Some("connection refused"));
        let status = probe(Ok(client.clone()), "a".to_string(), Duration::ZERO);
        assert!(!status.online);
        assert_eq!(status.error.as_deref(), Some("connection refused"));
        assert_eq!(client.status_calls(), 1);

        let missing = probe(Err("unknown connection".to_string()), "b".to_string(), Duration::ZERO);
        assert!(!missing.online);
    }

    #[test]
    fn due_follows_interval() {
        let mut health = HealthState::default();
        let start = Instant::now();
        assert!(health.due(start, Duration::from_secs(5)));
        health.last_poll = Some(start);
        assert!(!health.due(start + Duration::from_secs(4), Duration::from_secs(5)));
        assert!(health.due(start + Duration::from_secs(5), Duration::from_secs(5)));
    }
}
