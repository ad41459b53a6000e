//! Deferred marker aggregation while the map widget is not ready.

use std::time::{Duration, Instant};

use mapscrip_core::{Marker, RetrySettings, Viewport};

/// Doubling delays from `initial`, stopping once a delay would exceed
/// `ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    ceiling: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, ceiling: Duration) -> Self {
        let initial = initial.max(Duration::from_millis(1));
        Self { initial, ceiling }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(
            Duration::from_millis(settings.initial_delay_ms),
            Duration::from_millis(settings.ceiling_ms),
        )
    }

    pub fn initial(&self) -> Duration {
        self.initial
    }

    /// The delay after `delay`, or `None` once past the ceiling.
    pub fn after(&self, delay: Duration) -> Option<Duration> {
        let next = delay.checked_mul(2)?;
        (next <= self.ceiling).then_some(next)
    }

    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let first = (self.initial <= self.ceiling).then_some(self.initial);
        std::iter::successors(first, |delay| self.after(*delay))
    }

    pub fn max_retries(&self) -> usize {
        self.delays().count()
    }
}

/// What the map widget should display after a chapter renders.
#[derive(Debug, Clone, PartialEq)]
pub struct MapUpdate {
    pub generation: u64,
    pub markers: Vec<Marker>,
    pub viewport: Viewport,
    /// Index of the marker a "jump to" targets.
    pub focused: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerPoll {
    Idle,
    Waiting { due: Instant },
    /// The widget is ready; aggregate these references now.
    Ready {
        generation: u64,
        references: Vec<String>,
    },
    Abandoned { generation: u64 },
}

#[derive(Debug)]
struct PendingAggregation {
    generation: u64,
    references: Vec<String>,
    due: Instant,
    delay: Option<Duration>,
    retries: usize,
}

/// Holds at most one aggregation. Scheduling a newer chapter replaces an
/// older one that never reached the widget.
#[derive(Debug)]
pub struct MarkerScheduler {
    backoff: Backoff,
    pending: Option<PendingAggregation>,
}

impl MarkerScheduler {
    pub fn new(backoff: Backoff) -> Self {
        Self {
            backoff,
            pending: None,
        }
    }

    pub fn schedule(&mut self, generation: u64, references: Vec<String>, now: Instant) {
        if let Some(old) = &self.pending
            && old.generation != generation
        {
            log::debug!(
                "marker aggregation for generation {} superseded by {generation}",
                old.generation
            );
        }
        self.pending = Some(PendingAggregation {
            generation,
            references,
            due: now,
            delay: Some(self.backoff.initial()),
            retries: 0,
        });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Never blocks. When the widget is not ready the aggregation is pushed
    /// back by the next backoff delay, or dropped once the delays run out.
    pub fn poll(&mut self, now: Instant, widget_ready: bool) -> MarkerPoll {
        let Some(pending) = self.pending.as_mut() else {
            return MarkerPoll::Idle;
        };
        if now < pending.due {
            return MarkerPoll::Waiting { due: pending.due };
        }

        if widget_ready {
            let Some(pending) = self.pending.take() else {
                return MarkerPoll::Idle;
            };
            return MarkerPoll::Ready {
                generation: pending.generation,
                references: pending.references,
            };
        }

        match pending.delay.filter(|delay| *delay <= self.backoff.ceiling) {
            Some(delay) => {
                pending.retries += 1;
                pending.due = now + delay;
                pending.delay = self.backoff.after(delay);
                log::debug!(
                    "map not ready, retry {} for generation {} in {delay:?}",
                    pending.retries,
                    pending.generation
                );
                MarkerPoll::Waiting { due: pending.due }
            }
            None => {
                let generation = pending.generation;
                log::warn!(
                    "map never became ready; leaving generation {generation} without markers"
                );
                self.pending = None;
                MarkerPoll::Abandoned { generation }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn backoff_doubles_until_ceiling() {
        let backoff = Backoff::new(ms(500), ms(5_000));
        let delays: Vec<Duration> = backoff.delays().collect();
        assert_eq!(delays, vec![ms(500), ms(1_000), ms(2_000), ms(4_000)]);
        assert_eq!(backoff.max_retries(), 4);
    }

    #[test]
    fn backoff_with_low_ceiling_never_retries() {
        let backoff = Backoff::new(ms(500), ms(100));
        assert_eq!(backoff.max_retries(), 0);
    }

    #[test]
    fn ready_widget_gets_references_immediately() {
        let mut scheduler = MarkerScheduler::new(Backoff::new(ms(100), ms(1_000)));
        let now = Instant::now();
        scheduler.schedule(3, vec!["ref".to_string()], now);
        assert_eq!(
            scheduler.poll(now, true),
            MarkerPoll::Ready {
                generation: 3,
                references: vec!["ref".to_string()]
            }
        );
        assert_eq!(scheduler.poll(now, true), MarkerPoll::Idle);
    }

    #[test]
    fn retries_back_off_then_abandon() {
        let mut scheduler = MarkerScheduler::new(Backoff::new(ms(100), ms(400)));
        let t0 = Instant::now();
        scheduler.schedule(1, Vec::new(), t0);

        assert_eq!(scheduler.poll(t0, false), MarkerPoll::Waiting { due: t0 + ms(100) });
        assert_eq!(
            scheduler.poll(t0 + ms(50), false),
            MarkerPoll::Waiting { due: t0 + ms(100) }
        );

        let t1 = t0 + ms(100);
        assert_eq!(scheduler.poll(t1, false), MarkerPoll::Waiting { due: t1 + ms(200) });
        let t2 = t1 + ms(200);
        assert_eq!(scheduler.poll(t2, false), MarkerPoll::Waiting { due: t2 + ms(400) });
        let t3 = t2 + ms(400);
        assert_eq!(scheduler.poll(t3, false), MarkerPoll::Abandoned { generation: 1 });
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn widget_ready_during_backoff_delivers() {
        let mut scheduler = MarkerScheduler::new(Backoff::new(ms(100), ms(400)));
        let t0 = Instant::now();
        scheduler.schedule(2, vec!["a".to_string()], t0);
        scheduler.poll(t0, false);
        assert!(matches!(
            scheduler.poll(t0 + ms(100), true),
            MarkerPoll::Ready { generation: 2, .. }
        ));
    }

    #[test]
    fn newer_schedule_replaces_older() {
        let mut scheduler = MarkerScheduler::new(Backoff::new(ms(100), ms(400)));
        let t0 = Instant::now();
        scheduler.schedule(1, vec!["old".to_string()], t0);
        scheduler.poll(t0, false);
        scheduler.schedule(2, vec!["new".to_string()], t0 + ms(10));
        assert_eq!(
            scheduler.poll(t0 + ms(10), true),
            MarkerPoll::Ready {
                generation: 2,
                references: vec!["new".to_string()]
            }
        );
    }
}
