use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const NEVER: u64 = u64::MAX;

/// Process-wide gate between reconciliation passes.
///
/// The last fire time is kept as milliseconds since `epoch` in a single atomic
/// word and stamped with compare-and-swap, so of several callbacks racing
/// inside the same window exactly one wins.
#[derive(Debug)]
pub struct DebounceState {
    epoch: Instant,
    min_interval: Duration,
    last_fire_ms: AtomicU64,
    fired: AtomicU64,
}

impl DebounceState {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            min_interval,
            last_fire_ms: AtomicU64::new(NEVER),
            fired: AtomicU64::new(0),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Claim the right to fire at `now`. Returns false while the window since
    /// the last fire is still open, or when another caller won the race.
    pub fn try_fire(&self, now: Instant) -> bool {
        let now_ms = millis(now.saturating_duration_since(self.epoch));
        let min_ms = millis(self.min_interval);
        let last = self.last_fire_ms.load(Ordering::Acquire);

        if last != NEVER && now_ms.saturating_sub(last) < min_ms {
            return false;
        }

        let won = self
            .last_fire_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.fired.fetch_add(1, Ordering::Relaxed);
        }
        won
    }

    /// When the last pass was let through, if ever
    pub fn last_fire(&self) -> Option<Instant> {
        match self.last_fire_ms.load(Ordering::Acquire) {
            NEVER => None,
            ms => Some(self.epoch + Duration::from_millis(ms)),
        }
    }

    /// Number of passes let through so far
    pub fn fire_count(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(NEVER - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_call_fires() {
        let state = DebounceState::new(Duration::from_secs(5));
        assert!(state.last_fire().is_none());
        assert!(state.try_fire(Instant::now()));
        assert!(state.last_fire().is_some());
        assert_eq!(state.fire_count(), 1);
    }

    #[test]
    fn test_window_boundaries() {
        let state = DebounceState::new(Duration::from_secs(5));
        let t0 = Instant::now();

        assert!(state.try_fire(t0));
        assert!(!state.try_fire(t0 + Duration::from_millis(4_999)));
        assert!(state.try_fire(t0 + Duration::from_secs(5)));
        assert!(!state.try_fire(t0 + Duration::from_secs(6)));
        assert!(state.try_fire(t0 + Duration::from_secs(11)));
        assert_eq!(state.fire_count(), 3);
    }

    #[test]
    fn test_stale_clock_reading_does_not_fire() {
        let state = DebounceState::new(Duration::from_secs(5));
        let t0 = Instant::now();

        assert!(state.try_fire(t0 + Duration::from_secs(10)));
        // A context that read the clock before the winner stamped it
        assert!(!state.try_fire(t0 + Duration::from_secs(9)));
    }

    #[test]
    fn test_concurrent_callers_fire_once() {
        let state = Arc::new(DebounceState::new(Duration::from_secs(5)));
        let now = Instant::now();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || state.try_fire(now))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(state.fire_count(), 1);
    }
}
