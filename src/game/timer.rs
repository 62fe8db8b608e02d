use std::time::{Duration, Instant};

/// Per-player countdown. A stopped timer reports its full budget.
#[derive(Debug, Clone)]
pub struct TurnTimer {
    total: Duration,
    started_at: Option<Instant>,
}

impl TurnTimer {
    pub fn new(total_seconds: u64) -> Self {
        Self {
            total: Duration::from_secs(total_seconds),
            started_at: None,
        }
    }

    pub fn start(&mut self, total_seconds: u64) {
        self.total = Duration::from_secs(total_seconds);
        self.started_at = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed_at(&self, now: Instant) -> Duration {
        self.started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or_default()
    }

    /// Seconds left at `now`, rounded up: 0 only once the budget is spent.
    pub fn remaining_at(&self, now: Instant) -> u64 {
        let left = self.total.saturating_sub(self.elapsed_at(now));
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_timer_reports_full_budget() {
        let timer = TurnTimer::new(30);
        assert!(!timer.is_running());
        assert_eq!(timer.remaining(), 30);
    }

    #[test]
    fn test_remaining_counts_down_and_rounds_up() {
        let mut timer = TurnTimer::new(0);
        timer.start(10);
        let now = Instant::now();
        assert_eq!(timer.remaining_at(now + Duration::from_millis(2500)), 8);
        assert_eq!(timer.remaining_at(now + Duration::from_secs(10)), 0);
        assert_eq!(timer.remaining_at(now + Duration::from_secs(60)), 0);
    }

    #[test]
    fn test_stop_resets_elapsed() {
        let mut timer = TurnTimer::new(5);
        timer.start(5);
        timer.stop();
        assert_eq!(timer.remaining_at(Instant::now() + Duration::from_secs(100)), 5);
    }
}
