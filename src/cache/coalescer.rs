//! Write coalescing with debounce and max-delay deadlines.
//!
//! Every mutation marks the scheduler dirty. The flush deadline is the
//! earlier of two bounds: `last_mutation + debounce` (quiet-period flush)
//! and `first_unflushed_mutation + max_delay` (hard ceiling, so continuous
//! editing still reaches the remote store at least once per max-delay
//! window). A flush begins by claiming the pending mutation, which clears
//! the dirty flag and disarms both deadlines in one step; both the normal
//! and the teardown transports go through the same claim, so at most one
//! of them ever observes the flag set.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct FlushScheduler {
    debounce: Duration,
    max_delay: Duration,
    dirty: bool,
    dirty_since: Option<Instant>,
    last_mutation_at: Option<Instant>,
}

impl FlushScheduler {
    pub fn new(debounce: Duration, max_delay: Duration) -> Self {
        Self {
            debounce,
            max_delay,
            dirty: false,
            dirty_since: None,
            last_mutation_at: None,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.mark_dirty_at(Instant::now());
    }

    pub fn mark_dirty_at(&mut self, now: Instant) {
        if !self.dirty {
            self.dirty = true;
            self.dirty_since = Some(now);
        }
        self.last_mutation_at = Some(now);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The instant at which a flush should fire, or `None` when clean.
    pub fn deadline(&self) -> Option<Instant> {
        if !self.dirty {
            return None;
        }
        let last = self.last_mutation_at?;
        let since = self.dirty_since.unwrap_or(last);
        Some((last + self.debounce).min(since + self.max_delay))
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    /// Claim the pending mutation: returns whether anything was pending and
    /// clears the dirty flag and both deadlines. A flush whose claim returns
    /// false must not issue any network call.
    pub fn claim(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.reset();
        was_dirty
    }

    /// Disarm everything, e.g. after a fresh document load or at logout.
    pub fn reset(&mut self) {
        self.dirty = false;
        self.dirty_since = None;
        self.last_mutation_at = None;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> FlushScheduler {
        FlushScheduler::new(Duration::from_millis(10), Duration::from_millis(40))
    }

    #[test]
    fn clean_scheduler_has_no_deadline() {
        let s = scheduler();
        assert!(!s.is_dirty());
        assert_eq!(s.deadline(), None);
        assert!(!s.is_due(Instant::now()));
    }

    #[test]
    fn mutation_arms_debounce_deadline() {
        let mut s = scheduler();
        let base = Instant::now();
        s.mark_dirty_at(base);
        assert_eq!(s.deadline(), Some(base + Duration::from_millis(10)));
    }

    #[test]
    fn repeated_mutations_push_debounce_out() {
        let mut s = scheduler();
        let base = Instant::now();
        s.mark_dirty_at(base);
        s.mark_dirty_at(base + Duration::from_millis(5));
        assert_eq!(s.deadline(), Some(base + Duration::from_millis(15)));
        assert!(!s.is_due(base + Duration::from_millis(14)));
        assert!(s.is_due(base + Duration::from_millis(15)));
    }

    #[test]
    fn max_delay_caps_continuous_mutations() {
        let mut s = scheduler();
        let base = Instant::now();
        // Mutations every 5ms, each inside the 10ms debounce window.
        for i in 0..8 {
            s.mark_dirty_at(base + Duration::from_millis(i * 5));
        }
        // Deadline never exceeds first-mutation + 40ms.
        assert_eq!(s.deadline(), Some(base + Duration::from_millis(40)));
        assert!(s.is_due(base + Duration::from_millis(40)));
    }

    #[test]
    fn claim_clears_and_reports_pending() {
        let mut s = scheduler();
        s.mark_dirty_at(Instant::now());
        assert!(s.claim());
        assert!(!s.is_dirty());
        assert_eq!(s.deadline(), None);
        // Second claim has nothing pending.
        assert!(!s.claim());
    }

    #[test]
    fn mutation_after_claim_starts_new_cycle() {
        let mut s = scheduler();
        let base = Instant::now();
        s.mark_dirty_at(base);
        assert!(s.claim());

        let later = base + Duration::from_millis(100);
        s.mark_dirty_at(later);
        assert_eq!(s.deadline(), Some(later + Duration::from_millis(10)));
    }
}
