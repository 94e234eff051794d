use std::time::{Duration, Instant};

/// Default minimum gap between two dropped-line warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

/// Helper that rate limits dropped-line warnings.
///
/// The caller increments the drop counter via [`record_drop`]. The next call to
/// [`warn_if_due`] emits a warning using the provided callback if the configured
/// interval has elapsed. [`flush`] emits a warning immediately if any lines
/// have been dropped since the last emission.
///
/// [`record_drop`]: RateLimitedWarner::record_drop
/// [`warn_if_due`]: RateLimitedWarner::warn_if_due
/// [`flush`]: RateLimitedWarner::flush
#[derive(Debug)]
pub struct RateLimitedWarner {
    interval: Duration,
    last_warn: Option<Instant>,
    pending: u64,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    /// Create a new [`RateLimitedWarner`]. The first warning can be emitted
    /// immediately.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_warn: None,
            pending: 0,
        }
    }

    /// Increment the dropped-line counter.
    pub fn record_drop(&mut self) {
        self.pending = self.pending.saturating_add(1);
    }

    /// Emit a warning if the rate limit interval has elapsed.
    pub fn warn_if_due(&mut self, warn: impl FnOnce(u64)) {
        self.warn_if_due_at(Instant::now(), warn);
    }

    fn warn_if_due_at(&mut self, now: Instant, warn: impl FnOnce(u64)) {
        let due = self
            .last_warn
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if due && self.pending > 0 {
            warn(std::mem::take(&mut self.pending));
            self.last_warn = Some(now);
        }
    }

    /// Immediately warn about any dropped lines.
    pub fn flush(&mut self, warn: impl FnOnce(u64)) {
        if self.pending > 0 {
            warn(std::mem::take(&mut self.pending));
            self.last_warn = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_first_warning_immediately() {
        let mut warner = RateLimitedWarner::default();
        let mut warnings = Vec::new();
        warner.record_drop();
        warner.warn_if_due(|c| warnings.push(c));
        assert_eq!(warnings, vec![1]);
    }

    #[test]
    fn rate_limits_subsequent_warnings() {
        let mut warner = RateLimitedWarner::new(Duration::from_secs(60));
        let mut warnings = Vec::new();
        warner.record_drop();
        warner.warn_if_due(|c| warnings.push(c));
        warner.record_drop();
        warner.record_drop();
        warner.warn_if_due(|c| warnings.push(c));
        assert_eq!(warnings, vec![1]);
    }

    #[test]
    fn accumulated_drops_reported_after_interval() {
        let mut warner = RateLimitedWarner::new(Duration::from_secs(5));
        let start = Instant::now();
        let mut warnings = Vec::new();
        warner.record_drop();
        warner.warn_if_due_at(start, |c| warnings.push(c));
        warner.record_drop();
        warner.record_drop();
        warner.warn_if_due_at(start + Duration::from_secs(1), |c| warnings.push(c));
        warner.warn_if_due_at(start + Duration::from_secs(6), |c| warnings.push(c));
        assert_eq!(warnings, vec![1, 2]);
    }

    #[test]
    fn flush_emits_pending_warning() {
        let mut warner = RateLimitedWarner::new(Duration::from_secs(60));
        let mut warnings = Vec::new();
        warner.record_drop();
        warner.flush(|c| warnings.push(c));
        warner.flush(|c| warnings.push(c));
        assert_eq!(warnings, vec![1]);
    }
}
