//! Frame scheduling and resize debouncing.
//!
//! Both types are pure functions of injected timestamps: the host owns the
//! clock and the tick loop, which keeps the timing logic deterministic and
//! testable. There are no callbacks; the host polls.

use std::time::{Duration, Instant};

use tracing::trace;

/// Throttles redraws to a fixed interval.
///
/// Mutations call [`RenderScheduler::request`]; the host's tick loop calls
/// [`RenderScheduler::poll`] and renders when it returns `true`. Work is
/// coalesced: any number of requests between frames produce one redraw.
#[derive(Debug)]
pub struct RenderScheduler {
    interval: Duration,
    pending: bool,
    last_frame: Option<Instant>,
    shut_down: bool,
}

impl RenderScheduler {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: false,
            last_frame: None,
            shut_down: false,
        }
    }

    pub fn request(&mut self) {
        if !self.shut_down {
            self.pending = true;
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// `true` when pending work exists and the interval has elapsed since
    /// the last granted frame. Granting clears the pending flag.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        if let Some(last) = self.last_frame
            && now.duration_since(last) < self.interval
        {
            return false;
        }
        self.pending = false;
        self.last_frame = Some(now);
        true
    }

    /// Drop pending work permanently. Subsequent requests are ignored, so
    /// no tick after shutdown can produce a frame.
    pub fn shutdown(&mut self) {
        self.pending = false;
        self.shut_down = true;
    }
}

/// Bounds for committed terminal sizes.
#[derive(Debug, Clone, Copy)]
pub struct SizeLimits {
    pub min_cols: u16,
    pub max_cols: u16,
    pub min_rows: u16,
    pub max_rows: u16,
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self {
            min_cols: 20,
            max_cols: 400,
            min_rows: 5,
            max_rows: 200,
        }
    }
}

/// Snap a raw cell size to the committed grid: columns to the nearest 10,
/// rows to the nearest 5, clamped to `limits`.
///
/// Rounding keeps drag-resizes from committing a new grid on every pixel
/// of movement.
#[must_use]
pub fn round_size(cols: u16, rows: u16, limits: SizeLimits) -> (u16, u16) {
    let round_to = |v: u16, step: u16| v.saturating_add(step / 2) / step * step;
    let cols = round_to(cols, 10).clamp(limits.min_cols, limits.max_cols);
    let rows = round_to(rows, 5).clamp(limits.min_rows, limits.max_rows);
    (cols, rows)
}

/// Latest-wins resize coalescer.
///
/// Requests replace each other; only the most recent size is committed,
/// after a quiet period. The committed size is reported only when it
/// actually differs from the last committed one.
#[derive(Debug)]
pub struct ResizeDebouncer {
    quiet: Duration,
    limits: SizeLimits,
    pending: Option<(u16, u16)>,
    last_request: Option<Instant>,
    committed: Option<(u16, u16)>,
}

impl ResizeDebouncer {
    #[must_use]
    pub fn new(quiet: Duration, limits: SizeLimits) -> Self {
        Self {
            quiet,
            limits,
            pending: None,
            last_request: None,
            committed: None,
        }
    }

    /// Record a raw size request. Earlier uncommitted requests are
    /// discarded.
    pub fn request(&mut self, cols: u16, rows: u16, now: Instant) {
        self.pending = Some(round_size(cols, rows, self.limits));
        self.last_request = Some(now);
    }

    /// Commit the pending size once the quiet period has elapsed. Returns
    /// the new size only when it changed.
    pub fn poll(&mut self, now: Instant) -> Option<(u16, u16)> {
        let pending = self.pending?;
        let last = self.last_request?;
        if now.duration_since(last) < self.quiet {
            return None;
        }
        self.commit(pending)
    }

    /// Commit immediately, skipping the quiet period.
    pub fn flush(&mut self) -> Option<(u16, u16)> {
        let pending = self.pending?;
        self.commit(pending)
    }

    fn commit(&mut self, size: (u16, u16)) -> Option<(u16, u16)> {
        self.pending = None;
        self.last_request = None;
        if self.committed == Some(size) {
            trace!(cols = size.0, rows = size.1, "resize coalesced to no-op");
            return None;
        }
        self.committed = Some(size);
        Some(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> Instant {
        Instant::now()
    }

    #[test]
    fn poll_without_request_is_idle() {
        let mut s = RenderScheduler::new(Duration::from_millis(16));
        assert!(!s.poll(t0()));
    }

    #[test]
    fn requests_coalesce_into_one_frame() {
        let mut s = RenderScheduler::new(Duration::from_millis(16));
        let now = t0();
        s.request();
        s.request();
        s.request();
        assert!(s.poll(now));
        assert!(!s.poll(now));
    }

    #[test]
    fn interval_throttles_frames() {
        let mut s = RenderScheduler::new(Duration::from_millis(16));
        let now = t0();
        s.request();
        assert!(s.poll(now));
        s.request();
        assert!(!s.poll(now + Duration::from_millis(5)));
        assert!(s.poll(now + Duration::from_millis(16)));
    }

    #[test]
    fn shutdown_drops_and_blocks_work() {
        let mut s = RenderScheduler::new(Duration::from_millis(16));
        s.request();
        s.shutdown();
        assert!(!s.poll(t0()));
        s.request();
        assert!(!s.has_pending());
    }

    #[test]
    fn rounding_is_tiered_and_clamped() {
        let limits = SizeLimits::default();
        assert_eq!(round_size(83, 27, limits), (80, 25));
        assert_eq!(round_size(87, 28, limits), (90, 30));
        assert_eq!(round_size(3, 1, limits), (20, 5));
        assert_eq!(round_size(2000, 2000, limits), (400, 200));
    }

    #[test]
    fn latest_request_wins() {
        let mut d = ResizeDebouncer::new(Duration::from_millis(100), SizeLimits::default());
        let now = t0();
        d.request(100, 40, now);
        d.request(120, 50, now + Duration::from_millis(10));
        assert!(d.poll(now + Duration::from_millis(50)).is_none());
        assert_eq!(
            d.poll(now + Duration::from_millis(110)),
            Some((120, 50))
        );
    }

    #[test]
    fn unchanged_committed_size_reports_nothing() {
        let mut d = ResizeDebouncer::new(Duration::from_millis(100), SizeLimits::default());
        let now = t0();
        d.request(80, 24, now);
        assert_eq!(d.flush(), Some((80, 25)));
        // 83 rounds to the same committed grid.
        d.request(83, 26, now);
        assert_eq!(d.flush(), None);
    }

    #[test]
    fn quiet_period_restarts_on_new_request() {
        let mut d = ResizeDebouncer::new(Duration::from_millis(100), SizeLimits::default());
        let now = t0();
        d.request(100, 40, now);
        d.request(110, 45, now + Duration::from_millis(90));
        assert!(d.poll(now + Duration::from_millis(120)).is_none());
        assert_eq!(
            d.poll(now + Duration::from_millis(190)),
            Some((110, 45))
        );
    }
}
