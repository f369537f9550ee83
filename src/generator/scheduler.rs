//! Host schedulers
//!
//! A bulk generation run hands control back to its host between batches. The
//! [`Scheduler`] trait is that suspension point: the run awaits
//! [`Scheduler::yield_control`] and resumes when the returned future completes.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Suspension primitive supplied by the host
pub trait Scheduler: Send + Sync {
    /// Suspend until the host lets the run continue
    fn yield_control(&self) -> impl Future<Output = ()> + Send;
}

/// Resumes immediately; for tests and headless batch jobs
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    async fn yield_control(&self) {}
}

/// Lets every other ready task on the runtime run before resuming
#[derive(Debug, Clone, Copy, Default)]
pub struct CooperativeScheduler;

impl Scheduler for CooperativeScheduler {
    async fn yield_control(&self) {
        tokio::task::yield_now().await;
    }
}

/// Resumes on the next frame tick, like a UI waiting for its next paint
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    origin: Instant,
    frame: Duration,
}

impl FrameScheduler {
    /// Create a scheduler ticking every `frame`
    ///
    /// # Arguments
    /// * `frame` - Frame length; zero is bumped to one millisecond
    pub fn new(frame: Duration) -> Self {
        Self {
            origin: Instant::now(),
            frame: frame.max(Duration::from_millis(1)),
        }
    }

    /// Frame length
    pub fn frame(&self) -> Duration {
        self.frame
    }

    /// Instant of the first frame boundary strictly after `now`
    fn next_tick(&self, now: Instant) -> Instant {
        let elapsed = now.saturating_duration_since(self.origin).as_nanos();
        let frame = self.frame.as_nanos();
        let frames = elapsed / frame + 1;
        let offset = u64::try_from(frames * frame).unwrap_or(u64::MAX);
        self.origin + Duration::from_nanos(offset)
    }
}

impl Scheduler for FrameScheduler {
    async fn yield_control(&self) {
        tokio::time::sleep_until(self.next_tick(Instant::now())).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_immediate_scheduler() {
        ImmediateScheduler.yield_control().await;
        CooperativeScheduler.yield_control().await;
    }

    #[test]
    fn test_next_tick_lands_on_frame_boundary() {
        let scheduler = FrameScheduler::new(Duration::from_millis(16));
        let origin = scheduler.origin;

        let tick = scheduler.next_tick(origin + Duration::from_millis(5));
        assert_eq!(tick, origin + Duration::from_millis(16));

        let tick = scheduler.next_tick(origin + Duration::from_millis(16));
        assert_eq!(tick, origin + Duration::from_millis(32));
    }

    #[test]
    fn test_zero_frame_is_bumped() {
        let scheduler = FrameScheduler::new(Duration::ZERO);
        assert_eq!(scheduler.frame(), Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_frame_scheduler_waits_for_tick() {
        let scheduler = FrameScheduler::new(Duration::from_millis(5));
        let before = Instant::now();
        scheduler.yield_control().await;
        assert!(before.elapsed() <= Duration::from_millis(500));
        assert!(Instant::now() > scheduler.origin);
    }
}
