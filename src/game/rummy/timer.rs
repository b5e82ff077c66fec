use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::game::models::TimerState;

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Outcome of a single countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Timer is stopped, nothing changed
    Idle,
    Running { remaining: u32 },
    /// Countdown reached zero and the timer stopped
    TimeUp,
}

impl TimerState {
    pub fn new(total_time: u32) -> Self {
        Self {
            total_time,
            remaining: total_time,
            running: false,
        }
    }

    /// Stopped -> Running. Returns false if it was already running.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        true
    }

    /// Running -> Stopped, keeping `remaining`. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.running = false;
        true
    }

    /// Flips the state and returns whether the timer is now running
    pub fn toggle(&mut self) -> bool {
        if self.running {
            self.stop();
        } else {
            self.start();
        }
        self.running
    }

    /// Refills the countdown for a new turn
    pub fn reset(&mut self) {
        self.remaining = self.total_time;
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Tick::TimeUp
        } else {
            Tick::Running {
                remaining: self.remaining,
            }
        }
    }
}

/// Handle to the background task driving a turn countdown.
///
/// At most one task is alive per handle: spawning aborts the previous one.
#[derive(Debug, Default)]
pub struct Countdown {
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `on_tick` once per second until it returns `ControlFlow::Break`
    pub fn spawn<F, Fut>(&mut self, mut on_tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        self.cancel();

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if on_tick().await.is_break() {
                    debug!("Countdown finished");
                    break;
                }
            }
        });

        self.handle = Some(handle);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Countdown cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn start_is_a_no_op_when_running() {
        let mut timer = TimerState::new(120);

        assert!(timer.start());
        assert!(!timer.start());
        assert!(timer.running);
    }

    #[test]
    fn stop_preserves_remaining() {
        let mut timer = TimerState::new(120);
        timer.start();
        timer.tick();
        timer.tick();

        assert!(timer.stop());
        assert_eq!(timer.remaining, 118);
        assert_eq!(timer.tick(), Tick::Idle);
        assert_eq!(timer.remaining, 118);
    }

    #[test]
    fn toggle_flips_state() {
        let mut timer = TimerState::new(60);

        assert!(timer.toggle());
        assert!(!timer.toggle());
        assert!(!timer.running);
    }

    #[test]
    fn reaching_zero_is_terminal() {
        let mut timer = TimerState::new(2);
        timer.start();

        assert_eq!(timer.tick(), Tick::Running { remaining: 1 });
        assert_eq!(timer.tick(), Tick::TimeUp);
        assert!(!timer.running);
        assert_eq!(timer.tick(), Tick::Idle);
    }

    #[test]
    fn starting_an_exhausted_timer_times_up_on_first_tick() {
        let mut timer = TimerState::new(60);
        timer.remaining = 0;
        timer.start();

        assert_eq!(timer.tick(), Tick::TimeUp);
    }

    #[test]
    fn reset_refills_remaining() {
        let mut timer = TimerState::new(90);
        timer.remaining = 5;
        timer.reset();

        assert_eq!(timer.remaining, 90);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_once_per_second() {
        let ticks = Arc::new(AtomicU32::new(0));
        let mut countdown = Countdown::new();

        let counter = Arc::clone(&ticks);
        countdown.spawn(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(countdown.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn respawning_replaces_the_running_task() {
        let ticks = Arc::new(AtomicU32::new(0));
        let mut countdown = Countdown::new();

        for _ in 0..2 {
            let counter = Arc::clone(&ticks);
            countdown.spawn(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    ControlFlow::Continue(())
                }
            });
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticking() {
        let ticks = Arc::new(AtomicU32::new(0));
        let mut countdown = Countdown::new();

        let counter = Arc::clone(&ticks);
        countdown.spawn(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        countdown.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert!(!countdown.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn break_ends_the_task() {
        let mut countdown = Countdown::new();
        countdown.spawn(|| async { ControlFlow::Break(()) });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        tokio::task::yield_now().await;
        assert!(!countdown.is_active());
    }
}
