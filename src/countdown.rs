//! Pre-shot countdown timer.
//!
//! The current value and running flag are published through watch channels so
//! UI layers can observe ticks without polling. Cancellation snaps the value
//! to zero immediately.

use std::time::Duration;

use tokio::sync::watch;

pub struct Countdown {
    value: watch::Sender<u32>,
    running: watch::Sender<bool>,
    cancel: watch::Sender<bool>,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            value: watch::Sender::new(0),
            running: watch::Sender::new(false),
            cancel: watch::Sender::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.value.subscribe()
    }

    pub fn subscribe_running(&self) -> watch::Receiver<bool> {
        self.running.subscribe()
    }

    pub fn value(&self) -> u32 {
        *self.value.borrow()
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    /// Count from `duration` down to zero in one-second ticks, then return.
    /// A concurrent [`cancel`](Self::cancel) ends the wait early with the
    /// value forced to zero.
    pub async fn start(&self, duration: u32) {
        self.cancel.send_replace(false);
        self.value.send_replace(duration);
        self.running.send_replace(true);

        let mut cancel_rx = self.cancel.subscribe();
        let mut remaining = duration;
        while remaining > 0 {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {
                    remaining -= 1;
                    self.value.send_replace(remaining);
                }
                _ = cancel_rx.wait_for(|c| *c) => {
                    self.value.send_replace(0);
                    break;
                }
            }
        }
        self.running.send_replace(false);
    }

    /// Interrupt a running countdown. Harmless when idle.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Force the published value back to zero and mark the timer stopped.
    /// Used when the driving future is dropped instead of run to completion.
    pub fn reset(&self) {
        self.value.send_replace(0);
        self.running.send_replace(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_one_tick_per_second() {
        let cd = Countdown::new();
        let mut rx = cd.subscribe();
        let run = cd.start(3);
        tokio::pin!(run);

        // Not finished before 3 simulated seconds.
        let early = tokio::time::timeout(Duration::from_millis(2900), &mut run).await;
        assert!(early.is_err());
        assert_eq!(*rx.borrow_and_update(), 1);

        tokio::time::timeout(Duration::from_millis(200), &mut run)
            .await
            .expect("countdown should finish at the 3s mark");
        assert_eq!(*rx.borrow_and_update(), 0);
        assert!(!cd.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_completes_immediately() {
        let cd = Countdown::new();
        cd.start(0).await;
        assert_eq!(cd.value(), 0);
        assert!(!cd.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_ends_early_with_zero() {
        let cd = Countdown::new();
        let run = cd.start(5);
        tokio::pin!(run);

        let early = tokio::time::timeout(Duration::from_millis(1500), &mut run).await;
        assert!(early.is_err());
        assert_eq!(cd.value(), 4);

        cd.cancel();
        tokio::time::timeout(Duration::from_millis(10), &mut run)
            .await
            .expect("cancel should end the countdown");
        assert_eq!(cd.value(), 0);
        assert!(!cd.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_cancel_works() {
        let cd = Countdown::new();
        cd.cancel();
        // A stale cancel flag must not poison the next run.
        let run = cd.start(2);
        tokio::pin!(run);
        let early = tokio::time::timeout(Duration::from_millis(500), &mut run).await;
        assert!(early.is_err());
        assert!(cd.is_running());
        tokio::time::timeout(Duration::from_millis(1600), &mut run)
            .await
            .expect("restarted countdown should run to completion");
        assert_eq!(cd.value(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn running_flag_tracks_lifecycle() {
        let cd = Countdown::new();
        let mut running = cd.subscribe_running();
        assert!(!*running.borrow_and_update());
        let run = cd.start(1);
        tokio::pin!(run);
        let _ = tokio::time::timeout(Duration::from_millis(10), &mut run).await;
        assert!(*running.borrow_and_update());
        tokio::time::timeout(Duration::from_millis(1100), &mut run)
            .await
            .unwrap();
        assert!(!*running.borrow_and_update());
    }
}
