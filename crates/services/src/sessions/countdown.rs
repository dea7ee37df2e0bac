use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// One countdown step for a specific question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick {
    pub question_index: usize,
    pub remaining: u32,
}

impl CountdownTick {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }
}

/// Cancellable per-question timer.
///
/// A background task derives the remaining budget from the wall-clock time
/// elapsed since `start` and publishes it as a latest value. A consumer that
/// falls behind sees one jump to the current value instead of a backlog, and
/// the countdown never waits on it.
///
/// The receiving end is owned here, so once the handle is stopped or dropped
/// no further tick can be observed, including one already published.
#[derive(Debug)]
pub struct Countdown {
    question_index: usize,
    ticks: Option<watch::Receiver<CountdownTick>>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Start counting down `seconds` for the question at `question_index`.
    ///
    /// Returns `None` for a zero budget: untimed questions have no driver.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn start(question_index: usize, seconds: u32, period: Duration) -> Option<Self> {
        if seconds == 0 {
            return None;
        }
        let initial = CountdownTick {
            question_index,
            remaining: seconds,
        };
        let (tx, ticks) = watch::channel(initial);
        let task = tokio::spawn(run(initial, Instant::now(), period, tx));
        debug!(question_index, seconds, ?period, "countdown started");

        Some(Self {
            question_index,
            ticks: Some(ticks),
            task,
        })
    }

    /// Wait for the next change in remaining time. `None` once the budget is
    /// spent or after `stop`.
    ///
    /// Cancel safe: dropping the future never loses a tick.
    pub async fn next_tick(&mut self) -> Option<CountdownTick> {
        let ticks = self.ticks.as_mut()?;
        ticks.changed().await.ok()?;
        Some(*ticks.borrow_and_update())
    }

    /// Cancel the timer and discard anything not yet received.
    pub fn stop(&mut self) {
        self.task.abort();
        self.ticks = None;
        debug!(question_index = self.question_index, "countdown stopped");
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    initial: CountdownTick,
    started: Instant,
    period: Duration,
    tx: watch::Sender<CountdownTick>,
) {
    let mut interval = time::interval_at(started + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut last = initial.remaining;
    while last > 0 {
        interval.tick().await;
        let remaining = initial
            .remaining
            .saturating_sub(periods_elapsed(started, period));
        if remaining == last {
            continue;
        }
        last = remaining;
        trace!(question_index = initial.question_index, remaining, "countdown tick");
        let tick = CountdownTick {
            remaining,
            ..initial
        };
        if tx.send(tick).is_err() {
            return;
        }
    }
}

fn periods_elapsed(started: Instant, period: Duration) -> u32 {
    let periods = started.elapsed().as_nanos() / period.as_nanos().max(1);
    u32::try_from(periods).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn counts_down_to_zero_then_ends() {
        let started = Instant::now();
        let mut countdown = Countdown::start(0, 5, Duration::from_secs(1)).unwrap();

        let mut seen = Vec::new();
        while let Some(tick) = countdown.next_tick().await {
            seen.push(tick.remaining);
        }

        assert_eq!(seen, vec![4, 3, 2, 1, 0]);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
        assert_eq!(countdown.next_tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_budget_has_no_driver() {
        assert!(Countdown::start(3, 0, Duration::from_secs(1)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_published_ticks() {
        let mut countdown = Countdown::start(1, 10, Duration::from_secs(1)).unwrap();
        assert_eq!(countdown.next_tick().await.map(|t| t.remaining), Some(9));

        // Let the task publish the next value without receiving it.
        time::sleep(Duration::from_millis(1500)).await;
        countdown.stop();

        assert_eq!(countdown.next_tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn late_consumer_jumps_to_current_value() {
        let started = Instant::now();
        let mut countdown = Countdown::start(0, 10, Duration::from_secs(1)).unwrap();
        time::sleep(Duration::from_millis(4500)).await;

        let caught_up = countdown.next_tick().await.unwrap();
        assert_eq!(caught_up.remaining, 6);
        assert_eq!(started.elapsed(), Duration::from_millis(4500));

        let next = countdown.next_tick().await.unwrap();
        assert_eq!(next.remaining, 5);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_consumer_does_not_stretch_the_budget() {
        let started = Instant::now();
        let mut countdown = Countdown::start(0, 10, Duration::from_secs(1)).unwrap();

        let mut seen = Vec::new();
        let mut expired_at = None;
        while let Some(tick) = countdown.next_tick().await {
            seen.push(tick.remaining);
            if tick.is_expired() {
                expired_at = Some(started.elapsed());
            }
            time::sleep(Duration::from_secs(2)).await;
        }

        assert!(seen.windows(2).all(|pair| pair[1] < pair[0]));
        // Zero is published at 10s while the consumer sleeps until 11s.
        assert_eq!(expired_at, Some(Duration::from_secs(11)));
    }
}
