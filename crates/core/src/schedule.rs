//! Fixed-interval repetition of deployment rounds.

use std::{future::Future, time::Duration};

use anyhow::Result;
use tokio::sync::watch;

use crate::RoundOutcome;

/// Create a connected shutdown trigger and signal.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

/// Fires the shutdown.
#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn fire(&self) {
        self.0.send_replace(true);
    }
}

/// Observes the shutdown. Cloned freely.
#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    pub fn is_fired(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolve once the shutdown fires. Never resolves if the trigger is dropped unfired.
    pub async fn fired(&mut self) {
        if self.0.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// One repeatable unit of work.
pub trait Round {
    /// Run round number `round` (1-based).
    fn run(&mut self, round: u64) -> impl Future<Output = Result<RoundOutcome>>;
}

/// Why the scheduler stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    /// A round found no key to deploy with.
    NoKeys,
    /// The shutdown signal fired between two rounds.
    Shutdown,
}

/// Runs a [`Round`] forever, waiting `interval` after each completed round.
///
/// The shutdown signal is only observed between rounds: a started round always runs
/// to completion.
#[derive(Debug)]
pub struct RoundScheduler {
    interval: Duration,
    shutdown: ShutdownSignal,
}

impl RoundScheduler {
    pub fn new(interval: Duration, shutdown: ShutdownSignal) -> Self {
        Self { interval, shutdown }
    }

    pub async fn run<R: Round>(&mut self, round: &mut R) -> Result<SchedulerExit> {
        let mut number = 0;

        loop {
            if self.shutdown.is_fired() {
                return Ok(SchedulerExit::Shutdown);
            }

            number += 1;
            if let RoundOutcome::NoKeys = round.run(number).await? {
                return Ok(SchedulerExit::NoKeys);
            }

            tracing::info!(
                round = number,
                wait_secs = self.interval.as_secs(),
                "Waiting before the next round..."
            );

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.fired() => {
                    tracing::info!("Shutdown requested, stopping");
                    return Ok(SchedulerExit::Shutdown);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::RoundReport;

    /// Plays back a fixed list of outcomes and records when each round started.
    struct ScriptedRound {
        outcomes: Vec<Result<RoundOutcome>>,
        started: Vec<(u64, Instant)>,
        on_round: Option<Box<dyn FnMut(u64)>>,
    }

    impl ScriptedRound {
        fn new(outcomes: Vec<Result<RoundOutcome>>) -> Self {
            Self {
                outcomes: outcomes.into_iter().rev().collect(),
                started: vec![],
                on_round: None,
            }
        }
    }

    impl Round for ScriptedRound {
        async fn run(&mut self, round: u64) -> Result<RoundOutcome> {
            self.started.push((round, Instant::now()));
            if let Some(hook) = self.on_round.as_mut() {
                hook(round);
            }
            self.outcomes.pop().unwrap_or(Ok(RoundOutcome::NoKeys))
        }
    }

    fn completed() -> Result<RoundOutcome> {
        Ok(RoundOutcome::Completed(RoundReport::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_stops_on_no_keys() {
        let (_trigger, signal) = shutdown_channel();
        let mut scheduler = RoundScheduler::new(Duration::from_secs(300), signal);
        let mut round = ScriptedRound::new(vec![completed(), completed(), Ok(RoundOutcome::NoKeys)]);

        let exit = scheduler.run(&mut round).await.unwrap();

        assert_eq!(exit, SchedulerExit::NoKeys);
        let numbers: Vec<_> = round.started.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 3]);

        // The full interval elapses between consecutive rounds
        for pair in round.started.windows(2) {
            assert_eq!(pair[1].1 - pair[0].1, Duration::from_secs(300));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_waits_even_when_deployments_failed() {
        let (_trigger, signal) = shutdown_channel();
        let mut scheduler = RoundScheduler::new(Duration::from_secs(60), signal);

        let partial = RoundReport {
            attempted: 3,
            failures: vec![crate::DeploymentFailure {
                attempt: 2,
                error: "reverted".to_string(),
            }],
            ..Default::default()
        };
        let mut round = ScriptedRound::new(vec![
            Ok(RoundOutcome::Completed(partial)),
            Ok(RoundOutcome::NoKeys),
        ]);

        let start = Instant::now();
        assert_eq!(scheduler.run(&mut round).await.unwrap(), SchedulerExit::NoKeys);
        assert_eq!(round.started.len(), 2);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_shutdown_between_rounds() {
        let (trigger, signal) = shutdown_channel();
        let mut scheduler = RoundScheduler::new(Duration::from_secs(300), signal);

        let mut round = ScriptedRound::new(vec![completed(), completed(), completed()]);
        // Fire during the first round: it still completes, the wait is cut short.
        let mut trigger = Some(trigger);
        round.on_round = Some(Box::new(move |_| {
            if let Some(trigger) = trigger.take() {
                trigger.fire();
            }
        }));

        let start = Instant::now();
        let exit = scheduler.run(&mut round).await.unwrap();

        assert_eq!(exit, SchedulerExit::Shutdown);
        assert_eq!(round.started.len(), 1);
        assert!(start.elapsed() < Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_fired_before_start_runs_nothing() {
        let (trigger, signal) = shutdown_channel();
        trigger.fire();

        let mut scheduler = RoundScheduler::new(Duration::from_secs(1), signal);
        let mut round = ScriptedRound::new(vec![completed()]);

        assert_eq!(scheduler.run(&mut round).await.unwrap(), SchedulerExit::Shutdown);
        assert!(round.started.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_propagates_round_errors() {
        let (_trigger, signal) = shutdown_channel();
        let mut scheduler = RoundScheduler::new(Duration::from_secs(1), signal);
        let mut round = ScriptedRound::new(vec![
            completed(),
            Err(anyhow::anyhow!("Compilation failed")),
        ]);

        let err = scheduler.run(&mut round).await.unwrap_err();
        assert!(err.to_string().contains("Compilation failed"));
        assert_eq!(round.started.len(), 2);
    }
}
