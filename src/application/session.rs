//! Actor that owns one [`TransactionStateMachine`] and feeds it events.
//!
//! Commands arrive over an `mpsc` channel and are applied one at a time, so a
//! draft never has more than one outstanding `analyze` or `commit`. While a
//! review has a running cooldown the actor keeps exactly one interval, keyed by
//! the timer handle; the interval is dropped as soon as the handle changes or
//! disappears, so no tick can outlive the review that started it.
//!
//! Snapshots reach the `watch` channel from the machine itself on every phase
//! change, so `Analyzing` and `Sending` are visible while their call is in flight.

use crate::application::cooldown::TimerHandle;
use crate::application::machine::{Phase, TransactionStateMachine, WorkflowSnapshot};
use crate::domain::draft::DraftInput;
use crate::domain::record::TransactionRecord;
use crate::error::{Rejection, Result, TriageError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::debug;

type Reply<T> = oneshot::Sender<std::result::Result<T, Rejection>>;

enum Command {
    Submit(DraftInput, Reply<Phase>),
    Confirm(Reply<Phase>),
    Cancel(Reply<Option<TransactionRecord>>),
    Reset(Reply<Phase>),
}

/// Client side of a running workflow actor.
pub struct WorkflowSession {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<WorkflowSnapshot>,
    task: JoinHandle<TransactionStateMachine>,
}

impl WorkflowSession {
    /// Moves `machine` into a new task. Must be called within a tokio runtime.
    pub fn spawn(mut machine: TransactionStateMachine) -> Self {
        let (commands, rx) = mpsc::channel(16);
        let (observer, snapshots) = watch::channel(machine.snapshot());
        machine.observe(observer);
        let task = tokio::spawn(run(machine, rx));
        Self {
            commands,
            snapshots,
            task,
        }
    }

    pub async fn submit(&self, input: DraftInput) -> Result<Phase> {
        self.request(|reply| Command::Submit(input, reply)).await
    }

    pub async fn confirm(&self) -> Result<Phase> {
        self.request(Command::Confirm).await
    }

    pub async fn cancel(&self) -> Result<Option<TransactionRecord>> {
        self.request(Command::Cancel).await
    }

    pub async fn reset(&self) -> Result<Phase> {
        self.request(Command::Reset).await
    }

    async fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| TriageError::SessionClosed)?;
        let outcome = response.await.map_err(|_| TriageError::SessionClosed)?;
        Ok(outcome?)
    }

    /// Latest published state of the machine.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until confirmation is permitted, or until the review ends.
    ///
    /// Returns the first snapshot that either allows confirmation or is no
    /// longer reviewing. Blocked reviews never satisfy the first condition.
    pub async fn wait_until_confirmable(&self) -> Result<WorkflowSnapshot> {
        let mut snapshots = self.subscribe();
        let snapshot = snapshots
            .wait_for(|s| s.confirm_enabled || s.phase != Phase::Reviewing)
            .await
            .map_err(|_| TriageError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Stops the actor and hands the machine back.
    pub async fn shutdown(self) -> Result<TransactionStateMachine> {
        drop(self.commands);
        self.task.await.map_err(|_| TriageError::SessionClosed)
    }
}

async fn run(
    mut machine: TransactionStateMachine,
    mut commands: mpsc::Receiver<Command>,
) -> TransactionStateMachine {
    let period = machine.config().tick_period;
    let mut ticker: Option<(TimerHandle, Interval)> = None;

    loop {
        sync_ticker(&machine, &mut ticker, period);

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                apply(&mut machine, command).await;
            }
            handle = next_tick(&mut ticker) => {
                let outcome = machine.tick_timer(handle);
                debug!(?outcome, "cooldown tick");
                machine.publish();
            }
        }
    }
    machine
}

async fn apply(machine: &mut TransactionStateMachine, command: Command) {
    match command {
        Command::Submit(input, reply) => {
            let outcome = machine.submit(&input).await;
            respond(machine, reply, outcome);
        }
        Command::Confirm(reply) => {
            let outcome = machine.confirm().await;
            respond(machine, reply, outcome);
        }
        Command::Cancel(reply) => {
            let outcome = machine.cancel();
            respond(machine, reply, outcome);
        }
        Command::Reset(reply) => {
            let outcome = machine.reset();
            respond(machine, reply, outcome);
        }
    }
}

/// Publishes the new state before answering, so a caller never observes a stale snapshot.
fn respond<T>(
    machine: &TransactionStateMachine,
    reply: Reply<T>,
    outcome: std::result::Result<T, Rejection>,
) {
    machine.publish();
    // A dropped receiver means the caller gave up on the answer; the event still applied.
    let _ = reply.send(outcome);
}

fn sync_ticker(
    machine: &TransactionStateMachine,
    ticker: &mut Option<(TimerHandle, Interval)>,
    period: Duration,
) {
    match machine.cooldown_handle() {
        Some(handle) if ticker.as_ref().is_some_and(|(h, _)| *h == handle) => {}
        Some(handle) => {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            *ticker = Some((handle, interval));
        }
        None => *ticker = None,
    }
}

async fn next_tick(ticker: &mut Option<(TimerHandle, Interval)>) -> TimerHandle {
    match ticker {
        Some((handle, interval)) => {
            interval.tick().await;
            *handle
        }
        None => std::future::pending().await,
    }
}
