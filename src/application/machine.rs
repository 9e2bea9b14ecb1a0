use crate::application::cooldown::{CooldownState, CooldownTimer, TickOutcome, TimerHandle};
use crate::application::friction_gate::{self, GateDecision};
use crate::config::WorkflowConfig;
use crate::domain::draft::{DraftInput, TransactionDraft};
use crate::domain::ports::{RiskAssessorBox, TransactionCommitterBox};
use crate::domain::record::{CommitAck, RecordStatus, TransactionRecord};
use crate::domain::risk::{FrictionKind, RiskResult};
use crate::error::{AnalysisError, Rejection, SendError, WorkflowError};
use std::fmt;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Form,
    Analyzing,
    Reviewing,
    Sending,
    Success,
    Blocked,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Form => "form",
            Phase::Analyzing => "analyzing",
            Phase::Reviewing => "reviewing",
            Phase::Sending => "sending",
            Phase::Success => "success",
            Phase::Blocked => "blocked",
        };
        f.write_str(label)
    }
}

/// Cooldown obligation of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cooldown {
    NotRequired,
    Running(TimerHandle),
    Elapsed,
}

/// Everything bound to a draft once its risk result arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub draft: TransactionDraft,
    pub risk: RiskResult,
    pub friction: FrictionKind,
    pub warning_acknowledgement: bool,
    pub cooldown: Cooldown,
}

impl Review {
    fn cooldown_elapsed(&self) -> bool {
        !matches!(self.cooldown, Cooldown::Running(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Form,
    Analyzing { draft: TransactionDraft },
    Reviewing(Review),
    Sending(Review),
    Success {
        record: TransactionRecord,
        ack: CommitAck,
    },
    Blocked { record: TransactionRecord },
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Form => Phase::Form,
            WorkflowState::Analyzing { .. } => Phase::Analyzing,
            WorkflowState::Reviewing(_) => Phase::Reviewing,
            WorkflowState::Sending(_) => Phase::Sending,
            WorkflowState::Success { .. } => Phase::Success,
            WorkflowState::Blocked { .. } => Phase::Blocked,
        }
    }
}

/// Read-only view of the machine for presentation layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowSnapshot {
    pub phase: Phase,
    pub draft: Option<TransactionDraft>,
    pub risk: Option<RiskResult>,
    pub friction: Option<FrictionKind>,
    pub cooldown: Option<CooldownState>,
    pub confirm_enabled: bool,
    pub warning_acknowledgement: bool,
    pub error: Option<WorkflowError>,
    pub record: Option<TransactionRecord>,
}

/// Orchestrates one payment from form submission to a terminal outcome.
///
/// The machine is the only owner of the draft, its risk result and the cooldown
/// timer. The confirm guard is enforced here, so no caller can settle a payment
/// that its friction policy forbids. Errors from the services are stored on the
/// machine (see [`TransactionStateMachine::error`]) rather than returned; the
/// `Err` side of each command is reserved for commands refused without effect.
pub struct TransactionStateMachine {
    assessor: RiskAssessorBox,
    committer: TransactionCommitterBox,
    config: WorkflowConfig,
    state: WorkflowState,
    timer: CooldownTimer,
    error: Option<WorkflowError>,
    observer: Option<watch::Sender<WorkflowSnapshot>>,
}

impl TransactionStateMachine {
    pub fn new(assessor: RiskAssessorBox, committer: TransactionCommitterBox) -> Self {
        Self::with_config(assessor, committer, WorkflowConfig::default())
    }

    pub fn with_config(
        assessor: RiskAssessorBox,
        committer: TransactionCommitterBox,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            assessor,
            committer,
            config,
            state: WorkflowState::Form,
            timer: CooldownTimer::new(),
            error: None,
            observer: None,
        }
    }

    /// Publishes a snapshot to `observer` on every phase change, including the
    /// ones that happen before an `analyze` or `commit` call is awaited.
    pub fn observe(&mut self, observer: watch::Sender<WorkflowSnapshot>) {
        observer.send_replace(self.snapshot());
        self.observer = Some(observer);
    }

    /// Pushes the current snapshot to the observer, if any.
    pub fn publish(&self) {
        if let Some(observer) = &self.observer {
            observer.send_replace(self.snapshot());
        }
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// The last error caught at the orchestrator boundary, if any.
    pub fn error(&self) -> Option<&WorkflowError> {
        self.error.as_ref()
    }

    pub fn draft(&self) -> Option<&TransactionDraft> {
        match &self.state {
            WorkflowState::Analyzing { draft } => Some(draft),
            WorkflowState::Reviewing(review) | WorkflowState::Sending(review) => {
                Some(&review.draft)
            }
            _ => None,
        }
    }

    pub fn risk(&self) -> Option<&RiskResult> {
        match &self.state {
            WorkflowState::Reviewing(review) | WorkflowState::Sending(review) => {
                Some(&review.risk)
            }
            WorkflowState::Success { record, .. } | WorkflowState::Blocked { record } => {
                Some(record.risk_result())
            }
            _ => None,
        }
    }

    /// Handle of the cooldown currently bound to the review, if one is running.
    pub fn cooldown_handle(&self) -> Option<TimerHandle> {
        match &self.state {
            WorkflowState::Reviewing(Review {
                cooldown: Cooldown::Running(handle),
                ..
            }) if self.timer.is_active(*handle) => Some(*handle),
            _ => None,
        }
    }

    /// Whether a confirm issued now would pass the guard.
    pub fn can_confirm(&self) -> bool {
        match &self.state {
            WorkflowState::Reviewing(review) => {
                friction_gate::check_confirm(&review.risk, review.cooldown_elapsed(), None)
                    .is_ok()
            }
            _ => false,
        }
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let review = match &self.state {
            WorkflowState::Reviewing(review) | WorkflowState::Sending(review) => Some(review),
            _ => None,
        };
        let record = match &self.state {
            WorkflowState::Success { record, .. } | WorkflowState::Blocked { record } => {
                Some(record.clone())
            }
            _ => None,
        };
        let cooldown = review.and_then(|r| match r.cooldown {
            Cooldown::NotRequired => None,
            Cooldown::Running(_) => self.timer.state(),
            Cooldown::Elapsed => Some(CooldownState {
                remaining_seconds: 0,
                completed: true,
            }),
        });

        WorkflowSnapshot {
            phase: self.phase(),
            draft: self.draft().cloned(),
            risk: self.risk().cloned(),
            friction: review.map(|r| r.friction),
            cooldown,
            confirm_enabled: self.can_confirm(),
            warning_acknowledgement: review.is_some_and(|r| r.warning_acknowledgement),
            error: self.error.clone(),
            record,
        }
    }

    /// Validates `input` and, if valid, runs the single risk analysis for it.
    ///
    /// Resolves to the phase reached: `Form` (invalid input or analysis failure),
    /// `Reviewing`, or `Blocked`.
    pub async fn submit(&mut self, input: &DraftInput) -> Result<Phase, Rejection> {
        if self.phase() != Phase::Form {
            return Err(self.reject("submit"));
        }
        self.error = None;

        let draft = match input.validate() {
            Ok(draft) => draft,
            Err(e) => {
                debug!(error = %e, "payment request rejected by validation");
                self.error = Some(e.into());
                return Ok(Phase::Form);
            }
        };

        self.transition(WorkflowState::Analyzing {
            draft: draft.clone(),
        });

        let limit = self.config.analyze_timeout;
        let outcome = match timeout(limit, self.assessor.analyze(&draft)).await {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout(limit)),
        };

        match outcome {
            Ok(risk) => self.bind_risk(draft, risk).await,
            Err(e) => {
                warn!(error = %e, "risk analysis failed, draft discarded");
                self.error = Some(e.into());
                self.transition(WorkflowState::Form);
            }
        }
        Ok(self.phase())
    }

    async fn bind_risk(&mut self, draft: TransactionDraft, risk: RiskResult) {
        let friction = friction_gate::effective_friction(&risk);
        info!(
            score = risk.score,
            level = %risk.level,
            action = %risk.recommended_action,
            ?friction,
            "risk result bound to draft"
        );

        let decision = friction_gate::evaluate(&risk);
        if decision == GateDecision::Blocked {
            let record = TransactionRecord::new(&draft, &risk, RecordStatus::Blocked);
            self.transition(WorkflowState::Blocked {
                record: record.clone(),
            });
            self.commit_best_effort(&record).await;
            return;
        }

        let cooldown = match decision {
            GateDecision::PendingCooldown { seconds } => {
                Cooldown::Running(self.timer.start(seconds))
            }
            _ => Cooldown::NotRequired,
        };
        self.transition(WorkflowState::Reviewing(Review {
            draft,
            risk,
            friction,
            warning_acknowledgement: decision == GateDecision::AllowedWithWarning,
            cooldown,
        }));
    }

    async fn commit_best_effort(&self, record: &TransactionRecord) {
        match self.commit(record).await {
            Ok(_) => debug!(id = %record.id(), "blocked outcome recorded"),
            // Refusing confirmation already happened; losing the record is tolerated.
            Err(e) => warn!(id = %record.id(), error = %e, "failed to record blocked outcome"),
        }
    }

    async fn commit(&self, record: &TransactionRecord) -> Result<CommitAck, SendError> {
        let limit = self.config.commit_timeout;
        match timeout(limit, self.committer.commit(record)).await {
            Ok(result) => result,
            Err(_) => Err(SendError::Timeout(limit)),
        }
    }

    /// Confirms the reviewed payment and commits it.
    ///
    /// Refused without any state change while the friction policy forbids it.
    /// A commit failure returns to `Reviewing` with the same risk result; calling
    /// `confirm` again is the retry and never triggers a fresh analysis.
    pub async fn confirm(&mut self) -> Result<Phase, Rejection> {
        let review = match std::mem::replace(&mut self.state, WorkflowState::Form) {
            WorkflowState::Reviewing(review) => review,
            other => {
                self.state = other;
                return Err(self.reject("confirm"));
            }
        };

        let remaining = self.timer.state().map(|s| s.remaining_seconds);
        if let Err(rejection) =
            friction_gate::check_confirm(&review.risk, review.cooldown_elapsed(), remaining)
        {
            debug!(%rejection, "confirm rejected");
            self.state = WorkflowState::Reviewing(review);
            return Err(rejection);
        }

        self.error = None;
        let record = TransactionRecord::new(&review.draft, &review.risk, RecordStatus::Completed);
        self.transition(WorkflowState::Sending(review.clone()));

        match self.commit(&record).await {
            Ok(ack) => {
                info!(id = %record.id(), "payment committed");
                self.transition(WorkflowState::Success { record, ack });
            }
            Err(e) => {
                warn!(error = %e, "commit failed, awaiting manual retry");
                self.error = Some(e.into());
                self.transition(WorkflowState::Reviewing(review));
            }
        }
        Ok(self.phase())
    }

    /// Abandons the review and returns to a clean form.
    ///
    /// Idempotent: cancelling while already on the form is a no-op. The first
    /// cancel of a review yields a `cancelled` record for the caller; it is not
    /// committed anywhere.
    pub fn cancel(&mut self) -> Result<Option<TransactionRecord>, Rejection> {
        match std::mem::replace(&mut self.state, WorkflowState::Form) {
            WorkflowState::Form => {
                self.timer.cancel();
                self.error = None;
                Ok(None)
            }
            WorkflowState::Reviewing(review) => {
                self.timer.cancel();
                self.error = None;
                info!(from = %Phase::Reviewing, to = %Phase::Form, "workflow transition");
                Ok(Some(TransactionRecord::new(
                    &review.draft,
                    &review.risk,
                    RecordStatus::Cancelled,
                )))
            }
            other => {
                self.state = other;
                Err(self.reject("cancel"))
            }
        }
    }

    /// Leaves a terminal state for a fresh form.
    pub fn reset(&mut self) -> Result<Phase, Rejection> {
        match self.phase() {
            Phase::Form | Phase::Success | Phase::Blocked => {
                self.error = None;
                self.transition(WorkflowState::Form);
                Ok(Phase::Form)
            }
            _ => Err(self.reject("reset")),
        }
    }

    /// Advances the bound cooldown by one second. `None` when no cooldown runs.
    pub fn tick(&mut self) -> Option<TickOutcome> {
        let handle = self.cooldown_handle()?;
        Some(self.tick_timer(handle))
    }

    /// Advances the cooldown identified by `handle`; stale handles are ignored.
    pub fn tick_timer(&mut self, handle: TimerHandle) -> TickOutcome {
        let outcome = self.timer.tick(handle);
        if outcome == TickOutcome::Completed
            && let WorkflowState::Reviewing(review) = &mut self.state
            && review.cooldown == Cooldown::Running(handle)
        {
            review.cooldown = Cooldown::Elapsed;
            info!("cooldown elapsed, confirmation unlocked");
        }
        outcome
    }

    fn transition(&mut self, next: WorkflowState) {
        // A timer lives only as long as the review that started it.
        if !matches!(next, WorkflowState::Reviewing(_)) {
            self.timer.cancel();
        }
        let from = self.phase();
        let to = next.phase();
        self.state = next;
        if from != to {
            info!(%from, %to, "workflow transition");
        }
        self.publish();
    }

    fn reject(&self, command: &'static str) -> Rejection {
        let rejection = Rejection::InvalidState {
            command,
            phase: self.phase(),
        };
        debug!(%rejection, "command rejected");
        rejection
    }
}
