use serde::Serialize;

use super::domain::{Category, Step};
use super::submission::{SubmissionOutcome, SubmissionVariant};

/// Position of a session in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    Step1,
    Step2,
    Success,
}

impl WizardState {
    /// Step whose rules apply here; none once the wizard is complete.
    pub fn step(self) -> Option<Step> {
        match self {
            WizardState::Step1 => Some(Step::Sale),
            WizardState::Step2 => Some(Step::Confirmation),
            WizardState::Success => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WizardState::Step1 => "step1",
            WizardState::Step2 => "step2",
            WizardState::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("the confirmation has not been persisted yet")]
    NotPersisted,
    #[error("the wizard has already completed")]
    AtTerminalState,
    #[error("cannot go back from {}", .0.label())]
    CannotRetreat(WizardState),
}

/// Proof that the submitting flag is held. Consumed by `finish_submission`.
#[derive(Debug)]
#[must_use = "a permit must be handed back through finish_submission"]
pub struct SubmissionPermit {
    variant: SubmissionVariant,
    handoff: bool,
}

impl SubmissionPermit {
    pub fn variant(&self) -> SubmissionVariant {
        self.variant
    }

    pub fn handoff(&self) -> bool {
        self.handoff
    }
}

/// Owns the session's step, category and submission flags.
#[derive(Debug, Clone)]
pub struct WizardStateMachine {
    state: WizardState,
    category: Category,
    submitting: bool,
    last_error: Option<String>,
}

impl WizardStateMachine {
    pub fn new(category: Category) -> Self {
        Self {
            state: WizardState::Step1,
            category,
            submitting: false,
            last_error: None,
        }
    }

    /// Start directly in the confirmation leg after a sale-only handoff.
    pub fn resume_confirmation(category: Category) -> Self {
        Self {
            state: WizardState::Step2,
            ..Self::new(category)
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_success(&self) -> bool {
        self.state == WizardState::Success
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Step2 only ends through a persisted submission, so it never advances on its own.
    pub fn advance(&mut self) -> Result<WizardState, WizardError> {
        if self.submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        self.state = match self.state {
            WizardState::Step1 => WizardState::Step2,
            WizardState::Step2 => return Err(WizardError::NotPersisted),
            WizardState::Success => return Err(WizardError::AtTerminalState),
        };
        Ok(self.state)
    }

    pub fn retreat(&mut self) -> Result<WizardState, WizardError> {
        if self.submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        match self.state {
            WizardState::Step2 => {
                self.state = WizardState::Step1;
                Ok(self.state)
            }
            other => Err(WizardError::CannotRetreat(other)),
        }
    }

    /// Take the single submission slot; concurrent attempts are rejected, not queued.
    pub fn begin_submission(
        &mut self,
        variant: SubmissionVariant,
        handoff: bool,
    ) -> Result<SubmissionPermit, WizardError> {
        if self.state == WizardState::Success {
            return Err(WizardError::AtTerminalState);
        }
        if self.submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        self.submitting = true;
        self.last_error = None;
        Ok(SubmissionPermit { variant, handoff })
    }

    /// Release the slot and apply the outcome. The flag clears whatever happened.
    pub fn finish_submission(
        &mut self,
        permit: SubmissionPermit,
        outcome: &SubmissionOutcome,
    ) -> WizardState {
        self.submitting = false;

        if let SubmissionOutcome::Failure { message, .. } = outcome {
            self.last_error = Some(message.clone());
            return self.state;
        }

        self.last_error = None;
        match (permit.variant, permit.handoff) {
            (SubmissionVariant::SaleOnly, true) => {
                if self.state == WizardState::Step1 {
                    self.state = WizardState::Step2;
                }
            }
            _ => self.state = WizardState::Success,
        }
        self.state
    }
}
