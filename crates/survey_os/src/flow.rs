#![forbid(unsafe_code)]

//! Page flow for one participant session: intake, flashcards, icon
//! assignment and the completion screen. Every state change is pushed to the
//! persistence bridge so a reload resumes where the participant left off.

use rand::rngs::StdRng;
use rand::SeedableRng;
use survey_engines::assignment::{AssignmentOutcome, AssignmentStore};
use survey_engines::education::FlashcardDeck;
use survey_engines::submission_client::{SubmissionError, SubmitReceipt, SurveySubmitter};
use survey_kernel_contracts::assignment::{AssignmentSnapshot, DragPayload};
use survey_kernel_contracts::role::{CreditRole, RoleId, ROLE_COUNT};
use survey_kernel_contracts::session::{NavigationState, ParticipantInfo, SurveyPage};
use survey_storage::bridge::{PersistenceBridge, SessionKey};
use survey_storage::kv::KeyValueStore;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::intake::{IntakeErrors, IntakeForm};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("page transition not allowed: {} -> {}", .from.as_str(), .to.as_str())]
    TransitionNotAllowed { from: SurveyPage, to: SurveyPage },
    #[error("{0}")]
    InvalidIntake(IntakeErrors),
    #[error("Please assign icons to all roles. {unassigned} roles still need icons.")]
    IncompleteAssignment { unassigned: usize },
    #[error("User information is missing. Please restart the survey.")]
    MissingParticipant,
    #[error("a survey submission is already in progress")]
    SubmissionInFlight,
    #[error("no survey submission is in progress")]
    NoSubmissionInFlight,
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

impl FlowError {
    /// Text shown to the participant for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Submission(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

fn is_allowed_page_transition(from: SurveyPage, to: SurveyPage) -> bool {
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (SurveyPage::Intake, SurveyPage::Education)
            | (SurveyPage::Education, SurveyPage::Intake)
            | (SurveyPage::Education, SurveyPage::Assignment)
            | (SurveyPage::Assignment, SurveyPage::Education)
            | (SurveyPage::Assignment, SurveyPage::Completed)
            | (SurveyPage::Completed, SurveyPage::Intake)
    )
}

/// What the submitter needs, captured when a submission starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSubmission {
    pub participant: ParticipantInfo,
    pub roles: Vec<CreditRole>,
}

#[derive(Debug)]
pub struct PageFlowController<S: KeyValueStore> {
    navigation: NavigationState,
    participant: Option<ParticipantInfo>,
    assignment_snapshot: Option<AssignmentSnapshot>,
    assignment: Option<AssignmentStore>,
    deck: FlashcardDeck,
    bridge: PersistenceBridge<S>,
    rng: StdRng,
    submitting: bool,
}

impl<S: KeyValueStore> PageFlowController<S> {
    pub fn resume(store: S) -> Self {
        Self::resume_with_rng(store, StdRng::from_entropy())
    }

    /// Rebuilds the session from whatever the store holds. Missing or
    /// damaged parts fall back to their defaults.
    pub fn resume_with_rng(store: S, rng: StdRng) -> Self {
        let bridge = PersistenceBridge::new(store);
        let session = bridge.load_session();
        let mut controller = Self {
            navigation: session.navigation,
            participant: session.participant,
            assignment_snapshot: session.assignment_snapshot,
            assignment: None,
            deck: FlashcardDeck::default(),
            bridge,
            rng,
            submitting: false,
        };
        if controller.navigation.current_page == SurveyPage::Assignment {
            controller.ensure_assignment();
        }
        info!(
            page = controller.navigation.current_page.as_str(),
            is_submitted = controller.navigation.is_submitted,
            "survey session resumed"
        );
        controller
    }

    pub fn current_page(&self) -> SurveyPage {
        self.navigation.current_page
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    pub fn is_submitted(&self) -> bool {
        self.navigation.is_submitted
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn participant(&self) -> Option<&ParticipantInfo> {
        self.participant.as_ref()
    }

    /// Present once the assignment page has been opened in this session.
    pub fn assignment(&self) -> Option<&AssignmentStore> {
        self.assignment.as_ref()
    }

    pub fn deck(&self) -> &FlashcardDeck {
        &self.deck
    }

    pub fn deck_mut(&mut self) -> &mut FlashcardDeck {
        &mut self.deck
    }

    pub fn bridge(&self) -> &PersistenceBridge<S> {
        &self.bridge
    }

    pub fn submit_intake(&mut self, form: &IntakeForm) -> Result<(), FlowError> {
        self.require_page(SurveyPage::Intake, SurveyPage::Education)?;
        let participant = form.validate().map_err(FlowError::InvalidIntake)?;
        self.bridge.save(SessionKey::Participant, &participant);
        self.participant = Some(participant);
        self.deck.reset();
        self.go_to(SurveyPage::Education)
    }

    pub fn back_to_intake(&mut self) -> Result<(), FlowError> {
        self.require_page(SurveyPage::Education, SurveyPage::Intake)?;
        self.go_to(SurveyPage::Intake)
    }

    pub fn continue_to_assignment(&mut self) -> Result<(), FlowError> {
        self.require_page(SurveyPage::Education, SurveyPage::Assignment)?;
        self.ensure_assignment();
        self.go_to(SurveyPage::Assignment)
    }

    pub fn back_to_education(&mut self) -> Result<(), FlowError> {
        self.require_page(SurveyPage::Assignment, SurveyPage::Education)?;
        self.deck.reset();
        self.go_to(SurveyPage::Education)
    }

    pub fn drop_on_role(
        &mut self,
        role_id: RoleId,
        payload: &DragPayload,
    ) -> Result<AssignmentOutcome, FlowError> {
        self.require_assignment_page()?;
        let outcome = match self.assignment.as_mut() {
            Some(store) => store.apply_drop(role_id, payload),
            None => AssignmentOutcome::Unchanged,
        };
        debug!(role_id = %role_id, ?outcome, "drop handled");
        self.persist_assignment_if(outcome);
        Ok(outcome)
    }

    pub fn reset_assignment(&mut self) -> Result<AssignmentOutcome, FlowError> {
        self.require_assignment_page()?;
        let outcome = match self.assignment.as_mut() {
            Some(store) => store.reset(&mut self.rng),
            None => AssignmentOutcome::Unchanged,
        };
        self.persist_assignment_if(outcome);
        Ok(outcome)
    }

    /// Local checks for a submission. On success the controller is marked
    /// as submitting until `finish_submission` is called.
    pub fn begin_submission(&mut self) -> Result<PendingSubmission, FlowError> {
        if self.submitting {
            return Err(FlowError::SubmissionInFlight);
        }
        self.require_page(SurveyPage::Assignment, SurveyPage::Completed)?;
        let store = self
            .assignment
            .as_ref()
            .ok_or(FlowError::IncompleteAssignment {
                unassigned: ROLE_COUNT,
            })?;
        if !store.is_complete() {
            return Err(FlowError::IncompleteAssignment {
                unassigned: store.unassigned_count(),
            });
        }
        let participant = self
            .participant
            .clone()
            .ok_or(FlowError::MissingParticipant)?;
        self.submitting = true;
        Ok(PendingSubmission {
            participant,
            roles: store.roles().to_vec(),
        })
    }

    /// Success moves to the completion page. Failure leaves the assignment
    /// page untouched so the participant can retry. Only valid after
    /// `begin_submission`.
    pub fn finish_submission(
        &mut self,
        result: Result<SubmitReceipt, SubmissionError>,
    ) -> Result<SubmitReceipt, FlowError> {
        if !self.submitting {
            return Err(FlowError::NoSubmissionInFlight);
        }
        self.submitting = false;
        match result {
            Ok(receipt) => {
                self.require_page(SurveyPage::Assignment, SurveyPage::Completed)?;
                self.navigation.is_submitted = true;
                self.go_to(SurveyPage::Completed)?;
                info!(submission_id = %receipt.submission_id, "survey completed");
                Ok(receipt)
            }
            Err(err) => {
                warn!(error = %err, "survey submission failed");
                Err(FlowError::Submission(err))
            }
        }
    }

    pub fn submit_survey(
        &mut self,
        submitter: &dyn SurveySubmitter,
    ) -> Result<SubmitReceipt, FlowError> {
        let pending = self.begin_submission()?;
        let result = submitter.submit(&pending.participant, &pending.roles);
        self.finish_submission(result)
    }

    /// Wipes every persisted key and starts over at intake.
    pub fn restart(&mut self) -> Result<(), FlowError> {
        self.require_page(SurveyPage::Completed, SurveyPage::Intake)?;
        self.bridge.clear();
        self.navigation = NavigationState::default();
        self.participant = None;
        self.assignment_snapshot = None;
        self.assignment = None;
        self.deck.reset();
        self.bridge.save(SessionKey::Navigation, &self.navigation);
        info!("survey restarted");
        Ok(())
    }

    fn require_page(&self, expected: SurveyPage, to: SurveyPage) -> Result<(), FlowError> {
        let from = self.navigation.current_page;
        if from != expected || !is_allowed_page_transition(from, to) {
            return Err(FlowError::TransitionNotAllowed { from, to });
        }
        Ok(())
    }

    fn go_to(&mut self, to: SurveyPage) -> Result<(), FlowError> {
        let from = self.navigation.current_page;
        if !is_allowed_page_transition(from, to) {
            return Err(FlowError::TransitionNotAllowed { from, to });
        }
        self.navigation.current_page = to;
        self.bridge.save(SessionKey::Navigation, &self.navigation);
        debug!(from = from.as_str(), to = to.as_str(), "page changed");
        Ok(())
    }

    fn ensure_assignment(&mut self) {
        if self.assignment.is_some() {
            return;
        }
        let store = AssignmentStore::initialize(self.assignment_snapshot.take(), &mut self.rng);
        let snapshot = store.snapshot();
        self.bridge.save(SessionKey::Assignment, &snapshot);
        self.assignment_snapshot = Some(snapshot);
        self.assignment = Some(store);
    }

    fn require_assignment_page(&self) -> Result<(), FlowError> {
        let page = self.navigation.current_page;
        if page != SurveyPage::Assignment || self.assignment.is_none() {
            return Err(FlowError::TransitionNotAllowed {
                from: page,
                to: SurveyPage::Assignment,
            });
        }
        Ok(())
    }

    fn persist_assignment_if(&mut self, outcome: AssignmentOutcome) {
        if !outcome.is_change() {
            return;
        }
        if let Some(store) = &self.assignment {
            let snapshot = store.snapshot();
            self.bridge.save(SessionKey::Assignment, &snapshot);
            self.assignment_snapshot = Some(snapshot);
        }
    }
}
