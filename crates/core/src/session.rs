//! Guest session state machine.
//!
//! A [`GuestSession`] walks one guest through the flow:
//!
//! ```text
//! Start -> NameEntered -> PhotoStaged -> [ToneChosen] -> MessageComposed -> Submitted
//! ```
//!
//! Every transition is guard-checked and refused with a typed
//! [`SessionError`] instead of a redirect. Guests may step back to an
//! earlier step at any time before submission; later steps must then be
//! walked again.
//!
//! Submission is at-most-once. [`GuestSession::begin_submission`] latches
//! the session before the caller talks to the [`MemoryStore`], and any call
//! made while the latch is held short-circuits without a network effect.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::prompt::{select_question, select_question_with, SelectionMode};
use crate::settings::{EventRef, ResolvedConfig};
use crate::stores::{MemoryStore, StoreError};
use crate::tone::Tone;
use crate::types::MemoryId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum length of a guest message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 200;

/// Maximum length of a guest name, in characters.
pub const MAX_GUEST_NAME_CHARS: usize = 100;

/// Maximum size of an inline photo payload (data URL or link), in bytes.
///
/// The HTTP body limit must stay above this for the check to be reachable.
pub const MAX_PHOTO_BYTES: usize = 8 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a guest name and return it trimmed.
pub fn validate_guest_name(name: &str) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::blank("Name"));
    }
    if trimmed.chars().count() > MAX_GUEST_NAME_CHARS {
        return Err(CoreError::Validation(format!(
            "Name exceeds maximum length of {MAX_GUEST_NAME_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a guest message and return it trimmed.
///
/// The length limit applies to the raw input, so a 201-character entry is
/// refused even if trimming would bring it under the limit.
pub fn validate_message(message: &str) -> Result<String, CoreError> {
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(CoreError::Validation(format!(
            "Message exceeds maximum length of {MAX_MESSAGE_CHARS} characters"
        )));
    }
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(CoreError::blank("Message"));
    }
    Ok(trimmed.to_string())
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

/// A guest photo: an embedded `data:image/...` URL or an `http(s)` link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Photo(String);

impl Photo {
    pub fn new(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        let ok_scheme = value.starts_with("data:image/")
            || value.starts_with("https://")
            || value.starts_with("http://");
        if !ok_scheme {
            return Err(CoreError::Validation(
                "Photo must be a data:image URL or an http(s) link".to_string(),
            ));
        }
        if value.len() > MAX_PHOTO_BYTES {
            return Err(CoreError::Validation(format!(
                "Photo exceeds maximum size of {MAX_PHOTO_BYTES} bytes"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Photo {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Photo> for String {
    fn from(photo: Photo) -> Self {
        photo.0
    }
}

// ---------------------------------------------------------------------------
// NewMemory
// ---------------------------------------------------------------------------

/// A complete guest memory, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMemory {
    pub guest_name: String,
    pub photo: Option<Photo>,
    pub message: String,
    pub tone: Option<Tone>,
    pub event: Option<EventRef>,
}

impl NewMemory {
    /// Validate and normalize a memory submitted outside a session.
    pub fn new(
        guest_name: &str,
        photo: Option<Photo>,
        message: &str,
        tone: Option<Tone>,
        event: Option<EventRef>,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            guest_name: validate_guest_name(guest_name)?,
            photo,
            message: validate_message(message)?,
            tone,
            event,
        })
    }

    pub fn event_code(&self) -> Option<&str> {
        self.event.as_ref().map(|e| e.code.as_str())
    }
}

// ---------------------------------------------------------------------------
// State and errors
// ---------------------------------------------------------------------------

/// Where a guest is in the flow. Ordered by progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Start,
    NameEntered,
    PhotoStaged,
    ToneChosen,
    MessageComposed,
    Submitted,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::NameEntered => "name_entered",
            Self::PhotoStaged => "photo_staged",
            Self::ToneChosen => "tone_chosen",
            Self::MessageComposed => "message_composed",
            Self::Submitted => "submitted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A refused transition.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("Cannot {action} while the session is {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },

    #[error("The tone step is disabled for this session")]
    ToneStepDisabled,

    #[error("Cannot {action} while the memory is being submitted")]
    SubmissionInFlight { action: &'static str },
}

/// A failed finalize attempt.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Session is not ready to submit (state: {0})")]
    NotReady(SessionState),

    /// Persisting the memory failed. The session stays in
    /// `MessageComposed`; retrying is up to the caller.
    #[error("Memory submission failed: {0}")]
    Network(#[from] StoreError),
}

/// Result of a finalize call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "memory_id", rename_all = "snake_case")]
pub enum FinalizeOutcome {
    /// This call persisted the memory.
    Submitted(MemoryId),
    /// An earlier call already persisted it; nothing was sent.
    AlreadySubmitted(MemoryId),
    /// Another call is persisting it right now; nothing was sent.
    InFlight,
}

impl FinalizeOutcome {
    pub fn memory_id(self) -> Option<MemoryId> {
        match self {
            Self::Submitted(id) | Self::AlreadySubmitted(id) => Some(id),
            Self::InFlight => None,
        }
    }
}

/// Handle for a submission started with [`GuestSession::begin_submission`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket(u64);

/// What the caller should do after [`GuestSession::begin_submission`].
#[derive(Debug)]
pub enum Submission {
    /// Persist `memory`, then report back with the ticket.
    Ready {
        ticket: SubmissionTicket,
        memory: NewMemory,
    },
    /// Nothing to send.
    ShortCircuit(FinalizeOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Latch {
    Open,
    InFlight(SubmissionTicket),
    Done(MemoryId),
}

// ---------------------------------------------------------------------------
// GuestSession
// ---------------------------------------------------------------------------

/// One guest's in-progress submission.
#[derive(Debug)]
pub struct GuestSession {
    config: Arc<ResolvedConfig>,
    state: SessionState,
    guest_name: Option<String>,
    photo: Option<Photo>,
    tone: Option<Tone>,
    message: Option<String>,
    compose_question: Option<String>,
    latch: Latch,
    /// Bumped on every ticket and on reset, so a stale completion is ignored.
    epoch: u64,
}

impl GuestSession {
    pub fn new(config: Arc<ResolvedConfig>) -> Self {
        Self {
            config,
            state: SessionState::Start,
            guest_name: None,
            photo: None,
            tone: None,
            message: None,
            compose_question: None,
            latch: Latch::Open,
            epoch: 0,
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn config(&self) -> &Arc<ResolvedConfig> {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn guest_name(&self) -> Option<&str> {
        self.guest_name.as_deref()
    }

    pub fn photo(&self) -> Option<&Photo> {
        self.photo.as_ref()
    }

    pub fn tone(&self) -> Option<Tone> {
        self.tone
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn event(&self) -> Option<&EventRef> {
        self.config.event.as_ref()
    }

    /// Id of the persisted memory once submitted.
    pub fn memory_id(&self) -> Option<MemoryId> {
        match self.latch {
            Latch::Done(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.latch, Latch::InFlight(_))
    }

    /// `true` if the guest must pick a tone before composing.
    pub fn tone_step_required(&self) -> bool {
        self.config.tone_page_enabled
    }

    // -- transitions --------------------------------------------------------

    /// Enter the guest's name. Allowed from any state before submission.
    pub fn set_name(&mut self, name: &str) -> Result<SessionState, SessionError> {
        self.guard("enter a name", SessionState::Start)?;
        self.guest_name = Some(validate_guest_name(name)?);
        Ok(self.advance(SessionState::NameEntered))
    }

    /// Stage a captured or uploaded photo, or skip with `None`.
    pub fn set_photo(&mut self, photo: Option<Photo>) -> Result<SessionState, SessionError> {
        self.guard("stage a photo", SessionState::NameEntered)?;
        self.photo = photo;
        Ok(self.advance(SessionState::PhotoStaged))
    }

    /// Pick a tone. Refused when the tone step is disabled.
    pub fn choose_tone(&mut self, tone: Tone) -> Result<SessionState, SessionError> {
        if !self.tone_step_required() {
            return Err(SessionError::ToneStepDisabled);
        }
        self.guard("choose a tone", SessionState::PhotoStaged)?;
        if self.tone != Some(tone) {
            self.compose_question = None;
        }
        self.tone = Some(tone);
        Ok(self.advance(SessionState::ToneChosen))
    }

    /// Write the message. Requires a chosen tone when the tone step is on.
    pub fn compose_message(&mut self, message: &str) -> Result<SessionState, SessionError> {
        self.guard("write a message", self.compose_prerequisite())?;
        self.message = Some(validate_message(message)?);
        Ok(self.advance(SessionState::MessageComposed))
    }

    /// The question shown while composing.
    ///
    /// Picked at random on first call and then held until the tone changes
    /// or the session resets, so re-rendering never reshuffles it.
    pub fn compose_question(&mut self) -> &str {
        if self.compose_question.is_none() {
            let q = select_question(self.tone, &self.config.tone_questions, SelectionMode::Random);
            self.compose_question = Some(q);
        }
        self.compose_question.as_deref().unwrap_or_default()
    }

    /// Same as [`compose_question`](Self::compose_question) with an explicit RNG.
    pub fn compose_question_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &str {
        if self.compose_question.is_none() {
            let q = select_question_with(
                self.tone,
                &self.config.tone_questions,
                SelectionMode::Random,
                rng,
            );
            self.compose_question = Some(q);
        }
        self.compose_question.as_deref().unwrap_or_default()
    }

    /// The question shown on the recap page: always the first candidate.
    pub fn recap_question(&self) -> String {
        select_question(self.tone, &self.config.tone_questions, SelectionMode::First)
    }

    // -- submission ---------------------------------------------------------

    /// Latch the session and hand out the memory to persist.
    ///
    /// Returns [`Submission::ShortCircuit`] when a submission is already in
    /// flight or done.
    pub fn begin_submission(&mut self) -> Result<Submission, SubmitError> {
        match self.latch {
            Latch::Done(id) => {
                return Ok(Submission::ShortCircuit(FinalizeOutcome::AlreadySubmitted(id)))
            }
            Latch::InFlight(_) => return Ok(Submission::ShortCircuit(FinalizeOutcome::InFlight)),
            Latch::Open => {}
        }
        if self.state != SessionState::MessageComposed {
            return Err(SubmitError::NotReady(self.state));
        }
        let memory = self.draft().ok_or(SubmitError::NotReady(self.state))?;

        self.epoch += 1;
        let ticket = SubmissionTicket(self.epoch);
        self.latch = Latch::InFlight(ticket);
        Ok(Submission::Ready { ticket, memory })
    }

    /// Record the outcome of the persistence call started with `ticket`.
    ///
    /// A completion for a ticket that is no longer current is ignored and
    /// reported as [`FinalizeOutcome::InFlight`] with no state change.
    pub fn complete_submission(
        &mut self,
        ticket: SubmissionTicket,
        result: Result<MemoryId, StoreError>,
    ) -> Result<FinalizeOutcome, SubmitError> {
        if self.latch != Latch::InFlight(ticket) {
            tracing::warn!(state = %self.state, "Ignoring stale submission completion");
            return Ok(FinalizeOutcome::InFlight);
        }
        match result {
            Ok(id) => {
                self.latch = Latch::Done(id);
                self.state = SessionState::Submitted;
                Ok(FinalizeOutcome::Submitted(id))
            }
            Err(err) => {
                self.latch = Latch::Open;
                Err(SubmitError::Network(err))
            }
        }
    }

    /// Persist the memory through `store`, at most once.
    pub async fn finalize(
        &mut self,
        store: &dyn MemoryStore,
    ) -> Result<FinalizeOutcome, SubmitError> {
        match self.begin_submission()? {
            Submission::ShortCircuit(outcome) => Ok(outcome),
            Submission::Ready { ticket, memory } => {
                let result = store.create(&memory).await;
                self.complete_submission(ticket, result)
            }
        }
    }

    /// Clear everything and return to `Start`, keeping the resolved config
    /// so the device can serve the next guest.
    ///
    /// Refused while a submission is in flight; the draft belongs to the
    /// store call until it completes.
    pub fn reset(&mut self) -> Result<SessionState, SessionError> {
        if self.is_submitting() {
            return Err(SessionError::SubmissionInFlight {
                action: "start over",
            });
        }
        self.state = SessionState::Start;
        self.guest_name = None;
        self.photo = None;
        self.tone = None;
        self.message = None;
        self.compose_question = None;
        self.latch = Latch::Open;
        self.epoch += 1;
        Ok(SessionState::Start)
    }

    // -- helpers ------------------------------------------------------------

    /// The memory as it would be submitted now.
    pub fn draft(&self) -> Option<NewMemory> {
        Some(NewMemory {
            guest_name: self.guest_name.clone()?,
            photo: self.photo.clone(),
            message: self.message.clone()?,
            tone: if self.tone_step_required() { self.tone } else { None },
            event: self.config.event.clone(),
        })
    }

    fn compose_prerequisite(&self) -> SessionState {
        if self.tone_step_required() {
            SessionState::ToneChosen
        } else {
            SessionState::PhotoStaged
        }
    }

    /// Refuse edits after submission, during submission, or before `required`.
    fn guard(&self, action: &'static str, required: SessionState) -> Result<(), SessionError> {
        if self.is_submitting() {
            return Err(SessionError::SubmissionInFlight { action });
        }
        if self.state == SessionState::Submitted || self.state < required {
            return Err(SessionError::InvalidTransition {
                state: self.state,
                action,
            });
        }
        Ok(())
    }

    fn advance(&mut self, next: SessionState) -> SessionState {
        self.state = next;
        next
    }
}
