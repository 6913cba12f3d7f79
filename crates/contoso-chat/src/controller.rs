//! Conversation controller: central coordinator of the assistant widget.
//!
//! Owns the message timeline and turn-taking against the inference backend,
//! and coordinates the identity gate, the voice controller and the product
//! classifier. No operation reports an error to its caller: invalid calls are
//! ignored and backend failures become a fallback message in the timeline.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use contoso_core::config::ContosoConfig;
use contoso_core::types::Identity;

use crate::backend::{AgentReply, AgentRequest, InferenceBackend};
use crate::classifier::is_comparison;
use crate::error::ChatError;
use crate::identity::IdentityGate;
use crate::quick_reply::{QuickReply, QuickReplyCatalog};
use crate::types::{Message, MessageId, TurnStatus, VoiceState};
use crate::voice::{CaptureEvent, PlaybackEvent, VoiceController};

/// Appended when the backend cannot be reached or its reply cannot be read.
pub const APOLOGY_TEXT: &str =
    "Sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// Sent on the shopper's behalf when they say the email on file is wrong.
pub const UPDATE_EMAIL_TEXT: &str = "I want to update my email";

/// Result of a send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input, a turn already in flight, or the microphone open.
    Ignored,
    /// The backend replied; `with_products` is set when a product message followed.
    Answered { with_products: bool },
    /// The backend failed; the apology message was appended.
    Failed,
}

/// Per-session timeline state.
struct Conversation {
    session_id: Uuid,
    identity: Identity,
    messages: Vec<Message>,
    next_id: MessageId,
    input: String,
    status: TurnStatus,
}

impl Conversation {
    fn empty() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            identity: Identity::default(),
            messages: Vec::new(),
            next_id: 1,
            input: String::new(),
            status: TurnStatus::Idle,
        }
    }

    /// Append a message under the next id.
    fn push(&mut self, build: impl FnOnce(MessageId) -> Message) -> MessageId {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(build(id));
        id
    }
}

/// Returns the turn status to `Idle` if a turn ends without a reply being
/// applied (the send future was dropped, or unwound).
struct TurnGuard<'a> {
    state: &'a Mutex<Conversation>,
    session_id: Uuid,
    armed: bool,
}

impl TurnGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut conv = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if conv.session_id == self.session_id && conv.status.is_awaiting() {
            tracing::warn!(session = %self.session_id, "Turn abandoned before the backend replied");
            conv.status = TurnStatus::Idle;
        }
    }
}

/// Coordinates one assistant widget session.
pub struct ConversationController {
    state: Mutex<Conversation>,
    voice: Mutex<VoiceController>,
    identity: IdentityGate,
    backend: Arc<dyn InferenceBackend>,
    guest_email: String,
    narrate_confirmations: bool,
}

impl ConversationController {
    /// Create a controller with default settings. Call [`initialize`](Self::initialize)
    /// before use.
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        identity: IdentityGate,
        voice: VoiceController,
    ) -> Self {
        let defaults = ContosoConfig::default();
        Self {
            state: Mutex::new(Conversation::empty()),
            voice: Mutex::new(voice),
            identity,
            backend,
            guest_email: defaults.backend.guest_email,
            narrate_confirmations: defaults.voice.narrate_confirmations,
        }
    }

    /// Apply the backend and voice sections of the configuration.
    pub fn with_config(mut self, config: &ContosoConfig) -> Self {
        self.guest_email = config.backend.guest_email.clone();
        self.narrate_confirmations = config.voice.narrate_confirmations;
        self
    }

    /// Start a new session for `identity`, discarding any previous timeline.
    ///
    /// The seed message asks the shopper to confirm their email when one is
    /// on file but not yet confirmed; otherwise it is a greeting.
    pub fn initialize(&self, identity: Identity) {
        let needs_confirmation = identity.has_email() && !self.identity.is_confirmed(&identity.email);

        let mut conv = self.conversation();
        *conv = Conversation::empty();
        if needs_confirmation {
            let text = email_prompt_text(&identity.email);
            conv.push(|id| Message::email_prompt(id, text));
        } else {
            let text = greeting_text(&identity);
            conv.push(|id| Message::bot(id, text));
        }
        tracing::info!(
            session = %conv.session_id,
            needs_confirmation,
            "Conversation initialized"
        );
        conv.identity = identity;
    }

    /// Send one turn to the backend.
    ///
    /// Silently ignored when `text` is blank, a turn is already in flight, or
    /// voice capture is active. Otherwise the user message is appended at once
    /// and the reply (or an apology) is appended when the backend answers.
    pub async fn send_message(&self, text: &str) -> TurnOutcome {
        let question = text.trim();
        if question.is_empty() {
            tracing::debug!("Ignoring blank message");
            return TurnOutcome::Ignored;
        }
        if self.voice().is_listening() {
            tracing::debug!("Ignoring message while listening");
            return TurnOutcome::Ignored;
        }

        let (session_id, email) = {
            let mut conv = self.conversation();
            if conv.status.is_awaiting() {
                tracing::debug!(session = %conv.session_id, "Ignoring message while a turn is in flight");
                return TurnOutcome::Ignored;
            }
            conv.push(|id| Message::user(id, question));
            conv.input.clear();
            conv.status = TurnStatus::AwaitingResponse {
                question: question.to_string(),
            };
            (conv.session_id, conv.identity.email.clone())
        };

        let guard = TurnGuard {
            state: &self.state,
            session_id,
            armed: true,
        };
        let request = AgentRequest {
            question: question.to_string(),
            email: self.effective_email(&email),
        };
        tracing::debug!(session = %session_id, email = %request.email, "Sending turn to backend");

        let result = self.backend.ask(&request).await;
        let (outcome, narration) = self.complete_turn(session_id, result);
        guard.disarm();

        if let Some(text) = narration {
            self.voice().speak(&text);
        }
        outcome
    }

    /// Send whatever is in the input buffer.
    pub async fn send_input(&self) -> TurnOutcome {
        let input = self.input();
        self.send_message(&input).await
    }

    /// The shopper confirmed the email on file.
    ///
    /// Ignored unless an email prompt is pending. Returns whether the prompt
    /// was answered.
    pub fn confirm_email(&self) -> bool {
        let (email, reply) = {
            let mut conv = self.conversation();
            let Some(prompt) = conv
                .messages
                .iter_mut()
                .find(|m| m.is_pending_confirmation())
            else {
                tracing::debug!("No email confirmation pending");
                return false;
            };
            prompt.email_confirmation_pending = Some(false);

            let email = conv.identity.email.clone();
            let reply = confirmed_text(&email);
            let text = reply.clone();
            conv.push(|id| Message::bot(id, text));
            (email, reply)
        };

        if let Err(e) = self.identity.confirm(&email) {
            tracing::warn!(error = %e, "Email confirmation not persisted; kept for this session");
        }
        if self.narrate_confirmations {
            self.voice().speak(&reply);
        }
        true
    }

    /// The shopper said the email on file is wrong. Asks the backend how to
    /// update it through the normal turn path.
    pub async fn reject_email(&self) -> TurnOutcome {
        if !self.has_pending_confirmation() {
            tracing::debug!("No email confirmation pending");
            return TurnOutcome::Ignored;
        }
        self.send_message(UPDATE_EMAIL_TEXT).await
    }

    /// Send the query behind the quick reply at `index`, if quick replies are showing.
    pub async fn select_quick_reply(&self, index: usize) -> TurnOutcome {
        let query = {
            let conv = self.conversation();
            QuickReplyCatalog::visible(&conv.messages)
                .get(index)
                .map(|reply| reply.query)
        };
        match query {
            Some(query) => self.send_message(query).await,
            None => TurnOutcome::Ignored,
        }
    }

    // -- Input buffer --

    pub fn set_input(&self, text: impl Into<String>) {
        self.conversation().input = text.into();
    }

    pub fn input(&self) -> String {
        self.conversation().input.clone()
    }

    // -- Voice --

    pub fn start_listening(&self) -> bool {
        self.voice().start_listening()
    }

    pub fn stop_listening(&self) {
        self.voice().stop_listening();
    }

    /// Apply a capture result; a transcript replaces the input buffer.
    /// Returns the transcript, if one was accepted.
    pub fn handle_capture_event(&self, event: CaptureEvent) -> Option<String> {
        let transcript = self.voice().handle_capture_event(event)?;
        self.set_input(transcript.clone());
        Some(transcript)
    }

    pub fn handle_playback_event(&self, event: PlaybackEvent) {
        self.voice().handle_playback_event(event);
    }

    pub fn toggle_voice(&self) -> bool {
        self.voice().toggle_voice()
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice().state()
    }

    // -- Read access --

    pub fn messages(&self) -> Vec<Message> {
        self.conversation().messages.clone()
    }

    pub fn status(&self) -> TurnStatus {
        self.conversation().status.clone()
    }

    /// Whether the typing indicator should show.
    pub fn is_typing(&self) -> bool {
        self.conversation().status.is_awaiting()
    }

    pub fn has_pending_confirmation(&self) -> bool {
        self.conversation()
            .messages
            .iter()
            .any(Message::is_pending_confirmation)
    }

    pub fn quick_replies(&self) -> &'static [QuickReply] {
        QuickReplyCatalog::visible(&self.conversation().messages)
    }

    pub fn session_id(&self) -> Uuid {
        self.conversation().session_id
    }

    // -- Private helpers --

    /// Apply a backend result to the timeline and return the turn to `Idle`.
    ///
    /// Returns the outcome and the text to narrate, if any.
    fn complete_turn(
        &self,
        session_id: Uuid,
        result: Result<AgentReply, ChatError>,
    ) -> (TurnOutcome, Option<String>) {
        let mut conv = self.conversation();
        if conv.session_id != session_id {
            tracing::debug!(session = %session_id, "Dropping reply for a closed session");
            return (TurnOutcome::Ignored, None);
        }
        conv.status = TurnStatus::Idle;

        match result {
            Ok(reply) => {
                let answer = reply.answer_text().to_string();
                let products = reply.into_products();
                let text = answer.clone();
                conv.push(|id| Message::bot(id, text));

                let with_products = match products {
                    Some(products) => {
                        let comparison = is_comparison(&products);
                        tracing::debug!(
                            count = products.len(),
                            comparison,
                            "Reply carried products"
                        );
                        conv.push(|id| Message::products(id, products, comparison));
                        true
                    }
                    None => false,
                };
                (TurnOutcome::Answered { with_products }, Some(answer))
            }
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "Backend turn failed");
                conv.push(|id| Message::bot(id, APOLOGY_TEXT));
                (TurnOutcome::Failed, None)
            }
        }
    }

    /// Confirmed email if there is one, else the guest placeholder.
    fn effective_email(&self, email: &str) -> String {
        if self.identity.is_confirmed(email) {
            email.to_string()
        } else {
            self.guest_email.clone()
        }
    }

    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn voice(&self) -> MutexGuard<'_, VoiceController> {
        self.voice.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn email_prompt_text(email: &str) -> String {
    format!(
        "Hi! I see your email is {}. Is that correct? Please confirm so I can personalise your shopping.",
        email
    )
}

fn greeting_text(identity: &Identity) -> String {
    match identity.display_name.as_deref() {
        Some(name) if !name.trim().is_empty() => format!(
            "Hi {}! I'm your Contoso shopping assistant. How can I help you today?",
            name.trim()
        ),
        _ => "Hi! I'm your Contoso shopping assistant. How can I help you today?".to_string(),
    }
}

fn confirmed_text(email: &str) -> String {
    format!(
        "Thanks! {} is confirmed. What can I help you find today?",
        email
    )
}

// =============================================================================
// Tests
// =============================================================================
