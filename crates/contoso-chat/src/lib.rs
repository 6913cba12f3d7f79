//! Conversation core of the Contoso storefront assistant.
//!
//! Owns the message timeline, turn-taking against the inference backend,
//! the email-confirmation gate, voice capture/narration state, and the
//! product payload classification used by the renderer.

pub mod backend;
pub mod classifier;
pub mod controller;
pub mod error;
pub mod identity;
pub mod quick_reply;
pub mod types;
pub mod voice;

pub use backend::{AgentReply, AgentRequest, HttpBackend, InferenceBackend};
pub use classifier::is_comparison;
pub use controller::{ConversationController, TurnOutcome};
pub use error::ChatError;
pub use identity::{ConfirmationStore, IdentityGate, MemoryConfirmationStore};
pub use quick_reply::{QuickReply, QuickReplyCatalog};
pub use types::{Message, MessageId, Sender, TurnStatus, VoiceState};
pub use voice::{
    CaptureEvent, PlaybackEvent, SpeechCapture, SpeechPlayback, UnsupportedSpeech, UtteranceId,
    VoiceController,
};
