//! Timeline and state types shared by the controller and the renderer.

use serde::{Deserialize, Serialize};

use contoso_core::types::{Product, Timestamp};

/// Position of a message in the timeline. Starts at 1, never reused.
pub type MessageId = u64;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// One entry of the conversation timeline.
///
/// Messages are built through the constructors below so that a product
/// payload and an email-confirmation prompt never share a message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_comparison: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_confirmation_pending: Option<bool>,
}

impl Message {
    fn new(id: MessageId, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id,
            sender,
            text: text.into(),
            timestamp: Timestamp::now(),
            products: None,
            is_comparison: None,
            email_confirmation_pending: None,
        }
    }

    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Sender::User, text)
    }

    pub fn bot(id: MessageId, text: impl Into<String>) -> Self {
        Self::new(id, Sender::Bot, text)
    }

    /// A bot message asking the shopper to confirm their email.
    pub fn email_prompt(id: MessageId, text: impl Into<String>) -> Self {
        let mut msg = Self::new(id, Sender::Bot, text);
        msg.email_confirmation_pending = Some(true);
        msg
    }

    /// A bot message carrying only a product payload.
    pub fn products(id: MessageId, products: Vec<Product>, is_comparison: bool) -> Self {
        let mut msg = Self::new(id, Sender::Bot, String::new());
        msg.products = Some(products);
        msg.is_comparison = Some(is_comparison);
        msg
    }

    pub fn is_pending_confirmation(&self) -> bool {
        self.email_confirmation_pending == Some(true)
    }
}

/// Turn-taking state of the controller.
///
/// Only one request to the backend may be outstanding; while it is, new
/// sends are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TurnStatus {
    #[default]
    Idle,
    AwaitingResponse { question: String },
}

impl TurnStatus {
    pub fn is_awaiting(&self) -> bool {
        matches!(self, TurnStatus::AwaitingResponse { .. })
    }
}

/// Snapshot of voice capture/playback state, as shown to the UI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceState {
    pub listening: bool,
    pub speaking: bool,
    pub supported: bool,
    pub enabled: bool,
}
