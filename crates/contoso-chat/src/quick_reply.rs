//! Canned prompts offered on a fresh conversation.

use crate::types::Message;

/// A suggestion chip: what the button says and what gets sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuickReply {
    pub label: &'static str,
    pub query: &'static str,
}

const QUICK_REPLIES: &[QuickReply] = &[
    QuickReply {
        label: "Show phones",
        query: "Show me some phones",
    },
    QuickReply {
        label: "Compare laptops",
        query: "Compare your best laptops",
    },
    QuickReply {
        label: "Deals under ₹1000",
        query: "What products do you have under ₹1000?",
    },
    QuickReply {
        label: "Return policy",
        query: "What is your return policy?",
    },
    QuickReply {
        label: "Shipping info",
        query: "How long does shipping take?",
    },
];

/// Fixed, ordered catalog of quick replies.
pub struct QuickReplyCatalog;

impl QuickReplyCatalog {
    pub fn all() -> &'static [QuickReply] {
        QUICK_REPLIES
    }

    /// Quick replies are shown only while the timeline holds just its seed
    /// greeting. An email prompt hides them until it is answered.
    pub fn is_visible(messages: &[Message]) -> bool {
        matches!(messages, [only] if !only.is_pending_confirmation())
    }

    /// The replies to show for this timeline; empty when hidden.
    pub fn visible(messages: &[Message]) -> &'static [QuickReply] {
        if Self::is_visible(messages) {
            QUICK_REPLIES
        } else {
            &[]
        }
    }
}
