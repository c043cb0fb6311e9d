//! Text events exchanged over the application's text bus.
//!
//! A [`TextEvent`] is one unit of text moving through the pipeline: an
//! interim or final speech recognition result, a translation, a line typed
//! into an input field, or a chat message echoed back from the channel.
//! Events are published under a [`TextEventSource`] and carry an optional
//! origin tag that identifies which input produced them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin tag attached to events that were produced from channel chat.
///
/// Anything carrying this tag must never be relayed back into chat.
pub const CHAT_ORIGIN_TAG: &str = "twitchChat";

/// Emote annotations keyed by word index into [`TextEvent::value`].
pub type EmoteSpans = BTreeMap<usize, String>;

/// Whether an event is a provisional or a settled piece of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEventKind {
    /// Provisional text that may still change (e.g. partial recognition).
    Interim,
    /// Settled text.
    Final,
}

/// Named source a text event is published under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEventSource {
    /// Speech-to-text output.
    #[default]
    Stt,
    /// Translation output.
    Translation,
    /// Text input fields (typed text, chat echo).
    Textfield,
}

impl fmt::Display for TextEventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stt => write!(f, "stt"),
            Self::Translation => write!(f, "translation"),
            Self::Textfield => write!(f, "textfield"),
        }
    }
}

/// One unit of text on the bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEvent {
    /// Interim or final.
    #[serde(rename = "type")]
    pub kind: TextEventKind,
    /// The text itself.
    pub value: String,
    /// Which input produced the event, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_tag: Option<String>,
    /// Emote image references keyed by word index.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub emote_spans: EmoteSpans,
}

impl TextEvent {
    /// A final event with no origin tag.
    pub fn final_text(value: impl Into<String>) -> Self {
        Self {
            kind: TextEventKind::Final,
            value: value.into(),
            origin_tag: None,
            emote_spans: EmoteSpans::new(),
        }
    }

    /// An interim event with no origin tag.
    pub fn interim_text(value: impl Into<String>) -> Self {
        Self {
            kind: TextEventKind::Interim,
            ..Self::final_text(value)
        }
    }

    /// Set the origin tag.
    #[must_use]
    pub fn with_origin(mut self, tag: impl Into<String>) -> Self {
        self.origin_tag = Some(tag.into());
        self
    }

    /// Set the emote spans.
    #[must_use]
    pub fn with_emotes(mut self, spans: EmoteSpans) -> Self {
        self.emote_spans = spans;
        self
    }

    /// Whether the event is settled text.
    pub fn is_final(&self) -> bool {
        self.kind == TextEventKind::Final
    }

    /// Whether the event was produced from channel chat.
    pub fn is_from_chat(&self) -> bool {
        self.origin_tag.as_deref() == Some(CHAT_ORIGIN_TAG)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
