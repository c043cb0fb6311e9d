//! # chatbridge-service
//!
//! The Twitch session core:
//!
//! - [`SessionManager`]: token → identity → clients, logout, observable
//!   session/chat/live state
//! - [`ChatConnection`]: chat status state machine over one transport
//! - [`EmoteRegistry`]: merged emote table and word scanning
//! - [`LiveStatusPoller`]: periodic live check with one active timer
//! - [`TextBridge`]: gated relay between the text bus and chat

#![deny(unsafe_code)]

pub mod bridge;
pub mod chat;
pub mod clients;
pub mod emotes;
pub mod errors;
pub mod live;
pub mod session;

pub use bridge::{BridgeFlags, TextBridge, should_post};
pub use chat::{ChatConnection, ConnectionStatus, transition};
pub use clients::{ClientFactory, TwitchClientFactory};
pub use emotes::{EmoteRegistry, load_emotes};
pub use errors::{AuthError, EmoteScope, ProbeError, ProviderFetchError};
pub use live::{ApiLiveProbe, LiveProbe, LiveStatusPoller};
pub use session::{Session, SessionManager};
