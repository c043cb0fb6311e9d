//! # chatbridge-twitch
//!
//! Clients for the remote services behind the Twitch integration:
//!
//! - [`helix`]: Helix REST client (identity, first-party emotes, stream status)
//!   behind the [`TwitchApi`] trait
//! - [`chat`]: IRC-over-websocket chat transport behind the [`ChatTransport`]
//!   trait, reporting lifecycle and messages on a single event channel
//! - [`emotes`]: `FrankerFaceZ`, `BetterTTV` and 7TV emote providers behind the
//!   [`EmoteProvider`] trait
//! - [`auth`]: implicit-flow authorization URL and token hand-off parsing

#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod chat;
pub mod emotes;
pub mod errors;
pub mod helix;
mod http;

pub use api::{Identity, TwitchApi};
pub use chat::{ChatMessage, ChatTransport, IrcConfig, IrcTransport, TransportEvent};
pub use emotes::{EmoteMap, EmoteProvider, default_providers};
pub use errors::{TransportError, TwitchError};
pub use helix::HelixClient;
