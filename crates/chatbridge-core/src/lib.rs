//! # chatbridge-core
//!
//! Shared vocabulary for the chatbridge crates.
//!
//! - **Text events**: [`TextEvent`] records flowing through the application's
//!   text pipeline (speech recognition, translation, typed input, chat echo)
//! - **Text bus**: the [`TextBus`] publish/subscribe seam and a
//!   broadcast-backed [`InMemoryTextBus`]
//! - **Logging**: [`logging::init`] for the `tracing` stack

#![deny(unsafe_code)]

pub mod bus;
pub mod events;
pub mod logging;

pub use bus::{InMemoryTextBus, TextBus};
pub use events::{CHAT_ORIGIN_TAG, EmoteSpans, TextEvent, TextEventKind, TextEventSource};
