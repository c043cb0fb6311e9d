//! Construction of the per-session platform clients.
//!
//! [`SessionManager`](crate::SessionManager) never builds network clients
//! itself; it asks a [`ClientFactory`]. The production factory reads the
//! endpoints from the settings store at call time.

use std::sync::Arc;

use chatbridge_settings::SettingsStore;
use chatbridge_twitch::{
    ChatTransport, EmoteProvider, HelixClient, IrcConfig, IrcTransport, TransportEvent, TwitchApi,
    default_providers,
};
use tokio::sync::mpsc;

use crate::session::Session;

/// Builds the clients a session needs.
pub trait ClientFactory: Send + Sync {
    /// API client bound to `token`.
    fn api(&self, token: &str) -> Arc<dyn TwitchApi>;

    /// Chat transport for `session`'s own channel, with its event receiver.
    fn chat_transport(
        &self,
        session: &Session,
    ) -> (Arc<dyn ChatTransport>, mpsc::Receiver<TransportEvent>);

    /// Third-party emote providers in merge order.
    fn emote_providers(&self) -> Vec<Arc<dyn EmoteProvider>>;
}

/// Helix, IRC-over-websocket, and the built-in emote providers.
pub struct TwitchClientFactory {
    settings: Arc<SettingsStore>,
}

impl TwitchClientFactory {
    /// Create a factory reading endpoints from `settings`.
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }
}

impl ClientFactory for TwitchClientFactory {
    fn api(&self, token: &str) -> Arc<dyn TwitchApi> {
        Arc::new(HelixClient::from_settings(&self.settings.snapshot(), token))
    }

    fn chat_transport(
        &self,
        session: &Session,
    ) -> (Arc<dyn ChatTransport>, mpsc::Receiver<TransportEvent>) {
        let config = IrcConfig::for_own_channel(
            &self.settings.snapshot(),
            session.login.clone(),
            session.token.clone(),
        );
        let (transport, events) = IrcTransport::new(config);
        (Arc::new(transport), events)
    }

    fn emote_providers(&self) -> Vec<Arc<dyn EmoteProvider>> {
        default_providers(&self.settings.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use chatbridge_twitch::Identity;

    use super::*;

    #[tokio::test]
    async fn builds_default_clients() {
        let factory = TwitchClientFactory::new(Arc::new(SettingsStore::default()));
        assert_eq!(factory.emote_providers().len(), 3);

        let session = Session::from_identity(
            Identity {
                id: "1".into(),
                login: "owner".into(),
                display_name: "Owner".into(),
                avatar_url: String::new(),
            },
            "tok".into(),
        );
        let (transport, _events) = factory.chat_transport(&session);
        assert!(transport.say("owner", "hi").is_err());
    }
}
