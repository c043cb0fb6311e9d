//! Text relay behaviour between the bus and a fake chat transport.

mod support;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chatbridge_core::{CHAT_ORIGIN_TAG, TextBus, TextEvent, TextEventSource};
use chatbridge_service::{ConnectionStatus, TextBridge};
use chatbridge_settings::TwitchSettings;
use support::{FakeTransport, Harness, OWNER_ID, harness, settle, wait_until};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Running {
    h: Harness,
    chat: Arc<FakeTransport>,
    cancel: CancellationToken,
    bridge: JoinHandle<()>,
}

impl Running {
    fn publish(&self, source: TextEventSource, event: TextEvent) {
        self.h.bus.publish(source, event);
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.bridge.await.unwrap();
    }
}

async fn running(configure: impl FnOnce(&mut TwitchSettings)) -> Running {
    let h = harness(|t| {
        t.chat_enable = true;
        t.chat_post_enable = true;
        configure(t);
    });
    let _ = h.manager.connect("tok").await.unwrap();
    let manager = h.manager.clone();
    wait_until("chat connected", || {
        manager.chat_status() == ConnectionStatus::Connected
    })
    .await;

    let cancel = CancellationToken::new();
    let bridge = TextBridge::new(h.bus.clone(), h.manager.clone(), h.settings.clone())
        .spawn(cancel.clone());
    let chat = h.factory.latest_transport();
    Running {
        h,
        chat,
        cancel,
        bridge,
    }
}

#[tokio::test]
async fn final_source_text_is_posted() {
    let r = running(|_| {}).await;

    r.publish(TextEventSource::Stt, TextEvent::interim_text("hel"));
    r.publish(TextEventSource::Stt, TextEvent::final_text(""));
    r.publish(TextEventSource::Stt, TextEvent::final_text("hello chat"));

    let chat = r.chat.clone();
    wait_until("posted", || !chat.said().is_empty()).await;
    settle().await;
    assert_eq!(r.chat.said(), vec!["hello chat"]);
    r.stop().await;
}

#[tokio::test]
async fn nothing_posted_when_disabled() {
    let r = running(|t| t.chat_post_enable = false).await;
    r.publish(TextEventSource::Stt, TextEvent::final_text("quiet"));
    settle().await;
    assert!(r.chat.said().is_empty());
    r.stop().await;
}

#[tokio::test]
async fn live_gate_holds_until_live() {
    let r = running(|t| t.chat_post_live = true).await;

    r.publish(TextEventSource::Stt, TextEvent::final_text("offline line"));
    settle().await;
    assert!(r.chat.said().is_empty());

    r.h.api.live.store(true, Ordering::SeqCst);
    let manager = r.h.manager.clone();
    wait_until("live", || manager.is_live()).await;

    r.publish(TextEventSource::Stt, TextEvent::final_text("offline line"));
    let chat = r.chat.clone();
    wait_until("posted", || !chat.said().is_empty()).await;
    assert_eq!(r.chat.said(), vec!["offline line"]);
    r.stop().await;
}

#[tokio::test]
async fn input_field_posted_alongside_source() {
    let r = running(|t| t.chat_post_input = true).await;
    r.publish(TextEventSource::Textfield, TextEvent::final_text("typed"));
    let chat = r.chat.clone();
    wait_until("posted", || !chat.said().is_empty()).await;
    assert_eq!(r.chat.said(), vec!["typed"]);
    r.stop().await;
}

#[tokio::test]
async fn input_field_ignored_when_disabled() {
    let r = running(|t| t.chat_post_input = false).await;
    r.publish(TextEventSource::Textfield, TextEvent::final_text("typed"));
    settle().await;
    assert!(r.chat.said().is_empty());
    r.stop().await;
}

#[tokio::test]
async fn textfield_source_posts_once() {
    let r = running(|t| {
        t.chat_post_source = TextEventSource::Textfield;
        t.chat_post_input = true;
    })
    .await;
    r.publish(TextEventSource::Textfield, TextEvent::final_text("once"));
    let chat = r.chat.clone();
    wait_until("posted", || !chat.said().is_empty()).await;
    settle().await;
    assert_eq!(r.chat.said(), vec!["once"]);
    r.stop().await;
}

#[tokio::test]
async fn owner_chat_published_with_emotes_and_not_echoed() {
    let r = running(|t| {
        t.chat_receive_enable = true;
        t.chat_post_source = TextEventSource::Textfield;
        t.chat_post_input = true;
    })
    .await;
    let mut textfield = r.h.bus.subscribe(TextEventSource::Textfield);

    r.chat.deliver("999", "viewer says Kappa").await;
    r.chat.deliver(OWNER_ID, "hello Kappa").await;

    let event = tokio::time::timeout(std::time::Duration::from_secs(5), textfield.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(event.is_final());
    assert_eq!(event.value, "hello Kappa");
    assert_eq!(event.origin_tag.as_deref(), Some(CHAT_ORIGIN_TAG));
    assert_eq!(event.emote_spans[&1], "twitch-global");

    settle().await;
    assert!(textfield.try_recv().is_err());
    assert!(r.chat.said().is_empty());
    r.stop().await;
}

#[tokio::test]
async fn owner_chat_dropped_when_receive_disabled() {
    let r = running(|t| t.chat_receive_enable = false).await;
    let mut textfield = r.h.bus.subscribe(TextEventSource::Textfield);

    r.chat.deliver(OWNER_ID, "hello").await;
    settle().await;
    assert!(textfield.try_recv().is_err());
    r.stop().await;
}

#[tokio::test]
async fn post_source_change_resubscribes() {
    let r = running(|t| {
        t.chat_post_source = TextEventSource::Stt;
        t.chat_post_input = false;
    })
    .await;

    assert!(
        r.h.settings
            .update(|s| s.twitch.chat_post_source = TextEventSource::Translation)
    );
    settle().await;

    r.publish(TextEventSource::Stt, TextEvent::final_text("from stt"));
    r.publish(TextEventSource::Translation, TextEvent::final_text("from translation"));
    let chat = r.chat.clone();
    wait_until("posted", || !chat.said().is_empty()).await;
    settle().await;
    assert_eq!(r.chat.said(), vec!["from translation"]);
    r.stop().await;
}

#[tokio::test]
async fn nothing_posted_without_session() {
    let r = running(|_| {}).await;
    r.h.manager.logout();
    r.publish(TextEventSource::Stt, TextEvent::final_text("after logout"));
    settle().await;
    assert!(r.chat.said().is_empty());
    r.stop().await;
}
