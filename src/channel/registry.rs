use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde_json::Value;

use super::{Channel, MessageTarget, WireMessage};

thread_local! {
    static GLOBAL_REGISTRY: Rc<ChannelRegistry> = Rc::new(ChannelRegistry::new());
}

/// One channel per id; the registry is also the page's single window
/// `message` listener.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    channels: RefCell<HashMap<String, Rc<Channel>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by everything running on this thread's event loop.
    pub fn global() -> Rc<Self> {
        GLOBAL_REGISTRY.with(Rc::clone)
    }

    /// Returns the channel for `channel_id`, creating it when a live target is
    /// available. Without a reachable target the channel is absent and callers
    /// degrade to no-ops.
    pub fn acquire(
        &self,
        channel_id: &str,
        target: Option<&Rc<dyn MessageTarget>>,
    ) -> Option<Rc<Channel>> {
        if let Some(existing) = self.channels.borrow().get(channel_id) {
            return Some(Rc::clone(existing));
        }

        let target = target.filter(|target| target.is_alive())?;
        let channel = Rc::new(Channel::new(channel_id, Rc::downgrade(target)));
        tracing::debug!(channel = channel_id, "channel created");
        self.channels
            .borrow_mut()
            .insert(channel_id.to_string(), Rc::clone(&channel));
        Some(channel)
    }

    pub fn get(&self, channel_id: &str) -> Option<Rc<Channel>> {
        self.channels.borrow().get(channel_id).cloned()
    }

    /// Drops the channel; its outstanding requests reject as closed once the
    /// last handle goes away.
    pub fn release(&self, channel_id: &str) -> bool {
        self.channels.borrow_mut().remove(channel_id).is_some()
    }

    /// Entry point for raw window messages. Messages that are not channel
    /// envelopes, or that name an unknown channel, are ignored.
    pub fn handle_message(&self, raw: &Value) -> Option<LocalBoxFuture<'static, ()>> {
        let message = WireMessage::from_value(raw)?;
        let Some(channel) = self.get(&message.channel_id) else {
            tracing::trace!(channel = %message.channel_id, "message for unknown channel");
            return None;
        };
        channel.handle_message(message)
    }
}
