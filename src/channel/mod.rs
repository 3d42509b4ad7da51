//! Typed request/reply and event dispatch over the window-messaging primitive.
//!
//! A [`Channel`] is one named conversation with a counterpart window. Requests
//! carry a fresh correlation id and resolve when the matching reply arrives;
//! there is no timeout, so a vanished counterpart leaves the request pending
//! until the channel itself is dropped. Inbound requests are routed to
//! per-type handler chains registered with [`Channel::register_event`].

mod error;
pub mod events;
mod message;
mod registry;

pub use error::{ChannelError, ChannelResult};
pub use message::{has_error, MessageKind, WireMessage};
pub use registry::ChannelRegistry;

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};

use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// The counterpart window (parent frame or opener).
pub trait MessageTarget {
    /// `false` once the window has closed or navigated away.
    fn is_alive(&self) -> bool {
        true
    }

    fn post_message(&self, message: &WireMessage) -> Result<(), String>;
}

pub type HandlerFuture = LocalBoxFuture<'static, Result<Value, Value>>;
pub type EventHandler = Rc<dyn Fn(Value) -> HandlerFuture>;
pub type EventHook = Rc<dyn Fn(Value) -> LocalBoxFuture<'static, ()>>;
pub type RequestListener = Rc<dyn Fn(String, Value) -> HandlerFuture>;

/// Hooks awaited in order around the primary handler.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    pub pre_handlers: Vec<EventHook>,
    pub post_handlers: Vec<EventHook>,
}

impl HandlerOptions {
    pub fn pre<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.pre_handlers
            .push(Rc::new(move |payload| hook(payload).boxed_local()));
        self
    }

    pub fn post<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Value) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.post_handlers
            .push(Rc::new(move |payload| hook(payload).boxed_local()));
        self
    }
}

#[derive(Clone)]
struct HandlerChain {
    pre_handlers: Vec<EventHook>,
    handlers: Vec<EventHandler>,
    post_handlers: Vec<EventHook>,
}

type PendingReply = oneshot::Sender<Result<Value, Value>>;

pub struct Channel {
    id: String,
    target: Weak<dyn MessageTarget>,
    pending: RefCell<HashMap<String, PendingReply>>,
    handlers: RefCell<HashMap<String, HandlerChain>>,
    listener: RefCell<Option<RequestListener>>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("pending", &self.pending.borrow().len())
            .field("handlers", &self.handlers.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Channel {
    pub(crate) fn new(id: impl Into<String>, target: Weak<dyn MessageTarget>) -> Self {
        Self {
            id: id.into(),
            target,
            pending: RefCell::new(HashMap::new()),
            handlers: RefCell::new(HashMap::new()),
            listener: RefCell::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_reachable(&self) -> bool {
        self.target.upgrade().is_some_and(|target| target.is_alive())
    }

    pub fn pending_requests(&self) -> usize {
        self.pending.borrow().len()
    }

    fn post(&self, message: &WireMessage) -> ChannelResult<()> {
        let target = self
            .target
            .upgrade()
            .filter(|target| target.is_alive())
            .ok_or_else(|| ChannelError::TargetGone {
                channel_id: self.id.clone(),
            })?;
        target
            .post_message(message)
            .map_err(|detail| ChannelError::Delivery {
                channel_id: self.id.clone(),
                detail,
            })
    }

    /// Posts a request and resolves with the counterpart's reply payload.
    ///
    /// The message is posted before this returns; only the wait is deferred.
    pub fn send(&self, event_type: &str, payload: Value) -> LocalBoxFuture<'static, ChannelResult<Value>> {
        let correlation_id = Uuid::new_v4().to_string();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending
            .borrow_mut()
            .insert(correlation_id.clone(), reply_tx);

        let message = WireMessage::request(&self.id, &correlation_id, event_type, payload);
        tracing::debug!(channel = %self.id, event_type, correlation_id = %correlation_id, "sending request");
        if let Err(err) = self.post(&message) {
            self.pending.borrow_mut().remove(&correlation_id);
            return future::ready(Err(err)).boxed_local();
        }

        let channel_id = self.id.clone();
        let event_type = event_type.to_string();
        async move {
            match reply_rx.await {
                Ok(Ok(payload)) => Ok(payload),
                Ok(Err(reason)) => Err(ChannelError::Rejected { event_type, reason }),
                Err(oneshot::Canceled) => Err(ChannelError::Closed { channel_id }),
            }
        }
        .boxed_local()
    }

    pub fn send_as<T: DeserializeOwned + 'static>(
        &self,
        event_type: &str,
        payload: Value,
    ) -> LocalBoxFuture<'static, ChannelResult<T>> {
        let reply = self.send(event_type, payload);
        let event_type = event_type.to_string();
        async move {
            let payload = reply.await?;
            serde_json::from_value(payload).map_err(|err| ChannelError::Decode {
                event_type,
                detail: err.to_string(),
            })
        }
        .boxed_local()
    }

    /// Posts a request without waiting for (or tracking) its reply.
    pub fn fire(&self, event_type: &str, payload: Value) -> ChannelResult<()> {
        let correlation_id = Uuid::new_v4().to_string();
        tracing::debug!(channel = %self.id, event_type, "firing event");
        self.post(&WireMessage::request(&self.id, correlation_id, event_type, payload))
    }

    /// Replaces the raw request listener; when unset, inbound requests are
    /// dispatched to the registered handler chains.
    pub fn on<F, Fut>(&self, listener: F)
    where
        F: Fn(String, Value) -> Fut + 'static,
        Fut: Future<Output = Result<Value, Value>> + 'static,
    {
        *self.listener.borrow_mut() = Some(Rc::new(move |event_type, payload| {
            listener(event_type, payload).boxed_local()
        }));
    }

    pub fn register_event<F, Fut>(&self, event_type: &str, handler: F)
    where
        F: Fn(Value) -> Fut + 'static,
        Fut: Future<Output = Result<Value, Value>> + 'static,
    {
        self.register_event_with(event_type, handler, HandlerOptions::default());
    }

    /// Appends `handler` (and its hooks) to the chain for `event_type`.
    pub fn register_event_with<F, Fut>(&self, event_type: &str, handler: F, options: HandlerOptions)
    where
        F: Fn(Value) -> Fut + 'static,
        Fut: Future<Output = Result<Value, Value>> + 'static,
    {
        let handler: EventHandler = Rc::new(move |payload| handler(payload).boxed_local());
        let mut handlers = self.handlers.borrow_mut();
        let chain = handlers
            .entry(event_type.to_string())
            .or_insert_with(|| HandlerChain {
                pre_handlers: Vec::new(),
                handlers: Vec::new(),
                post_handlers: Vec::new(),
            });
        chain.pre_handlers.extend(options.pre_handlers);
        chain.handlers.push(handler);
        chain.post_handlers.extend(options.post_handlers);
    }

    pub fn unregister_event(&self, event_type: &str) {
        self.handlers.borrow_mut().remove(event_type);
    }

    pub fn has_handler(&self, event_type: &str) -> bool {
        self.handlers.borrow().contains_key(event_type)
    }

    /// Runs the chain for `event_type`: pre hooks, handlers, post hooks, each
    /// awaited in registration order. The last handler's outcome is returned;
    /// an unregistered type resolves to `Null`.
    pub fn invoke(&self, event_type: &str, payload: Value) -> HandlerFuture {
        let chain = self.handlers.borrow().get(event_type).cloned();
        let Some(chain) = chain else {
            tracing::debug!(channel = %self.id, event_type, "no handler registered for event");
            return future::ready(Ok(Value::Null)).boxed_local();
        };

        async move {
            for hook in &chain.pre_handlers {
                hook(payload.clone()).await;
            }
            let mut outcome = Ok(Value::Null);
            for handler in &chain.handlers {
                outcome = handler(payload.clone()).await;
            }
            for hook in &chain.post_handlers {
                hook(payload.clone()).await;
            }
            outcome
        }
        .boxed_local()
    }

    /// Routes an inbound message. Replies settle their pending request
    /// immediately; requests yield a future that runs the handlers and posts
    /// the reply, to be spawned on the page's executor.
    pub fn handle_message(self: &Rc<Self>, message: WireMessage) -> Option<LocalBoxFuture<'static, ()>> {
        match message.kind {
            MessageKind::Reply => {
                self.settle(message);
                None
            }
            MessageKind::Request => {
                let channel = Rc::clone(self);
                Some(
                    async move {
                        let listener = channel.listener.borrow().clone();
                        let outcome = match listener {
                            Some(listener) => {
                                listener(message.event_type.clone(), message.payload.clone()).await
                            }
                            None => {
                                channel
                                    .invoke(&message.event_type, message.payload.clone())
                                    .await
                            }
                        };
                        if let Err(err) = channel.post(&message.reply_to(outcome)) {
                            tracing::warn!(
                                channel = %channel.id,
                                event_type = %message.event_type,
                                %err,
                                "failed to post reply"
                            );
                        }
                    }
                    .boxed_local(),
                )
            }
        }
    }

    fn settle(&self, message: WireMessage) {
        let pending = self.pending.borrow_mut().remove(&message.correlation_id);
        let Some(reply_tx) = pending else {
            tracing::debug!(
                channel = %self.id,
                correlation_id = %message.correlation_id,
                "reply for unknown request"
            );
            return;
        };
        let outcome = if message.is_error() {
            Err(message.payload)
        } else {
            Ok(message.payload)
        };
        // The caller may have dropped its future; nothing to deliver to then.
        let _ = reply_tx.send(outcome);
    }
}
