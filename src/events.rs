//! Typed publish/subscribe surface for engine events.
//!
//! External collaborators (the command layer, persistence) subscribe per
//! topic; the poller and authenticator publish. Publish is synchronous
//! fan-out: every handler for an event runs before the publisher moves on
//! to the next event, which is what preserves per-stream ordering. Slow
//! subscribers are the subscriber's problem, not this engine's.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::models::{InboundMail, InboundMessage, MessageKind};

/// Subscription topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Public chat messages
    Public,
    /// Private chat messages
    Private,
    /// System announcements
    System,
    /// Inbound mail
    Kmail,
    /// One-shot signal that a maintenance window has completed
    OutageEnded,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Topic::Public => "public",
            Topic::Private => "private",
            Topic::System => "system",
            Topic::Kmail => "kmail",
            Topic::OutageEnded => "outage-ended",
        };
        write!(f, "{}", name)
    }
}

/// An event published by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// An inbound chat message (topic derived from its kind)
    Chat(InboundMessage),
    /// An inbound mail item, already consumed server-side
    Kmail(InboundMail),
    /// The service came back from a maintenance window
    OutageEnded,
}

impl SessionEvent {
    /// The topic this event is delivered on.
    pub fn topic(&self) -> Topic {
        match self {
            SessionEvent::Chat(msg) => match msg.kind {
                MessageKind::Public => Topic::Public,
                MessageKind::Private => Topic::Private,
                MessageKind::System => Topic::System,
            },
            SessionEvent::Kmail(_) => Topic::Kmail,
            SessionEvent::OutageEnded => Topic::OutageEnded,
        }
    }
}

type Handler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Typed publish/subscribe bus.
///
/// Cheap to clone; clones share the same subscriber table.
///
/// # Example
///
/// ```ignore
/// use bellhop::events::{EventBus, SessionEvent, Topic};
///
/// let bus = EventBus::new();
/// bus.on(Topic::Private, |event| {
///     if let SessionEvent::Chat(msg) = event {
///         println!("{}: {}", msg.sender.name, msg.body);
///     }
/// });
/// ```
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: Arc<Mutex<HashMap<Topic, Vec<Handler>>>>,
}

impl EventBus {
    /// Create a new bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a handler to a topic.
    ///
    /// Multiple handlers per topic are allowed and run in subscription
    /// order.
    pub fn on<F>(&self, topic: Topic, handler: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.lock().unwrap();
        handlers.entry(topic).or_default().push(Arc::new(handler));
    }

    /// Publish an event to all subscribers of its topic.
    ///
    /// Handlers run synchronously on the publisher's task. The handler list
    /// is snapshotted before dispatch so handlers may subscribe without
    /// deadlocking.
    pub fn publish(&self, event: &SessionEvent) {
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.lock().unwrap();
            match handlers.get(&event.topic()) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        tracing::trace!(topic = %event.topic(), subscribers = snapshot.len(), "dispatching event");
        for handler in snapshot {
            handler(event);
        }
    }

    /// Number of subscribers for a topic.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers
            .lock()
            .unwrap()
            .get(&topic)
            .map(|list| list.len())
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus").finish_non_exhaustive()
    }
}
