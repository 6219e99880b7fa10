//! Synchronous, in-process event pub/sub.

use crate::event::{Event, EventCategory};

/// Opaque handle returned from a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&Event) -> anyhow::Result<()>>;

struct Subscription {
    id: SubscriptionId,
    handler: Handler,
}

/// Records one handler's failure during a single `emit` call, surfaced on
/// the diagnostic channel (see the core's `HandlerFailed` error kind)
/// without interrupting delivery to remaining handlers.
#[derive(Debug)]
pub struct HandlerFailure {
    pub subscription: SubscriptionId,
    pub error: anyhow::Error,
}

/// In-process event bus: synchronous emit, registration-ordered delivery.
///
/// Handlers registered for an event's specific category, and all "any"
/// handlers, are invoked in the order they were registered, before `emit`
/// returns. A handler returning `Err` is isolated: it's recorded as a
/// [`HandlerFailure`] and logged, but does not block later handlers.
#[derive(Default)]
pub struct EventBus {
    category_handlers: Vec<(EventCategory, Subscription)>,
    any_handlers: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Subscribe a handler for a single category.
    pub fn subscribe_category<F>(&mut self, category: EventCategory, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> anyhow::Result<()> + 'static,
    {
        let id = self.fresh_id();
        self.category_handlers.push((
            category,
            Subscription {
                id,
                handler: Box::new(handler),
            },
        ));
        id
    }

    /// Subscribe a handler that receives every emitted event, regardless of
    /// category.
    pub fn subscribe_any<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) -> anyhow::Result<()> + 'static,
    {
        let id = self.fresh_id();
        self.any_handlers.push(Subscription {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a subscription by handle. Idempotent: removing an
    /// already-removed (or never-existing) handle is a no-op.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.category_handlers.retain(|(_, sub)| sub.id != id);
        self.any_handlers.retain(|sub| sub.id != id);
    }

    /// Number of registered "any" handlers.
    pub fn any_handler_count(&self) -> usize {
        self.any_handlers.len()
    }

    /// Synchronously deliver `event` to every matching category handler and
    /// every "any" handler, in registration order. Returns the set of
    /// handler failures encountered (empty on full success).
    pub fn emit(&mut self, event: &Event) -> Vec<HandlerFailure> {
        let mut failures = Vec::new();
        for (category, sub) in &mut self.category_handlers {
            if *category == event.category {
                if let Err(error) = (sub.handler)(event) {
                    tracing::warn!(subscription = sub.id.0, %error, "category event handler failed");
                    failures.push(HandlerFailure {
                        subscription: sub.id,
                        error,
                    });
                }
            }
        }
        for sub in &mut self.any_handlers {
            if let Err(error) = (sub.handler)(event) {
                tracing::warn!(subscription = sub.id.0, %error, "any-event handler failed");
                failures.push(HandlerFailure {
                    subscription: sub.id,
                    error,
                });
            }
        }
        failures
    }
}
