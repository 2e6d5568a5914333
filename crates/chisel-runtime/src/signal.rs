//! Named lifecycle signals.
//!
//! The bot emits three reserved signals (`startup`, `shutdown`,
//! `post_event_handling`) and one `on_<event_type>` signal per incoming
//! event. Handlers run concurrently and cannot affect dispatch.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, join_all};
use parking_lot::RwLock;

use chisel_core::{BoxedEvent, HandlingStatus};

/// Signals with a fixed meaning in the bot loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedSignal {
    Startup,
    Shutdown,
    PostEventHandling,
}

impl ReservedSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::PostEventHandling => "post_event_handling",
        }
    }
}

impl fmt::Display for ReservedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of the signal emitted when an event of `event_type` arrives.
pub fn event_signal(event_type: &str) -> String {
    format!("on_{event_type}")
}

/// Data attached to a signal.
#[derive(Debug, Clone)]
pub enum SignalPayload {
    None,
    Event(BoxedEvent),
    Handled {
        event: BoxedEvent,
        statuses: Arc<[HandlingStatus]>,
    },
}

impl SignalPayload {
    pub fn event(&self) -> Option<&BoxedEvent> {
        match self {
            Self::None => None,
            Self::Event(event) | Self::Handled { event, .. } => Some(event),
        }
    }

    pub fn statuses(&self) -> Option<&[HandlingStatus]> {
        match self {
            Self::Handled { statuses, .. } => Some(statuses),
            _ => None,
        }
    }
}

/// Emits named signals to whoever is listening.
#[async_trait]
pub trait SignalDispatcher: Send + Sync {
    async fn emit(&self, name: &str, payload: SignalPayload);
}

#[async_trait]
impl<S: SignalDispatcher + ?Sized> SignalDispatcher for Arc<S> {
    async fn emit(&self, name: &str, payload: SignalPayload) {
        (**self).emit(name, payload).await
    }
}

/// Drops every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignals;

#[async_trait]
impl SignalDispatcher for NoSignals {
    async fn emit(&self, _name: &str, _payload: SignalPayload) {}
}

type SignalHandler = Arc<dyn Fn(SignalPayload) -> BoxFuture<'static, ()> + Send + Sync>;

/// In-process signal registry.
///
/// ```rust,ignore
/// let hub = SignalHub::new();
/// hub.on("startup", |_| async { tracing::info!("ready") });
/// ```
#[derive(Default)]
pub struct SignalHub {
    handlers: RwLock<HashMap<String, Vec<SignalHandler>>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `name`.
    pub fn on<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(SignalPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: SignalHandler = Arc::new(move |payload| Box::pin(handler(payload)));
        self.handlers
            .write()
            .entry(name.into())
            .or_default()
            .push(handler);
    }

    /// Number of handlers registered for `name`.
    pub fn handler_count(&self, name: &str) -> usize {
        self.handlers.read().get(name).map_or(0, Vec::len)
    }
}

impl fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut names: Vec<_> = handlers.keys().collect();
        names.sort();
        f.debug_struct("SignalHub").field("signals", &names).finish()
    }
}

#[async_trait]
impl SignalDispatcher for SignalHub {
    async fn emit(&self, name: &str, payload: SignalPayload) {
        // Clone out so no lock is held across handler awaits.
        let handlers = self.handlers.read().get(name).cloned();
        let Some(handlers) = handlers else {
            return;
        };

        tracing::trace!(signal = name, handlers = handlers.len(), "Emitting signal");
        join_all(handlers.iter().map(|handler| handler(payload.clone()))).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chisel_core::TextEvent;

    use super::*;

    #[tokio::test]
    async fn test_hub_runs_every_handler() {
        let hub = SignalHub::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            hub.on("startup", move |_| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        hub.emit(ReservedSignal::Startup.as_str(), SignalPayload::None)
            .await;
        hub.emit("unknown", SignalPayload::None).await;

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(hub.handler_count("startup"), 3);
        assert_eq!(hub.handler_count("unknown"), 0);
    }

    #[tokio::test]
    async fn test_payload_reaches_handler() {
        let hub = SignalHub::new();
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let sink = seen.clone();
        hub.on(event_signal("message_new"), move |payload: SignalPayload| {
            let sink = sink.clone();
            async move {
                *sink.lock() = payload.event().map(|e| e.text_or_empty().to_string());
            }
        });

        let event = BoxedEvent::new(TextEvent::message("/ping"));
        hub.emit("on_message_new", SignalPayload::Event(event)).await;

        assert_eq!(seen.lock().as_deref(), Some("/ping"));
    }
}
