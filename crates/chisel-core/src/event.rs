//! Event system for the Chisel engine.
//!
//! This module provides the read-only event model that flows through a
//! dispatch batch:
//!
//! - [`Event`] - Base trait for all events
//! - [`BoxedEvent`] - Shared, type-erased handle to one event snapshot
//! - [`EventContext<T>`] - Wrapper giving typed access to a concrete event
//! - [`TextEvent`] - A plain JSON-backed chat event
//!
//! # Immutability
//!
//! Every command evaluating an event receives a clone of the same
//! [`BoxedEvent`]. The handle only ever hands out shared references, so a
//! reaction of one command can never change what a sibling command sees.

use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event type assigned to freshly received chat messages.
pub const MESSAGE_NEW: &str = "message_new";

/// Event type assigned to edited chat messages.
pub const MESSAGE_EDIT: &str = "message_edit";

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for all events in the Chisel engine.
///
/// Events are type-erased using `dyn Event` and can be downcast to concrete
/// types using `as_any()`.
pub trait Event: Any + Send + Sync {
    /// Returns the platform event type (e.g. `"message_new"`).
    ///
    /// Commands use this to decide whether the event is one they handle at
    /// all before running any filter.
    fn event_type(&self) -> &str;

    /// Returns the message text carried by this event, if any.
    ///
    /// Argument cutters consume this text from the front. Events without a
    /// message return `None`, which cutters see as an empty string.
    fn text(&self) -> Option<&str> {
        None
    }

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Boxed Event
// ============================================================================

/// A type-erased container for events that supports runtime downcasting.
///
/// `BoxedEvent` wraps any type implementing [`Event`] in an `Arc`; cloning
/// it is cheap and every clone points at the same snapshot.
///
/// `BoxedEvent` implements `Deref<Target = dyn Event>`, so trait methods can
/// be called directly:
///
/// ```rust,ignore
/// let event = BoxedEvent::new(TextEvent::message("/ping"));
/// assert_eq!(event.event_type(), "message_new");
/// ```
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event + 'static>(event: E) -> Self {
        Self {
            inner: Arc::new(event),
        }
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event + 'static>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }

    /// Returns `true` if the wrapped event is of type `E`.
    pub fn is<E: Event + 'static>(&self) -> bool {
        self.inner.as_any().is::<E>()
    }

    /// Attempts to extract a typed copy of the event.
    pub fn extract<E: Event + Clone + 'static>(&self) -> Option<EventContext<E>> {
        self.downcast_ref::<E>()
            .map(|event| EventContext::new(event.clone()))
    }

    /// Returns the event text, or an empty string for events without one.
    pub fn text_or_empty(&self) -> &str {
        self.inner.text().unwrap_or_default()
    }
}

impl<E: Event + 'static> From<E> for BoxedEvent {
    fn from(event: E) -> Self {
        Self::new(event)
    }
}

impl Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl std::fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("event_type", &self.event_type())
            .field("text", &self.text())
            .finish()
    }
}

// ============================================================================
// Event Context
// ============================================================================

/// Context wrapper that provides access to a concrete event type.
///
/// Reactions receive this through the extractor system and use `Deref` to
/// read fields directly on the wrapped type.
#[derive(Clone)]
pub struct EventContext<T: Event + Clone> {
    data: T,
}

impl<T: Event + Clone> EventContext<T> {
    /// Creates a new EventContext with the given data.
    pub fn new(data: T) -> Self {
        Self { data }
    }

    /// Returns a reference to the wrapped event.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Unwraps the event value.
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: Event + Clone> Deref for EventContext<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T: Event + Clone + std::fmt::Debug> std::fmt::Debug for EventContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("data", &self.data)
            .finish()
    }
}

// ============================================================================
// Text Event
// ============================================================================

/// A chat event decoded from the platform's JSON representation.
///
/// Only the fields the engine needs are typed; everything else is kept in
/// `extra` so reactions can still read platform-specific data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextEvent {
    /// The platform event type.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Message text, if the event carries a message.
    #[serde(default)]
    pub text: Option<String>,

    /// Conversation the event belongs to.
    #[serde(default)]
    pub peer_id: Option<i64>,

    /// Author of the message.
    #[serde(default)]
    pub from_id: Option<i64>,

    /// Remaining platform fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextEvent {
    /// Creates an event of the given type without text.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            text: None,
            peer_id: None,
            from_id: None,
            extra: Map::new(),
        }
    }

    /// Creates a `message_new` event with the given text.
    pub fn message(text: impl Into<String>) -> Self {
        Self::new(MESSAGE_NEW).with_text(text)
    }

    /// Sets the message text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the conversation identifier.
    pub fn with_peer(mut self, peer_id: i64) -> Self {
        self.peer_id = Some(peer_id);
        self
    }

    /// Sets the author identifier.
    pub fn with_author(mut self, from_id: i64) -> Self {
        self.from_id = Some(from_id);
        self
    }

    /// Decodes an event from its JSON form.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl Event for TextEvent {
    fn event_type(&self) -> &str {
        &self.event_type
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_event_from_json_keeps_extra_fields() {
        let raw = r#"{"type":"message_new","text":"/ping","peer_id":7,"attachments":[]}"#;
        let event = TextEvent::from_json(raw).unwrap();

        assert_eq!(event.event_type(), MESSAGE_NEW);
        assert_eq!(event.text(), Some("/ping"));
        assert_eq!(event.peer_id, Some(7));
        assert!(event.extra.contains_key("attachments"));
    }

    #[test]
    fn test_boxed_event_downcast() {
        let event = BoxedEvent::new(TextEvent::message("hi").with_author(42));

        assert!(event.is::<TextEvent>());
        let typed = event.extract::<TextEvent>().unwrap();
        assert_eq!(typed.from_id, Some(42));
    }

    #[test]
    fn test_text_or_empty_for_eventless_text() {
        let event = BoxedEvent::new(TextEvent::new("group_join"));
        assert_eq!(event.text_or_empty(), "");
    }
}
