//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Handlers publish [`PlatformEvent`]s after a change commits; the
//! notification router subscribes and turns them into emails. The bus is
//! shared as `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use cutroom_core::types::DbId;

/// A client or staff member left a comment.
pub const EVENT_COMMENT_CREATED: &str = "comment.created";
/// A video version was approved.
pub const EVENT_VIDEO_APPROVED: &str = "video.approved";
/// Approval was withdrawn from a video version.
pub const EVENT_VIDEO_UNAPPROVED: &str = "video.unapproved";
/// Every video group in a project now has an approved version.
pub const EVENT_PROJECT_APPROVED: &str = "project.approved";

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// A domain event.
///
/// Every event is scoped to a project. `source_*` names the entity the
/// event is about (a comment, a video). The actor is either a staff user
/// id or, for clients, only a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Dot-separated event name, e.g. `"comment.created"`.
    pub event_type: String,
    pub project_id: DbId,
    pub source_entity_type: Option<String>,
    pub source_entity_id: Option<DbId>,
    /// Staff user behind the event, `None` for client actions.
    pub actor_user_id: Option<DbId>,
    /// Display name of whoever triggered the event.
    pub actor_name: Option<String>,
    /// Event-specific data.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    pub fn new(event_type: impl Into<String>, project_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            project_id,
            source_entity_type: None,
            source_entity_id: None,
            actor_user_id: None,
            actor_name: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.source_entity_type = Some(entity_type.into());
        self.source_entity_id = Some(entity_id);
        self
    }

    /// Record who triggered the event. `user_id` is `None` for clients.
    pub fn with_actor(mut self, user_id: Option<DbId>, name: impl Into<String>) -> Self {
        self.actor_user_id = user_id;
        self.actor_name = Some(name.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Whether a client (not staff) triggered the event.
    pub fn is_client_action(&self) -> bool {
        self.actor_user_id.is_none()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// When the buffer is full the oldest events are dropped and slow
/// receivers observe `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers. Dropped silently when
    /// nobody is listening.
    pub fn publish(&self, event: PlatformEvent) {
        tracing::debug!(event_type = %event.event_type, project_id = event.project_id, "Event published");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_enriched_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            PlatformEvent::new(EVENT_COMMENT_CREATED, 3)
                .with_source("comment", 42)
                .with_actor(None, "Dana")
                .with_payload(serde_json::json!({"timecode": "0:12"})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, EVENT_COMMENT_CREATED);
        assert_eq!(received.project_id, 3);
        assert_eq!(received.source_entity_id, Some(42));
        assert_eq!(received.actor_name.as_deref(), Some("Dana"));
        assert!(received.is_client_action());
        assert_eq!(received.payload["timecode"], "0:12");
    }

    #[tokio::test]
    async fn every_subscriber_gets_a_copy() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(PlatformEvent::new(EVENT_VIDEO_APPROVED, 1).with_actor(Some(9), "editor"));

        assert_eq!(rx1.recv().await.unwrap().event_type, EVENT_VIDEO_APPROVED);
        let e2 = rx2.recv().await.unwrap();
        assert!(!e2.is_client_action());
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.publish(PlatformEvent::new(EVENT_PROJECT_APPROVED, 1));
    }
}
