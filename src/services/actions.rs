use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::errors::AppError;
use crate::models::{ActionEvent, ActionKind, ServiceDescriptor};

const CHANNEL_CAPACITY: usize = 64;

/// What the service sidebar is showing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SidebarState {
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceDescriptor>,
}

impl SidebarState {
    /// Folds one action into the sidebar. Returns `None` when the event does
    /// not concern the sidebar.
    pub fn apply(&self, event: &ActionEvent) -> Option<SidebarState> {
        match event.kind {
            ActionKind::Click => {
                let object = event.data.get("object")?;
                let service: ServiceDescriptor = serde_json::from_value(object.clone()).ok()?;
                Some(SidebarState {
                    open: true,
                    service: Some(service),
                })
            }
            ActionKind::Close => Some(SidebarState::default()),
            ActionKind::Other => None,
        }
    }
}

struct SessionChannel {
    tx: broadcast::Sender<SidebarState>,
    current: SidebarState,
}

impl SessionChannel {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            current: SidebarState::default(),
        }
    }

    /// Nothing to remember and nobody listening.
    fn is_idle(&self) -> bool {
        self.current == SidebarState::default() && self.tx.receiver_count() == 0
    }
}

/// Publish/subscribe channel for component actions, one per session. A
/// session only ever sees its own sidebar changes.
#[derive(Default)]
pub struct ActionBus {
    sessions: Mutex<HashMap<String, SessionChannel>>,
}

impl ActionBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, SessionChannel>>, AppError> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("sidebar state lock poisoned".to_string()))
    }

    pub fn publish(&self, session: &str, event: &ActionEvent) -> Result<SidebarState, AppError> {
        let mut sessions = self.lock()?;
        let channel = sessions
            .entry(session.to_string())
            .or_insert_with(SessionChannel::new);

        match channel.current.apply(event) {
            Some(next) if next != channel.current => {
                channel.current = next;
                tracing::info!(session, open = channel.current.open, service = ?channel.current.service.as_ref().map(|s| s.display_name()), "sidebar updated");
                // No subscribers is fine.
                let _ = channel.tx.send(channel.current.clone());
            }
            Some(_) => {}
            None => {
                tracing::debug!(session, kind = ?event.kind, component = ?event.component_id, "ignoring action");
            }
        }

        let current = channel.current.clone();
        if channel.is_idle() {
            sessions.remove(session);
        }
        Ok(current)
    }

    pub fn current(&self, session: &str) -> SidebarState {
        self.lock()
            .ok()
            .and_then(|sessions| sessions.get(session).map(|c| c.current.clone()))
            .unwrap_or_default()
    }

    /// The session's current sidebar plus a receiver for every later change.
    pub fn subscribe(
        &self,
        session: &str,
    ) -> Result<(SidebarState, broadcast::Receiver<SidebarState>), AppError> {
        let mut sessions = self.lock()?;
        // Drop sessions whose last subscriber went away with the sidebar closed.
        sessions.retain(|_, channel| !channel.is_idle());
        let channel = sessions
            .entry(session.to_string())
            .or_insert_with(SessionChannel::new);
        Ok((channel.current.clone(), channel.tx.subscribe()))
    }

    pub fn session_count(&self) -> usize {
        self.lock().map(|sessions| sessions.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn click(object: serde_json::Value) -> ActionEvent {
        ActionEvent {
            kind: ActionKind::Click,
            data: json!({ "object": object }),
            component_id: Some("service-card".to_string()),
        }
    }

    fn close() -> ActionEvent {
        ActionEvent {
            kind: ActionKind::Close,
            data: serde_json::Value::Null,
            component_id: None,
        }
    }

    #[test]
    fn test_click_opens_sidebar() {
        let state = SidebarState::default()
            .apply(&click(json!({"title": "Sports Massage", "needs": ["recovery"]})))
            .unwrap();
        assert!(state.open);
        assert_eq!(state.service.unwrap().display_name(), "Sports Massage");
    }

    #[test]
    fn test_click_without_object_ignored() {
        let event = ActionEvent {
            kind: ActionKind::Click,
            data: json!({"href": "/somewhere"}),
            component_id: None,
        };
        assert!(SidebarState::default().apply(&event).is_none());
    }

    #[test]
    fn test_close_clears() {
        let open = SidebarState {
            open: true,
            service: Some(ServiceDescriptor::default()),
        };
        assert_eq!(open.apply(&close()), Some(SidebarState::default()));
    }

    #[test]
    fn test_parse_event_json() {
        let event: ActionEvent = serde_json::from_str(
            r#"{"type": "hover", "data": {}, "componentId": "card-1"}"#,
        )
        .unwrap();
        assert_eq!(event.kind, ActionKind::Other);
        assert_eq!(event.component_id.as_deref(), Some("card-1"));
    }

    #[tokio::test]
    async fn test_bus_broadcasts_changes() {
        let bus = ActionBus::new();
        let (initial, mut rx) = bus.subscribe("user-1").unwrap();
        assert_eq!(initial, SidebarState::default());

        bus.publish("user-1", &click(json!({"name": "Physiotherapy"}))).unwrap();
        let received = rx.recv().await.unwrap();
        assert!(received.open);
        assert_eq!(bus.current("user-1"), received);

        // Unchanged state is not rebroadcast.
        bus.publish("user-1", &click(json!({"name": "Physiotherapy"}))).unwrap();
        bus.publish("user-1", &close()).unwrap();
        assert!(!rx.recv().await.unwrap().open);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let bus = ActionBus::new();
        let (_, mut alice) = bus.subscribe("alice").unwrap();
        let (_, mut bob) = bus.subscribe("bob").unwrap();

        bus.publish("bob", &click(json!({"name": "Private Consult"}))).unwrap();

        assert!(bob.recv().await.unwrap().open);
        assert!(alice.try_recv().is_err());
        assert!(!bus.current("alice").open);

        // A later subscriber for another session starts closed.
        let (initial, _) = bus.subscribe("carol").unwrap();
        assert_eq!(initial, SidebarState::default());
    }

    #[test]
    fn test_idle_sessions_dropped() {
        let bus = ActionBus::new();
        bus.publish("user-1", &click(json!({"name": "Physiotherapy"}))).unwrap();
        assert_eq!(bus.session_count(), 1);

        bus.publish("user-1", &close()).unwrap();
        assert_eq!(bus.session_count(), 0);

        {
            let (_, _rx) = bus.subscribe("user-2").unwrap();
            assert_eq!(bus.session_count(), 1);
        }
        // Receiver gone and sidebar closed: pruned on the next subscribe.
        let (_, _rx) = bus.subscribe("user-3").unwrap();
        assert_eq!(bus.session_count(), 1);
    }
}
