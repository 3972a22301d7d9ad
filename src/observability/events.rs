//! Event notification for dashboards and alerting.
//!
//! Each client owns an `EventSink`. Sinks created through
//! [`EventSink::forwarding_to`] also publish into a parent channel, which is
//! how the manager sees the events of every client it built.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::integration::types::IntegrationError;
use crate::resilience::circuit_breaker::CircuitState;
use crate::resilience::classifier::Severity;

/// Buffered events per channel before slow subscribers start lagging.
pub const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrationEvent {
    StateChange {
        endpoint_id: String,
        from: CircuitState,
        to: CircuitState,
    },
    CircuitOpen {
        endpoint_id: String,
        failures: u32,
    },
    Reset {
        endpoint_id: String,
    },
    IntegrationError {
        error: IntegrationError,
    },
    IntegrationAlert {
        error: IntegrationError,
        severity: Severity,
    },
}

impl IntegrationEvent {
    pub fn endpoint_id(&self) -> &str {
        match self {
            IntegrationEvent::StateChange { endpoint_id, .. }
            | IntegrationEvent::CircuitOpen { endpoint_id, .. }
            | IntegrationEvent::Reset { endpoint_id } => endpoint_id,
            IntegrationEvent::IntegrationError { error }
            | IntegrationEvent::IntegrationAlert { error, .. } => &error.endpoint_id,
        }
    }
}

/// Publishing side of an event channel.
#[derive(Debug, Clone)]
pub struct EventSink {
    local: broadcast::Sender<IntegrationEvent>,
    upstream: Option<broadcast::Sender<IntegrationEvent>>,
}

impl EventSink {
    pub fn new() -> Self {
        let (local, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            local,
            upstream: None,
        }
    }

    /// A new sink whose events are also delivered to this sink's subscribers.
    pub fn forwarding_to(&self) -> Self {
        let (local, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            local,
            upstream: Some(self.local.clone()),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IntegrationEvent> {
        self.local.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: IntegrationEvent) {
        if let Some(upstream) = &self.upstream {
            let _ = upstream.send(event.clone());
        }
        let _ = self.local.send(event);
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}
