use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use minnow_config::MinnowConfig;
use minnow_core::events::CoreEvent;
use minnow_protocol::ids::ProjectId;
use tokio::sync::broadcast;

pub const DEFAULT_PROJECT_BUFFER_CAPACITY: usize = 64;
pub const DEFAULT_GLOBAL_BUFFER_CAPACITY: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreEventBusConfig {
    pub project_buffer_capacity: usize,
    pub global_buffer_capacity: usize,
}

impl Default for CoreEventBusConfig {
    fn default() -> Self {
        Self {
            project_buffer_capacity: DEFAULT_PROJECT_BUFFER_CAPACITY,
            global_buffer_capacity: DEFAULT_GLOBAL_BUFFER_CAPACITY,
        }
    }
}

impl From<&MinnowConfig> for CoreEventBusConfig {
    fn from(config: &MinnowConfig) -> Self {
        Self {
            project_buffer_capacity: config.events.project_buffer,
            global_buffer_capacity: config.events.global_buffer,
        }
    }
}

/// A published event plus its position in the publish order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreEventEnvelope {
    pub sequence: u64,
    pub event: CoreEvent,
}

/// Fan-out for core events: one global channel every observer can watch,
/// plus lazily created per-project channels keyed by the event's project id.
/// Events that concern no single project reach only the global channel.
#[derive(Debug)]
pub struct CoreEventBus {
    next_sequence: AtomicU64,
    config: CoreEventBusConfig,
    project_senders: RwLock<HashMap<ProjectId, broadcast::Sender<CoreEventEnvelope>>>,
    global_sender: broadcast::Sender<CoreEventEnvelope>,
}

impl Default for CoreEventBus {
    fn default() -> Self {
        Self::new(CoreEventBusConfig::default())
    }
}

impl CoreEventBus {
    pub fn new(config: CoreEventBusConfig) -> Self {
        assert!(
            config.project_buffer_capacity > 0,
            "project_buffer_capacity must be greater than 0"
        );
        assert!(
            config.global_buffer_capacity > 0,
            "global_buffer_capacity must be greater than 0"
        );

        let (global_sender, _global_receiver) = broadcast::channel(config.global_buffer_capacity);
        Self {
            next_sequence: AtomicU64::new(0),
            config,
            project_senders: RwLock::new(HashMap::new()),
            global_sender,
        }
    }

    pub fn subscribe_all(&self) -> broadcast::Receiver<CoreEventEnvelope> {
        self.global_sender.subscribe()
    }

    pub fn subscribe_project(&self, project_id: ProjectId) -> broadcast::Receiver<CoreEventEnvelope> {
        if let Some(sender) = self.project_sender(&project_id) {
            return sender.subscribe();
        }

        let mut project_senders = self
            .project_senders
            .write()
            .expect("core event bus sender lock poisoned");
        let sender = project_senders.entry(project_id).or_insert_with(|| {
            let (sender, _receiver) = broadcast::channel(self.config.project_buffer_capacity);
            sender
        });
        sender.subscribe()
    }

    /// Drops the project's channel, closing its subscribers. Called when a
    /// project is deleted.
    pub fn remove_project(&self, project_id: &ProjectId) -> bool {
        let mut project_senders = self
            .project_senders
            .write()
            .expect("core event bus sender lock poisoned");
        project_senders.remove(project_id).is_some()
    }

    pub fn publish(&self, event: CoreEvent) -> CoreEventEnvelope {
        let envelope = CoreEventEnvelope {
            sequence: self.next_sequence(),
            event,
        };

        if let Some(project_id) = envelope.event.project_id() {
            if let Some(sender) = self.project_sender(project_id) {
                let _ = sender.send(envelope.clone());
            }
        }
        let _ = self.global_sender.send(envelope.clone());

        envelope
    }

    fn project_sender(
        &self,
        project_id: &ProjectId,
    ) -> Option<broadcast::Sender<CoreEventEnvelope>> {
        let project_senders = self
            .project_senders
            .read()
            .expect("core event bus sender lock poisoned");
        project_senders.get(project_id).cloned()
    }

    fn next_sequence(&self) -> u64 {
        let previous = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        previous
            .checked_add(1)
            .expect("core event sequence exhausted")
    }
}
