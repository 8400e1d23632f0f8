use async_trait::async_trait;
use events::{DomainEvent, EventHandler, EventPublisher};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Keeps every event it is handed so tests can assert on what was published.
#[derive(Default)]
pub(crate) struct RecordingHandler {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingHandler {
    pub(crate) fn publisher() -> (EventPublisher, Arc<RecordingHandler>) {
        let handler = Arc::new(RecordingHandler::default());
        let publisher = EventPublisher::new().with_handler(handler.clone());
        (publisher, handler)
    }

    pub(crate) async fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &DomainEvent) {
        self.events.lock().await.push(event.clone());
    }
}
