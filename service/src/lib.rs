use config::Config;
use domain::store::Store;
use events::EventPublisher;
use std::sync::Arc;

pub mod config;
pub mod logging;

// Service-level state shared by every request handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub sse_manager: Arc<sse::Manager>,
    pub event_publisher: Arc<EventPublisher>,
}

impl AppState {
    pub fn new(
        app_config: Config,
        store: Arc<dyn Store>,
        sse_manager: Arc<sse::Manager>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            config: app_config,
            store,
            sse_manager,
            event_publisher: Arc::new(event_publisher),
        }
    }

    pub fn store_ref(&self) -> &dyn Store {
        self.store.as_ref()
    }
}
