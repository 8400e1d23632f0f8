use domain::store::MemoryStore;
use events::EventPublisher;
use log::*;
use relay::{RelayPublisher, RelaySubscriber};
use service::{config::Config, logging, AppState};
use sse::domain_event_handler::SseDomainEventHandler;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = logging::init(&config) {
        eprintln!("Failed to start the logger: {e}");
    }

    info!(
        "Starting up RayEx Platform API server (instance {}, {} mode)",
        config.instance_id(),
        config.runtime_env()
    );

    let sse_manager = Arc::new(sse::Manager::new());
    sse::heartbeat::spawn(sse_manager.clone(), config.heartbeat_interval());

    let mut event_publisher = EventPublisher::new()
        .with_handler(Arc::new(SseDomainEventHandler::new(sse_manager.clone())));

    match config.redis_url() {
        Some(redis_url) => {
            match RelayPublisher::connect(&redis_url, config.instance_id()).await {
                Ok(publisher) => event_publisher = event_publisher.with_handler(Arc::new(publisher)),
                Err(e) => warn!("Relay publisher unavailable, rate updates stay on this instance: {e}"),
            }
            RelaySubscriber::new(
                redis_url,
                config.instance_id(),
                config.relay_max_retries,
                config.relay_retry_delay(),
            )
            .spawn(sse_manager.clone());
        }
        None => info!("No Redis URL configured, running without the cross-instance relay"),
    }

    let app_state = AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        sse_manager,
        event_publisher,
    );

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with an error: {e}");
        std::process::exit(1);
    }
}
