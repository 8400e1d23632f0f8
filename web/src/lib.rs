use axum::http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use log::*;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use self::error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod params;
pub mod router;
mod sse;

/// Binds the configured interface and port and serves the API until ctrl-c.
pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let server_url = format!(
        "{}:{}",
        app_state.config.interface(),
        app_state.config.port
    );
    let listener = TcpListener::bind(&server_url).await?;

    info!("Server starting... listening for connections on http://{server_url}");
    info!(
        "Allowed CORS origins: {}",
        app_state.config.allowed_origins.join(", ")
    );

    serve(listener, app_state, shutdown_signal()).await
}

/// Serves the API on `listener` until `signal` resolves. Event streams never
/// finish on their own, so they are closed once the signal fires and the
/// graceful shutdown only waits on ordinary requests.
pub async fn serve<F>(listener: TcpListener, app_state: AppState, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let sse_manager = app_state.sse_manager.clone();
    axum::serve(listener, router::define_routes(app_state))
        .with_graceful_shutdown(async move {
            signal.await;
            sse_manager.close_all();
        })
        .await
}

pub(crate) fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::DELETE,
            Method::GET,
            Method::OPTIONS,
            Method::PATCH,
            Method::POST,
            Method::PUT,
        ])
        .allow_credentials(true)
        .allow_headers([ACCEPT, CACHE_CONTROL, CONTENT_TYPE])
        .allow_origin(origins)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {e}");
        return;
    }
    info!("Shutdown signal received, draining connections");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    #[tokio::test]
    async fn shutdown_closes_open_event_streams() {
        let state = test_support::app_state();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state.clone(), async move {
            let _ = stop_rx.await;
        }));

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"GET /api/realtime/sse?role=public HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut received = String::new();
        let mut buf = [0u8; 1024];
        while !received.contains("event: connected") {
            let n = timeout(Duration::from_secs(1), client.read(&mut buf))
                .await
                .expect("no bytes within a second")
                .unwrap();
            assert!(n > 0, "connection closed before the ack");
            received.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
        assert_eq!(state.sse_manager.connection_count(), 1);

        stop_tx.send(()).unwrap();

        let finished = timeout(Duration::from_secs(3), server).await;
        assert!(
            matches!(finished, Ok(Ok(Ok(())))),
            "server did not drain after the shutdown signal"
        );
        assert_eq!(state.sse_manager.connection_count(), 0);
    }
}
