use crate::params::sse::ConnectParams;
use async_stream::stream;
use axum::extract::{Query, State};
use axum::http::{header, HeaderName, StatusCode};
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;
use serde_json::json;
use service::AppState;
use sse::connection::ConnectionKey;
use sse::message::{ConnectedAck, Event};
use sse::Manager;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// Unregisters its connection when the response stream is dropped, which is
/// how axum reports that the client went away.
struct ConnectionGuard {
    manager: Arc<Manager>,
    key: ConnectionKey,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!("SSE stream {} ended, cleaning up", self.key);
        self.manager.unregister_connection(self.key);
    }
}

/// GET a long-lived event stream
#[utoipa::path(
    get,
    path = "/api/realtime/sse",
    params(ConnectParams),
    responses(
        (status = 200, description = "Event stream opened; the first event is `connected`", content_type = "text/event-stream"),
        (status = 400, description = "Email or valid role is required for SSE")
    )
)]
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> Response {
    let Some((id, rooms)) = params.admit() else {
        warn!(
            "SSE connection rejected: missing email or valid role (role: {:?})",
            params.role
        );
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Email or valid role is required for SSE" })),
        )
            .into_response();
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let manager = app_state.sse_manager.clone();
    let registration = manager.register_connection(id, tx, rooms);

    // Queued before the stream exists so it is always the first frame.
    let ack = Event::Connected(ConnectedAck::ok(registration.id.as_str()));
    if !manager.send_to_connection(registration.key, &ack) {
        warn!("Failed to queue connected event for {}", registration.id);
    }

    let guard = ConnectionGuard {
        manager,
        key: registration.key,
    };
    let stream = stream! {
        let _guard = guard;
        while let Some(frame) = rx.recv().await {
            yield Ok::<_, Infallible>(frame.into_sse_event());
        }
    };

    (
        [
            (header::CACHE_CONTROL, "no-cache, no-transform"),
            (header::CONNECTION, "keep-alive"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        Sse::new(stream),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use crate::router::define_routes;
    use crate::test_support::app_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use futures::StreamExt;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn connect(query: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/api/realtime/sse{query}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn next_chunk(body: &mut (impl futures::Stream<Item = Result<axum::body::Bytes, axum::Error>> + Unpin)) -> String {
        let chunk = tokio::time::timeout(Duration::from_secs(1), body.next())
            .await
            .expect("no frame within a second")
            .expect("stream ended")
            .unwrap();
        String::from_utf8(chunk.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn rejects_requests_without_email_or_role() {
        let state = app_state();
        let app = define_routes(state.clone());

        let response = app.oneshot(connect("?role=guest")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.sse_manager.connection_count(), 0);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Email or valid role is required for SSE");
    }

    #[tokio::test]
    async fn opens_stream_with_connected_ack_first() {
        let state = app_state();
        let app = define_routes(state.clone());

        let response = app
            .oneshot(connect("?email=ana@example.com&role=admin"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["content-type"], "text/event-stream");
        assert_eq!(headers["cache-control"], "no-cache, no-transform");
        assert_eq!(headers["x-accel-buffering"], "no");
        assert_eq!(state.sse_manager.connection_count(), 1);

        let mut body = response.into_body().into_data_stream();
        let first = next_chunk(&mut body).await;
        assert!(first.starts_with("event: connected\n"), "got {first:?}");
        assert!(first.contains(r#""id":"ana@example.com""#));
        assert!(first.contains(r#""status":"ok""#));
    }

    #[tokio::test]
    async fn published_events_reach_the_stream() {
        let state = app_state();
        let app = define_routes(state.clone());
        let response = app.oneshot(connect("?role=public")).await.unwrap();
        let mut body = response.into_body().into_data_stream();
        next_chunk(&mut body).await;

        state
            .sse_manager
            .publish("public", "rate_updated", &serde_json::json!({"rate": 0.92}));

        let frame = next_chunk(&mut body).await;
        assert!(frame.starts_with("event: rate_updated\n"), "got {frame:?}");
        assert!(frame.contains(r#"data: {"rate":0.92}"#));
    }

    #[tokio::test]
    async fn dropping_the_response_unregisters_the_connection() {
        let state = app_state();
        let app = define_routes(state.clone());

        let response = app
            .oneshot(connect("?email=ana@example.com"))
            .await
            .unwrap();
        assert_eq!(state.sse_manager.connection_count(), 1);

        drop(response);
        assert_eq!(state.sse_manager.connection_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_comment_reaches_the_body() {
        let state = app_state();
        let heartbeat = sse::heartbeat::spawn(state.sse_manager.clone(), Duration::from_secs(30));
        let app = define_routes(state.clone());
        let response = app.oneshot(connect("?role=public")).await.unwrap();
        let mut body = response.into_body().into_data_stream();
        next_chunk(&mut body).await;

        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(next_chunk(&mut body).await, ": heartbeat\n\n");
        heartbeat.abort();
    }

    #[tokio::test]
    async fn closing_all_connections_ends_the_body() {
        let state = app_state();
        let app = define_routes(state.clone());
        let response = app.oneshot(connect("?role=admin")).await.unwrap();
        let mut body = response.into_body().into_data_stream();
        next_chunk(&mut body).await;

        state.sse_manager.close_all();

        let end = tokio::time::timeout(Duration::from_secs(1), body.next())
            .await
            .expect("stream still open after close_all");
        assert!(end.is_none());
        assert_eq!(state.sse_manager.connection_count(), 0);
    }
}
