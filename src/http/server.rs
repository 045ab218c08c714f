//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router and wire up middleware (tracing, timeout, request ID)
//! - Send every request through the routing engine via a single fallback
//! - Render dispatch outcomes and handler errors as HTTP responses
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::api::Handler;
use crate::config::GatewayConfig;
use crate::http::request::{MakeRequestUuid, RequestContext, X_REQUEST_ID};
use crate::http::response::{json_error, route_not_found};
use crate::observability::metrics;
use crate::routing::{DispatchError, Dispatcher, Outcome};

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher<Handler>>,
    pub max_body_bytes: usize,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a frozen route table.
    pub fn new(config: GatewayConfig, dispatcher: Arc<Dispatcher<Handler>>) -> Self {
        let state = AppState {
            dispatcher,
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffers the request, dispatches it through the route table and renders
/// the outcome.
async fn dispatch_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %parts.uri,
        remote_addr = %remote_addr,
        "New request"
    );

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Request body rejected");
            metrics::record_request(&method, 413, start_time);
            return json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }
    };
    let context = RequestContext::new(request_id.clone(), parts, body);

    let outcome = state
        .dispatcher
        .dispatch_async(&path, &method, |handler, params| handler.call(params, context))
        .await;

    let response = match outcome {
        Ok(Outcome::Handled(response)) => response,
        Ok(Outcome::RouteNotFound) => {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
            metrics::record_unmatched(&method);
            route_not_found()
        }
        Err(DispatchError::Internal(e)) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %e,
                "Caught a handler error"
            );
            e.into_response()
        }
    };

    let status = response.status();
    metrics::record_request(&method, status.as_u16(), start_time);
    tracing::debug!(
        request_id = %request_id,
        status = %status,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Response"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::connect_info::MockConnectInfo;
    use tower::ServiceExt;

    use crate::api::{ApiError, Handler};
    use crate::routing::RouteTable;
    use crate::vms::VmsError;

    fn router() -> Router {
        let mut table = RouteTable::new();
        table
            .get(
                "/echo/{word}",
                Handler::new(|params, context: RequestContext| async move {
                    let word = params.get("word").unwrap_or_default().to_string();
                    Ok::<_, ApiError>(format!("{word} {}", context.request_id()).into_response())
                }),
            )
            .unwrap();
        table
            .get(
                "/broken",
                Handler::new(|_, _| async {
                    Err::<Response, _>(ApiError::Vms(VmsError::ChannelNotFound))
                }),
            )
            .unwrap();

        let config = GatewayConfig::default();
        let server = HttpServer::new(config, Arc::new(Dispatcher::new(table)));
        server
            .router
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))))
    }

    async fn call(uri: &str) -> Response {
        router()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(X_REQUEST_ID, "req-7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_matched_route() {
        let response = call("/echo/hello").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[X_REQUEST_ID], "req-7");
        assert_eq!(body_text(response).await, "hello req-7");
    }

    #[tokio::test]
    async fn test_route_not_found() {
        let response = call("/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "Route not found");
    }

    #[tokio::test]
    async fn test_handler_error_rendered() {
        let response = call("/broken").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Channel not found"));
    }
}
