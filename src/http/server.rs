//! HTTP server shell.
//!
//! # Responsibilities
//! - Own the Axum router and the `fiber.*` shell options
//! - Apply path normalization (case sensitivity, strict routing)
//! - Wire up middleware (write timeout, body read timeout, server header,
//!   request ID, tracing)
//! - Serve HTTP/1.1 and HTTP/2 connections from the bounded listener with
//!   idle and header read limits
//! - Drain in-flight connections on shutdown

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::body::{Bytes, HttpBody};
use axum::http::{header, HeaderValue, Request};
use axum::response::Response;
use axum::routing::future::RouteFuture;
use axum::routing::MethodRouter;
use axum::{BoxError, Router};
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, watch};
use tower::Service;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::request::{normalize_path, normalize_request};
use crate::net::connection::{
    ConnectionActivity, ConnectionGuard, ConnectionTracker, IdleTimeout,
};
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};

/// HTTP server for the auth service.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    routes: usize,
}

impl HttpServer {
    /// Create a server with no routes.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            router: Router::new(),
            config,
            routes: 0,
        }
    }

    /// Register a handler. The path is normalized with the same rules as
    /// incoming requests.
    pub fn route(mut self, path: &str, method_router: MethodRouter) -> Self {
        let path = normalize_path(path, self.config.case_sensitive, self.config.strict_routing);
        self.router = self.router.route(&path, method_router);
        self.routes += 1;
        self
    }

    /// Options the server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn route_count(&self) -> usize {
        self.routes
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(router: Router, config: &ServerConfig) -> Router {
        let mut router = router;

        if !config.write_timeout.is_zero() {
            router = router.layer(TimeoutLayer::new(config.write_timeout));
        }
        if !config.read_timeout.is_zero() {
            router = router.layer(RequestBodyTimeoutLayer::new(config.read_timeout));
        }
        if !config.server_header.is_empty() {
            match HeaderValue::from_str(&config.server_header) {
                Ok(value) => {
                    router = router.layer(SetResponseHeaderLayer::if_not_present(
                        header::SERVER,
                        value,
                    ));
                }
                Err(_) => {
                    tracing::warn!(
                        server_header = %config.server_header,
                        "Server header is not a valid header value, omitting"
                    );
                }
            }
        }

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Finish the server into a cloneable service.
    pub fn into_service(self) -> RouterService {
        RouterService {
            router: Self::build_router(self.router, &self.config),
            case_sensitive: self.config.case_sensitive,
            strict_routing: self.config.strict_routing,
        }
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. In-flight connections get `drain_timeout` to finish.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
        drain_timeout: Duration,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let config = self.config.clone();

        if config.prefork {
            tracing::warn!("Prefork is not supported, serving from a single process");
        }
        if !config.disable_startup_message {
            tracing::info!(
                app_name = %config.app_name,
                address = %addr,
                handlers = self.routes,
                max_connections = listener.max_connections(),
                "HTTP server starting"
            );
        }

        let service = self.into_service();
        let tracker = ConnectionTracker::new();
        let idle_timeout = config.effective_idle_timeout();
        // Latched, so a connection spawned in the same turn as the shutdown
        // still sees it.
        let (draining_tx, draining_rx) = watch::channel(false);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => {
                    let (stream, peer, permit) = match accepted {
                        Ok(accepted) => accepted,
                        Err(ListenerError::Closed) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let connection = Connection {
                        stream,
                        peer,
                        _permit: permit,
                        guard: tracker.track(),
                    };
                    tokio::spawn(connection.serve(
                        service.clone(),
                        draining_rx.clone(),
                        idle_timeout,
                        config.read_timeout,
                    ));
                }
            }
        }

        draining_tx.send_replace(true);
        if !tracker.drain(drain_timeout).await {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Drain timeout elapsed with connections still open"
            );
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Router wrapped with request path normalization.
///
/// Normalization has to run before route matching, so it cannot be a
/// `Router::layer`.
#[derive(Clone)]
pub struct RouterService {
    router: Router,
    case_sensitive: bool,
    strict_routing: bool,
}

impl<B> Service<Request<B>> for RouterService
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = RouteFuture<Infallible>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Service::<Request<B>>::poll_ready(&mut self.router, cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let request = normalize_request(request, self.case_sensitive, self.strict_routing);
        Service::<Request<B>>::call(&mut self.router, request)
    }
}

/// Counts in-flight requests so the idle deadline only runs between them.
#[derive(Clone)]
struct TrackedService {
    inner: RouterService,
    activity: Arc<ConnectionActivity>,
}

impl<B> Service<Request<B>> for TrackedService
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Service::<Request<B>>::poll_ready(&mut self.inner, cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let request_guard = self.activity.begin();
        let response = Service::<Request<B>>::call(&mut self.inner, request);
        Box::pin(async move {
            let response = response.await;
            drop(request_guard);
            response
        })
    }
}

/// An accepted connection holding its listener permit and tracker slot.
struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    _permit: ConnectionPermit,
    guard: ConnectionGuard,
}

impl Connection {
    async fn serve(
        self,
        service: RouterService,
        mut draining: watch::Receiver<bool>,
        idle_timeout: Option<Duration>,
        read_timeout: Duration,
    ) {
        let id = self.guard.id();
        tracing::trace!(connection_id = %id, peer = %self.peer, "Connection accepted");

        let activity = ConnectionActivity::new();
        let io = TokioIo::new(IdleTimeout::new(
            self.stream,
            idle_timeout,
            Arc::clone(&activity),
        ));
        let service = TrackedService {
            inner: service,
            activity,
        };
        let mut builder = Builder::new(TokioExecutor::new());
        if !read_timeout.is_zero() {
            builder
                .http1()
                .timer(TokioTimer::new())
                .header_read_timeout(read_timeout);
        }

        let conn = builder.serve_connection(io, TowerToHyperService::new(service));
        tokio::pin!(conn);

        let result = tokio::select! {
            result = conn.as_mut() => result,
            _ = async { let _ = draining.wait_for(|draining| *draining).await; } => {
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        };

        if let Err(e) = result {
            tracing::debug!(connection_id = %id, peer = %self.peer, error = %e, "Connection ended with error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::ServiceExt;

    fn server(config: ServerConfig) -> RouterService {
        HttpServer::new(config)
            .route("/Health", get(|| async { "ok" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    "done"
                }),
            )
            .into_service()
    }

    async fn status(service: RouterService, uri: &str) -> StatusCode {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        service.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn routing_is_case_insensitive_by_default() {
        let service = server(ServerConfig::default());
        assert_eq!(status(service.clone(), "/health").await, StatusCode::OK);
        assert_eq!(status(service.clone(), "/HEALTH/").await, StatusCode::OK);
        assert_eq!(status(service, "/missing").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn case_sensitive_and_strict_routing() {
        let service = server(ServerConfig {
            case_sensitive: true,
            strict_routing: true,
            ..Default::default()
        });
        assert_eq!(status(service.clone(), "/Health").await, StatusCode::OK);
        assert_eq!(status(service.clone(), "/health").await, StatusCode::NOT_FOUND);
        assert_eq!(status(service, "/Health/").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn server_header_and_request_id_are_set() {
        let service = server(ServerConfig {
            server_header: "auth".into(),
            ..Default::default()
        });
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = service.oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::SERVER], "auth");
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn empty_server_header_is_omitted() {
        let service = server(ServerConfig::default());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = service.oneshot(request).await.unwrap();
        assert!(!response.headers().contains_key(header::SERVER));
    }

    #[tokio::test]
    async fn caller_request_id_is_propagated() {
        let service = server(ServerConfig::default());
        let request = Request::builder()
            .uri("/health")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = service.oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "abc-123");
    }

    #[tokio::test(start_paused = true)]
    async fn write_timeout_cuts_off_slow_handlers() {
        let service = server(ServerConfig {
            write_timeout: Duration::from_millis(100),
            ..Default::default()
        });
        assert_eq!(status(service, "/slow").await, StatusCode::REQUEST_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_write_timeout_means_no_limit() {
        let service = server(ServerConfig::default());
        assert_eq!(status(service, "/slow").await, StatusCode::OK);
    }

    #[test]
    fn routes_are_counted() {
        let server = HttpServer::new(ServerConfig::default())
            .route("/a", get(|| async { "a" }))
            .route("/b", get(|| async { "b" }));
        assert_eq!(server.route_count(), 2);
    }
}
