//! Exposition Server
//!
//! Plain HTTP/1 server publishing the metric registry and a health probe.

use std::convert::Infallible;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::metrics::MetricRegistry;

/// Liveness probe path.
pub const HEALTH_PATH: &str = "/healthz";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const PROMETHEUS_TEXT: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Pause after a failed accept before trying again.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

fn text_response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// Answer one request.
pub fn route(
    registry: &MetricRegistry,
    metrics_path: &str,
    method: &Method,
    path: &str,
) -> Response<Full<Bytes>> {
    if method != Method::GET && method != Method::HEAD {
        return text_response(StatusCode::METHOD_NOT_ALLOWED, TEXT_PLAIN, "method not allowed\n");
    }

    if path == HEALTH_PATH {
        return text_response(StatusCode::OK, TEXT_PLAIN, "OK\n");
    }

    if path == metrics_path {
        return match registry.render() {
            Ok(body) => text_response(StatusCode::OK, PROMETHEUS_TEXT, body),
            Err(e) => {
                error!(error = %e, "Failed to encode metrics");
                text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    TEXT_PLAIN,
                    format!("failed to encode metrics: {}\n", e),
                )
            }
        };
    }

    text_response(StatusCode::NOT_FOUND, TEXT_PLAIN, "not found\n")
}

/// Wait for the next connection, retrying failed accepts.
///
/// Accept errors such as `EMFILE` or `ECONNABORTED` are transient; the
/// listener stays usable. Returns `None` once `shutdown` is cancelled.
async fn accept_next<T, F, Fut>(mut accept: F, shutdown: &CancellationToken) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return None,
            accepted = accept() => match accepted {
                Ok(conn) => return Some(conn),
                Err(e) => warn!(error = %e, "Metrics server accept failed, retrying"),
            },
        }

        tokio::select! {
            _ = shutdown.cancelled() => return None,
            _ = tokio::time::sleep(ACCEPT_RETRY_DELAY) => {}
        }
    }
}

/// Serve `registry` on `listener` until `shutdown` is cancelled.
///
/// Only cancellation ends the loop; failed accepts are logged and retried.
pub async fn serve(
    listener: TcpListener,
    registry: Arc<MetricRegistry>,
    metrics_path: String,
    shutdown: CancellationToken,
) -> Result<()> {
    let metrics_path: Arc<str> = Arc::from(metrics_path);
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, path = %metrics_path, "Metrics server listening");
    }

    loop {
        let Some((stream, peer)) = accept_next(|| listener.accept(), &shutdown).await else {
            break;
        };

        let io = TokioIo::new(stream);
        let registry = registry.clone();
        let metrics_path = metrics_path.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let response = route(&registry, &metrics_path, req.method(), req.uri().path());
                async move { Ok::<_, Infallible>(response) }
            });
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!(peer = %peer, error = %e, "Metrics server connection error");
            }
        });
    }

    info!("Metrics server stopped");
    Ok(())
}

/// Bind `addr` and serve until `shutdown` is cancelled.
pub async fn run(
    addr: SocketAddr,
    registry: Arc<MetricRegistry>,
    metrics_path: String,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind metrics server on {}: {}", addr, e)))?;
    serve(listener, registry, metrics_path, shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricDefinition, MetricLabel};
    use http_body_util::BodyExt;
    use std::collections::HashMap;

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let registry = MetricRegistry::new();
        let response = route(&registry, "/metrics", &Method::GET, "/healthz");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK\n");
    }

    #[tokio::test]
    async fn test_metrics_path() {
        let registry = MetricRegistry::new();
        let gauge = registry
            .register_gauge_vec(MetricDefinition::new(
                "peer_count",
                "Number of peers",
                &[MetricLabel::new("instance", "Exporter host")],
            ))
            .unwrap();
        gauge
            .set(&HashMap::from([("instance", "node1")]), 3.0)
            .unwrap();

        let response = route(&registry, "/custom", &Method::GET, "/custom");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            PROMETHEUS_TEXT
        );
        let body = body_string(response).await;
        assert!(body.contains("gluster_peer_count{instance=\"node1\"} 3"));
    }

    #[test]
    fn test_unknown_path_not_found() {
        let registry = MetricRegistry::new();
        assert_eq!(
            route(&registry, "/metrics", &Method::GET, "/other").status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            route(&registry, "/custom", &Method::GET, "/metrics").status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_post_rejected() {
        let registry = MetricRegistry::new();
        assert_eq!(
            route(&registry, "/metrics", &Method::POST, "/metrics").status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(serve(
            listener,
            Arc::new(MetricRegistry::new()),
            "/metrics".into(),
            token.clone(),
        ));
        token.cancel();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_retries_after_transient_errors() {
        let token = CancellationToken::new();
        let mut attempts = 0;
        let conn = accept_next(
            || {
                attempts += 1;
                let result = if attempts < 3 {
                    Err(io::Error::from_raw_os_error(24))
                } else {
                    Ok(attempts)
                };
                async move { result }
            },
            &token,
        )
        .await;
        assert_eq!(conn, Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_stops_on_shutdown_while_failing() {
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            cancel.cancel();
        });

        let conn: Option<()> = accept_next(
            || async { Err(io::Error::from(io::ErrorKind::ConnectionAborted)) },
            &token,
        )
        .await;
        assert_eq!(conn, None);
    }

    #[tokio::test]
    async fn test_serve_keeps_answering_after_connections_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let token = CancellationToken::new();
        let handle = tokio::spawn(serve(
            listener,
            Arc::new(MetricRegistry::new()),
            "/metrics".into(),
            token.clone(),
        ));

        for _ in 0..5 {
            drop(tokio::net::TcpStream::connect(addr).await.unwrap());
        }
        let health = reqwest::get(format!("http://{}/healthz", addr)).await.unwrap();
        assert_eq!(health.status(), reqwest::StatusCode::OK);
        assert!(!handle.is_finished());

        token.cancel();
        assert!(handle.await.unwrap().is_ok());
    }
}
