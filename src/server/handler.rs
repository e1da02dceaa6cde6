// src/server/handler.rs
use crate::aggregator::StatusBoard;
use crate::metrics::MetricsRegistry;
use hyper::{Body, Method, Request, Response, StatusCode};
use std::sync::Arc;
use tower::Service;

/// Serves the latest snapshot as a plain listing, JSON document, liveness
/// endpoint, and Prometheus metrics. Knows nothing about how cycles run.
#[derive(Clone)]
pub struct StatusHandler {
    board: Arc<StatusBoard>,
    metrics: Arc<MetricsRegistry>,
}

impl StatusHandler {
    pub fn new(board: Arc<StatusBoard>, metrics: Arc<MetricsRegistry>) -> Self {
        Self { board, metrics }
    }

    fn respond(&self, req: &Request<Body>) -> Response<Body> {
        match (req.method(), req.uri().path()) {
            (&Method::GET, "/") => match self.board.latest() {
                Some(snapshot) => text(StatusCode::OK, snapshot.render_plain()),
                None => text(StatusCode::OK, "no snapshot yet\n".to_string()),
            },
            (&Method::GET, "/status.json") => match self.board.latest() {
                Some(snapshot) => {
                    let body = serde_json::to_vec(snapshot.as_ref()).unwrap();
                    Response::builder()
                        .status(StatusCode::OK)
                        .header("Content-Type", "application/json")
                        .body(Body::from(body))
                        .unwrap()
                }
                None => text(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "no snapshot yet\n".to_string(),
                ),
            },
            (&Method::GET, "/healthz") => match self.board.latest() {
                Some(snapshot) if snapshot.overall_ok => {
                    text(StatusCode::OK, "ok\n".to_string())
                }
                Some(_) => text(StatusCode::SERVICE_UNAVAILABLE, "unhealthy\n".to_string()),
                None => text(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "no snapshot yet\n".to_string(),
                ),
            },
            (&Method::GET, "/metrics") => Response::builder()
                .status(StatusCode::OK)
                .header("Content-Type", "text/plain; version=0.0.4")
                .body(Body::from(self.metrics.gather()))
                .unwrap(),
            _ => text(StatusCode::NOT_FOUND, "Not Found\n".to_string()),
        }
    }
}

fn text(status: StatusCode, body: String) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Body::from(body))
        .unwrap()
}

impl Service<Request<Body>> for StatusHandler {
    type Response = Response<Body>;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.respond(&req)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::StatusSnapshot;
    use crate::probe::{ProbeFailure, ProbeResult, Target};

    fn handler() -> (Arc<StatusBoard>, StatusHandler) {
        let board = Arc::new(StatusBoard::new());
        let metrics = Arc::new(MetricsRegistry::new().unwrap());
        (board.clone(), StatusHandler::new(board, metrics))
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    fn snapshot(ok: bool) -> StatusSnapshot {
        let target = Target::new("mysql", "127.0.0.1", 3306).unwrap();
        let result = if ok {
            ProbeResult::pass(target, None, 2)
        } else {
            ProbeResult::fail(target, ProbeFailure::ConnectionRefused, 2)
        };
        StatusSnapshot::new(vec![result])
    }

    #[test]
    fn test_healthz_before_first_cycle() {
        let (_board, handler) = handler();
        let response = handler.respond(&get("/healthz"));
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_healthz_follows_overall_ok() {
        let (board, handler) = handler();

        board.publish(snapshot(true));
        assert_eq!(handler.respond(&get("/healthz")).status(), StatusCode::OK);

        board.publish(snapshot(false));
        assert_eq!(
            handler.respond(&get("/healthz")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_unknown_route_is_not_found() {
        let (_board, handler) = handler();
        let response = handler.respond(&get("/nope"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_metrics_route_serves_text() {
        let (_board, handler) = handler();
        let response = handler.respond(&get("/metrics"));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
