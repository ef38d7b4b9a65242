//! The Prometheus scrape listener: a one-route `axum` server exposing
//! `GET /metrics`, grounded in `server/prom.go`'s `PromServer` (a
//! dedicated HTTP listener separate from the gRPC/admin listeners).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use modelbox_metrics::ServerMetrics;

async fn metrics_handler(State(metrics): State<Arc<ServerMetrics>>) -> impl IntoResponse {
    match metrics.gather() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("unable to gather metrics: {e}")),
    }
}

pub fn router(metrics: Arc<ServerMetrics>) -> Router {
    Router::new().route("/metrics", get(metrics_handler)).with_state(metrics)
}

/// Binds `addr` and serves the `/metrics` route until the process exits.
/// Errors binding the listener are fatal, matching the original's
/// `logger.Fatal` on listener setup failure.
pub async fn serve(addr: &str, metrics: Arc<ServerMetrics>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("[prom-server] server listening on addr: {addr}");
    axum::serve(listener, router(metrics)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn metrics_route_renders_the_registered_families() {
        let metrics = Arc::new(ServerMetrics::new().unwrap());
        metrics.scheduler_ticks_total.inc();
        let app = router(metrics);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
