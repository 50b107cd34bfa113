use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use urgent_relay_core::RelevanceEngine;
use urgent_relay_pagerduty::PagerDutyClient;
use urgent_relay_slack::SlackClient;

use crate::{oncall, telemetry, webhook};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    webhook_secret: Arc<[u8]>,
    engine: Arc<RelevanceEngine>,
    slack: SlackClient,
    pagerduty: PagerDutyClient,
    pagerduty_schedule_id: String,
    slack_channel_name: String,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        metrics: PrometheusHandle,
        webhook_secret: Arc<[u8]>,
        engine: RelevanceEngine,
        slack: SlackClient,
        pagerduty: PagerDutyClient,
        pagerduty_schedule_id: String,
        slack_channel_name: String,
    ) -> Self {
        Self {
            metrics,
            webhook_secret,
            engine: Arc::new(engine),
            slack,
            pagerduty,
            pagerduty_schedule_id,
            slack_channel_name,
            clock: Arc::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn webhook_secret(&self) -> Arc<[u8]> {
        self.webhook_secret.clone()
    }

    pub fn engine(&self) -> &RelevanceEngine {
        &self.engine
    }

    pub fn slack(&self) -> &SlackClient {
        &self.slack
    }

    pub fn pagerduty(&self) -> &PagerDutyClient {
        &self.pagerduty
    }

    pub fn schedule_id(&self) -> &str {
        &self.pagerduty_schedule_id
    }

    pub fn channel_name(&self) -> &str {
        &self.slack_channel_name
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/webhook/linear", post(webhook::handle))
        .route("/oncall/sync", post(oncall::sync))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use url::Url;

    fn setup_state() -> AppState {
        let metrics = telemetry::init_metrics().expect("metrics init");
        let http = reqwest::Client::builder().build().expect("client");
        let slack = SlackClient::new(
            "xoxb-token",
            Url::parse("http://localhost:9/").expect("url"),
            http.clone(),
        );
        let pagerduty = PagerDutyClient::new(
            "pd-token",
            Url::parse("http://localhost:9/").expect("url"),
            http,
        );
        let engine = RelevanceEngine::new(1, ["label-a".to_string()]);
        let secret: Arc<[u8]> = Arc::from(b"test-secret".to_vec().into_boxed_slice());

        AppState::new(
            metrics,
            secret,
            engine,
            slack,
            pagerduty,
            "sched-1".to_string(),
            "urgent".to_string(),
        )
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let app = app_router(setup_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_exports_build_info() {
        let app = app_router(setup_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .expect("handler should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let collected = response
            .into_body()
            .collect()
            .await
            .expect("body should read");
        let body = String::from_utf8(collected.to_bytes().to_vec()).expect("utf-8");
        assert!(body.contains("app_build_info"));
        assert!(body.contains("app_uptime_seconds"));
    }
}
