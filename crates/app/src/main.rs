mod error;
mod oncall;
mod router;
mod telemetry;
mod webhook;

use std::{net::SocketAddr, sync::Arc};

use reqwest::Client;
use tracing::info;
use url::Url;
use urgent_relay_core::RelevanceEngine;
use urgent_relay_pagerduty::PagerDutyClient;
use urgent_relay_slack::SlackClient;
use urgent_relay_util::{load_env_file, AppConfig};

const PAGERDUTY_API_BASE: &str = "https://api.pagerduty.com/";
const SLACK_API_BASE: &str = "https://slack.com/api/";

// Tracker-side notification configuration: the priority level that counts as
// urgent and the label ids whose presence makes an issue page-worthy.
const URGENT_PRIORITY: u8 = 1;
const BUG_LABEL_ID: &str = "5b04a744-c7e8-4024-bc50-465cf1fb10f3";
const USER_QUESTION_LABEL_ID: &str = "4a1d862d-2f2e-4cf3-82c1-7c78257e2c7a";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let http = Client::builder().build()?;
    let slack = SlackClient::new(
        config.slack_bot_token.clone(),
        Url::parse(SLACK_API_BASE)?,
        http.clone(),
    );
    let pagerduty = PagerDutyClient::new(
        config.pagerduty_api_token.clone(),
        Url::parse(PAGERDUTY_API_BASE)?,
        http,
    );

    let engine = RelevanceEngine::new(
        URGENT_PRIORITY,
        [BUG_LABEL_ID.to_string(), USER_QUESTION_LABEL_ID.to_string()],
    );
    let secret: Arc<[u8]> =
        Arc::from(config.webhook_secret.clone().into_bytes().into_boxed_slice());

    let state = router::AppState::new(
        metrics,
        secret,
        engine,
        slack,
        pagerduty,
        config.pagerduty_schedule_id.clone(),
        config.slack_channel_name.clone(),
    );

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
