use std::time::Instant;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use metrics::{counter, histogram};
use serde_json::{json, Value};
use tracing::info;
use urgent_relay_core::{verify_signature, IssueEvent};

use crate::error::RelayError;
use crate::router::AppState;

const HEADER_SIGNATURE: &str = "linear-signature";
const TIMESTAMP_FIELD: &str = "webhookTimestamp";

pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, RelayError> {
    let start = Instant::now();
    counter!("webhook_ingress_total").increment(1);

    let signature = headers
        .get(HEADER_SIGNATURE)
        .and_then(|value| value.to_str().ok())
        .ok_or(RelayError::MissingHeader(HEADER_SIGNATURE))?;

    // The delivery timestamp is the only value read from the body before
    // verification, and it is acted upon only inside the verifier.
    let timestamp_ms = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| value.get(TIMESTAMP_FIELD).and_then(Value::as_i64));

    let secret = state.webhook_secret();
    verify_signature(&secret, &body, signature, timestamp_ms, state.now()).map_err(|err| {
        counter!("webhook_invalid_signature_total").increment(1);
        histogram!("webhook_ack_latency_seconds").record(start.elapsed().as_secs_f64());
        RelayError::from(err)
    })?;

    let event = IssueEvent::parse(&body)?;

    if !state.engine().is_relevant(&event) {
        info!(stage = "relay", issue_id = %event.data.id, action = ?event.action, "event not relevant, skipping");
        counter!("relay_skipped_total", "reason" => "not_relevant").increment(1);
        histogram!("webhook_ack_latency_seconds").record(start.elapsed().as_secs_f64());
        return Ok(message_response("event not relevant, skipping"));
    }

    let on_call = state
        .pagerduty()
        .current_on_call(state.schedule_id())
        .await?;
    let slack_user = state.slack().lookup_user_by_email(&on_call.email).await?;
    let channel = state.slack().find_channel(state.channel_name()).await?;

    let text = format!(
        "Hey <@{}>, there's a new urgent issue: {}\n{}",
        slack_user.id, event.data.title, event.url
    );
    state.slack().post_message(&channel.id, &text).await?;

    counter!("notifications_sent_total").increment(1);
    info!(
        stage = "relay",
        issue_id = %event.data.id,
        channel = %channel.name,
        responder = %on_call.email,
        "notified on-call responder"
    );
    histogram!("webhook_ack_latency_seconds").record(start.elapsed().as_secs_f64());
    Ok(message_response("webhook received and processed successfully"))
}

fn message_response(message: &str) -> Response {
    (StatusCode::OK, Json(json!({ "message": message }))).into_response()
}
