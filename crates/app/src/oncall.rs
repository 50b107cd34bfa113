use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use metrics::counter;
use serde_json::json;
use tracing::info;

use crate::error::RelayError;
use crate::router::AppState;

/// Scheduled entrypoint keeping the urgent channel's topic in sync with the
/// current on-call responder. Read-then-conditional-write; concurrent runs
/// racing on the same topic are an accepted risk at this invocation
/// frequency.
pub async fn sync(State(state): State<AppState>) -> Result<Response, RelayError> {
    let on_call = state
        .pagerduty()
        .current_on_call(state.schedule_id())
        .await?;
    let channel = state.slack().find_channel(state.channel_name()).await?;
    let desired = format!("On-call: {}", on_call.name);

    let current = state.slack().channel_topic(&channel.id).await?;
    if current.as_deref() == Some(desired.as_str()) {
        counter!("oncall_sync_total", "outcome" => "unchanged").increment(1);
        info!(stage = "oncall", channel = %channel.name, "topic already current, skipping write");
    } else {
        state.slack().set_channel_topic(&channel.id, &desired).await?;
        counter!("oncall_sync_total", "outcome" => "updated").increment(1);
        info!(
            stage = "oncall",
            channel = %channel.name,
            responder = %on_call.name,
            "updated channel topic"
        );
    }

    Ok((StatusCode::OK, Json(json!({ "success": true }))).into_response())
}
