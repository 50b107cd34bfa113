use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Client for the PagerDuty schedule API used to resolve the current on-call
/// responder.
#[derive(Clone)]
pub struct PagerDutyClient {
    http: Client,
    base_url: Url,
    api_token: String,
}

impl PagerDutyClient {
    /// Creates a new client with the provided configuration.
    pub fn new(api_token: impl Into<String>, base_url: Url, http: Client) -> Self {
        Self {
            http,
            base_url,
            api_token: api_token.into(),
        }
    }

    /// Fetches the user currently on call for the given schedule.
    ///
    /// The schedule API lists users ordered by their on-call position; the
    /// first entry is the active responder. An empty list means nobody is on
    /// call, which is an error for this relay.
    pub async fn current_on_call(&self, schedule_id: &str) -> Result<OnCallUser, PagerDutyError> {
        let url = self
            .base_url
            .join(&format!("schedules/{schedule_id}/users"))?;

        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Token token={}", self.api_token))
            .header("Accept", "application/vnd.pagerduty+json;version=2")
            .send()
            .await?;

        let page: ScheduleUsersResponse = parse_json(response).await?;
        page.users
            .into_iter()
            .next()
            .ok_or(PagerDutyError::NoOnCall)
    }
}

/// On-call responder identity resolved from a schedule. Ephemeral; fetched
/// fresh on every relevant event and topic-sync trigger.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OnCallUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
struct ScheduleUsersResponse {
    users: Vec<OnCallUser>,
}

/// Errors produced by the PagerDuty client.
#[derive(Debug, Error)]
pub enum PagerDutyError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("no on-call user found in schedule")]
    NoOnCall,
}

async fn parse_json<T>(response: Response) -> Result<T, PagerDutyError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(PagerDutyError::Status { status, body });
    }

    Ok(response.json().await?)
}
