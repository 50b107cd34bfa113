use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

/// Client for the subset of the Slack Web API this relay uses: resolving
/// users and channels, posting messages, and maintaining a channel topic.
///
/// The Web API reports logical failures as HTTP 200 with `"ok": false`, so
/// every response body is checked in addition to the status code.
#[derive(Clone)]
pub struct SlackClient {
    http: Client,
    base_url: Url,
    bot_token: String,
}

impl SlackClient {
    /// Creates a new client with the provided configuration.
    pub fn new(bot_token: impl Into<String>, base_url: Url, http: Client) -> Self {
        Self {
            http,
            base_url,
            bot_token: bot_token.into(),
        }
    }

    /// Resolves a workspace user by email address.
    pub async fn lookup_user_by_email(&self, email: &str) -> Result<SlackUser, SlackError> {
        let mut url = self.base_url.join("users.lookupByEmail")?;
        url.query_pairs_mut().append_pair("email", email);

        let response = self.authorized(self.http.get(url)).send().await?;
        let body: LookupUserResponse = parse_json(response).await?;

        if !body.ok {
            if body.error.as_deref() == Some("users_not_found") {
                return Err(SlackError::UserNotFound(email.to_string()));
            }
            return Err(api_error("users.lookupByEmail", body.error));
        }
        body.user
            .ok_or_else(|| api_error("users.lookupByEmail", None))
    }

    /// Finds a public channel by name, following list pagination until the
    /// cursor is exhausted.
    pub async fn find_channel(&self, name: &str) -> Result<SlackChannel, SlackError> {
        let mut cursor: Option<String> = None;

        loop {
            let mut url = self.base_url.join("conversations.list")?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("types", "public_channel");
                if let Some(cursor) = cursor.as_deref() {
                    query.append_pair("cursor", cursor);
                }
            }

            let response = self.authorized(self.http.get(url)).send().await?;
            let body: ListChannelsResponse = parse_json(response).await?;

            if !body.ok {
                return Err(api_error("conversations.list", body.error));
            }

            if let Some(channel) = body
                .channels
                .unwrap_or_default()
                .into_iter()
                .find(|channel| channel.name == name)
            {
                return Ok(channel);
            }

            cursor = body
                .response_metadata
                .and_then(|meta| meta.next_cursor)
                .filter(|value| !value.is_empty());
            if cursor.is_none() {
                return Err(SlackError::ChannelNotFound(name.to_string()));
            }
        }
    }

    /// Reads the current topic of a channel. `None` when no topic is set.
    pub async fn channel_topic(&self, channel_id: &str) -> Result<Option<String>, SlackError> {
        let mut url = self.base_url.join("conversations.info")?;
        url.query_pairs_mut().append_pair("channel", channel_id);

        let response = self.authorized(self.http.get(url)).send().await?;
        let body: ChannelInfoResponse = parse_json(response).await?;

        if !body.ok {
            return Err(api_error("conversations.info", body.error));
        }
        Ok(body
            .channel
            .and_then(|channel| channel.topic)
            .map(|topic| topic.value))
    }

    /// Replaces the channel topic.
    pub async fn set_channel_topic(
        &self,
        channel_id: &str,
        topic: &str,
    ) -> Result<(), SlackError> {
        let url = self.base_url.join("conversations.setTopic")?;
        let response = self
            .authorized(self.http.post(url))
            .json(&json!({ "channel": channel_id, "topic": topic }))
            .send()
            .await?;

        let body: AckResponse = parse_json(response).await?;
        if !body.ok {
            return Err(api_error("conversations.setTopic", body.error));
        }
        Ok(())
    }

    /// Posts a text message to a channel.
    pub async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), SlackError> {
        let url = self.base_url.join("chat.postMessage")?;
        let response = self
            .authorized(self.http.post(url))
            .json(&json!({ "channel": channel_id, "text": text }))
            .send()
            .await?;

        let body: AckResponse = parse_json(response).await?;
        if !body.ok {
            return Err(api_error("chat.postMessage", body.error));
        }
        Ok(())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("Bearer {}", self.bot_token))
    }
}

/// Workspace user resolved via email lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlackUser {
    pub id: String,
    pub name: String,
}

/// Public channel entry from the conversations list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct LookupUserResponse {
    ok: bool,
    error: Option<String>,
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct ListChannelsResponse {
    ok: bool,
    error: Option<String>,
    channels: Option<Vec<SlackChannel>>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelInfoResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<ChannelInfo>,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    topic: Option<ChannelTopic>,
}

#[derive(Debug, Deserialize)]
struct ChannelTopic {
    value: String,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    ok: bool,
    error: Option<String>,
}

/// Errors produced by the Slack client.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("failed to build url: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("{method} failed: {error}")]
    Api { method: &'static str, error: String },
    #[error("no slack user found for email: {0}")]
    UserNotFound(String),
    #[error("could not find channel #{0}")]
    ChannelNotFound(String),
}

fn api_error(method: &'static str, error: Option<String>) -> SlackError {
    SlackError::Api {
        method,
        error: error.unwrap_or_else(|| String::from("unknown_error")),
    }
}

async fn parse_json<T>(response: Response) -> Result<T, SlackError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<unavailable>"));
        return Err(SlackError::Status { status, body });
    }

    Ok(response.json().await?)
}
