use serde::Deserialize;
use thiserror::Error;

/// Entity kind that drives notification logic. Webhook deliveries for any
/// other entity kind are ignored wholesale.
pub const ISSUE_ENTITY: &str = "Issue";

/// Errors that can occur while decoding a webhook payload into an
/// [`IssueEvent`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("payload is not a well-formed issue event: {0}")]
    Json(#[from] serde_json::Error),
}

/// Action reported by the issue tracker for a webhook delivery.
///
/// Only `create` and `update` participate in the relevance decision; every
/// other action string maps to [`IssueAction::Other`] rather than failing
/// the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueAction {
    Create,
    Update,
    Remove,
    #[serde(other)]
    Other,
}

/// Current state of the issue carried in the delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueState {
    pub id: String,
    pub title: String,
    pub priority: u8,
    #[serde(rename = "labelIds")]
    pub label_ids: Vec<String>,
}

/// Prior values of the fields that changed as part of an update.
///
/// `None` means the field did not change, so its prior value equals the
/// current one. The tracker never reports fields here that are absent from
/// [`IssueState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChangedFields {
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default, rename = "labelIds")]
    pub label_ids: Option<Vec<String>>,
}

/// Validated representation of one webhook delivery.
///
/// Constructed fresh from the raw request body for each invocation and never
/// retained afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueEvent {
    pub action: IssueAction,
    #[serde(rename = "type")]
    pub entity: String,
    pub url: String,
    pub data: IssueState,
    #[serde(default, rename = "updatedFrom")]
    pub updated_from: Option<ChangedFields>,
}

impl IssueEvent {
    /// Decodes the raw request body. Call only after the delivery signature
    /// has been verified; the verifier operates on the raw bytes.
    pub fn parse(raw_body: &[u8]) -> Result<Self, ParseError> {
        Ok(serde_json::from_slice(raw_body)?)
    }
}
