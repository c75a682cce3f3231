//! The subset of the webhook payload the bot reads. Anything else is
//! ignored rather than rejected.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    /// Kept raw so one malformed event doesn't sink the whole delivery
    #[serde(default)]
    pub events: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub reply_token: Option<String>,
    pub source: Option<Source>,
    pub message: Option<EventMessage>,
}

impl Event {
    pub fn user_id(&self) -> Option<&str> {
        self.source.as_ref()?.user_id.as_deref()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventMessage {
    Text { id: String, text: String },
    Image { id: String },
    #[serde(other)]
    Other,
}
