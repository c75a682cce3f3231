use super::{content_url, Content, LineApi, Message, Profile};
use crate::richmenu::RichMenu;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use serde::Deserialize;
use serde_json::json;

const API_BASE: &str = "https://api.line.me/v2/bot";
const DATA_API_BASE: &str = "https://api-data.line.me/v2/bot";

pub struct LineClient {
    http: Client,
    token: String,
}

impl LineClient {
    pub fn new(token: impl Into<String>) -> Self {
        LineClient {
            http: Client::new(),
            token: token.into(),
        }
    }
}

/// LINE answers errors with a JSON body worth keeping, so read it before
/// giving up.
async fn ensure_ok(res: Response, what: &str) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    bail!("{what} failed with {status}: {body}")
}

#[async_trait]
impl LineApi for LineClient {
    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<()> {
        let res = self
            .http
            .post(format!("{API_BASE}/message/reply"))
            .bearer_auth(&self.token)
            .json(&json!({ "replyToken": reply_token, "messages": messages }))
            .send()
            .await
            .context("sending reply")?;
        ensure_ok(res, "reply").await?;

        Ok(())
    }

    async fn push(&self, to: &str, messages: Vec<Message>) -> Result<()> {
        let res = self
            .http
            .post(format!("{API_BASE}/message/push"))
            .bearer_auth(&self.token)
            .json(&json!({ "to": to, "messages": messages }))
            .send()
            .await
            .context("sending push")?;
        ensure_ok(res, "push").await?;

        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile> {
        let res = self
            .http
            .get(format!("{API_BASE}/profile/{user_id}"))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("fetching profile")?;

        Ok(ensure_ok(res, "profile").await?.json().await?)
    }

    async fn get_content(&self, message_id: &str) -> Result<Content> {
        let res = self
            .http
            .get(content_url(message_id))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("fetching message content")?;
        let res = ensure_ok(res, "content").await?;
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = res.bytes().await?.to_vec();

        Ok(Content {
            content_type,
            bytes,
        })
    }

    async fn create_rich_menu(&self, menu: &RichMenu) -> Result<String> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Created {
            rich_menu_id: String,
        }
        let res = self
            .http
            .post(format!("{API_BASE}/richmenu"))
            .bearer_auth(&self.token)
            .json(menu)
            .send()
            .await
            .context("creating rich menu")?;
        let created: Created =
            ensure_ok(res, "create rich menu").await?.json().await?;

        Ok(created.rich_menu_id)
    }

    async fn upload_rich_menu_image(
        &self,
        rich_menu_id: &str,
        png: Vec<u8>,
    ) -> Result<()> {
        let res = self
            .http
            .post(format!("{DATA_API_BASE}/richmenu/{rich_menu_id}/content"))
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "image/png")
            .body(png)
            .send()
            .await
            .context("uploading rich menu image")?;
        ensure_ok(res, "upload rich menu image").await?;

        Ok(())
    }

    async fn set_default_rich_menu(&self, rich_menu_id: &str) -> Result<()> {
        let res = self
            .http
            .post(format!("{API_BASE}/user/all/richmenu/{rich_menu_id}"))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("setting default rich menu")?;
        ensure_ok(res, "set default rich menu").await?;

        Ok(())
    }
}
