//! LINE Messaging API: outbound calls behind [LineApi], plus the webhook
//! payload types.

mod client;
pub mod events;

pub use client::LineClient;

use crate::richmenu::RichMenu;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        text: String,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: serde_json::Value,
    },
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text { text: text.into() }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
}

/// Binary message content, i.e. a receipt photo
#[derive(Clone, Debug)]
pub struct Content {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Where LINE serves the bytes of a message the bot received.
pub fn content_url(message_id: &str) -> String {
    format!("https://api-data.line.me/v2/bot/message/{message_id}/content")
}

#[async_trait]
pub trait LineApi: Send + Sync {
    async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<()>;
    async fn push(&self, to: &str, messages: Vec<Message>) -> Result<()>;
    async fn get_profile(&self, user_id: &str) -> Result<Profile>;
    async fn get_content(&self, message_id: &str) -> Result<Content>;

    /// Returns the new rich menu's id
    async fn create_rich_menu(&self, menu: &RichMenu) -> Result<String>;
    async fn upload_rich_menu_image(&self, rich_menu_id: &str, png: Vec<u8>)
        -> Result<()>;
    async fn set_default_rich_menu(&self, rich_menu_id: &str) -> Result<()>;
}

#[cfg(test)]
pub mod testing {
    //! A [LineApi] that records what the bot says instead of calling LINE.

    use super::*;
    use anyhow::bail;
    use std::sync::Mutex;

    #[derive(Clone, Debug, PartialEq)]
    pub enum Sent {
        Reply(String, Vec<Message>),
        Push(String, Vec<Message>),
    }

    #[derive(Default)]
    pub struct FakeLine {
        pub sent: Mutex<Vec<Sent>>,
        pub profiles: Mutex<Vec<(String, String)>>,
        pub rich_menus: Mutex<Vec<String>>,
        pub uploads: Mutex<Vec<(String, usize)>>,
        pub defaults: Mutex<Vec<String>>,
        pub fail_upload: bool,
        pub fail_reply: bool,
    }

    impl FakeLine {
        pub fn with_profile(user_id: &str, display_name: &str) -> Self {
            let fake = FakeLine::default();
            fake.profiles
                .lock()
                .unwrap()
                .push((user_id.into(), display_name.into()));
            fake
        }

        pub fn sent(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        /// All reply messages, flattened, in order
        pub fn replies(&self) -> Vec<Message> {
            self.sent()
                .into_iter()
                .filter_map(|s| match s {
                    Sent::Reply(_, m) => Some(m),
                    Sent::Push(..) => None,
                })
                .flatten()
                .collect()
        }

        /// Every text a reply carried: text bodies and flex alt texts
        pub fn reply_texts(&self) -> Vec<String> {
            self.replies()
                .into_iter()
                .map(|m| match m {
                    Message::Text { text } => text,
                    Message::Flex { alt_text, .. } => alt_text,
                })
                .collect()
        }
    }

    #[async_trait]
    impl LineApi for FakeLine {
        async fn reply(&self, reply_token: &str, messages: Vec<Message>) -> Result<()> {
            if self.fail_reply {
                bail!("400 invalid reply token");
            }
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Reply(reply_token.into(), messages));
            Ok(())
        }
        async fn push(&self, to: &str, messages: Vec<Message>) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push(Sent::Push(to.into(), messages));
            Ok(())
        }
        async fn get_profile(&self, user_id: &str) -> Result<Profile> {
            let profiles = self.profiles.lock().unwrap();
            match profiles.iter().find(|(id, _)| id == user_id) {
                Some((_, name)) => Ok(Profile {
                    display_name: name.clone(),
                }),
                None => bail!("404 no such profile"),
            }
        }
        async fn get_content(&self, message_id: &str) -> Result<Content> {
            if message_id == "missing" {
                bail!("404 no such message");
            }
            Ok(Content {
                content_type: "image/jpeg".into(),
                bytes: message_id.as_bytes().to_vec(),
            })
        }
        async fn create_rich_menu(&self, menu: &RichMenu) -> Result<String> {
            let mut menus = self.rich_menus.lock().unwrap();
            menus.push(menu.name.clone());
            Ok(format!("richmenu-{}", menus.len()))
        }
        async fn upload_rich_menu_image(
            &self,
            rich_menu_id: &str,
            png: Vec<u8>,
        ) -> Result<()> {
            if self.fail_upload {
                bail!("400 image too large");
            }
            self.uploads
                .lock()
                .unwrap()
                .push((rich_menu_id.into(), png.len()));
            Ok(())
        }
        async fn set_default_rich_menu(&self, rich_menu_id: &str) -> Result<()> {
            self.defaults.lock().unwrap().push(rich_menu_id.into());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_format() {
        assert_eq!(
            serde_json::to_value(Message::text("hi")).unwrap(),
            json!({"type": "text", "text": "hi"})
        );
        let flex = Message::Flex {
            alt_text: "alt".into(),
            contents: json!({"type": "bubble"}),
        };
        assert_eq!(
            serde_json::to_value(flex).unwrap(),
            json!({"type": "flex", "altText": "alt", "contents": {"type": "bubble"}})
        );
    }

    #[test]
    fn test_content_url() {
        assert_eq!(
            content_url("123"),
            "https://api-data.line.me/v2/bot/message/123/content"
        );
    }
}
