//! What the bot does with each chat event LINE delivers.

use super::{
    components::{self, Component},
    config::FALLBACK_PROPERTY_NAME,
    db_ops,
    line::{
        content_url,
        events::{Event, EventMessage, WebhookBody},
        Message,
    },
    models::{AppState, NewTransaction, PendingImage, Property},
    parser::{self, Command, Intent, ParsedTransaction},
    summary::{self, Summary},
};
use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// Recorded as the author when the sender's profile can't be fetched
const UNKNOWN_SENDER: &str = "ไม่ทราบ";

const CANCEL_WORDS: [&str; 2] = ["ยกเลิก", "cancel"];

/// Handle every event in a delivery. One failing event never stops the rest;
/// its sender gets a short failure notice instead.
pub async fn handle_delivery(state: &AppState, body: WebhookBody) {
    for raw in body.events {
        let event: Event = match serde_json::from_value(raw) {
            Ok(ev) => ev,
            Err(e) => {
                warn!("skipping malformed event: {e}");
                continue;
            }
        };
        if let Err(e) = handle_event(state, &event).await {
            error!("error handling event: {e:?}");
            if let Some(user_id) = event.user_id() {
                if let Err(e) = state
                    .line
                    .push(user_id, vec![components::something_went_wrong()])
                    .await
                {
                    error!("could not tell {user_id} about the failure: {e:?}");
                }
            }
        }
    }
}

pub async fn handle_event(state: &AppState, event: &Event) -> Result<()> {
    if event.kind != "message" {
        return Ok(());
    }
    let (Some(reply_token), Some(message)) = (&event.reply_token, &event.message)
    else {
        return Ok(());
    };
    // group sources may hide the sender; those never get a pending image
    let user_id = event.user_id();

    match message {
        EventMessage::Image { id } => {
            let Some(user_id) = user_id else {
                debug!(message_id = %id, "image from an unknown sender");
                return Ok(());
            };
            state
                .store
                .save_pending_image(user_id, &content_url(id))
                .await?;
            state
                .line
                .reply(reply_token, components::receipt_received())
                .await
        }
        EventMessage::Text { id, text } => {
            debug!(message_id = %id, "text message");
            let text = text.trim();
            if let Some(user_id) = user_id {
                if let Some(pending) = state.store.get_pending_image(user_id).await? {
                    return handle_pending_reply(state, text, pending, reply_token)
                        .await;
                }
            }
            match parser::parse_message(text) {
                Intent::Command(command) => {
                    handle_command(state, command, reply_token).await
                }
                Intent::Transaction(parsed) => {
                    record_transaction(state, parsed, user_id, reply_token, None)
                        .await
                        .map(|_| ())
                }
                Intent::Unknown => {
                    reply(state, reply_token, components::HelpCard.render()).await
                }
            }
        }
        EventMessage::Other => Ok(()),
    }
}

async fn reply(state: &AppState, reply_token: &str, message: Message) -> Result<()> {
    state.line.reply(reply_token, vec![message]).await
}

/// The sender has a receipt photo waiting for its amount.
async fn handle_pending_reply(
    state: &AppState,
    text: &str,
    pending: PendingImage,
    reply_token: &str,
) -> Result<()> {
    if CANCEL_WORDS.contains(&text) {
        state.store.clear_pending_image(&pending.user_id).await?;
        return reply(state, reply_token, components::receipt_cancelled()).await;
    }
    match parser::parse_message(text) {
        Intent::Transaction(parsed) => {
            record_transaction(
                state,
                parsed,
                Some(&pending.user_id),
                reply_token,
                Some(&pending),
            )
            .await
            .map(|_| ())
        }
        _ => reply(state, reply_token, components::receipt_not_understood()).await,
    }
}

/// Work out which property a transaction belongs to. `None` means the user
/// has already been asked to name one.
async fn resolve_property(
    state: &AppState,
    parsed: &ParsedTransaction,
    reply_token: &str,
) -> Result<Option<Property>> {
    if let Some(name) = &parsed.property_name {
        return Ok(Some(match state.store.find_property_by_name(name).await? {
            Some(p) => p,
            None => state.store.add_property(name).await?,
        }));
    }

    let mut properties = state.store.list_properties().await?;
    match properties.len() {
        0 => Ok(Some(
            state.store.add_property(FALLBACK_PROPERTY_NAME).await?,
        )),
        1 => Ok(properties.pop()),
        _ => {
            let ask = components::WhichProperty {
                tx_type: parsed.tx_type,
                amount: parsed.amount,
                description: &parsed.description,
                properties: &properties,
            };
            reply(state, reply_token, ask.render()).await?;
            Ok(None)
        }
    }
}

/// Returns whether a transaction was stored. Once it is, nothing after
/// that returns an error: the sender must never be told to send it again.
async fn record_transaction(
    state: &AppState,
    parsed: ParsedTransaction,
    user_id: Option<&str>,
    reply_token: &str,
    pending: Option<&PendingImage>,
) -> Result<bool> {
    let Some(property) = resolve_property(state, &parsed, reply_token).await?
    else {
        return Ok(false);
    };

    let recorded_by = match user_id {
        Some(user_id) => match state.line.get_profile(user_id).await {
            Ok(profile) => profile.display_name,
            Err(e) => {
                warn!("no profile for {user_id}: {e:#}");
                UNKNOWN_SENDER.to_string()
            }
        },
        None => UNKNOWN_SENDER.to_string(),
    };

    let tx = state
        .store
        .add_transaction(NewTransaction {
            property_id: property.id,
            tx_type: parsed.tx_type,
            amount: parsed.amount,
            category: parsed.category,
            description: parsed.description,
            image_url: pending.map(|p| p.image_url.clone()),
            recorded_by,
            date: Utc::now().date_naive(),
        })
        .await?;

    if let Some(pending) = pending {
        if let Err(e) = state.store.clear_pending_image(&pending.user_id).await {
            error!(tx_id = %tx.id, "could not clear pending image: {e:?}");
        }
    }

    let card = components::TransactionCard {
        tx_type: tx.tx_type,
        amount: tx.amount,
        description: &tx.description,
        property_name: &property.name,
    }
    .render();
    if let Err(e) = reply(state, reply_token, card.clone()).await {
        warn!(tx_id = %tx.id, "stored but the reply failed: {e:#}");
        // reply tokens expire; a push still reaches the sender
        if let Some(user_id) = user_id {
            if let Err(e) = state.line.push(user_id, vec![card]).await {
                error!(tx_id = %tx.id, "could not confirm to {user_id}: {e:?}");
            }
        }
    }

    Ok(true)
}

async fn handle_command(
    state: &AppState,
    command: Command,
    reply_token: &str,
) -> Result<()> {
    let message = match command {
        Command::Help => components::HelpCard.render(),
        Command::Summary {
            property_name: None,
        } => {
            let summary = db_ops::get_summary(state.store.as_ref(), None).await?;
            components::SummaryCard {
                summary: &summary,
                property_name: None,
            }
            .render()
        }
        Command::Summary {
            property_name: Some(name),
        } => match state.store.find_property_by_name(&name).await? {
            Some(property) => {
                let summary =
                    db_ops::get_summary(state.store.as_ref(), Some(property.id))
                        .await?;
                components::SummaryCard {
                    summary: &summary,
                    property_name: Some(&property.name),
                }
                .render()
            }
            None => components::property_not_found(&name),
        },
        Command::Properties => {
            let rows = property_rows(state).await?;
            components::PropertyList { rows: &rows }.render()
        }
        Command::AddProperty { property_name } => {
            match state.store.find_property_by_name(&property_name).await? {
                Some(existing) => components::property_exists(&existing.name),
                None => {
                    let added = state.store.add_property(&property_name).await?;
                    components::property_added(&added.name)
                }
            }
        }
    };
    reply(state, reply_token, message).await
}

/// Each property with its summary, from a single pass over the ledger
async fn property_rows(
    state: &AppState,
) -> Result<Vec<(Property, Summary)>> {
    let properties = state.store.list_properties().await?;
    if properties.is_empty() {
        return Ok(Vec::new());
    }
    let transactions = state.store.list_transactions(None).await?;
    let mut by_property: HashMap<_, Vec<_>> = HashMap::new();
    for tx in transactions {
        by_property.entry(tx.property_id).or_default().push(tx);
    }

    Ok(properties
        .into_iter()
        .map(|p| {
            let txs = by_property.remove(&p.id).unwrap_or_default();
            let summary = summary::summarize(&txs);
            (p, summary)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{Config, StoreBackend},
        db_ops::{MemStore, Store},
        line::testing::{FakeLine, Sent},
        models::TxType,
    };
    use serde_json::json;
    use std::sync::Arc;

    struct Harness {
        state: AppState,
        store: Arc<MemStore>,
        line: Arc<FakeLine>,
    }

    fn harness(line: FakeLine) -> Harness {
        let store = Arc::new(MemStore::default());
        let line = Arc::new(line);
        let config = Config::from_lookup(|k| match k {
            "STORE" => Some("memory".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        Harness {
            state: AppState {
                store: store.clone(),
                line: line.clone(),
                config: Arc::new(config),
            },
            store,
            line,
        }
    }

    fn text(user: &str, text: &str) -> serde_json::Value {
        json!({
            "type": "message",
            "replyToken": "reply-token",
            "source": {"type": "user", "userId": user},
            "message": {"type": "text", "id": "m1", "text": text}
        })
    }

    fn image(user: &str, id: &str) -> serde_json::Value {
        json!({
            "type": "message",
            "replyToken": "reply-token",
            "source": {"type": "user", "userId": user},
            "message": {"type": "image", "id": id}
        })
    }

    async fn deliver(h: &Harness, events: Vec<serde_json::Value>) {
        handle_delivery(&h.state, WebhookBody { events }).await;
    }

    #[tokio::test]
    async fn test_expense_with_named_property() {
        let h = harness(FakeLine::with_profile("U1", "สมชาย"));
        deliver(&h, vec![text("U1", "จ่าย 3500 ค่าปูน บ้านรามคำแหง")]).await;

        let properties = h.store.list_properties().await.unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].name, "บ้านรามคำแหง");

        let txs = h.store.list_transactions(None).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].tx_type, TxType::Expense);
        assert_eq!(txs[0].amount, 3500.0);
        assert_eq!(txs[0].category, "วัสดุ");
        assert_eq!(txs[0].description, "ค่าปูน");
        assert_eq!(txs[0].recorded_by, "สมชาย");
        assert_eq!(txs[0].date, Utc::now().date_naive());
        assert_eq!(txs[0].image_url, None);

        assert_eq!(h.line.reply_texts().len(), 1);
        assert!(h.line.reply_texts()[0].contains("3,500"));
    }

    #[tokio::test]
    async fn test_unnamed_transaction_falls_back_to_general_property() {
        let h = harness(FakeLine::default());
        deliver(&h, vec![text("U1", "รับ 50000 ค่ามัดจำ")]).await;

        let properties = h.store.list_properties().await.unwrap();
        assert_eq!(properties[0].name, FALLBACK_PROPERTY_NAME);
        let txs = h.store.list_transactions(None).await.unwrap();
        assert_eq!(txs[0].recorded_by, UNKNOWN_SENDER);
        assert_eq!(txs[0].property_id, properties[0].id);
    }

    #[tokio::test]
    async fn test_unnamed_transaction_uses_sole_property() {
        let h = harness(FakeLine::default());
        let only = h.store.add_property("บ้านลาดพร้าว").await.unwrap();
        deliver(&h, vec![text("U1", "จ่าย 800 ค่าไฟ")]).await;

        let txs = h.store.list_transactions(None).await.unwrap();
        assert_eq!(txs[0].property_id, only.id);
        assert_eq!(h.store.list_properties().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unnamed_transaction_with_many_properties_asks() {
        let h = harness(FakeLine::default());
        h.store.add_property("บ้านA").await.unwrap();
        h.store.add_property("บ้านB").await.unwrap();
        deliver(&h, vec![text("U1", "จ่าย 800 ค่าไฟ")]).await;

        assert!(h.store.list_transactions(None).await.unwrap().is_empty());
        let replies = h.line.reply_texts();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("กรุณาระบุชื่อทรัพย์สิน"));
        assert!(replies[0].contains("จ่าย 800 ค่าไฟ บ้านXXX"));
        assert!(replies[0].contains("• บ้านA"));
    }

    #[tokio::test]
    async fn test_receipt_image_flow() {
        let h = harness(FakeLine::default());
        deliver(&h, vec![image("U1", "img-1")]).await;
        assert_eq!(h.line.replies().len(), 2);
        let pending = h.store.get_pending_image("U1").await.unwrap().unwrap();
        assert_eq!(pending.image_url, content_url("img-1"));

        // gibberish keeps the image waiting
        deliver(&h, vec![text("U1", "อะไรนะ")]).await;
        assert!(h.line.reply_texts()[2].contains("ไม่เข้าใจ"));
        assert!(h.store.get_pending_image("U1").await.unwrap().is_some());

        deliver(&h, vec![text("U1", "จ่าย 3500 ค่าปูน บ้านรามคำแหง")]).await;
        let txs = h.store.list_transactions(None).await.unwrap();
        assert_eq!(txs[0].image_url.as_deref(), Some(content_url("img-1").as_str()));
        assert!(h.store.get_pending_image("U1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_pending_image() {
        let h = harness(FakeLine::default());
        deliver(&h, vec![image("U1", "img-1"), text("U1", " ยกเลิก ")]).await;
        assert!(h.store.get_pending_image("U1").await.unwrap().is_none());
        assert!(h.line.reply_texts()[2].contains("ยกเลิกการบันทึกรูปบิล"));
        assert!(h.store.list_transactions(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_image_is_per_user() {
        let h = harness(FakeLine::default());
        deliver(&h, vec![image("U1", "img-1"), text("U2", "สรุป")]).await;
        assert!(h.store.get_pending_image("U1").await.unwrap().is_some());
        assert!(h.line.reply_texts()[2].starts_with("📊 สรุป: "));
    }

    #[tokio::test]
    async fn test_summary_commands() {
        let h = harness(FakeLine::default());
        deliver(
            &h,
            vec![
                text("U1", "จ่าย 3500 ค่าปูน บ้านรามคำแหง"),
                text("U1", "สรุป รามคำแหง"),
                text("U1", "สรุป บ้านไม่มี"),
            ],
        )
        .await;
        let replies = h.line.reply_texts();
        assert_eq!(replies[1], "📊 สรุป: รับ ฿0 | จ่าย ฿3,500");
        assert_eq!(replies[2], "❌ ไม่พบทรัพย์สิน \"บ้านไม่มี\"");
        let Message::Flex { contents, .. } = &h.line.replies()[1] else {
            panic!("expected a summary card");
        };
        assert!(contents.to_string().contains("📊 สรุป: บ้านรามคำแหง"));
    }

    #[tokio::test]
    async fn test_property_commands() {
        let h = harness(FakeLine::default());
        deliver(
            &h,
            vec![
                text("U1", "ทรัพย์สิน"),
                text("U1", "เพิ่มบ้าน บ้านสวน"),
                text("U1", "เพิ่มบ้าน บ้านสวน"),
                text("U1", "รับ 1000 ค่าเช่า บ้านสวน"),
                text("U1", "ทรัพย์สิน"),
            ],
        )
        .await;
        let replies = h.line.reply_texts();
        assert!(replies[0].contains("ยังไม่มีทรัพย์สิน"));
        assert!(replies[1].starts_with("✅ เพิ่มทรัพย์สิน \"บ้านสวน\""));
        assert_eq!(replies[2], "⚠️ มีทรัพย์สิน \"บ้านสวน\" อยู่แล้ว");
        assert!(replies[4].contains("• บ้านสวน"));
        assert!(replies[4].contains("รับ: ฿1,000"));
        assert_eq!(h.store.list_properties().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_text_gets_help() {
        let h = harness(FakeLine::default());
        deliver(&h, vec![text("U1", "สวัสดี")]).await;
        assert_eq!(h.line.reply_texts(), vec!["📖 วิธีใช้งาน RenovateTrack Bot"]);
    }

    #[tokio::test]
    async fn test_ignored_events() {
        let h = harness(FakeLine::default());
        deliver(
            &h,
            vec![
                json!({"type": "follow", "replyToken": "r", "source": {"userId": "U1"}}),
                json!({
                    "type": "message",
                    "replyToken": "r",
                    "source": {"userId": "U1"},
                    "message": {"type": "sticker", "id": "s1"}
                }),
                json!("not an event"),
            ],
        )
        .await;
        assert!(h.line.sent().is_empty());
    }

    #[tokio::test]
    async fn test_failure_pushes_notice() {
        let h = harness(FakeLine {
            fail_reply: true,
            ..Default::default()
        });
        deliver(&h, vec![text("U1", "สรุป"), text("U2", "ช่วยเหลือ")]).await;
        assert_eq!(
            h.line.sent(),
            vec![
                Sent::Push("U1".into(), vec![components::something_went_wrong()]),
                Sent::Push("U2".into(), vec![components::something_went_wrong()]),
            ]
        );
    }

    #[tokio::test]
    async fn test_stored_transaction_is_confirmed_by_push_when_reply_fails() {
        let h = harness(FakeLine {
            fail_reply: true,
            ..Default::default()
        });
        deliver(&h, vec![text("U1", "จ่าย 100 ค่าปูน บ้านA")]).await;
        let txs = h.store.list_transactions(None).await.unwrap();
        assert_eq!(txs.len(), 1);
        let card = components::TransactionCard {
            tx_type: TxType::Expense,
            amount: 100.0,
            description: "ค่าปูน",
            property_name: "บ้านA",
        }
        .render();
        assert_eq!(h.line.sent(), vec![Sent::Push("U1".into(), vec![card])]);
    }

    #[tokio::test]
    async fn test_pending_image_cleared_when_reply_fails() {
        let h = harness(FakeLine {
            fail_reply: true,
            ..Default::default()
        });
        h.store
            .save_pending_image("U1", &content_url("img-1"))
            .await
            .unwrap();
        deliver(&h, vec![text("U1", "จ่าย 250 ค่าสี บ้านA")]).await;
        assert!(h.store.get_pending_image("U1").await.unwrap().is_none());
        let txs = h.store.list_transactions(None).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].image_url.as_deref(), Some(content_url("img-1").as_str()));
        let sent = h.line.sent();
        assert_eq!(sent.len(), 1);
        assert!(!sent.contains(&Sent::Push(
            "U1".into(),
            vec![components::something_went_wrong()]
        )));
    }

    #[tokio::test]
    async fn test_senders_without_user_id_share_no_pending_image() {
        let h = harness(FakeLine::default());
        let group = |message: serde_json::Value| {
            json!({
                "type": "message",
                "replyToken": "reply-token",
                "source": {"type": "group", "groupId": "G1"},
                "message": message
            })
        };
        deliver(
            &h,
            vec![
                group(json!({"type": "image", "id": "img-1"})),
                group(json!({"type": "text", "id": "m1", "text": "จ่าย 100 ค่าปูน บ้านA"})),
            ],
        )
        .await;
        assert!(h.store.get_pending_image("").await.unwrap().is_none());
        let txs = h.store.list_transactions(None).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].image_url, None);
        assert_eq!(txs[0].recorded_by, UNKNOWN_SENDER);
        assert_eq!(h.line.replies().len(), 1);
    }
}
