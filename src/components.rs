//! Chat replies. Cards are LINE flex "bubbles"; everything else is plain
//! text.

use super::{
    line::Message,
    models::{Property, TxType},
    summary::Summary,
};
use serde_json::{json, Value};

const BACKGROUND: &str = "#1a1a2e";
const GREEN: &str = "#10b981";
const RED: &str = "#ef4444";
const MUTED: &str = "#888888";
const HINT: &str = "#aaaaaa";

pub trait Component {
    /// Render the component to a single LINE message
    fn render(&self) -> Message;
}

/// `฿` amount with thousands separators and at most three decimals, e.g.
/// `฿1,234.5`
pub fn baht(amount: f64) -> String {
    format!("฿{}", group_thousands(amount))
}

fn group_thousands(amount: f64) -> String {
    let fixed = format!("{:.3}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let negative = amount < 0.0 && (grouped != "0" || !frac_part.is_empty());

    format!(
        "{}{grouped}{}{frac_part}",
        if negative { "-" } else { "" },
        if frac_part.is_empty() { "" } else { "." }
    )
}

fn bubble(size: &str, contents: Vec<Value>) -> Value {
    json!({
        "type": "bubble",
        "size": size,
        "body": {
            "type": "box",
            "layout": "vertical",
            "contents": contents,
        },
        "styles": { "body": { "backgroundColor": BACKGROUND } },
    })
}

/// Label on the left, value on the right
fn row(label: &str, value: Value) -> Value {
    json!({
        "type": "box",
        "layout": "horizontal",
        "contents": [
            { "type": "text", "text": label, "size": "sm", "color": MUTED, "flex": 2 },
            value,
        ],
    })
}

fn value_text(text: &str) -> Value {
    json!({ "type": "text", "text": text, "size": "sm", "flex": 3, "align": "end" })
}

fn strong_text(text: &str, size: &str, color: &str) -> Value {
    json!({
        "type": "text",
        "text": text,
        "size": size,
        "weight": "bold",
        "color": color,
        "flex": 3,
        "align": "end",
    })
}

pub struct TransactionCard<'a> {
    pub tx_type: TxType,
    pub amount: f64,
    pub description: &'a str,
    pub property_name: &'a str,
}

impl Component for TransactionCard<'_> {
    fn render(&self) -> Message {
        let (color, icon) = match self.tx_type {
            TxType::Income => (GREEN, "✅"),
            TxType::Expense => (RED, "📝"),
        };
        let label = self.tx_type.label();
        let amount = baht(self.amount);
        let description = if self.description.is_empty() {
            "-"
        } else {
            self.description
        };

        Message::Flex {
            alt_text: format!("{icon} บันทึก{label} {amount}"),
            contents: bubble(
                "kilo",
                vec![
                    json!({
                        "type": "text",
                        "text": format!("{icon} บันทึก{label}สำเร็จ"),
                        "weight": "bold",
                        "size": "md",
                        "color": color,
                    }),
                    json!({ "type": "separator", "margin": "md" }),
                    json!({
                        "type": "box",
                        "layout": "vertical",
                        "margin": "md",
                        "spacing": "sm",
                        "contents": [
                            row("จำนวน", strong_text(&amount, "sm", color)),
                            row("รายการ", value_text(description)),
                            row(
                                "ทรัพย์สิน",
                                value_text(&format!("🏠 {}", self.property_name)),
                            ),
                        ],
                    }),
                ],
            ),
        }
    }
}

pub struct SummaryCard<'a> {
    pub summary: &'a Summary,
    /// `None` for the all-properties summary
    pub property_name: Option<&'a str>,
}

impl Component for SummaryCard<'_> {
    fn render(&self) -> Message {
        let s = self.summary;
        let title = match self.property_name {
            Some(name) => format!("📊 สรุป: {name}"),
            None => "📊 สรุปรายรับรายจ่ายทั้งหมด".to_string(),
        };
        let (profit_label, profit_color) = if s.profit >= 0.0 {
            ("✅ กำไร", GREEN)
        } else {
            ("⚠️ ขาดทุน", RED)
        };

        Message::Flex {
            alt_text: format!(
                "📊 สรุป: รับ {} | จ่าย {}",
                baht(s.total_income),
                baht(s.total_expense)
            ),
            contents: bubble(
                "kilo",
                vec![
                    json!({
                        "type": "text",
                        "text": title,
                        "weight": "bold",
                        "size": "md",
                        "color": GREEN,
                    }),
                    json!({ "type": "separator", "margin": "md" }),
                    json!({
                        "type": "box",
                        "layout": "vertical",
                        "margin": "md",
                        "spacing": "sm",
                        "contents": [
                            row("💰 รายรับ", strong_text(&baht(s.total_income), "sm", GREEN)),
                            row("📝 รายจ่าย", strong_text(&baht(s.total_expense), "sm", RED)),
                            { "type": "separator", "margin": "sm" },
                            row(
                                profit_label,
                                strong_text(&baht(s.profit.abs()), "md", profit_color),
                            ),
                        ],
                    }),
                    json!({
                        "type": "text",
                        "text": format!("📋 ทั้งหมด {} รายการ", s.count),
                        "size": "xs",
                        "color": MUTED,
                        "margin": "md",
                    }),
                ],
            ),
        }
    }
}

pub struct HelpCard;

impl Component for HelpCard {
    fn render(&self) -> Message {
        fn heading(text: &str, color: &str) -> Value {
            json!({
                "type": "text",
                "text": text,
                "weight": "bold",
                "size": "sm",
                "margin": "lg",
                "color": color,
            })
        }
        fn hint(text: &str) -> Value {
            json!({
                "type": "text",
                "text": text,
                "size": "xs",
                "color": HINT,
                "margin": "sm",
                "wrap": true,
            })
        }

        Message::Flex {
            alt_text: "📖 วิธีใช้งาน RenovateTrack Bot".into(),
            contents: bubble(
                "mega",
                vec![
                    json!({
                        "type": "text",
                        "text": "📖 วิธีใช้งาน",
                        "weight": "bold",
                        "size": "lg",
                        "color": GREEN,
                    }),
                    json!({ "type": "separator", "margin": "md" }),
                    heading("💰 บันทึกรายจ่าย", RED),
                    hint("จ่าย 3500 ค่าปูน บ้านรามคำแหง"),
                    heading("💵 บันทึกรายรับ", GREEN),
                    hint("รับ 50000 ค่ามัดจำ บ้านลาดพร้าว"),
                    heading("📸 ส่งรูปบิล", "#3b82f6"),
                    hint("ส่งรูป → Bot จะถามยอดเงิน"),
                    json!({ "type": "separator", "margin": "lg" }),
                    heading("📋 คำสั่งอื่นๆ", "#f59e0b"),
                    hint(
                        "• \"สรุป\" → สรุปทั้งหมด\n\
                        • \"สรุป บ้านXX\" → สรุปเฉพาะบ้าน\n\
                        • \"ทรัพย์สิน\" → ดูทรัพย์ทั้งหมด\n\
                        • \"เพิ่มบ้าน ชื่อ\" → เพิ่มทรัพย์ใหม่",
                    ),
                ],
            ),
        }
    }
}

/// Every property with its running totals
pub struct PropertyList<'a> {
    pub rows: &'a [(Property, Summary)],
}

impl Component for PropertyList<'_> {
    fn render(&self) -> Message {
        if self.rows.is_empty() {
            return Message::text(
                "📋 ยังไม่มีทรัพย์สิน\n\n\
                เพิ่มทรัพย์ได้โดยพิมพ์:\nเพิ่มบ้าน [ชื่อ]\n\n\
                หรือบันทึกรายจ่ายพร้อมชื่อทรัพย์:\nจ่าย 3500 ค่าปูน บ้านXXX",
            );
        }
        let mut msg = String::from("🏠 ทรัพย์สินทั้งหมด:\n\n");
        for (property, s) in self.rows {
            let verdict = if s.profit >= 0.0 {
                "✅ กำไร"
            } else {
                "⚠️ ขาดทุน"
            };
            msg.push_str(&format!(
                "• {}\n  รับ: {} | จ่าย: {}\n  {verdict}: {}\n\n",
                property.name,
                baht(s.total_income),
                baht(s.total_expense),
                baht(s.profit.abs()),
            ));
        }
        Message::text(msg.trim())
    }
}

/// Asked when a transaction names no property and several exist
pub struct WhichProperty<'a> {
    pub tx_type: TxType,
    pub amount: f64,
    pub description: &'a str,
    pub properties: &'a [Property],
}

impl Component for WhichProperty<'_> {
    fn render(&self) -> Message {
        let verb = match self.tx_type {
            TxType::Income => "รับ",
            TxType::Expense => "จ่าย",
        };
        let names = self
            .properties
            .iter()
            .map(|p| format!("• {}", p.name))
            .collect::<Vec<_>>()
            .join("\n");
        Message::text(format!(
            "🏠 กรุณาระบุชื่อทรัพย์สิน\n\
            พิมพ์ข้อความใหม่พร้อมชื่อทรัพย์ เช่น:\n\n\
            {verb} {} {} บ้านXXX\n\n\
            📋 ทรัพย์ที่มี:\n{names}",
            self.amount, self.description
        ))
    }
}

pub fn receipt_received() -> Vec<Message> {
    vec![
        Message::text("📸 ได้รับรูปบิลแล้ว!"),
        Message::text(
            "กรุณาพิมพ์ข้อมูลตามรูปแบบนี้:\n\n\
            จ่าย [จำนวนเงิน] [รายละเอียด] [ชื่อทรัพย์]\n\n\
            ตัวอย่าง:\nจ่าย 3500 ค่าปูน บ้านรามคำแหง\n\n\
            หรือพิมพ์ \"ยกเลิก\" เพื่อยกเลิก",
        ),
    ]
}

pub fn receipt_cancelled() -> Message {
    Message::text("❌ ยกเลิกการบันทึกรูปบิลแล้ว")
}

pub fn receipt_not_understood() -> Message {
    Message::text(
        "❌ ไม่เข้าใจ กรุณาพิมพ์ใหม่ เช่น:\n\
        จ่าย 3500 ค่าปูน บ้านรามคำแหง\n\n\
        หรือพิมพ์ \"ยกเลิก\"",
    )
}

pub fn property_not_found(name: &str) -> Message {
    Message::text(format!("❌ ไม่พบทรัพย์สิน \"{name}\""))
}

pub fn property_exists(name: &str) -> Message {
    Message::text(format!("⚠️ มีทรัพย์สิน \"{name}\" อยู่แล้ว"))
}

pub fn property_added(name: &str) -> Message {
    Message::text(format!(
        "✅ เพิ่มทรัพย์สิน \"{name}\" สำเร็จ!\n\n\
        ตอนนี้สามารถบันทึกรายจ่ายได้:\nจ่าย 3500 ค่าปูน {name}"
    ))
}

pub fn something_went_wrong() -> Message {
    Message::text("⚠️ เกิดข้อผิดพลาด กรุณาลองใหม่อีกครั้ง")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(m: Message) -> String {
        match m {
            Message::Text { text } => text,
            Message::Flex { .. } => panic!("expected text"),
        }
    }

    #[test]
    fn test_baht() {
        assert_eq!(baht(3500.0), "฿3,500");
        assert_eq!(baht(0.0), "฿0");
        assert_eq!(baht(999.0), "฿999");
        assert_eq!(baht(1234567.0), "฿1,234,567");
        assert_eq!(baht(1234.5), "฿1,234.5");
        assert_eq!(baht(0.1234), "฿0.123");
        assert_eq!(baht(-2500.0), "฿-2,500");
    }

    #[test]
    fn test_transaction_card() {
        let m = TransactionCard {
            tx_type: TxType::Expense,
            amount: 3500.0,
            description: "",
            property_name: "บ้านรามคำแหง",
        }
        .render();
        let Message::Flex { alt_text, contents } = m else {
            panic!("expected flex");
        };
        assert_eq!(alt_text, "📝 บันทึกรายจ่าย ฿3,500");
        let rows = &contents["body"]["contents"][2]["contents"];
        assert_eq!(rows[0]["contents"][1]["text"], "฿3,500");
        assert_eq!(rows[0]["contents"][1]["color"], RED);
        assert_eq!(rows[1]["contents"][1]["text"], "-");
        assert_eq!(rows[2]["contents"][1]["text"], "🏠 บ้านรามคำแหง");
    }

    #[test]
    fn test_summary_card_loss() {
        let summary = Summary {
            total_income: 100.0,
            total_expense: 350.0,
            profit: -250.0,
            count: 3,
            ..Default::default()
        };
        let Message::Flex { alt_text, contents } = SummaryCard {
            summary: &summary,
            property_name: Some("บ้านA"),
        }
        .render() else {
            panic!("expected flex");
        };
        assert_eq!(alt_text, "📊 สรุป: รับ ฿100 | จ่าย ฿350");
        let body = &contents["body"]["contents"];
        assert_eq!(body[0]["text"], "📊 สรุป: บ้านA");
        let profit_row = &body[2]["contents"][3]["contents"];
        assert_eq!(profit_row[0]["text"], "⚠️ ขาดทุน");
        assert_eq!(profit_row[1]["text"], "฿250");
        assert_eq!(body[3]["text"], "📋 ทั้งหมด 3 รายการ");
    }

    #[test]
    fn test_property_list() {
        assert!(text_of(PropertyList { rows: &[] }.render())
            .starts_with("📋 ยังไม่มีทรัพย์สิน"));

        let rows = vec![(
            Property::new("บ้านA"),
            Summary {
                total_income: 50000.0,
                total_expense: 3500.0,
                profit: 46500.0,
                ..Default::default()
            },
        )];
        assert_eq!(
            text_of(PropertyList { rows: &rows }.render()),
            "🏠 ทรัพย์สินทั้งหมด:\n\n• บ้านA\n  รับ: ฿50,000 | จ่าย: ฿3,500\n  ✅ กำไร: ฿46,500"
        );
    }

    #[test]
    fn test_which_property() {
        let props = vec![Property::new("บ้านA"), Property::new("บ้านB")];
        let text = text_of(
            WhichProperty {
                tx_type: TxType::Income,
                amount: 2500.5,
                description: "ค่าเช่า",
                properties: &props,
            }
            .render(),
        );
        assert!(text.contains("รับ 2500.5 ค่าเช่า บ้านXXX"));
        assert!(text.ends_with("• บ้านA\n• บ้านB"));
    }
}
