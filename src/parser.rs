//! Turns one chat message into an [Intent].
//!
//! Recognized shapes:
//!
//! - `จ่าย 3500 ค่าปูน บ้านรามคำแหง` (keyword, amount, description, property)
//! - `จ่าย3500ค่าปูน` (no spaces needed after the keyword)
//! - `จ่าย 3,500 ค่าปูน` (digit-grouping commas are dropped)
//! - `-3500 ค่าปูน บ้านรามคำแหง` / `+50000 ค่ามัดจำ บ้านลาดพร้าว` (sign picks
//!   expense or income)
//! - `3500 ค่าปูน` (bare amount, expense unless an income keyword follows)
//!
//! plus the bot commands (help, summary, property list, add property).

use super::models::TxType;
use regex::Regex;
use std::sync::OnceLock;

const HELP_WORDS: &[&str] =
    &["ช่วยเหลือ", "help", "วิธีใช้", "คำสั่ง", "?", "เมนู", "menu"];
const SUMMARY_PREFIX: &str = "สรุป";
const PROPERTY_LIST_WORDS: &[&str] =
    &["ทรัพย์สิน", "ทรัพย์", "property", "ดูบ้าน", "บ้านทั้งหมด"];

const EXPENSE_KEYWORDS: &[&str] =
    &["จ่าย", "จ่า", "ซื้อ", "ค่า", "หัก", "out", "pay", "expense"];
const INCOME_KEYWORDS: &[&str] =
    &["รับ", "ได้", "เข้า", "ขาย", "in", "income", "receive"];

/// Locative nouns that introduce a property name. Checked in this order;
/// the first one found wins even if another appears earlier in the text.
const PROPERTY_PREFIXES: &[&str] =
    &["บ้าน", "ที่ดิน", "คอนโด", "ตึก", "ห้อง", "โครงการ"];

pub const DEFAULT_CATEGORY: &str = "อื่นๆ";

const CATEGORY_TABLE: &[(&str, &[&str])] = &[
    (
        "วัสดุ",
        &[
            "ปูน", "อิฐ", "ทราย", "เหล็ก", "ไม้", "สี", "กระเบื้อง", "วัสดุ",
            "อุปกรณ์", "ท่อ", "สาย",
        ],
    ),
    (
        "ค่าแรง",
        &["แรง", "ช่าง", "คนงาน", "ผู้รับเหมา", "ค่าจ้าง", "เงินเดือน"],
    ),
    ("ค่าโอน", &["โอน", "ธรรมเนียม", "จดทะเบียน", "นิติกรรม"]),
    ("ค่าน้ำ/ไฟ", &["น้ำ", "ไฟ", "ประปา", "ไฟฟ้า"]),
    ("ค่านายหน้า", &["นายหน้า", "คอมมิชชั่น", "commission"]),
    ("ภาษี", &["ภาษี", "tax", "สรรพากร"]),
    (
        "ค่าซื้อทรัพย์",
        &["ซื้อบ้าน", "ซื้อที่ดิน", "ค่าบ้าน", "ค่าที่ดิน", "มัดจำ"],
    ),
    ("ขายทรัพย์", &["ขาย", "ขายบ้าน", "ขายที่ดิน"]),
    ("ค่าเช่า", &["เช่า", "ค่าเช่า", "rental"]),
];

#[derive(Clone, Debug, PartialEq)]
pub enum Intent {
    Command(Command),
    Transaction(ParsedTransaction),
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    /// `None` summarizes every property
    Summary { property_name: Option<String> },
    Properties,
    AddProperty { property_name: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParsedTransaction {
    pub tx_type: TxType,
    pub amount: f64,
    pub description: String,
    pub property_name: Option<String>,
    pub category: String,
}

struct Patterns {
    summary_prefix: Regex,
    add_property: Regex,
    digit_comma: Regex,
    signed: Regex,
    expense: Regex,
    income: Regex,
    number_first: Regex,
    property: Vec<Regex>,
}

fn keyword_pattern(keywords: &[&str]) -> String {
    let alternatives = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    format!(r"(?i)^({alternatives})\s*([0-9]+(?:\.[0-9]+)?)\s*(.*)")
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        summary_prefix: Regex::new(r"^สรุป\s*").expect("valid regex"),
        add_property: Regex::new(
            r"^(?:เพิ่มทรัพย์สิน|เพิ่มทรัพย์|เพิ่มบ้าน|สร้างทรัพย์|สร้างบ้าน)\s+(.+)",
        )
        .expect("valid regex"),
        digit_comma: Regex::new(r"([0-9]),([0-9])").expect("valid regex"),
        signed: Regex::new(r"^([+-])\s*([0-9]+(?:\.[0-9]+)?)\s*(.*)")
            .expect("valid regex"),
        expense: Regex::new(&keyword_pattern(EXPENSE_KEYWORDS))
            .expect("valid regex"),
        income: Regex::new(&keyword_pattern(INCOME_KEYWORDS))
            .expect("valid regex"),
        number_first: Regex::new(r"^([0-9]+(?:\.[0-9]+)?)\s+(.+)")
            .expect("valid regex"),
        property: PROPERTY_PREFIXES
            .iter()
            .map(|p| {
                Regex::new(&format!(r"\s+({}\S+)", regex::escape(p)))
                    .expect("valid regex")
            })
            .collect(),
    })
}

/// Classify one message. Pure: the same text always gives the same intent.
pub fn parse_message(text: &str) -> Intent {
    let text = text.trim();
    let lower = text.to_lowercase();
    let pats = patterns();

    if HELP_WORDS.contains(&lower.as_str()) {
        return Intent::Command(Command::Help);
    }

    if lower.starts_with(SUMMARY_PREFIX) {
        let rest = pats.summary_prefix.replace(text, "");
        let rest = rest.trim();
        return Intent::Command(Command::Summary {
            property_name: (!rest.is_empty()).then(|| rest.to_string()),
        });
    }

    if PROPERTY_LIST_WORDS.contains(&lower.as_str()) {
        return Intent::Command(Command::Properties);
    }

    if let Some(caps) = pats.add_property.captures(text) {
        return Intent::Command(Command::AddProperty {
            property_name: caps[1].trim().to_string(),
        });
    }

    parse_transaction(text)
}

fn parse_transaction(text: &str) -> Intent {
    let pats = patterns();
    let text = pats.digit_comma.replace_all(text, "$1$2");

    if let Some(caps) = pats.signed.captures(&text) {
        let tx_type = if &caps[1] == "+" {
            TxType::Income
        } else {
            TxType::Expense
        };
        return build(tx_type, &caps[2], &caps[3]);
    }

    if let Some(caps) = pats.expense.captures(&text) {
        return build(TxType::Expense, &caps[2], &caps[3]);
    }

    if let Some(caps) = pats.income.captures(&text) {
        return build(TxType::Income, &caps[2], &caps[3]);
    }

    if let Some(caps) = pats.number_first.captures(&text) {
        let rest = caps[2].trim();
        let rest_lower = rest.to_lowercase();
        let tx_type = if INCOME_KEYWORDS.iter().any(|k| rest_lower.starts_with(k))
        {
            TxType::Income
        } else {
            TxType::Expense
        };
        return build(tx_type, &caps[1], rest);
    }

    Intent::Unknown
}

fn build(tx_type: TxType, amount: &str, rest: &str) -> Intent {
    // ASCII digits with an optional fraction always parse
    let amount: f64 = amount.parse().expect("amount capture is a decimal number");
    let (description, property_name) = split_description(rest.trim());
    let category = detect_category(&description).to_string();

    Intent::Transaction(ParsedTransaction {
        tx_type,
        amount,
        description,
        property_name,
        category,
    })
}

/// Pull a property name (`บ้าน...`, `คอนโด...`, ...) out of the free text.
/// The name must follow whitespace, so it is never the first word.
fn split_description(text: &str) -> (String, Option<String>) {
    if text.is_empty() {
        return (String::new(), None);
    }
    for pattern in &patterns().property {
        if let Some(caps) = pattern.captures(text) {
            let whole = caps.get(0).expect("group 0 always exists");
            let mut description = String::with_capacity(text.len());
            description.push_str(&text[..whole.start()]);
            description.push_str(&text[whole.end()..]);
            return (
                description.trim().to_string(),
                Some(caps[1].trim().to_string()),
            );
        }
    }
    (text.to_string(), None)
}

/// First category whose keyword appears anywhere in the description.
pub fn detect_category(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    CATEGORY_TABLE
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(DEFAULT_CATEGORY)
}
