use super::{config::Config, db_ops::Store, line::LineApi};
use anyhow::{bail, Error};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub line: Arc<dyn LineApi>,
    pub config: Arc<Config>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Income,
    Expense,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
    /// User-facing (Thai) label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Income => "รายรับ",
            Self::Expense => "รายจ่าย",
        }
    }
}

impl FromStr for TxType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => bail!("{s} is not a transaction type"),
        }
    }
}

/// Where a property is in the buy / renovate / sell cycle. `Active` is what
/// the chat bot assigns to properties it creates on the fly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Active,
    Surveying,
    Purchased,
    Renovating,
    Listing,
    Sold,
    Cancelled,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Surveying => "surveying",
            Self::Purchased => "purchased",
            Self::Renovating => "renovating",
            Self::Listing => "listing",
            Self::Sold => "sold",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for PropertyStatus {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "active" => Self::Active,
            "surveying" => Self::Surveying,
            "purchased" => Self::Purchased,
            "renovating" => Self::Renovating,
            "listing" => Self::Listing,
            "sold" => Self::Sold,
            "cancelled" => Self::Cancelled,
            _ => bail!("{s} is not a property status"),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    pub status: PropertyStatus,
    pub address: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub buy_date: Option<NaiveDate>,
    pub sell_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub notes: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Property {
    /// A freshly named property, the way the bot creates them.
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Property {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: PropertyStatus::Active,
            address: None,
            kind: None,
            buy_price: None,
            sell_price: None,
            buy_date: None,
            sell_date: None,
            budget: None,
            notes: None,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub property_id: Uuid,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    pub category: String,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
    pub recorded_by: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Joined in from `properties.name` when listing
    pub property_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub property_id: Uuid,
    pub tx_type: TxType,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub image_url: Option<String>,
    pub recorded_by: String,
    pub date: NaiveDate,
}

impl NewTransaction {
    pub fn into_transaction(self, property_name: Option<String>) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            property_id: self.property_id,
            tx_type: self.tx_type,
            category: self.category,
            amount: self.amount,
            description: self.description,
            date: self.date,
            recorded_by: self.recorded_by,
            image_url: self.image_url,
            created_at: now,
            updated_at: now,
            property_name,
        }
    }
}

pub const PENDING_WAITING: &str = "waiting";

/// A receipt photo waiting for its amount. At most one per chat user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PendingImage {
    pub user_id: String,
    pub image_url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
