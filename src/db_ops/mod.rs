//! Persistence for properties, transactions, and pending receipt images.
//!
//! Everything goes through [Store] so the bot and the dashboard don't care
//! whether they're talking to Postgres or the in-memory store.

mod memory;
mod pg;

pub use memory::MemStore;
pub use pg::PgStore;

use super::{
    models::{NewTransaction, PendingImage, Property, Transaction},
    summary::{self, DashboardData, Summary},
};
use anyhow::Result;
use async_trait::async_trait;
use futures::join;
use uuid::Uuid;

#[async_trait]
pub trait Store: Send + Sync {
    /// Newest first
    async fn list_properties(&self) -> Result<Vec<Property>>;
    /// Case-insensitive substring match on the name; the newest match wins
    async fn find_property_by_name(&self, name: &str) -> Result<Option<Property>>;
    async fn add_property(&self, name: &str) -> Result<Property>;

    async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction>;
    /// Newest first, with `property_name` filled in
    async fn list_transactions(
        &self,
        property_id: Option<Uuid>,
    ) -> Result<Vec<Transaction>>;

    /// Replaces whatever the user had waiting before
    async fn save_pending_image(
        &self,
        user_id: &str,
        image_url: &str,
    ) -> Result<PendingImage>;
    /// Only returns images that are still waiting
    async fn get_pending_image(&self, user_id: &str) -> Result<Option<PendingImage>>;
    async fn clear_pending_image(&self, user_id: &str) -> Result<()>;
}

pub async fn get_summary(
    store: &dyn Store,
    property_id: Option<Uuid>,
) -> Result<Summary> {
    let transactions = store.list_transactions(property_id).await?;
    Ok(summary::summarize(&transactions))
}

pub async fn get_dashboard_data(store: &dyn Store) -> Result<DashboardData> {
    let (properties, transactions) =
        join!(store.list_properties(), store.list_transactions(None));

    Ok(summary::dashboard(properties?, transactions?))
}
