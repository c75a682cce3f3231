use super::Store;
use crate::models::{
    NewTransaction, PendingImage, Property, Transaction, PENDING_WAITING,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};
use uuid::Uuid;

/// Keeps everything in process memory, in insertion order. Good for local
/// runs (`STORE=memory`) and tests.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    properties: Vec<Property>,
    transactions: Vec<Transaction>,
    pending: HashMap<String, PendingImage>,
}

impl MemStore {
    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("memory store lock is poisoned"))
    }
}

#[async_trait]
impl Store for MemStore {
    async fn list_properties(&self) -> Result<Vec<Property>> {
        Ok(self.lock()?.properties.iter().rev().cloned().collect())
    }

    async fn find_property_by_name(&self, name: &str) -> Result<Option<Property>> {
        let needle = name.to_lowercase();
        Ok(self
            .lock()?
            .properties
            .iter()
            .rev()
            .find(|p| p.name.to_lowercase().contains(&needle))
            .cloned())
    }

    async fn add_property(&self, name: &str) -> Result<Property> {
        let property = Property::new(name);
        self.lock()?.properties.push(property.clone());
        Ok(property)
    }

    async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
        let mut inner = self.lock()?;
        let property_name = inner
            .properties
            .iter()
            .find(|p| p.id == tx.property_id)
            .map(|p| p.name.clone());
        let tx = tx.into_transaction(property_name);
        inner.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn list_transactions(
        &self,
        property_id: Option<Uuid>,
    ) -> Result<Vec<Transaction>> {
        let inner = self.lock()?;
        Ok(inner
            .transactions
            .iter()
            .rev()
            .filter(|t| property_id.map_or(true, |id| t.property_id == id))
            .map(|t| {
                let mut t = t.clone();
                t.property_name = inner
                    .properties
                    .iter()
                    .find(|p| p.id == t.property_id)
                    .map(|p| p.name.clone());
                t
            })
            .collect())
    }

    async fn save_pending_image(
        &self,
        user_id: &str,
        image_url: &str,
    ) -> Result<PendingImage> {
        let pending = PendingImage {
            user_id: user_id.to_string(),
            image_url: image_url.to_string(),
            status: PENDING_WAITING.to_string(),
            created_at: Utc::now(),
        };
        self.lock()?
            .pending
            .insert(user_id.to_string(), pending.clone());
        Ok(pending)
    }

    async fn get_pending_image(&self, user_id: &str) -> Result<Option<PendingImage>> {
        Ok(self
            .lock()?
            .pending
            .get(user_id)
            .filter(|p| p.status == PENDING_WAITING)
            .cloned())
    }

    async fn clear_pending_image(&self, user_id: &str) -> Result<()> {
        self.lock()?.pending.remove(user_id);
        Ok(())
    }
}
