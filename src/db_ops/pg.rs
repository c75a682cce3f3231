use super::Store;
use crate::models::{
    NewTransaction, PendingImage, Property, Transaction, PENDING_WAITING,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    query, query_as, FromRow,
};
use tracing::info;
use uuid::Uuid;

pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let db = PgPoolOptions::new()
            // hosted plans cap connections well below the Postgres default
            .max_connections(10)
            .connect(url)
            .await
            .context("connecting to postgres")?;
        sqlx::migrate!()
            .run(&db)
            .await
            .context("running migrations")?;
        info!("postgres store ready");

        Ok(PgStore { db })
    }
}

#[derive(FromRow)]
struct PropertyRow {
    id: Uuid,
    name: String,
    status: String,
    address: Option<String>,
    #[sqlx(rename = "type")]
    kind: Option<String>,
    buy_price: Option<f64>,
    sell_price: Option<f64>,
    buy_date: Option<NaiveDate>,
    sell_date: Option<NaiveDate>,
    budget: Option<f64>,
    notes: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PropertyRow> for Property {
    type Error = anyhow::Error;
    fn try_from(row: PropertyRow) -> Result<Self> {
        Ok(Property {
            id: row.id,
            name: row.name,
            status: row.status.parse()?,
            address: row.address,
            kind: row.kind,
            buy_price: row.buy_price,
            sell_price: row.sell_price,
            buy_date: row.buy_date,
            sell_date: row.sell_date,
            budget: row.budget,
            notes: row.notes,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: Uuid,
    property_id: Uuid,
    #[sqlx(rename = "type")]
    tx_type: String,
    category: String,
    amount: f64,
    description: String,
    date: NaiveDate,
    recorded_by: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    property_name: Option<String>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = anyhow::Error;
    fn try_from(row: TransactionRow) -> Result<Self> {
        Ok(Transaction {
            id: row.id,
            property_id: row.property_id,
            tx_type: row.tx_type.parse()?,
            category: row.category,
            amount: row.amount,
            description: row.description,
            date: row.date,
            recorded_by: row.recorded_by,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            property_name: row.property_name,
        })
    }
}

#[derive(FromRow)]
struct PendingRow {
    user_id: String,
    image_url: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<PendingRow> for PendingImage {
    fn from(row: PendingRow) -> Self {
        PendingImage {
            user_id: row.user_id,
            image_url: row.image_url,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

const PROPERTY_COLUMNS: &str = "id, name, status, address, type, buy_price,
    sell_price, buy_date, sell_date, budget, notes, image, created_at,
    updated_at";

#[async_trait]
impl Store for PgStore {
    async fn list_properties(&self) -> Result<Vec<Property>> {
        let rows = query_as::<_, PropertyRow>(&format!(
            "select {PROPERTY_COLUMNS} from properties
            order by created_at desc"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Property::try_from).collect()
    }

    async fn find_property_by_name(&self, name: &str) -> Result<Option<Property>> {
        // strpos rather than ilike so `%` and `_` in chat text stay literal
        let row = query_as::<_, PropertyRow>(&format!(
            "select {PROPERTY_COLUMNS} from properties
            where strpos(lower(name), lower($1)) > 0
            order by created_at desc
            limit 1"
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await?;

        row.map(Property::try_from).transpose()
    }

    async fn add_property(&self, name: &str) -> Result<Property> {
        let property = Property::new(name);
        query(
            "insert into properties (id, name, status, created_at, updated_at)
            values ($1, $2, $3, $4, $5)",
        )
        .bind(property.id)
        .bind(&property.name)
        .bind(property.status.as_str())
        .bind(property.created_at)
        .bind(property.updated_at)
        .execute(&self.db)
        .await?;

        Ok(property)
    }

    async fn add_transaction(&self, tx: NewTransaction) -> Result<Transaction> {
        let row = query_as::<_, TransactionRow>(
            "with ins as (
                insert into transactions
                    (id, property_id, type, category, amount, description,
                    date, recorded_by, image_url)
                values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                returning *
            )
            select ins.id, ins.property_id, ins.type, ins.category,
                ins.amount, ins.description, ins.date, ins.recorded_by,
                ins.image_url, ins.created_at, ins.updated_at,
                p.name as property_name
            from ins
            left join properties p on p.id = ins.property_id",
        )
        .bind(Uuid::new_v4())
        .bind(tx.property_id)
        .bind(tx.tx_type.as_str())
        .bind(&tx.category)
        .bind(tx.amount)
        .bind(&tx.description)
        .bind(tx.date)
        .bind(&tx.recorded_by)
        .bind(&tx.image_url)
        .fetch_one(&self.db)
        .await?;

        row.try_into()
    }

    async fn list_transactions(
        &self,
        property_id: Option<Uuid>,
    ) -> Result<Vec<Transaction>> {
        let rows = query_as::<_, TransactionRow>(
            "select t.id, t.property_id, t.type, t.category, t.amount,
                t.description, t.date, t.recorded_by, t.image_url,
                t.created_at, t.updated_at, p.name as property_name
            from transactions t
            left join properties p on p.id = t.property_id
            where $1::uuid is null or t.property_id = $1
            order by t.created_at desc",
        )
        .bind(property_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn save_pending_image(
        &self,
        user_id: &str,
        image_url: &str,
    ) -> Result<PendingImage> {
        let row = query_as::<_, PendingRow>(
            "insert into pending_images (user_id, image_url, status, created_at)
            values ($1, $2, $3, now())
            on conflict (user_id)
            do update set
                image_url = excluded.image_url,
                status = excluded.status,
                created_at = excluded.created_at
            returning user_id, image_url, status, created_at",
        )
        .bind(user_id)
        .bind(image_url)
        .bind(PENDING_WAITING)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    async fn get_pending_image(&self, user_id: &str) -> Result<Option<PendingImage>> {
        let row = query_as::<_, PendingRow>(
            "select user_id, image_url, status, created_at
            from pending_images
            where user_id = $1 and status = $2",
        )
        .bind(user_id)
        .bind(PENDING_WAITING)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(PendingImage::from))
    }

    async fn clear_pending_image(&self, user_id: &str) -> Result<()> {
        query("delete from pending_images where user_id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}
