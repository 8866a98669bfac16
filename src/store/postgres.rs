use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Row as _, Transaction};

use crate::model::{EntityKind, Id, Row};
use crate::store::traits::{EntityStore, StoreTransaction};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        log::info!("Database migrations applied");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl EntityStore for PostgresStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// Wraps a sqlx transaction; sqlx rolls back on drop if it was never committed
struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

fn row_from_record(record: sqlx::postgres::PgRow) -> Result<Row> {
    let id: String = record.try_get("id").context("Missing id column")?;
    let attributes: Value = record
        .try_get("attributes")
        .context("Missing attributes column")?;
    let Value::Object(map) = attributes else {
        return Err(anyhow!("Attributes of '{}' are not a JSON object", id));
    };
    Ok(Row {
        id,
        attributes: map.into_iter().collect(),
    })
}

#[async_trait::async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn fetch_row(&mut self, kind: EntityKind, id: &Id) -> Result<Option<Row>> {
        let record = sqlx::query("SELECT id, attributes FROM entities WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .with_context(|| format!("Failed to fetch {} '{}'", kind, id))?;

        record.map(row_from_record).transpose()
    }

    async fn fetch_rows(&mut self, kind: EntityKind, column: &str, value: &Id) -> Result<Vec<Row>> {
        let records = sqlx::query(
            r#"
            SELECT id, attributes
            FROM entities
            WHERE kind = $1 AND attributes ->> $2 = $3
            ORDER BY seq
            "#,
        )
        .bind(kind.as_str())
        .bind(column)
        .bind(value)
        .fetch_all(&mut *self.tx)
        .await
        .with_context(|| format!("Failed to list {} by {}", kind, column))?;

        records.into_iter().map(row_from_record).collect()
    }

    async fn insert_row(&mut self, kind: EntityKind, row: Row) -> Result<Id> {
        let attributes = Value::Object(row.attributes.into_iter().collect());
        let record = sqlx::query(
            r#"
            INSERT INTO entities (id, kind, attributes)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&row.id)
        .bind(kind.as_str())
        .bind(attributes)
        .fetch_one(&mut *self.tx)
        .await
        .with_context(|| format!("Failed to insert {} '{}'", kind, row.id))?;

        let id: String = record.try_get("id")?;
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.context("Failed to commit transaction")
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")
    }
}
