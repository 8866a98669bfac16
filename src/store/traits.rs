use crate::model::{EntityKind, Id, Row};
use anyhow::Result;

/// Backend that hands out transactions over typed-by-kind rows
#[async_trait::async_trait]
pub trait EntityStore: Send + Sync {
    /// Open a transaction. Dropping it without [`StoreTransaction::commit`] rolls it back.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;
}

/// Row operations scoped to one open transaction
#[async_trait::async_trait]
pub trait StoreTransaction: Send {
    /// Get a single row by id
    async fn fetch_row(&mut self, kind: EntityKind, id: &Id) -> Result<Option<Row>>;
    /// List rows of a kind whose `column` attribute equals `value`, in insertion order
    async fn fetch_rows(&mut self, kind: EntityKind, column: &str, value: &Id) -> Result<Vec<Row>>;
    /// Insert a row, returning the id it was stored under
    async fn insert_row(&mut self, kind: EntityKind, row: Row) -> Result<Id>;
    /// Make every write of this transaction visible
    async fn commit(self: Box<Self>) -> Result<()>;
    /// Discard every write of this transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}
