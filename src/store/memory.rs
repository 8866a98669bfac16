use anyhow::{anyhow, Result};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Entity, EntityKind, Id, Row};
use crate::store::traits::{EntityStore, StoreTransaction};

/// Committed rows, per kind, in insertion order
#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<EntityKind, Vec<Row>>,
}

impl Tables {
    fn find(&self, kind: EntityKind, id: &str) -> Option<&Row> {
        self.rows
            .get(&kind)
            .and_then(|rows| rows.iter().find(|row| row.id == id))
    }
}

/// Injected failure: inserts of `kind` fail once `after` of them succeeded in a transaction
#[derive(Debug, Clone, Copy)]
struct InsertFault {
    kind: EntityKind,
    after: usize,
}

/// In-process store used for development and tests.
///
/// Each transaction stages its inserts privately and only publishes them on
/// commit, so a dropped or rolled-back transaction leaves no trace.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Mutex<Vec<InsertFault>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the insert following the first `after` inserts of `kind` in any transaction fail
    pub fn fail_inserts_of(&self, kind: EntityKind, after: usize) {
        self.faults.lock().push(InsertFault { kind, after });
    }

    pub fn clear_faults(&self) {
        self.faults.lock().clear();
    }

    /// Insert and commit a typed record directly
    pub fn insert<E: Entity>(&self, entity: &E) -> Result<Id> {
        let row = entity.to_row()?;
        let mut tables = self.tables.write();
        if tables.find(E::KIND, &row.id).is_some() {
            return Err(anyhow!("Duplicate {} id '{}'", E::KIND, row.id));
        }
        let id = row.id.clone();
        tables.rows.entry(E::KIND).or_default().push(row);
        Ok(id)
    }

    pub fn get(&self, kind: EntityKind, id: &str) -> Option<Row> {
        self.tables.read().find(kind, id).cloned()
    }

    pub fn rows(&self, kind: EntityKind) -> Vec<Row> {
        self.tables.read().rows.get(&kind).cloned().unwrap_or_default()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.tables.read().rows.get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// Row counts for every kind that has rows
    pub fn counts(&self) -> HashMap<EntityKind, usize> {
        self.tables
            .read()
            .rows
            .iter()
            .map(|(kind, rows)| (*kind, rows.len()))
            .collect()
    }

    /// Overwrite one attribute of a committed row
    pub fn update_attribute(&self, kind: EntityKind, id: &str, name: &str, value: Value) -> Result<()> {
        let mut tables = self.tables.write();
        let row = tables
            .rows
            .get_mut(&kind)
            .and_then(|rows| rows.iter_mut().find(|row| row.id == id))
            .ok_or_else(|| anyhow!("{} '{}' not found", kind, id))?;
        row.set(name, value);
        Ok(())
    }
}

#[async_trait::async_trait]
impl EntityStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            faults: self.faults.lock().clone(),
            staged: Vec::new(),
            inserted: HashMap::new(),
        }))
    }
}

struct MemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    faults: Vec<InsertFault>,
    staged: Vec<(EntityKind, Row)>,
    inserted: HashMap<EntityKind, usize>,
}

impl MemoryTransaction {
    fn staged_find(&self, kind: EntityKind, id: &str) -> Option<&Row> {
        self.staged
            .iter()
            .find(|(k, row)| *k == kind && row.id == id)
            .map(|(_, row)| row)
    }
}

#[async_trait::async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn fetch_row(&mut self, kind: EntityKind, id: &Id) -> Result<Option<Row>> {
        if let Some(row) = self.staged_find(kind, id) {
            return Ok(Some(row.clone()));
        }
        Ok(self.tables.read().find(kind, id).cloned())
    }

    async fn fetch_rows(&mut self, kind: EntityKind, column: &str, value: &Id) -> Result<Vec<Row>> {
        let matches = |row: &Row| row.get_str(column) == Some(value.as_str());

        let mut rows: Vec<Row> = self
            .tables
            .read()
            .rows
            .get(&kind)
            .map(|rows| rows.iter().filter(|row| matches(row)).cloned().collect())
            .unwrap_or_default();

        rows.extend(
            self.staged
                .iter()
                .filter(|(k, row)| *k == kind && matches(row))
                .map(|(_, row)| row.clone()),
        );
        Ok(rows)
    }

    async fn insert_row(&mut self, kind: EntityKind, row: Row) -> Result<Id> {
        if row.id.is_empty() {
            return Err(anyhow!("Cannot insert {} without an id", kind));
        }
        if self.staged_find(kind, &row.id).is_some() || self.tables.read().find(kind, &row.id).is_some() {
            return Err(anyhow!("Duplicate {} id '{}'", kind, row.id));
        }

        let done = self.inserted.entry(kind).or_insert(0);
        if self.faults.iter().any(|f| f.kind == kind && f.after == *done) {
            return Err(anyhow!("Injected insert failure for {}", kind));
        }
        *done += 1;

        let id = row.id.clone();
        self.staged.push((kind, row));
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        let mut tables = this.tables.write();
        for (kind, row) in this.staged {
            tables.rows.entry(kind).or_default().push(row);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        // staged rows are simply dropped
        Ok(())
    }
}
