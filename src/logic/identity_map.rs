use std::collections::HashMap;

use crate::model::{EntityKind, Id};

/// Old id -> new id, per kind, for one clone operation
#[derive(Debug, Default)]
pub struct IdentityMap {
    by_kind: HashMap<EntityKind, HashMap<Id, Id>>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: EntityKind, old_id: Id, new_id: Id) {
        self.by_kind.entry(kind).or_default().insert(old_id, new_id);
    }

    pub fn resolve(&self, kind: EntityKind, old_id: &str) -> Option<&Id> {
        self.by_kind.get(&kind).and_then(|ids| ids.get(old_id))
    }

    pub fn count(&self) -> usize {
        self.by_kind.values().map(HashMap::len).sum()
    }
}
