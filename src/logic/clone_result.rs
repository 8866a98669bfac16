use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{Entity, EntityKind, Row};

/// A row of a given kind, as written by a clone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindedRow {
    pub kind: EntityKind,
    pub row: Row,
}

/// Everything one clone wrote: the new top row and each child clone in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneResult {
    top: KindedRow,
    children: Vec<KindedRow>,
}

impl CloneResult {
    pub(crate) fn new(top_kind: EntityKind, top: Row) -> Self {
        Self {
            top: KindedRow {
                kind: top_kind,
                row: top,
            },
            children: Vec::new(),
        }
    }

    pub(crate) fn push_child(&mut self, kind: EntityKind, row: Row) {
        self.children.push(KindedRow { kind, row });
    }

    pub fn top(&self) -> &KindedRow {
        &self.top
    }

    pub fn child_clones(&self) -> &[KindedRow] {
        &self.children
    }

    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.children.iter().filter(|c| c.kind == kind).count()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Row> + '_ {
        self.children
            .iter()
            .filter(move |c| c.kind == kind)
            .map(|c| &c.row)
    }

    /// Child clones tallied per kind
    pub fn counts(&self) -> BTreeMap<EntityKind, usize> {
        self.children.iter().map(|c| c.kind).counts().into_iter().collect()
    }

    /// Decode the child clones of `T::KIND`
    pub fn typed<T: Entity>(&self) -> Result<Vec<T>> {
        self.of_kind(T::KIND).map(T::from_row).collect()
    }

    pub fn top_as<T: Entity>(&self) -> Result<T> {
        if self.top.kind != T::KIND {
            anyhow::bail!("Clone top is a {}, not a {}", self.top.kind, T::KIND);
        }
        T::from_row(&self.top.row).with_context(|| format!("Failed to decode cloned {}", T::KIND))
    }
}
