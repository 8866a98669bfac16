use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::logic::access::AccessGuard;
use crate::logic::clone_result::CloneResult;
use crate::logic::descriptor::{ChildDescriptor, RootDescriptor, SchemaDescriptor};
use crate::logic::identity_map::IdentityMap;
use crate::logic::inherit;
use crate::logic::validate::{ValidationErrors, Validator};
use crate::model::{row::is_set_value, EntityKind, Id, IdGenerator, Row};
use crate::store::{EntityStore, StoreTransaction};

#[derive(Debug, Error)]
pub enum CloneError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: Id },

    #[error("{0}")]
    ValidationFailed(ValidationErrors),

    #[error("Cannot write into {kind} '{id}'")]
    ParentNotAccessible { kind: EntityKind, id: Id },

    #[error("{kind} '{id}' references {column} '{referenced}' which has not been cloned")]
    DependencyOrderViolation {
        kind: EntityKind,
        column: String,
        referenced: String,
        id: Id,
    },

    #[error("Store failure: {0:#}")]
    StoreFailure(#[from] anyhow::Error),

    #[error("{kind} cannot be cloned")]
    NotCloneable { kind: EntityKind },
}

impl CloneError {
    /// Transient failures a caller may simply try again
    pub fn is_retryable(&self) -> bool {
        matches!(self, CloneError::StoreFailure(_))
    }

    /// Failures caused by the request rather than the system
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            CloneError::NotFound { .. }
                | CloneError::ValidationFailed(_)
                | CloneError::ParentNotAccessible { .. }
                | CloneError::NotCloneable { .. }
        )
    }

    /// Message safe to hand back to a caller; system faults stay opaque
    pub fn public_message(&self) -> String {
        match self {
            CloneError::StoreFailure(_) => "Content store unavailable, try again later".to_string(),
            CloneError::DependencyOrderViolation { .. } => "Internal error while cloning".to_string(),
            other => other.to_string(),
        }
    }
}

/// Where a clone got to before it committed or gave up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStage {
    NotStarted,
    SourceLoaded,
    MergedAndValidated,
    TopInserted,
    ChildKindInserted(EntityKind),
    Committed,
    Aborted,
}

impl CloneStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CloneStage::Committed | CloneStage::Aborted)
    }
}

impl fmt::Display for CloneStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneStage::NotStarted => f.write_str("not started"),
            CloneStage::SourceLoaded => f.write_str("source loaded"),
            CloneStage::MergedAndValidated => f.write_str("merged and validated"),
            CloneStage::TopInserted => f.write_str("top inserted"),
            CloneStage::ChildKindInserted(kind) => write!(f, "{} inserted", kind),
            CloneStage::Committed => f.write_str("committed"),
            CloneStage::Aborted => f.write_str("aborted"),
        }
    }
}

/// Stage tracker for one clone; every transition is logged
struct Progress<'a> {
    kind: EntityKind,
    source_id: &'a str,
    stage: CloneStage,
}

impl<'a> Progress<'a> {
    fn new(kind: EntityKind, source_id: &'a str) -> Self {
        Self {
            kind,
            source_id,
            stage: CloneStage::NotStarted,
        }
    }

    fn advance(&mut self, next: CloneStage) {
        log::debug!(
            "Clone of {} '{}': {} -> {}",
            self.kind,
            self.source_id,
            self.stage,
            next
        );
        self.stage = next;
    }

    fn abort(&mut self, err: &CloneError) {
        if err.is_user_correctable() {
            log::warn!(
                "Clone of {} '{}' aborted after {}: {}",
                self.kind,
                self.source_id,
                self.stage,
                err
            );
        } else {
            log::error!(
                "Clone of {} '{}' aborted after {}: {}",
                self.kind,
                self.source_id,
                self.stage,
                err
            );
        }
        self.stage = CloneStage::Aborted;
    }
}

/// Deep-copies a composition root and every row beneath it in one transaction.
///
/// Children are cloned kind by kind in the descriptor's dependency order, so a
/// local foreign key always finds its target in the identity map. Any failure
/// rolls the whole operation back.
pub struct CloneOrchestrator<'a> {
    descriptor: &'a SchemaDescriptor,
    ids: &'a dyn IdGenerator,
    validator: &'a dyn Validator,
    guard: &'a dyn AccessGuard,
}

impl<'a> CloneOrchestrator<'a> {
    pub fn new(
        descriptor: &'a SchemaDescriptor,
        ids: &'a dyn IdGenerator,
        validator: &'a dyn Validator,
        guard: &'a dyn AccessGuard,
    ) -> Self {
        Self {
            descriptor,
            ids,
            validator,
            guard,
        }
    }

    pub async fn clone_root(
        &self,
        store: &dyn EntityStore,
        root_kind: EntityKind,
        source_id: &Id,
        partial: Row,
    ) -> Result<CloneResult, CloneError> {
        let root = self
            .descriptor
            .root(root_kind)
            .ok_or(CloneError::NotCloneable { kind: root_kind })?;

        let mut progress = Progress::new(root_kind, source_id);
        let mut tx = store.begin().await?;

        let outcome = self
            .run(tx.as_mut(), root, source_id, partial, &mut progress)
            .await;

        match outcome {
            Ok(result) => {
                if let Err(e) = tx.commit().await {
                    let err = CloneError::StoreFailure(e);
                    progress.abort(&err);
                    return Err(err);
                }
                progress.advance(CloneStage::Committed);
                log::info!(
                    "Cloned {} '{}' as '{}' with {} child rows",
                    root_kind,
                    source_id,
                    result.top().row.id,
                    result.child_clones().len()
                );
                Ok(result)
            }
            Err(err) => {
                progress.abort(&err);
                if let Err(e) = tx.rollback().await {
                    log::error!("Rollback of {} clone failed: {:#}", root_kind, e);
                }
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        tx: &mut dyn StoreTransaction,
        root: &RootDescriptor,
        source_id: &Id,
        partial: Row,
        progress: &mut Progress<'_>,
    ) -> Result<CloneResult, CloneError> {
        let not_found = || CloneError::NotFound {
            kind: root.kind,
            id: source_id.clone(),
        };

        let source = tx.fetch_row(root.kind, source_id).await?.ok_or_else(not_found)?;
        if !self.guard.can_read(tx, root.kind, source_id).await? {
            return Err(not_found());
        }
        progress.advance(CloneStage::SourceLoaded);

        let overrides: Vec<String> = inherit::overridden(&partial)
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut top = inherit::merge(root, &source, partial);
        self.validator
            .validate(root.kind, &top)
            .map_err(CloneError::ValidationFailed)?;
        log::debug!("Clone of {} '{}' overrides {:?}", root.kind, source_id, overrides);
        progress.advance(CloneStage::MergedAndValidated);

        self.check_container(tx, root, &top).await?;

        top.id = self.ids.new_id();
        let top_id = tx.insert_row(root.kind, top.clone()).await?;
        top.id = top_id.clone();

        let mut identities = IdentityMap::new();
        identities.record(root.kind, source_id.clone(), top_id.clone());
        let mut result = CloneResult::new(root.kind, top);
        progress.advance(CloneStage::TopInserted);

        for child in self.descriptor.children_in_order(root.kind) {
            let rows = tx.fetch_rows(child.kind, &child.root_fk, source_id).await?;
            for source_row in rows {
                let row = self.clone_child(child, &source_row, &top_id, &identities)?;
                let new_id = tx.insert_row(child.kind, row.clone()).await?;
                identities.record(child.kind, source_row.id, new_id);
                result.push_child(child.kind, row);
            }
            progress.advance(CloneStage::ChildKindInserted(child.kind));
        }

        log::debug!(
            "Clone of {} '{}' mapped {} identities",
            root.kind,
            source_id,
            identities.count()
        );
        Ok(result)
    }

    async fn check_container(
        &self,
        tx: &mut dyn StoreTransaction,
        root: &RootDescriptor,
        top: &Row,
    ) -> Result<(), CloneError> {
        let container_id: Id = top
            .get_str(&root.container_column)
            .unwrap_or_default()
            .to_string();
        let inaccessible = || CloneError::ParentNotAccessible {
            kind: root.container_kind,
            id: container_id.clone(),
        };

        if tx.fetch_row(root.container_kind, &container_id).await?.is_none() {
            return Err(inaccessible());
        }
        if !self
            .guard
            .can_write_into(tx, root.container_kind, &container_id)
            .await?
        {
            return Err(inaccessible());
        }
        Ok(())
    }

    /// Fresh row for one source child: every attribute copied, every FK rewritten
    fn clone_child(
        &self,
        child: &ChildDescriptor,
        source: &Row,
        top_id: &Id,
        identities: &IdentityMap,
    ) -> Result<Row, CloneError> {
        let mut row = Row::new(self.ids.new_id());
        row.attributes = source.attributes.clone();
        row.set(&child.root_fk, top_id.as_str());

        for fk in &child.local_fks {
            let Some(value) = source.get(&fk.column) else {
                continue;
            };
            if !is_set_value(value) {
                continue;
            }
            let mapped = value
                .as_str()
                .and_then(|old| identities.resolve(fk.references, old));
            match mapped {
                Some(new_id) => row.set(&fk.column, new_id.as_str()),
                None => {
                    return Err(CloneError::DependencyOrderViolation {
                        kind: child.kind,
                        column: fk.column.clone(),
                        referenced: match value {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        },
                        id: source.id.clone(),
                    });
                }
            }
        }

        Ok(row)
    }
}
