use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::logic::access::{AccessGuard, HubAccessGuard};
use crate::logic::clone_result::{CloneResult, KindedRow};
use crate::logic::cloner::{CloneError, CloneOrchestrator};
use crate::logic::descriptor::SchemaDescriptor;
use crate::logic::validate::{ContentValidator, Validator};
use crate::model::{EntityKind, HubAccess, Id, IdGenerator, Row, UuidGenerator};
use crate::store::EntityStore;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Clone(#[from] CloneError),

    #[error("User '{user_id}' may not {action}")]
    Forbidden { user_id: String, action: String },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: Id },

    #[error("{kind} has no child graph")]
    NotARoot { kind: EntityKind },

    #[error("Store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

/// A composition root with every row beneath it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityGraph {
    pub root: KindedRow,
    pub children: Vec<KindedRow>,
}

impl EntityGraph {
    pub fn count_of(&self, kind: EntityKind) -> usize {
        self.children.iter().filter(|c| c.kind == kind).count()
    }
}

/// Entry point for callers: role checks, access scoping and orchestrator wiring
pub struct HubService<S: EntityStore> {
    store: Arc<S>,
    descriptor: Arc<SchemaDescriptor>,
    ids: Arc<dyn IdGenerator>,
    validator: Arc<dyn Validator>,
}

impl<S: EntityStore> HubService<S> {
    pub fn new(store: Arc<S>, descriptor: SchemaDescriptor) -> Self {
        Self {
            store,
            descriptor: Arc::new(descriptor),
            ids: Arc::new(UuidGenerator),
            validator: Arc::new(ContentValidator),
        }
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Deep-copy the root `kind`/`source_id` with `partial` overriding its attributes
    pub async fn clone_root(
        &self,
        access: &HubAccess,
        kind: EntityKind,
        source_id: &Id,
        partial: Row,
    ) -> Result<CloneResult, ServiceError> {
        if !access.is_artist() {
            return Err(ServiceError::Forbidden {
                user_id: access.user_id.clone(),
                action: format!("clone {}", kind),
            });
        }

        let guard = HubAccessGuard::new(access.clone());
        let orchestrator = CloneOrchestrator::new(
            &self.descriptor,
            self.ids.as_ref(),
            self.validator.as_ref(),
            &guard,
        );
        Ok(orchestrator
            .clone_root(self.store.as_ref(), kind, source_id, partial)
            .await?)
    }

    pub async fn read_one(&self, access: &HubAccess, kind: EntityKind, id: &Id) -> Result<Row, ServiceError> {
        let guard = HubAccessGuard::new(access.clone());
        let mut tx = self.store.begin().await?;

        let found = tx.fetch_row(kind, id).await?;
        let visible = found.is_some() && guard.can_read(tx.as_mut(), kind, id).await?;
        let row = match found {
            Some(row) if visible => row,
            _ => {
                return Err(ServiceError::NotFound {
                    kind,
                    id: id.clone(),
                })
            }
        };
        tx.rollback().await?;
        Ok(row)
    }

    /// Read a root and all of its child rows, children in clone order
    pub async fn read_graph(
        &self,
        access: &HubAccess,
        kind: EntityKind,
        root_id: &Id,
    ) -> Result<EntityGraph, ServiceError> {
        if !self.descriptor.is_root(kind) {
            return Err(ServiceError::NotARoot { kind });
        }

        let guard = HubAccessGuard::new(access.clone());
        let mut tx = self.store.begin().await?;

        let found = tx.fetch_row(kind, root_id).await?;
        let visible = found.is_some() && guard.can_read(tx.as_mut(), kind, root_id).await?;
        let root = match found {
            Some(row) if visible => row,
            _ => {
                return Err(ServiceError::NotFound {
                    kind,
                    id: root_id.clone(),
                })
            }
        };

        let mut children = Vec::new();
        for child in self.descriptor.children_in_order(kind) {
            let rows = tx.fetch_rows(child.kind, &child.root_fk, root_id).await?;
            children.extend(rows.into_iter().map(|row| KindedRow {
                kind: child.kind,
                row,
            }));
        }
        tx.rollback().await?;

        Ok(EntityGraph {
            root: KindedRow { kind, row: root },
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SequenceIdGenerator, UserRole};
    use crate::store::InMemoryStore;

    async fn service() -> HubService<InMemoryStore> {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_row(EntityKind::Account, Row::new("acct1").with("name", "bump"))
            .await
            .unwrap();
        tx.insert_row(
            EntityKind::Library,
            Row::new("lib1").with("account_id", "acct1").with("name", "house"),
        )
        .await
        .unwrap();
        tx.insert_row(
            EntityKind::Instrument,
            Row::new("i1")
                .with("library_id", "lib1")
                .with("type", "Drum")
                .with("mode", "Event")
                .with("state", "Published")
                .with("name", "808"),
        )
        .await
        .unwrap();
        tx.insert_row(
            EntityKind::InstrumentMeme,
            Row::new("im1").with("instrument_id", "i1").with("name", "heavy"),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        HubService::new(Arc::new(store), SchemaDescriptor::standard().unwrap())
            .with_id_generator(SequenceIdGenerator::new("svc"))
    }

    fn user(roles: Vec<UserRole>) -> HubAccess {
        HubAccess::new("u1".to_string(), vec!["acct1".to_string()], roles)
    }

    #[tokio::test]
    async fn test_clone_requires_artist_role() {
        let service = service().await;
        let err = service
            .clone_root(
                &user(vec![UserRole::User]),
                EntityKind::Instrument,
                &"i1".to_string(),
                Row::partial(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden { .. }));
        assert_eq!(service.store().count(EntityKind::Instrument), 1);
    }

    #[tokio::test]
    async fn test_artist_clones_and_reads_graph() {
        let service = service().await;
        let artist = user(vec![UserRole::Artist]);

        let result = service
            .clone_root(
                &artist,
                EntityKind::Instrument,
                &"i1".to_string(),
                Row::partial().with("name", "909"),
            )
            .await
            .unwrap();
        assert_eq!(result.top().row.id, "svc-1");

        let graph = service
            .read_graph(&artist, EntityKind::Instrument, &"svc-1".to_string())
            .await
            .unwrap();
        assert_eq!(graph.root.row.get_str("name"), Some("909"));
        assert_eq!(graph.count_of(EntityKind::InstrumentMeme), 1);
    }

    struct NoDrafts;

    impl Validator for NoDrafts {
        fn validate(&self, kind: EntityKind, row: &Row) -> Result<(), crate::logic::ValidationErrors> {
            if row.get_str("state") != Some("Draft") {
                return Ok(());
            }
            Err(crate::logic::ValidationErrors {
                kind,
                errors: vec![crate::logic::ValidationError {
                    error_type: crate::logic::ValidationErrorType::InvalidValue,
                    attribute: "state".to_string(),
                    message: "drafts cannot be cloned".to_string(),
                }],
            })
        }
    }

    #[tokio::test]
    async fn test_custom_validator_is_used() {
        let service = service().await.with_validator(NoDrafts);
        let err = service
            .clone_root(
                &user(vec![UserRole::Artist]),
                EntityKind::Instrument,
                &"i1".to_string(),
                Row::partial().with("state", "Draft"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Clone(CloneError::ValidationFailed(_))));
        assert_eq!(err.to_string(), "Invalid instrument: drafts cannot be cloned");
    }

    #[tokio::test]
    async fn test_reads_are_account_scoped() {
        let service = service().await;
        let outsider = HubAccess::new("u2".to_string(), vec!["acct9".to_string()], vec![UserRole::Artist]);

        let err = service
            .read_one(&outsider, EntityKind::Instrument, &"i1".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let row = service
            .read_one(&user(vec![UserRole::User]), EntityKind::InstrumentMeme, &"im1".to_string())
            .await
            .unwrap();
        assert_eq!(row.get_str("name"), Some("heavy"));

        let err = service
            .read_graph(&outsider, EntityKind::Library, &"lib1".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotARoot { .. }));
    }
}
