use anyhow::Result;

use crate::model::{EntityKind, HubAccess, Id};
use crate::store::StoreTransaction;

/// Read and write-into checks, evaluated inside the caller's transaction
#[async_trait::async_trait]
pub trait AccessGuard: Send + Sync {
    async fn can_read(&self, tx: &mut dyn StoreTransaction, kind: EntityKind, id: &Id) -> Result<bool>;

    async fn can_write_into(
        &self,
        tx: &mut dyn StoreTransaction,
        container_kind: EntityKind,
        container_id: &Id,
    ) -> Result<bool>;
}

/// Account-scoped guard for a [`HubAccess`].
///
/// A row is visible when the account at the end of its ownership chain is one
/// of the caller's accounts. Internal access sees every row that exists.
#[derive(Debug, Clone)]
pub struct HubAccessGuard {
    access: HubAccess,
}

impl HubAccessGuard {
    pub fn new(access: HubAccess) -> Self {
        Self { access }
    }

    /// Walk owner links up to the account; None when any hop is missing
    async fn account_of(
        &self,
        tx: &mut dyn StoreTransaction,
        kind: EntityKind,
        id: &Id,
    ) -> Result<Option<Id>> {
        let mut kind = kind;
        let mut id = id.clone();

        loop {
            let Some(row) = tx.fetch_row(kind, &id).await? else {
                return Ok(None);
            };
            let Some(owner) = kind.owner() else {
                return Ok(Some(row.id));
            };
            let Some(owner_id) = row.get_str(&owner.fk_column()).filter(|s| !s.is_empty()) else {
                return Ok(None);
            };
            id = owner_id.to_string();
            kind = owner;
        }
    }

    async fn is_visible(&self, tx: &mut dyn StoreTransaction, kind: EntityKind, id: &Id) -> Result<bool> {
        if self.access.internal {
            return Ok(tx.fetch_row(kind, id).await?.is_some());
        }
        let account = self.account_of(tx, kind, id).await?;
        Ok(account.is_some_and(|account_id| self.access.has_account(&account_id)))
    }
}

#[async_trait::async_trait]
impl AccessGuard for HubAccessGuard {
    async fn can_read(&self, tx: &mut dyn StoreTransaction, kind: EntityKind, id: &Id) -> Result<bool> {
        self.is_visible(tx, kind, id).await
    }

    async fn can_write_into(
        &self,
        tx: &mut dyn StoreTransaction,
        container_kind: EntityKind,
        container_id: &Id,
    ) -> Result<bool> {
        let allowed = self.is_visible(tx, container_kind, container_id).await?;
        if !allowed {
            log::debug!(
                "User {} may not write into {} '{}'",
                self.access.user_id,
                container_kind,
                container_id
            );
        }
        Ok(allowed)
    }
}
