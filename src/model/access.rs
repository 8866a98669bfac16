use serde::{Deserialize, Serialize};

use crate::model::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Artist,
    Engineer,
    User,
}

/// Who is calling, which accounts they may see, and what they may do
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubAccess {
    pub user_id: String,
    pub account_ids: Vec<Id>,
    pub roles: Vec<UserRole>,
    /// Internal access bypasses account scoping (system jobs, migrations of content)
    #[serde(default)]
    pub internal: bool,
}

impl HubAccess {
    /// Create an access context scoped to the given accounts
    pub fn new(user_id: String, account_ids: Vec<Id>, roles: Vec<UserRole>) -> Self {
        Self {
            user_id,
            account_ids,
            roles,
            internal: false,
        }
    }

    /// Access for internal operations; sees and writes everything
    pub fn internal() -> Self {
        Self {
            user_id: "system".to_string(),
            account_ids: Vec::new(),
            roles: vec![UserRole::Admin],
            internal: true,
        }
    }

    /// Anonymous development user with no account scope
    pub fn default_user() -> Self {
        Self {
            user_id: "dev-user".to_string(),
            account_ids: Vec::new(),
            roles: vec![UserRole::User],
            internal: false,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.internal || self.roles.contains(&UserRole::Admin)
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    /// Artists (and anyone top-level) may create and clone content
    pub fn is_artist(&self) -> bool {
        self.is_top_level() || self.has_role(UserRole::Artist)
    }

    pub fn has_account(&self, account_id: &str) -> bool {
        self.account_ids.iter().any(|id| id == account_id)
    }
}

impl Default for HubAccess {
    fn default() -> Self {
        Self::default_user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artist_and_top_level() {
        let artist = HubAccess::new(
            "u1".to_string(),
            vec!["acct1".to_string()],
            vec![UserRole::Artist],
        );
        assert!(artist.is_artist());
        assert!(!artist.is_top_level());
        assert!(artist.has_account("acct1"));
        assert!(!artist.has_account("acct2"));

        let admin = HubAccess::new("u2".to_string(), vec![], vec![UserRole::Admin]);
        assert!(admin.is_top_level());
        assert!(admin.is_artist());

        assert!(!HubAccess::default_user().is_artist());
        assert!(HubAccess::internal().is_top_level());
    }
}
