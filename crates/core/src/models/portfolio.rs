use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortfolioId(pub Uuid);

impl PortfolioId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortfolioId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named collection of holdings owned by one user.
///
/// Portfolios are never hard-deleted: deactivation keeps every historical
/// transaction reference valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: PortfolioId,

    pub user: UserId,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(user: UserId, name: impl Into<String>, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PortfolioId::new(),
            user,
            name: name.into().trim().to_string(),
            description,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.user == user
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = Utc::now();
    }
}
