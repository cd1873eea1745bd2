use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_ACCOUNT_NAME: &str = "Account";

// Represents an account owned by a user (e.g., "Account", "Retirement", "Crypto wallet")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccount {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAccount {
    pub name: String,
}

impl Account {
    pub fn new(user_id: uuid::Uuid, name: Option<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            user_id,
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ACCOUNT_NAME.to_string()),
            created_at: now,
            updated_at: now,
        }
    }
}
