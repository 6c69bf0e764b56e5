//! Account holder types
//!
//! An account carries no stored balance. The balance is always derived from the
//! ledger, so the only account state kept here is the holder's profile.

use super::ids::AccountId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registered account holder
///
/// The user id is also the id of the user's single ledger account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Account identifier
    pub id: AccountId,

    /// Display name
    pub name: String,

    /// Contact email
    pub email: String,

    /// Contact phone number
    pub phone: String,

    /// Unique login name
    pub username: String,

    /// Registration time
    pub created_at: DateTime<Utc>,
}

/// Profile data for a registration
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
}

/// Partial profile update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

impl User {
    /// Create a user with a fresh account id
    pub fn register(new: NewUser) -> Self {
        User {
            id: AccountId::new(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            username: new.username,
            created_at: Utc::now(),
        }
    }

    /// Apply the non-empty fields of `update`
    pub fn apply(&mut self, update: UserUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = phone;
        }
        if let Some(username) = update.username {
            self.username = username;
        }
    }
}
