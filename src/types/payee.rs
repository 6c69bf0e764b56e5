//! Payee types
//!
//! A payee is a transfer destination that must be approved by an admin before
//! any money can be sent to it.

use super::ids::{AccountId, PayeeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payee approval lifecycle
///
/// `Pending` moves to either `Approved` or `Rejected`; both are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayeeStatus {
    Pending,
    Approved,
    Rejected,
}

impl PayeeStatus {
    /// Whether a payee in this state may move to `next`
    pub fn can_become(self, next: PayeeStatus) -> bool {
        matches!(
            (self, next),
            (PayeeStatus::Pending, PayeeStatus::Approved)
                | (PayeeStatus::Pending, PayeeStatus::Rejected)
        )
    }
}

impl fmt::Display for PayeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PayeeStatus::Pending => "pending",
            PayeeStatus::Approved => "approved",
            PayeeStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Registered transfer destination
///
/// Payees are unique by account number. Transfers credit the `user_id`
/// account with a `transfer-in` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payee {
    pub id: PayeeId,

    /// Account that receives money paid to this payee
    pub user_id: AccountId,

    pub customer_name: String,

    pub bank_name: String,

    /// External account number, unique across all payees
    pub account_number: String,

    /// Bank routing code
    pub ifsc_code: String,

    pub status: PayeeStatus,

    pub created_at: DateTime<Utc>,
}

/// Data for a payee registration
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayee {
    pub user_id: AccountId,
    pub customer_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub ifsc_code: String,
}

impl Payee {
    /// Create a `Pending` payee with a fresh id
    pub fn register(new: NewPayee) -> Self {
        Payee {
            id: PayeeId::new(),
            user_id: new.user_id,
            customer_name: new.customer_name,
            bank_name: new.bank_name,
            account_number: new.account_number,
            ifsc_code: new.ifsc_code,
            status: PayeeStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Only approved payees are valid transfer targets
    pub fn is_approved(&self) -> bool {
        self.status == PayeeStatus::Approved
    }
}
