//! Ledger record types
//!
//! This module defines the immutable transaction record that makes up the
//! ledger, together with its kind and status enums.

use super::ids::{AccountId, PayeeId, TransactionId};
use super::payee::Payee;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of ledger record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    /// Money paid into the account from outside the ledger
    Deposit,

    /// Money paid out of the account to outside the ledger
    Withdrawal,

    /// Sender side of a transfer to an approved payee
    TransferOut,

    /// Receiver side of a transfer, posted on the payee's account
    TransferIn,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 4] = [
        TransactionKind::Deposit,
        TransactionKind::Withdrawal,
        TransactionKind::TransferOut,
        TransactionKind::TransferIn,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::TransferOut => "transfer-out",
            TransactionKind::TransferIn => "transfer-in",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| format!("unknown transaction type '{}'", s))
    }
}

/// Lifecycle status of a ledger record
///
/// Only `Completed` records are ever persisted; a failed attempt leaves no
/// record at all. The other states exist so stored data can be read back
/// without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// Immutable ledger entry
///
/// Records are never edited or deleted once appended; balance is always
/// derived by folding them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,

    /// Account this record affects
    #[serde(rename = "userId")]
    pub owner: AccountId,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Strictly positive, two decimal places
    pub amount: Decimal,

    /// Free text, withdrawals only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Payee paid by a `transfer-out`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee_id: Option<PayeeId>,

    /// Paying account of a `transfer-in`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_user_id: Option<AccountId>,

    /// The other half of a transfer pair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_transaction_id: Option<TransactionId>,

    pub status: TransactionStatus,

    /// Ordering hint, not an authoritative clock
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    fn completed(owner: AccountId, kind: TransactionKind, amount: Decimal) -> Self {
        TransactionRecord {
            id: TransactionId::new(),
            owner,
            kind,
            amount,
            reason: None,
            payee_id: None,
            related_user_id: None,
            related_transaction_id: None,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }

    /// A completed deposit
    pub fn deposit(owner: AccountId, amount: Decimal) -> Self {
        Self::completed(owner, TransactionKind::Deposit, amount)
    }

    /// A completed withdrawal carrying an optional reason
    pub fn withdrawal(owner: AccountId, amount: Decimal, reason: Option<String>) -> Self {
        let mut record = Self::completed(owner, TransactionKind::Withdrawal, amount);
        record.reason = reason;
        record
    }

    /// Both halves of a transfer
    ///
    /// Returns `(transfer_out, transfer_in)`. The out record references the
    /// payee, the in record references the sender, and each references the
    /// other's id. Both share one timestamp.
    pub fn transfer_pair(
        sender: AccountId,
        payee: &Payee,
        amount: Decimal,
    ) -> (TransactionRecord, TransactionRecord) {
        let mut out = Self::completed(sender, TransactionKind::TransferOut, amount);
        let mut inbound = Self::completed(payee.user_id, TransactionKind::TransferIn, amount);
        inbound.created_at = out.created_at;

        out.payee_id = Some(payee.id);
        out.related_transaction_id = Some(inbound.id);
        inbound.related_user_id = Some(sender);
        inbound.related_transaction_id = Some(out.id);

        (out, inbound)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::payee::{NewPayee, PayeeStatus};
    use rstest::rstest;

    fn approved_payee(owner: AccountId) -> Payee {
        let mut payee = Payee::register(NewPayee {
            user_id: owner,
            customer_name: "Bob".to_string(),
            bank_name: "First Bank".to_string(),
            account_number: "42".to_string(),
            ifsc_code: "FBNK0001".to_string(),
        });
        payee.status = PayeeStatus::Approved;
        payee
    }

    #[rstest]
    #[case("deposit", TransactionKind::Deposit)]
    #[case("withdrawal", TransactionKind::Withdrawal)]
    #[case("transfer-out", TransactionKind::TransferOut)]
    #[case("transfer-in", TransactionKind::TransferIn)]
    fn test_kind_parses_wire_names(#[case] input: &str, #[case] expected: TransactionKind) {
        assert_eq!(input.parse::<TransactionKind>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn test_kind_rejects_unknown() {
        assert!("refund".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&TransactionKind::TransferOut).unwrap();
        assert_eq!(json, "\"transfer-out\"");
    }

    #[test]
    fn test_withdrawal_keeps_reason() {
        let record =
            TransactionRecord::withdrawal(AccountId::new(), Decimal::new(5000, 2), Some("rent".into()));
        assert_eq!(record.kind, TransactionKind::Withdrawal);
        assert_eq!(record.reason.as_deref(), Some("rent"));
        assert!(record.is_completed());
    }

    #[test]
    fn test_transfer_pair_cross_references() {
        let sender = AccountId::new();
        let receiver = AccountId::new();
        let payee = approved_payee(receiver);

        let (out, inbound) = TransactionRecord::transfer_pair(sender, &payee, Decimal::new(3000, 2));

        assert_eq!(out.kind, TransactionKind::TransferOut);
        assert_eq!(out.owner, sender);
        assert_eq!(out.payee_id, Some(payee.id));
        assert_eq!(out.related_transaction_id, Some(inbound.id));

        assert_eq!(inbound.kind, TransactionKind::TransferIn);
        assert_eq!(inbound.owner, receiver);
        assert_eq!(inbound.related_user_id, Some(sender));
        assert_eq!(inbound.related_transaction_id, Some(out.id));

        assert_eq!(out.amount, inbound.amount);
        assert_eq!(out.created_at, inbound.created_at);
    }

    #[test]
    fn test_record_json_uses_wire_field_names() {
        let record = TransactionRecord::deposit(AccountId::new(), Decimal::new(10000, 2));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "deposit");
        assert_eq!(json["status"], "completed");
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("reason").is_none());
    }
}
