//! Request and response bodies
//!
//! Request fields are all optional so that a missing field is reported as
//! `InvalidRequest` with the field's name rather than as a generic body
//! rejection. Amounts are accepted as JSON numbers or strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

use crate::core::{HistoryEntry, LedgerEntry, PayeeSummary, UserSummary};
use crate::types::{
    parse_amount, AccountId, LedgerError, NewPayee, NewUser, Payee, PayeeId, TransactionId,
    TransactionKind, TransactionRecord, TransactionStatus, User, UserUpdate,
};

/// Value of a required text field
pub fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, LedgerError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| LedgerError::invalid_request(format!("{} is required", field)))
}

/// Parse an identifier, reporting the field name on failure
pub fn parse_id<T: FromStr>(field: &str, raw: &str) -> Result<T, LedgerError> {
    raw.trim()
        .parse()
        .map_err(|_| LedgerError::invalid_request(format!("{} '{}' is not a valid id", field, raw)))
}

/// Amount from a JSON number or numeric string
pub fn amount_from(value: &Option<Value>) -> Result<Decimal, LedgerError> {
    match value {
        None | Some(Value::Null) => Err(LedgerError::invalid_request("amount is required")),
        Some(Value::Number(n)) => parse_amount(&n.to_string()),
        Some(Value::String(s)) => parse_amount(s),
        Some(other) => Err(LedgerError::invalid_amount(other, "not a number")),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub user_id: Option<String>,
    pub amount: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub user_id: Option<String>,
    pub amount: Option<Value>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub user_id: Option<String>,
    pub payee_id: Option<String>,
    pub amount: Option<Value>,
}

/// `type`, `startDate` and `endDate` query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

impl RegisterUserRequest {
    pub fn into_new_user(self) -> Result<NewUser, LedgerError> {
        Ok(NewUser {
            name: required("name", &self.name)?.to_string(),
            email: required("email", &self.email)?.to_string(),
            phone: self.phone.unwrap_or_default().trim().to_string(),
            username: required("username", &self.username)?.to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(request: UpdateUserRequest) -> Self {
        UserUpdate {
            name: request.name,
            email: request.email,
            phone: request.phone,
            username: request.username,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayeeRequest {
    pub user_id: Option<String>,
    pub customer_name: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
}

impl RegisterPayeeRequest {
    pub fn into_new_payee(self) -> Result<NewPayee, LedgerError> {
        Ok(NewPayee {
            user_id: parse_id("userId", required("userId", &self.user_id)?)?,
            customer_name: required("customerName", &self.customer_name)?.to_string(),
            bank_name: required("bankName", &self.bank_name)?.to_string(),
            account_number: required("accountNumber", &self.account_number)?.to_string(),
            ifsc_code: required("ifscCode", &self.ifsc_code)?.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub success: bool,
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub message: String,
    pub transaction: TransactionView,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub success: bool,
    pub message: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub transaction_id: TransactionId,
}

#[derive(Debug, Serialize)]
pub struct UserRegisteredResponse {
    pub msg: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct PayeeResponse {
    pub message: String,
    pub payee: Payee,
}

/// A ledger record as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    pub id: TransactionId,
    pub user_id: AccountId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_id: Option<PayeeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_user_id: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_transaction_id: Option<TransactionId>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee: Option<PayeeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

impl From<TransactionRecord> for TransactionView {
    fn from(record: TransactionRecord) -> Self {
        TransactionView {
            id: record.id,
            user_id: record.owner,
            kind: record.kind,
            amount: record.amount,
            reason: record.reason,
            payee_id: record.payee_id,
            related_user_id: record.related_user_id,
            related_transaction_id: record.related_transaction_id,
            status: record.status,
            created_at: record.created_at,
            payee: None,
            user: None,
        }
    }
}

impl From<HistoryEntry> for TransactionView {
    fn from(entry: HistoryEntry) -> Self {
        TransactionView {
            payee: entry.payee,
            ..TransactionView::from(entry.record)
        }
    }
}

impl From<LedgerEntry> for TransactionView {
    fn from(entry: LedgerEntry) -> Self {
        TransactionView {
            payee: entry.payee,
            user: entry.user,
            ..TransactionView::from(entry.record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::number(json!(100), "100.00")]
    #[case::fraction(json!(12.5), "12.50")]
    #[case::string(json!("30.00"), "30.00")]
    fn test_amount_from_valid(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(amount_from(&Some(value)).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case::missing(None, "amount is required")]
    #[case::null(Some(Value::Null), "amount is required")]
    #[case::boolean(Some(json!(true)), "not a number")]
    #[case::text(Some(json!("abc")), "not a number")]
    #[case::negative(Some(json!(-5)), "greater than zero")]
    #[case::too_precise(Some(json!(1.005)), "two decimal places")]
    fn test_amount_from_invalid(#[case] value: Option<Value>, #[case] expected: &str) {
        let error = amount_from(&value).unwrap_err();
        assert!(error.to_string().contains(expected), "{}", error);
    }

    #[test]
    fn test_required_rejects_blank() {
        assert!(required("userId", &Some("  ".to_string())).is_err());
        assert!(required("userId", &None).is_err());
        assert_eq!(required("userId", &Some(" abc ".to_string())).unwrap(), "abc");
    }

    #[test]
    fn test_parse_id_reports_field() {
        let error = parse_id::<AccountId>("userId", "not-a-uuid").unwrap_err();
        assert!(matches!(error, LedgerError::InvalidRequest { .. }));
        assert!(error.to_string().contains("userId"));
    }

    #[test]
    fn test_transaction_view_uses_numeric_amount() {
        let record = TransactionRecord::deposit(AccountId::new(), Decimal::new(10050, 2));
        let json = serde_json::to_value(TransactionView::from(record)).unwrap();

        assert_eq!(json["amount"], json!(100.5));
        assert_eq!(json["type"], json!("deposit"));
        assert!(json.get("payee").is_none());
    }
}
