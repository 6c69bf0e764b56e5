//! Balance derivation
//!
//! An account's balance is never stored. It is recomputed on every call by
//! folding the account's completed ledger records:
//!
//! ```text
//! balance = Σ deposit − Σ withdrawal − Σ transfer-out (+ Σ transfer-in)
//! ```
//!
//! Whether `transfer-in` records count is decided by [`BalancePolicy`].

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use super::traits::LedgerStore;
use crate::types::{AccountId, LedgerError, TransactionKind, TransactionRecord};

/// Treatment of received transfers in the balance fold
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BalancePolicy {
    /// Received transfers add to the receiver's balance
    #[default]
    CreditInbound,

    /// Received transfers are history only and never spendable
    ExcludeInbound,
}

impl BalancePolicy {
    /// Sign a record kind contributes with, or `None` if it is not counted
    pub fn sign(self, kind: TransactionKind) -> Option<Decimal> {
        match kind {
            TransactionKind::Deposit => Some(Decimal::ONE),
            TransactionKind::Withdrawal | TransactionKind::TransferOut => Some(Decimal::NEGATIVE_ONE),
            TransactionKind::TransferIn => match self {
                BalancePolicy::CreditInbound => Some(Decimal::ONE),
                BalancePolicy::ExcludeInbound => None,
            },
        }
    }
}

/// Fold records into a balance for `account`
///
/// Records owned by other accounts and records that are not completed are
/// skipped, so the full ledger may be passed in.
///
/// # Returns
///
/// * `Ok(Decimal)` - The derived balance
/// * `Err(LedgerError::ArithmeticOverflow)` - If the running sum overflows
pub fn fold_balance<'a, I>(
    records: I,
    account: AccountId,
    policy: BalancePolicy,
) -> Result<Decimal, LedgerError>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    records
        .into_iter()
        .filter(|record| record.owner == account && record.is_completed())
        .filter_map(|record| policy.sign(record.kind).map(|sign| sign * record.amount))
        .try_fold(Decimal::ZERO, |balance, delta| {
            balance
                .checked_add(delta)
                .ok_or_else(|| LedgerError::arithmetic_overflow("balance", account))
        })
}

/// Read-only balance calculator over a ledger store
///
/// Takes no locks of its own; it relies on the store's read-committed reads
/// and is safe to call from any number of tasks at once.
#[derive(Debug)]
pub struct BalanceCalculator<S> {
    store: Arc<S>,
    policy: BalancePolicy,
    timeout: Duration,
}

impl<S> Clone for BalanceCalculator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
            timeout: self.timeout,
        }
    }
}

impl<S: LedgerStore> BalanceCalculator<S> {
    pub fn new(store: Arc<S>, policy: BalancePolicy, timeout: Duration) -> Self {
        Self {
            store,
            policy,
            timeout,
        }
    }

    pub fn policy(&self) -> BalancePolicy {
        self.policy
    }

    /// Current balance of `account`
    ///
    /// An account with no history, including an unknown one, has balance zero.
    /// Store failures are returned as errors, never as a zero balance.
    pub async fn compute_balance(&self, account: AccountId) -> Result<Decimal, LedgerError> {
        let records = tokio::time::timeout(self.timeout, self.store.records_for(account))
            .await
            .map_err(|_| LedgerError::timeout("balance read", self.timeout.as_millis() as u64))??;
        fold_balance(&records, account, self.policy)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::{NewPayee, Payee, PayeeStatus, TransactionStatus};
    use proptest::prelude::*;

    /// Generates random ledgers over three accounts.
    ///
    /// Kind selector: 0-3 deposit, 4-5 withdrawal, 6-7 transfer from the
    /// owner to the next account, 8 a pending deposit that must not count.
    fn ledger_strategy() -> impl Strategy<Value = (Vec<AccountId>, Vec<TransactionRecord>)> {
        prop::collection::vec((0usize..3, 1i64..=100_000i64, 0u8..=8u8), 0..=60).prop_map(
            |entries| {
                let accounts: Vec<AccountId> = (0..3).map(|_| AccountId::new()).collect();
                let payees: Vec<Payee> = accounts
                    .iter()
                    .enumerate()
                    .map(|(i, owner)| {
                        let mut payee = Payee::register(NewPayee {
                            user_id: *owner,
                            customer_name: format!("payee {}", i),
                            bank_name: "First Bank".to_string(),
                            account_number: format!("{:04}", i),
                            ifsc_code: "FBNK0001".to_string(),
                        });
                        payee.status = PayeeStatus::Approved;
                        payee
                    })
                    .collect();

                let mut records = Vec::new();
                for (owner, cents, selector) in entries {
                    let amount = Decimal::new(cents, 2);
                    match selector {
                        0..=3 => records.push(TransactionRecord::deposit(accounts[owner], amount)),
                        4..=5 => records.push(TransactionRecord::withdrawal(accounts[owner], amount, None)),
                        6..=7 => {
                            let (out, inbound) = TransactionRecord::transfer_pair(
                                accounts[owner],
                                &payees[(owner + 1) % 3],
                                amount,
                            );
                            records.push(out);
                            records.push(inbound);
                        }
                        _ => {
                            let mut pending = TransactionRecord::deposit(accounts[owner], amount);
                            pending.status = TransactionStatus::Pending;
                            records.push(pending);
                        }
                    }
                }
                (accounts, records)
            },
        )
    }

    fn naive_balance(records: &[TransactionRecord], account: AccountId, credit_inbound: bool) -> Decimal {
        let mut balance = Decimal::ZERO;
        for record in records {
            if record.owner != account || record.status != TransactionStatus::Completed {
                continue;
            }
            match record.kind {
                TransactionKind::Deposit => balance += record.amount,
                TransactionKind::Withdrawal => balance -= record.amount,
                TransactionKind::TransferOut => balance -= record.amount,
                TransactionKind::TransferIn if credit_inbound => balance += record.amount,
                TransactionKind::TransferIn => {}
            }
        }
        balance
    }

    /// Property test: the fold equals a naive per-record recomputation for
    /// every account under both policies.
    #[test]
    fn fold_matches_naive_recomputation() {
        proptest!(|((accounts, records) in ledger_strategy())| {
            for account in &accounts {
                prop_assert_eq!(
                    fold_balance(&records, *account, BalancePolicy::CreditInbound).unwrap(),
                    naive_balance(&records, *account, true)
                );
                prop_assert_eq!(
                    fold_balance(&records, *account, BalancePolicy::ExcludeInbound).unwrap(),
                    naive_balance(&records, *account, false)
                );
            }
        });
    }

    /// Property test: money moved by transfers is conserved across accounts
    /// when received transfers are credited.
    #[test]
    fn transfers_conserve_total_when_credited() {
        proptest!(|((accounts, records) in ledger_strategy())| {
            let total: Decimal = accounts
                .iter()
                .map(|a| fold_balance(&records, *a, BalancePolicy::CreditInbound).unwrap())
                .sum();
            let external: Decimal = records
                .iter()
                .filter(|r| r.is_completed())
                .map(|r| match r.kind {
                    TransactionKind::Deposit => r.amount,
                    TransactionKind::Withdrawal => -r.amount,
                    _ => Decimal::ZERO,
                })
                .sum();
            prop_assert_eq!(total, external);
        });
    }
}
