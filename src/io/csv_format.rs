//! CSV export of transaction history
//!
//! Renders the rows returned by a history query into the download format:
//! `date,type,amount,payee name,payee account,reason`.
//!
//! The writer is pure apart from the supplied `Write` sink, so it is tested
//! against an in-memory buffer.

use crate::core::HistoryEntry;
use crate::types::LedgerError;
use chrono::SecondsFormat;
use std::io::Write;

/// Column names of the export, in order
pub const HISTORY_CSV_HEADER: [&str; 6] = [
    "date",
    "type",
    "amount",
    "payee name",
    "payee account",
    "reason",
];

/// Write history entries as CSV
///
/// Rows are written in the order given, which for history queries is newest
/// first. Amounts are written with two decimal places; missing payee and reason
/// columns are left empty.
///
/// # Arguments
///
/// * `entries` - History rows to export
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(LedgerError::StorageError)` if a write error occurred
pub fn write_history_csv(entries: &[HistoryEntry], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(HISTORY_CSV_HEADER)?;

    for entry in entries {
        let record = &entry.record;
        let (payee_name, payee_account) = entry
            .payee
            .as_ref()
            .map(|p| (p.customer_name.as_str(), p.account_number.as_str()))
            .unwrap_or(("", ""));

        writer.write_record([
            record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true).as_str(),
            record.kind.as_str(),
            format!("{:.2}", record.amount).as_str(),
            payee_name,
            payee_account,
            record.reason.as_deref().unwrap_or(""),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
