//! History query filter
//!
//! Used by the history and export queries to narrow an account's completed
//! records by kind and creation date.

use super::error::LedgerError;
use super::transaction::{TransactionKind, TransactionRecord};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Optional kind and date-range restriction
///
/// Both date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub kind: Option<TransactionKind>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    /// Build a filter from raw query-string values
    ///
    /// Empty strings count as absent. Dates accept RFC 3339 timestamps or plain
    /// `YYYY-MM-DD` dates in UTC; a plain end date covers the whole day.
    pub fn parse(
        kind: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, LedgerError> {
        let kind = non_empty(kind)
            .map(|k| k.parse::<TransactionKind>())
            .transpose()
            .map_err(LedgerError::invalid_request)?;
        let start = non_empty(start)
            .map(|s| parse_bound(s, false))
            .transpose()?;
        let end = non_empty(end).map(|s| parse_bound(s, true)).transpose()?;

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(LedgerError::invalid_request(
                    "startDate must not be after endDate",
                ));
            }
        }

        Ok(HistoryFilter { kind, start, end })
    }

    /// Whether a record passes the filter
    ///
    /// Non-completed records never match.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        record.is_completed()
            && self.kind.is_none_or(|kind| record.kind == kind)
            && self.start.is_none_or(|start| record.created_at >= start)
            && self.end.is_none_or(|end| record.created_at <= end)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, LedgerError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| LedgerError::invalid_request(format!("invalid date '{}'", value)))?;
    let start_of_day = date.and_time(NaiveTime::MIN).and_utc();
    if !end_of_day {
        return Ok(start_of_day);
    }

    // The last representable date has no following midnight.
    start_of_day
        .checked_add_signed(Duration::days(1))
        .and_then(|next_day| next_day.checked_sub_signed(Duration::nanoseconds(1)))
        .ok_or_else(|| LedgerError::invalid_request(format!("invalid date '{}'", value)))
}
