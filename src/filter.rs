use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::record::CatalogRecord;

/// Fallback pattern for timestamps that arrive without a UTC offset.
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse an API timestamp: RFC 3339 first (a trailing `Z` reads as UTC),
/// then one offset-less pattern interpreted as UTC. Anything else is
/// undated.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Drop records older than `max_age_days`, counting back from `now`.
///
/// Records without a usable timestamp are kept; an undated entry is not
/// evidence that it is stale. A non-positive age disables filtering.
pub fn recent_only(
    records: Vec<CatalogRecord>,
    max_age_days: i64,
    now: DateTime<Utc>,
) -> Vec<CatalogRecord> {
    if max_age_days <= 0 {
        return records;
    }
    let cutoff = now - Duration::days(max_age_days);
    records
        .into_iter()
        .filter(
            |record| match record.timestamp().as_deref().and_then(parse_timestamp) {
                Some(stamp) => stamp >= cutoff,
                None => true,
            },
        )
        .collect()
}
