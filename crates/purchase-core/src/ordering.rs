//! Canonical chronological order of records.

use std::cmp::Ordering;

use chrono::NaiveDate;

use purchase_domain::Record;

/// Sort key: parsed date (missing or unparseable dates first), then id by byte order.
pub fn canonical_key(record: &Record) -> (Option<NaiveDate>, &str) {
    (record.parsed_date(), record.id.as_str())
}

pub fn canonical_cmp(a: &Record, b: &Record) -> Ordering {
    canonical_key(a).cmp(&canonical_key(b))
}

pub fn sort_canonical(records: &mut [Record]) {
    records.sort_by_cached_key(|record| (record.parsed_date(), record.id.clone()));
}

/// Borrowing view of `records` in canonical order.
pub fn canonical_refs(records: &[Record]) -> Vec<&Record> {
    let mut refs: Vec<&Record> = records.iter().collect();
    refs.sort_by(|a, b| canonical_cmp(a, b));
    refs
}
