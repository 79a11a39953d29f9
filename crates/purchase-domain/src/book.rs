//! The persisted aggregate of one user's records and its export snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Record;

pub const CURRENT_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordBook {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub suppliers: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "RecordBook::schema_version_default")]
    pub schema_version: u8,
}

impl RecordBook {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            records: Vec::new(),
            suppliers: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: CURRENT_SCHEMA_VERSION,
        }
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn record_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Adds every non-blank receipt supplier of `record` that the book does not
    /// know yet. Returns how many names were added.
    pub fn register_suppliers(&mut self, record: &Record) -> usize {
        let mut added = 0;
        for receipt in &record.receipts {
            let name = receipt.supplier_name();
            if name.is_empty() || self.suppliers.iter().any(|known| known == name) {
                continue;
            }
            self.suppliers.push(name.to_string());
            added += 1;
        }
        if added > 0 {
            self.suppliers.sort();
        }
        added
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn schema_version_default() -> u8 {
        CURRENT_SCHEMA_VERSION
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Backup/export file format. Both `records` and `suppliers` are mandatory.
pub struct BookSnapshot {
    pub records: Vec<Record>,
    pub suppliers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
}

impl BookSnapshot {
    pub fn from_book(book: &RecordBook) -> Self {
        Self {
            records: book.records.clone(),
            suppliers: book.suppliers.clone(),
            export_date: Some(Utc::now()),
        }
    }
}
