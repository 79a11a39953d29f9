use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use purchase_domain::{BookSnapshot, RecordBook};

use crate::{recalc::BalanceRecalculator, CoreError};

/// Describes a persisted backup artifact for a book.
#[derive(Debug, Clone)]
pub struct BookBackupInfo {
    pub book: String,
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Abstraction over persistence backends capable of storing record books and backups.
pub trait RecordStorage: Send + Sync {
    fn save_book(&self, name: &str, book: &RecordBook) -> Result<(), CoreError>;
    fn load_book(&self, name: &str) -> Result<RecordBook, CoreError>;
    fn book_exists(&self, name: &str) -> bool;
    fn list_books(&self) -> Result<Vec<String>, CoreError>;
    fn delete_book(&self, name: &str) -> Result<(), CoreError>;
    fn export_snapshot(&self, snapshot: &BookSnapshot, path: &Path) -> Result<(), CoreError>;
    fn import_snapshot(&self, path: &Path) -> Result<BookSnapshot, CoreError>;
    fn backup_book(
        &self,
        name: &str,
        book: &RecordBook,
        note: Option<&str>,
    ) -> Result<BookBackupInfo, CoreError>;
    fn list_backups(&self, name: &str) -> Result<Vec<BookBackupInfo>, CoreError>;
    fn restore_backup(&self, backup: &BookBackupInfo) -> Result<RecordBook, CoreError>;
}

/// Detects anomalies within a book snapshot.
pub fn book_warnings(book: &RecordBook) -> Vec<String> {
    let known: HashSet<&str> = book.suppliers.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    let mut duplicated = false;

    for record in &book.records {
        if !seen.insert(record.id.as_str()) {
            duplicated = true;
            warnings.push(format!("record id {} appears more than once", record.id));
        }
        if record.parsed_date().is_none() {
            warnings.push(format!(
                "record {} has unparseable date `{}`",
                record.id, record.date
            ));
        }
        for receipt in &record.receipts {
            let name = receipt.supplier_name();
            if !name.is_empty() && !known.contains(name) {
                warnings.push(format!(
                    "record {} references unknown supplier `{}`",
                    record.id, name
                ));
            }
        }
    }

    // The chain check rejects duplicate ids outright; they are reported above.
    if !duplicated {
        warnings.extend(BalanceRecalculator::chain_discrepancies(&book.records));
    }
    warnings
}
