//! Mutations on a [`RecordBook`]. Every committed change re-runs the balance
//! recalculation over the whole collection.

use chrono::{SubsecRound, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use purchase_domain::{BookSnapshot, MoneyInput, PaymentMode, Record, RecordBook};

use crate::{
    recalc::BalanceRecalculator, totals::TotalsCalculator, validation::RecordValidator, CoreError,
};

pub struct RecordService;

impl RecordService {
    /// A fresh, unsaved record whose opening balance is the current carry-over.
    /// Totals are filled in for display; the value is tentative until saved.
    pub fn draft_record(book: &RecordBook, date: impl Into<String>) -> Record {
        let mut draft = Record::new(date)
            .with_balance_bf(BalanceRecalculator::draft_carry_over(&book.records));
        TotalsCalculator::apply(&mut draft);
        draft
    }

    /// Copy of a stored record with its opening balance re-derived from its
    /// canonical predecessor.
    pub fn open_for_edit(book: &RecordBook, id: &str) -> Result<Record, CoreError> {
        let mut record = book
            .record(id)
            .cloned()
            .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))?;
        if let Some(expected) = BalanceRecalculator::expected_balance_bf(&book.records, id) {
            record.balance_bf = MoneyInput::Value(expected);
        }
        TotalsCalculator::apply(&mut record);
        Ok(record)
    }

    /// Validates, stamps metadata, inserts or replaces by id, then recalculates.
    /// The book is left untouched when any step fails.
    pub fn save_record(
        book: &mut RecordBook,
        mut record: Record,
        actor: &str,
    ) -> Result<Record, CoreError> {
        let report = RecordValidator::validate(&record);
        if !report.is_valid {
            return Err(CoreError::InvalidRecord {
                id: record.id,
                errors: report.errors,
            });
        }

        // Stored as epoch milliseconds.
        let now = Utc::now().trunc_subsecs(3);
        let mut records = book.records.clone();
        let existing = records.iter().position(|stored| stored.id == record.id);
        match existing {
            Some(index) => {
                let previous = &records[index].meta;
                record.meta.version = previous.version + 1;
                record.meta.created_at = previous.created_at;
                record.meta.created_by = previous.created_by.clone();
            }
            None => {
                record.meta.version = 1;
                record.meta.created_at = Some(now);
                record.meta.created_by = actor.to_string();
            }
        }
        record.meta.updated_at = Some(now);
        record.meta.updated_by = actor.to_string();
        record.meta.synced = false;

        let id = record.id.clone();
        match existing {
            Some(index) => records[index] = record,
            None => records.push(record),
        }
        let records = BalanceRecalculator::recalculate_all(records)?;
        if existing.is_none() {
            if let Some(opening) = displaced_opening_balance(&book.records, &records, &id) {
                warn!(
                    id = %id,
                    balance_bf = %opening,
                    "new record sorts before every stored record and keeps its balanceBF as the opening balance"
                );
            }
        }

        book.records = records;
        let saved = book
            .record(&id)
            .cloned()
            .ok_or_else(|| CoreError::RecordNotFound(id.clone()))?;
        let added = book.register_suppliers(&saved);
        book.touch();
        info!(
            id = %id,
            edited = existing.is_some(),
            new_suppliers = added,
            "saved record"
        );
        Ok(saved)
    }

    /// Removes a record and re-threads the records after it.
    pub fn delete_record(book: &mut RecordBook, id: &str) -> Result<Record, CoreError> {
        let index = book
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| CoreError::RecordNotFound(id.to_string()))?;
        let mut records = book.records.clone();
        let removed = records.remove(index);
        book.records = BalanceRecalculator::recalculate_all(records)?;
        book.touch();
        info!(id = %id, remaining = book.records.len(), "deleted record");
        Ok(removed)
    }

    /// Replaces the book's records and suppliers with a snapshot's.
    pub fn import_snapshot(book: &mut RecordBook, snapshot: BookSnapshot) -> Result<usize, CoreError> {
        let records = BalanceRecalculator::recalculate_all(snapshot.records)?;
        let count = records.len();
        book.records = records;
        book.suppliers = snapshot.suppliers;
        book.touch();
        info!(records = count, suppliers = book.suppliers.len(), "imported snapshot");
        Ok(count)
    }

    pub fn export_snapshot(book: &RecordBook) -> BookSnapshot {
        BookSnapshot::from_book(book)
    }

    /// Most frequent payment mode used with `supplier` (trimmed, case-insensitive).
    /// Ties go to the mode declared first.
    pub fn suggest_payment_mode(records: &[Record], supplier: &str) -> Option<PaymentMode> {
        let needle = supplier.trim();
        if needle.is_empty() {
            return None;
        }
        let mut counts = [0usize; PaymentMode::ALL.len()];
        for receipt in records.iter().flat_map(|record| &record.receipts) {
            if !receipt.supplier_name().eq_ignore_ascii_case(needle) {
                continue;
            }
            if let Some(mode) = receipt.mode() {
                if let Some(slot) = PaymentMode::ALL.iter().position(|m| *m == mode) {
                    counts[slot] += 1;
                }
            }
        }

        let mut best: Option<(usize, PaymentMode)> = None;
        for (count, mode) in counts.into_iter().zip(PaymentMode::ALL) {
            if count > 0 && best.map_or(true, |(top, _)| count > top) {
                best = Some((count, mode));
            }
        }
        best.map(|(_, mode)| mode)
    }
}

/// Nonzero `balance_bf` of a newly inserted record that took over the head of an
/// existing chain. That value is kept as a seeded opening balance and flows into
/// every later record.
fn displaced_opening_balance(
    previous: &[Record],
    recalculated: &[Record],
    id: &str,
) -> Option<Decimal> {
    if previous.is_empty() {
        return None;
    }
    let head = recalculated.first().filter(|head| head.id == id)?;
    head.balance_bf.value().filter(|opening| !opening.is_zero())
}
