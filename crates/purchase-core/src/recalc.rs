//! Balance carry-forward across the canonical chain of records.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::{debug, error, warn};

use purchase_domain::{MoneyInput, Record};

use crate::{
    ordering::{canonical_refs, sort_canonical},
    totals::TotalsCalculator,
    CoreError,
};

pub struct BalanceRecalculator;

impl BalanceRecalculator {
    /// Re-threads `balance_bf` through every record and recomputes all totals.
    ///
    /// Returns the records in canonical order. The first record keeps its stored
    /// `balance_bf` as an opening balance; every later one takes its predecessor's
    /// `cash_balance`, or zero when the predecessor stops carry-over. Duplicate ids
    /// are rejected before anything is modified.
    pub fn recalculate_all(mut records: Vec<Record>) -> Result<Vec<Record>, CoreError> {
        Self::ensure_unique_ids(&records)?;
        sort_canonical(&mut records);

        let mut carry: Option<Decimal> = None;
        for record in records.iter_mut() {
            if record.parsed_date().is_none() {
                warn!(id = %record.id, date = %record.date, "record has no usable date; ordered first");
            }
            if let Some(amount) = carry {
                record.balance_bf = MoneyInput::Value(amount);
            }
            TotalsCalculator::apply(record);
            carry = Some(Self::carried_from(record));
        }

        debug!(records = records.len(), "recalculated balance chain");
        Ok(records)
    }

    /// Tentative opening balance for a new, unsaved record: the carry-over of the
    /// canonically last record, using its stored totals.
    pub fn draft_carry_over(records: &[Record]) -> Decimal {
        canonical_refs(records)
            .last()
            .map(|last| Self::carried_from(last))
            .unwrap_or(Decimal::ZERO)
    }

    /// The `balance_bf` the record `id` should hold given its canonical predecessor.
    ///
    /// The first record keeps its own value. `None` when no record has that id.
    pub fn expected_balance_bf(records: &[Record], id: &str) -> Option<Decimal> {
        let ordered = canonical_refs(records);
        let position = ordered.iter().position(|record| record.id == id)?;
        let expected = match position.checked_sub(1) {
            Some(previous) => Self::carried_from(ordered[previous]),
            None => TotalsCalculator::coerce(&ordered[position].balance_bf),
        };
        Some(expected)
    }

    /// Reports every record whose stored carry-over or totals disagree with a fresh
    /// recalculation. Empty when the chain is consistent.
    pub fn chain_discrepancies(records: &[Record]) -> Vec<String> {
        let recalculated = match Self::recalculate_all(records.to_vec()) {
            Ok(recalculated) => recalculated,
            Err(err) => return vec![err.to_string()],
        };
        let stored: HashMap<&str, &Record> = records
            .iter()
            .map(|record| (record.id.as_str(), record))
            .collect();

        let mut problems = Vec::new();
        for fresh in &recalculated {
            let Some(current) = stored.get(fresh.id.as_str()) else {
                continue;
            };
            if current.balance_bf != fresh.balance_bf {
                problems.push(format!(
                    "record {} ({}): balanceBF is {}, expected {}",
                    fresh.id,
                    fresh.date,
                    display_money(&current.balance_bf),
                    display_money(&fresh.balance_bf)
                ));
            }
            if current.totals != fresh.totals {
                problems.push(format!(
                    "record {} ({}): stored totals are stale (cashBalance {}, expected {})",
                    fresh.id, fresh.date, current.totals.cash_balance, fresh.totals.cash_balance
                ));
            }
        }

        for problem in &problems {
            warn!("{problem}");
        }
        problems
    }

    fn carried_from(record: &Record) -> Decimal {
        if record.stop_carry_over {
            Decimal::ZERO
        } else {
            record.totals.cash_balance
        }
    }

    fn ensure_unique_ids(records: &[Record]) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id.as_str()) {
                error!(id = %record.id, "rejecting recalculation batch with duplicate record id");
                return Err(CoreError::DuplicateRecordId(record.id.clone()));
            }
        }
        Ok(())
    }
}

fn display_money(input: &MoneyInput) -> String {
    match input {
        MoneyInput::Blank => "blank".to_string(),
        other => other.to_string(),
    }
}
