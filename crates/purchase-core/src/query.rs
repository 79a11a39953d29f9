//! Display-side filtering and sorting. Results borrow from the input, so a
//! display order can never feed back into recalculation.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use purchase_domain::{PaymentMode, Record};

use crate::ordering::canonical_cmp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    #[default]
    All,
    On(NaiveDate),
    /// Inclusive on both ends.
    Range { start: NaiveDate, end: NaiveDate },
    Month { year: i32, month: u32 },
    Year(i32),
}

impl FilterMode {
    /// Records without a usable date only pass `All`.
    pub fn matches(&self, record: &Record) -> bool {
        if matches!(self, FilterMode::All) {
            return true;
        }
        let Some(date) = record.parsed_date() else {
            return false;
        };
        match *self {
            FilterMode::All => true,
            FilterMode::On(day) => date == day,
            FilterMode::Range { start, end } => date >= start && date <= end,
            FilterMode::Month { year, month } => date.year() == year && date.month() == month,
            FilterMode::Year(year) => date.year() == year,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplaySort {
    DateAsc,
    #[default]
    DateDesc,
    AmountAsc,
    AmountDesc,
}

impl DisplaySort {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date-asc" => Some(DisplaySort::DateAsc),
            "date-desc" => Some(DisplaySort::DateDesc),
            "amount-asc" => Some(DisplaySort::AmountAsc),
            "amount-desc" => Some(DisplaySort::AmountDesc),
            _ => None,
        }
    }

    fn compare(self, a: &Record, b: &Record) -> Ordering {
        let by_amount = a.totals.total_expenditure.cmp(&b.totals.total_expenditure);
        match self {
            DisplaySort::DateAsc => canonical_cmp(a, b),
            DisplaySort::DateDesc => canonical_cmp(b, a),
            DisplaySort::AmountAsc => by_amount.then_with(|| canonical_cmp(a, b)),
            DisplaySort::AmountDesc => by_amount.reverse().then_with(|| canonical_cmp(a, b)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub filter: FilterMode,
    pub payment_mode: Option<PaymentMode>,
    pub supplier: Option<String>,
    pub sort: DisplaySort,
}

impl RecordQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    pub fn payment_mode(mut self, mode: PaymentMode) -> Self {
        self.payment_mode = Some(mode);
        self
    }

    pub fn supplier(mut self, needle: impl Into<String>) -> Self {
        self.supplier = Some(needle.into());
        self
    }

    pub fn sort(mut self, sort: DisplaySort) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        if !self.filter.matches(record) {
            return false;
        }
        if let Some(mode) = self.payment_mode {
            if !record.receipts.iter().any(|receipt| receipt.mode() == Some(mode)) {
                return false;
            }
        }
        if let Some(needle) = self.supplier.as_deref().map(str::trim) {
            let needle = needle.to_lowercase();
            if !needle.is_empty()
                && !record
                    .receipts
                    .iter()
                    .any(|receipt| receipt.supplier.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        let mut selected: Vec<&Record> = records.iter().filter(|r| self.matches(r)).collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));
        selected
    }
}
