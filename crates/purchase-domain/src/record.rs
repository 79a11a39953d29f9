//! Daily cash-float records and their derived totals.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, receipt::Receipt};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One day's (or session's) cash-float entry.
///
/// `balance_bf` and everything in `totals` are derived by the recalculation
/// engine; only the first record of a history may carry a seeded opening
/// balance.
pub struct Record {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "MoneyInput::is_blank")]
    pub total_budget: MoneyInput,
    #[serde(default)]
    pub cash_received: MoneyInput,
    #[serde(default, rename = "balanceBF")]
    pub balance_bf: MoneyInput,
    #[serde(default)]
    pub stop_carry_over: bool,
    #[serde(default)]
    pub receipts: Vec<Receipt>,
    #[serde(flatten)]
    pub totals: Totals,
    #[serde(flatten)]
    pub meta: RecordMeta,
}

impl Record {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            date: date.into(),
            total_budget: MoneyInput::Blank,
            cash_received: MoneyInput::Value(Decimal::ZERO),
            balance_bf: MoneyInput::Value(Decimal::ZERO),
            stop_carry_over: false,
            receipts: Vec::new(),
            totals: Totals::default(),
            meta: RecordMeta::default(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_cash_received(mut self, amount: Decimal) -> Self {
        self.cash_received = MoneyInput::Value(amount);
        self
    }

    pub fn with_balance_bf(mut self, amount: Decimal) -> Self {
        self.balance_bf = MoneyInput::Value(amount);
        self
    }

    pub fn with_budget(mut self, amount: Decimal) -> Self {
        self.total_budget = MoneyInput::Value(amount);
        self
    }

    pub fn with_receipt(mut self, receipt: Receipt) -> Self {
        self.receipts.push(receipt);
        self
    }

    pub fn stopping_carry_over(mut self) -> Self {
        self.stop_carry_over = true;
        self
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_record_date(&self.date)
    }

    pub fn add_receipt(&mut self, receipt: Receipt) {
        self.receipts.push(receipt);
    }

    pub fn remove_receipt(&mut self, receipt_id: &str) -> Option<Receipt> {
        let index = self.receipts.iter().position(|r| r.id == receipt_id)?;
        Some(self.receipts.remove(index))
    }
}

impl Identifiable for Record {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Displayable for Record {
    fn display_label(&self) -> String {
        format!(
            "{} ({} receipt{})",
            if self.date.is_empty() { "-" } else { &self.date },
            self.receipts.len(),
            if self.receipts.len() == 1 { "" } else { "s" }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Figures derived from a record's receipts and cash fields.
pub struct Totals {
    pub cash_total: Decimal,
    pub mpesa_total: Decimal,
    pub cheque_total: Decimal,
    pub bank_total: Decimal,
    pub total_expenditure: Decimal,
    pub cash_available: Decimal,
    pub cash_balance: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_budget_used: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_remaining: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Bookkeeping stamped by the persistence boundary; never computed by the engine.
pub struct RecordMeta {
    pub version: u32,
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: String,
    pub synced: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::PaymentMode;
    use rust_decimal_macros::dec;

    #[test]
    fn record_reads_exported_camel_case_shape() {
        let json = r#"{
            "id": 1704153600000,
            "date": "2024-01-02",
            "totalBudget": "",
            "cashReceived": 500,
            "balanceBF": 700,
            "stopCarryOver": false,
            "receipts": [{"id": 1, "supplier": "Duka", "amount": 200, "paymentMode": "cash"}],
            "cashTotal": 200,
            "cashBalance": 1000,
            "version": 2,
            "createdAt": 1704153600000,
            "synced": true
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "1704153600000");
        assert!(record.total_budget.is_blank());
        assert_eq!(record.balance_bf.value(), Some(dec!(700)));
        assert_eq!(record.totals.cash_balance, dec!(1000));
        assert_eq!(record.receipts[0].mode(), Some(PaymentMode::Cash));
        assert_eq!(record.meta.version, 2);
        assert!(record.meta.created_at.is_some());
        assert!(record.meta.synced);
    }

    #[test]
    fn record_serializes_balance_bf_key_and_omits_absent_budget() {
        let record = Record::new("2024-01-01")
            .with_id("a")
            .with_cash_received(dec!(10));
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""balanceBF":"0""#), "{json}");
        assert!(!json.contains("totalBudget"), "{json}");
        assert!(!json.contains("budgetRemaining"), "{json}");

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn remove_receipt_returns_the_removed_line() {
        let receipt = Receipt::new("Duka", dec!(5), PaymentMode::Cash);
        let id = receipt.id.clone();
        let mut record = Record::new("2024-01-01").with_receipt(receipt);
        assert!(record.remove_receipt(&id).is_some());
        assert!(record.receipts.is_empty());
        assert!(record.remove_receipt(&id).is_none());
    }
}
