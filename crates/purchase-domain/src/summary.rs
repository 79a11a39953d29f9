//! Aggregated reporting values built from recalculated records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::receipt::PaymentMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Expenditure split across the payment modes.
pub struct PaymentBreakdown {
    pub cash: Decimal,
    pub mpesa: Decimal,
    pub cheque: Decimal,
    pub bank_transfer: Decimal,
}

impl PaymentBreakdown {
    pub fn get(&self, mode: PaymentMode) -> Decimal {
        match mode {
            PaymentMode::Cash => self.cash,
            PaymentMode::Mpesa => self.mpesa,
            PaymentMode::Cheque => self.cheque,
            PaymentMode::BankTransfer => self.bank_transfer,
        }
    }

    /// Saturates at the `Decimal` bounds instead of overflowing.
    pub fn add(&mut self, mode: PaymentMode, amount: Decimal) {
        let slot = match mode {
            PaymentMode::Cash => &mut self.cash,
            PaymentMode::Mpesa => &mut self.mpesa,
            PaymentMode::Cheque => &mut self.cheque,
            PaymentMode::BankTransfer => &mut self.bank_transfer,
        };
        *slot = slot.saturating_add(amount);
    }

    pub fn total(&self) -> Decimal {
        PaymentMode::ALL
            .into_iter()
            .fold(Decimal::ZERO, |sum, mode| sum.saturating_add(self.get(mode)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One row of the supplier leaderboard.
pub struct SupplierSummary {
    pub name: String,
    pub total: Decimal,
    pub count: usize,
    pub average: Decimal,
    pub last_transaction: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub record_count: usize,
    pub total_cash_received: Decimal,
    pub total_expenditure: Decimal,
    pub total_cash_balance: Decimal,
    pub breakdown: PaymentBreakdown,
    pub top_suppliers: Vec<SupplierSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyExpenditure {
    pub year: i32,
    pub month: u32,
    pub total: Decimal,
    pub record_count: usize,
}

impl MonthlyExpenditure {
    /// `YYYY-MM` key used by dashboards.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Summary plus the period analysis shown on printed reports.
pub struct FinancialReport {
    pub summary: FinancialSummary,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub unique_days: usize,
    pub average_daily_expenditure: Decimal,
    pub cash_efficiency_percent: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn breakdown_accumulates_per_mode() {
        let mut breakdown = PaymentBreakdown::default();
        breakdown.add(PaymentMode::Cash, dec!(10));
        breakdown.add(PaymentMode::BankTransfer, dec!(2.5));
        breakdown.add(PaymentMode::Cash, dec!(1));
        assert_eq!(breakdown.get(PaymentMode::Cash), dec!(11));
        assert_eq!(breakdown.get(PaymentMode::Mpesa), Decimal::ZERO);
        assert_eq!(breakdown.total(), dec!(13.5));
    }

    #[test]
    fn breakdown_saturates_instead_of_overflowing() {
        let mut breakdown = PaymentBreakdown::default();
        breakdown.add(PaymentMode::Cash, Decimal::MAX);
        breakdown.add(PaymentMode::Cash, dec!(1));
        breakdown.add(PaymentMode::Cheque, dec!(5));
        assert_eq!(breakdown.cash, Decimal::MAX);
        assert_eq!(breakdown.total(), Decimal::MAX);
    }

    #[test]
    fn month_label_is_zero_padded() {
        let month = MonthlyExpenditure {
            year: 2024,
            month: 3,
            total: Decimal::ZERO,
            record_count: 0,
        };
        assert_eq!(month.label(), "2024-03");
    }
}
