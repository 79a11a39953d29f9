//! Per-record totals derived from receipts and the cash fields.

use rust_decimal::Decimal;

use purchase_domain::{MoneyInput, PaymentBreakdown, Record, Totals};

/// Computes a record's derived figures. Never fails: sums saturate at the
/// `Decimal` bounds.
pub struct TotalsCalculator;

impl TotalsCalculator {
    /// Safe numeric coercion: anything that is not a parsed number counts as zero.
    ///
    /// Lets a half-filled form still show a running total. Strict checks live in
    /// [`crate::validation::RecordValidator`].
    pub fn coerce(input: &MoneyInput) -> Decimal {
        input.value().unwrap_or(Decimal::ZERO)
    }

    pub fn compute(record: &Record) -> Totals {
        let mut breakdown = PaymentBreakdown::default();
        for receipt in &record.receipts {
            // Receipts without a recognised mode are left out of every mode sum.
            if let Some(mode) = receipt.mode() {
                breakdown.add(mode, Self::coerce(&receipt.amount));
            }
        }

        let total_expenditure = breakdown.total();
        let cash_available =
            Self::coerce(&record.cash_received).saturating_add(Self::coerce(&record.balance_bf));
        let cash_balance = cash_available.saturating_sub(breakdown.cash);
        let budget = record.total_budget.value();

        Totals {
            cash_total: breakdown.cash,
            mpesa_total: breakdown.mpesa,
            cheque_total: breakdown.cheque,
            bank_total: breakdown.bank_transfer,
            total_expenditure,
            cash_available,
            cash_balance,
            total_budget_used: budget.map(|_| total_expenditure),
            budget_remaining: budget.map(|budget| budget.saturating_sub(total_expenditure)),
        }
    }

    /// Recomputes `record.totals` in place.
    pub fn apply(record: &mut Record) {
        record.totals = Self::compute(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purchase_domain::{ModeInput, PaymentMode, Receipt};
    use rust_decimal_macros::dec;

    fn receipt(mode: PaymentMode, amount: Decimal) -> Receipt {
        Receipt::new("Supplier", amount, mode)
    }

    #[test]
    fn sums_each_mode_and_only_cash_reduces_balance() {
        let record = Record::new("2024-01-01")
            .with_cash_received(dec!(200))
            .with_receipt(receipt(PaymentMode::Cash, dec!(100)))
            .with_receipt(receipt(PaymentMode::Mpesa, dec!(50)))
            .with_receipt(receipt(PaymentMode::Cash, dec!(25)));

        let totals = TotalsCalculator::compute(&record);
        assert_eq!(totals.cash_total, dec!(125));
        assert_eq!(totals.mpesa_total, dec!(50));
        assert_eq!(totals.cheque_total, Decimal::ZERO);
        assert_eq!(totals.bank_total, Decimal::ZERO);
        assert_eq!(totals.total_expenditure, dec!(175));
        assert_eq!(totals.cash_available, dec!(200));
        assert_eq!(totals.cash_balance, dec!(75));
    }

    #[test]
    fn mobile_money_spend_leaves_cash_balance_alone() {
        let record = Record::new("2024-01-01").with_receipt(receipt(PaymentMode::Mpesa, dec!(1000)));
        let totals = TotalsCalculator::compute(&record);
        assert_eq!(totals.cash_balance, Decimal::ZERO);
        assert_eq!(totals.total_expenditure, dec!(1000));
    }

    #[test]
    fn invalid_numbers_and_unknown_modes_are_coerced_not_rejected() {
        let mut bad_amount = receipt(PaymentMode::Cash, dec!(0));
        bad_amount.amount = MoneyInput::Invalid("abc".into());
        let mut unknown_mode = receipt(PaymentMode::Cash, dec!(40));
        unknown_mode.payment_mode = ModeInput::Other("paypal".into());

        let mut record = Record::new("2024-01-01")
            .with_receipt(bad_amount)
            .with_receipt(unknown_mode)
            .with_receipt(receipt(PaymentMode::Cheque, dec!(10)));
        record.cash_received = MoneyInput::Invalid("lots".into());
        record.balance_bf = MoneyInput::Blank;

        let totals = TotalsCalculator::compute(&record);
        assert_eq!(totals.cash_total, Decimal::ZERO);
        assert_eq!(totals.cheque_total, dec!(10));
        assert_eq!(totals.total_expenditure, dec!(10));
        assert_eq!(totals.cash_available, Decimal::ZERO);
    }

    #[test]
    fn differently_cased_mode_counts_toward_no_total() {
        let mut shouted = receipt(PaymentMode::Cash, dec!(40));
        shouted.payment_mode = ModeInput::from(Some("CASH".to_string()));
        let record = Record::new("2024-01-01")
            .with_cash_received(dec!(100))
            .with_receipt(shouted);

        let totals = TotalsCalculator::compute(&record);
        assert_eq!(totals.cash_total, Decimal::ZERO);
        assert_eq!(totals.total_expenditure, Decimal::ZERO);
        assert_eq!(totals.cash_balance, dec!(100));
    }

    #[test]
    fn budget_fields_only_appear_with_a_numeric_budget() {
        let record = Record::new("2024-01-01").with_receipt(receipt(PaymentMode::Cash, dec!(30)));
        let totals = TotalsCalculator::compute(&record);
        assert_eq!(totals.total_budget_used, None);
        assert_eq!(totals.budget_remaining, None);

        let budgeted = record.with_budget(dec!(100));
        let totals = TotalsCalculator::compute(&budgeted);
        assert_eq!(totals.total_budget_used, Some(dec!(30)));
        assert_eq!(totals.budget_remaining, Some(dec!(70)));
    }

    #[test]
    fn huge_amounts_saturate_instead_of_panicking() {
        let mut record = Record::new("2024-01-01")
            .with_receipt(Receipt::new("Duka", Decimal::ZERO, PaymentMode::Cash))
            .with_receipt(receipt(PaymentMode::Cash, dec!(1)));
        record.receipts[0].amount = MoneyInput::parse("79228162514264337593543950335");

        let totals = TotalsCalculator::compute(&record);
        assert_eq!(totals.cash_total, Decimal::MAX);
        assert_eq!(totals.total_expenditure, Decimal::MAX);
        assert_eq!(totals.cash_balance, Decimal::MIN);

        let flush = Record::new("2024-01-02")
            .with_cash_received(Decimal::MAX)
            .with_balance_bf(dec!(10))
            .with_budget(Decimal::MIN)
            .with_receipt(receipt(PaymentMode::Mpesa, dec!(1)));
        let totals = TotalsCalculator::compute(&flush);
        assert_eq!(totals.cash_available, Decimal::MAX);
        assert_eq!(totals.budget_remaining, Some(Decimal::MIN));
    }

    #[test]
    fn keeps_full_precision() {
        let record = Record::new("2024-01-01")
            .with_cash_received(dec!(0.1))
            .with_balance_bf(dec!(0.2))
            .with_receipt(receipt(PaymentMode::Cash, dec!(0.005)));
        let totals = TotalsCalculator::compute(&record);
        assert_eq!(totals.cash_available, dec!(0.3));
        assert_eq!(totals.cash_balance, dec!(0.295));
    }
}
