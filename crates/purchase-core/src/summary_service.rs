//! Dashboard and report aggregation over already recalculated records.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use purchase_domain::{
    FinancialReport, FinancialSummary, MonthlyExpenditure, PaymentMode, Record, SupplierSummary,
};

use crate::totals::TotalsCalculator;

const TOP_SUPPLIER_LIMIT: usize = 5;

pub struct SummaryService;

impl SummaryService {
    /// Plain sums across records plus the top supplier leaderboard. No carry-forward
    /// logic runs here.
    pub fn financial_summary(records: &[Record]) -> FinancialSummary {
        let mut summary = FinancialSummary {
            record_count: records.len(),
            ..FinancialSummary::default()
        };
        for record in records {
            summary.total_cash_received = summary
                .total_cash_received
                .saturating_add(TotalsCalculator::coerce(&record.cash_received));
            summary.total_expenditure = summary
                .total_expenditure
                .saturating_add(record.totals.total_expenditure);
            summary.total_cash_balance = summary
                .total_cash_balance
                .saturating_add(record.totals.cash_balance);
            summary.breakdown.add(PaymentMode::Cash, record.totals.cash_total);
            summary.breakdown.add(PaymentMode::Mpesa, record.totals.mpesa_total);
            summary.breakdown.add(PaymentMode::Cheque, record.totals.cheque_total);
            summary
                .breakdown
                .add(PaymentMode::BankTransfer, record.totals.bank_total);
        }
        summary.top_suppliers = Self::supplier_leaderboard(records, TOP_SUPPLIER_LIMIT);
        summary
    }

    /// Suppliers ranked by total spend, descending; ties go to the name that sorts first.
    pub fn supplier_leaderboard(records: &[Record], limit: usize) -> Vec<SupplierSummary> {
        let mut by_name: HashMap<&str, SupplierSummary> = HashMap::new();
        for record in records {
            let date = record.parsed_date();
            for receipt in &record.receipts {
                let name = receipt.supplier_name();
                if name.is_empty() {
                    continue;
                }
                let entry = by_name.entry(name).or_insert_with(|| SupplierSummary {
                    name: name.to_string(),
                    total: Decimal::ZERO,
                    count: 0,
                    average: Decimal::ZERO,
                    last_transaction: None,
                });
                entry.total = entry
                    .total
                    .saturating_add(TotalsCalculator::coerce(&receipt.amount));
                entry.count += 1;
                entry.last_transaction = entry.last_transaction.max(date);
            }
        }

        let mut ranked: Vec<SupplierSummary> = by_name
            .into_values()
            .map(|mut supplier| {
                supplier.average = supplier.total / Decimal::from(supplier.count);
                supplier
            })
            .collect();
        ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.name.cmp(&b.name)));
        ranked.truncate(limit);
        ranked
    }

    /// Expenditure per calendar month, oldest first. Records without a usable date
    /// are skipped.
    pub fn monthly_expenditure(records: &[Record]) -> Vec<MonthlyExpenditure> {
        let mut months: BTreeMap<(i32, u32), (Decimal, usize)> = BTreeMap::new();
        for record in records {
            let Some(date) = record.parsed_date() else {
                continue;
            };
            let slot = months
                .entry((date.year(), date.month()))
                .or_insert((Decimal::ZERO, 0));
            slot.0 = slot.0.saturating_add(record.totals.total_expenditure);
            slot.1 += 1;
        }
        months
            .into_iter()
            .map(|((year, month), (total, record_count))| MonthlyExpenditure {
                year,
                month,
                total,
                record_count,
            })
            .collect()
    }

    pub fn recent_months(records: &[Record], count: usize) -> Vec<MonthlyExpenditure> {
        let mut months = Self::monthly_expenditure(records);
        let skip = months.len().saturating_sub(count);
        months.drain(..skip);
        months
    }

    pub fn financial_report(records: &[Record]) -> FinancialReport {
        let summary = Self::financial_summary(records);
        let days: BTreeSet<NaiveDate> = records.iter().filter_map(Record::parsed_date).collect();
        let unique_days = days.len();

        let average_daily_expenditure =
            summary.total_expenditure / Decimal::from(unique_days.max(1));
        let cash_efficiency_percent = if summary.total_cash_received > Decimal::ZERO {
            // Capped when spend dwarfs a tiny cash intake.
            summary
                .total_expenditure
                .checked_div(summary.total_cash_received)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::MAX)
        } else {
            Decimal::ZERO
        };

        FinancialReport {
            period_start: days.first().copied(),
            period_end: days.last().copied(),
            unique_days,
            average_daily_expenditure,
            cash_efficiency_percent,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recalc::BalanceRecalculator;
    use purchase_domain::Receipt;
    use rust_decimal_macros::dec;

    fn chain() -> Vec<Record> {
        BalanceRecalculator::recalculate_all(vec![
            Record::new("2024-01-05")
                .with_id("a")
                .with_cash_received(dec!(1000))
                .with_receipt(Receipt::new("Duka", dec!(300), PaymentMode::Cash))
                .with_receipt(Receipt::new("Mama Mboga", dec!(100), PaymentMode::Mpesa)),
            Record::new("2024-01-05")
                .with_id("b")
                .with_receipt(Receipt::new(" Duka ", dec!(100), PaymentMode::Cheque)),
            Record::new("2024-02-10")
                .with_id("c")
                .with_cash_received(dec!(200))
                .with_receipt(Receipt::new("Bakery", dec!(400), PaymentMode::BankTransfer))
                .with_receipt(Receipt::new("", dec!(50), PaymentMode::Cash)),
        ])
        .unwrap()
    }

    #[test]
    fn financial_summary_aggregates_totals_and_modes() {
        let summary = SummaryService::financial_summary(&chain());
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.total_cash_received, dec!(1200));
        assert_eq!(summary.total_expenditure, dec!(950));
        assert_eq!(summary.breakdown.cash, dec!(350));
        assert_eq!(summary.breakdown.mpesa, dec!(100));
        assert_eq!(summary.breakdown.cheque, dec!(100));
        assert_eq!(summary.breakdown.bank_transfer, dec!(400));
        // a: 700, b: 700, c: 700 + 200 - 50
        assert_eq!(summary.total_cash_balance, dec!(2250));
    }

    #[test]
    fn leaderboard_trims_names_and_breaks_ties_by_name() {
        let summary = SummaryService::financial_summary(&chain());
        let names: Vec<&str> = summary.top_suppliers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Bakery", "Duka", "Mama Mboga"]);

        let duka = &summary.top_suppliers[1];
        assert_eq!(duka.total, dec!(400));
        assert_eq!(duka.count, 2);
        assert_eq!(duka.average, dec!(200));
        assert_eq!(duka.last_transaction, NaiveDate::from_ymd_opt(2024, 1, 5));
    }

    #[test]
    fn leaderboard_keeps_top_five() {
        let mut record = Record::new("2024-01-01").with_id("r");
        for (index, name) in ["a", "b", "c", "d", "e", "f", "g"].iter().enumerate() {
            record.add_receipt(Receipt::new(*name, Decimal::from(index as i64 + 1), PaymentMode::Cash));
        }
        let top = SummaryService::supplier_leaderboard(&[record], 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].name, "g");
        assert_eq!(top[4].name, "c");
    }

    #[test]
    fn monthly_expenditure_groups_by_calendar_month() {
        let mut records = chain();
        records.push(Record::new("garbage").with_id("z"));
        let months = SummaryService::monthly_expenditure(&records);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].label(), "2024-01");
        assert_eq!(months[0].total, dec!(500));
        assert_eq!(months[0].record_count, 2);
        assert_eq!(months[1].total, dec!(450));

        let recent = SummaryService::recent_months(&records, 1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].label(), "2024-02");
    }

    #[test]
    fn financial_report_computes_period_metrics() {
        let report = SummaryService::financial_report(&chain());
        assert_eq!(report.unique_days, 2);
        assert_eq!(report.period_start, NaiveDate::from_ymd_opt(2024, 1, 5));
        assert_eq!(report.period_end, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert_eq!(report.average_daily_expenditure, dec!(475));
        assert_eq!(report.cash_efficiency_percent.round_dp(2), dec!(79.17));
    }

    #[test]
    fn empty_report_has_zero_rates() {
        let report = SummaryService::financial_report(&[]);
        assert_eq!(report.unique_days, 0);
        assert_eq!(report.average_daily_expenditure, Decimal::ZERO);
        assert_eq!(report.cash_efficiency_percent, Decimal::ZERO);
        assert!(report.period_start.is_none());
    }

    #[test]
    fn lopsided_cash_intake_caps_efficiency() {
        let record = Record::new("2024-03-01")
            .with_id("tiny")
            .with_cash_received(dec!(0.0000000001))
            .with_receipt(Receipt::new("Importer", dec!(100000000000000000000), PaymentMode::Mpesa));
        let records = BalanceRecalculator::recalculate_all(vec![record]).unwrap();

        let report = SummaryService::financial_report(&records);
        assert_eq!(report.cash_efficiency_percent, Decimal::MAX);
        assert_eq!(report.summary.total_expenditure, dec!(100000000000000000000));
    }

    #[test]
    fn running_sums_saturate_across_records() {
        let records = BalanceRecalculator::recalculate_all(vec![
            Record::new("2024-03-01")
                .with_id("x")
                .with_cash_received(Decimal::MAX)
                .stopping_carry_over()
                .with_receipt(Receipt::new("Duka", Decimal::MAX, PaymentMode::Mpesa)),
            Record::new("2024-03-02")
                .with_id("y")
                .with_cash_received(Decimal::MAX)
                .with_receipt(Receipt::new("Duka", Decimal::MAX, PaymentMode::Mpesa)),
        ])
        .unwrap();

        let summary = SummaryService::financial_summary(&records);
        assert_eq!(summary.total_cash_received, Decimal::MAX);
        assert_eq!(summary.total_expenditure, Decimal::MAX);
        assert_eq!(summary.breakdown.mpesa, Decimal::MAX);
        assert_eq!(summary.top_suppliers[0].total, Decimal::MAX);
        assert_eq!(SummaryService::monthly_expenditure(&records)[0].total, Decimal::MAX);
    }
}
