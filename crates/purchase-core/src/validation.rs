//! Strict record validation, the counterpart of the lenient totals step.

use rust_decimal::Decimal;
use serde::Serialize;

use purchase_domain::{parse_record_date, MoneyInput, ModeInput, Record};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

pub struct RecordValidator;

impl RecordValidator {
    /// Collects every problem with `record`; does not stop at the first one.
    pub fn validate(record: &Record) -> ValidationReport {
        let mut errors = Vec::new();

        if record.date.trim().is_empty() {
            errors.push("Date is required".to_string());
        } else if parse_record_date(&record.date).is_none() {
            errors.push(format!("Date `{}` is not a valid calendar date", record.date.trim()));
        }

        match &record.cash_received {
            MoneyInput::Blank => errors.push("Cash received is required".to_string()),
            MoneyInput::Invalid(raw) => {
                errors.push(format!("Cash received must be a number (got `{raw}`)"))
            }
            MoneyInput::Value(value) if *value < Decimal::ZERO => {
                errors.push("Cash received cannot be negative".to_string())
            }
            MoneyInput::Value(_) => {}
        }

        match &record.balance_bf {
            MoneyInput::Blank => errors.push("Balance brought forward is required".to_string()),
            MoneyInput::Invalid(raw) => errors.push(format!(
                "Balance brought forward must be a number (got `{raw}`)"
            )),
            MoneyInput::Value(_) => {}
        }

        match &record.total_budget {
            MoneyInput::Invalid(raw) => {
                errors.push(format!("Total budget must be a number (got `{raw}`)"))
            }
            MoneyInput::Value(value) if *value < Decimal::ZERO => {
                errors.push("Total budget cannot be negative".to_string())
            }
            _ => {}
        }

        for (index, receipt) in record.receipts.iter().enumerate() {
            let position = index + 1;
            if receipt.supplier_name().is_empty() {
                errors.push(format!("Receipt {position}: Supplier is required"));
            }
            match &receipt.amount {
                MoneyInput::Blank => errors.push(format!("Receipt {position}: Amount is required")),
                MoneyInput::Invalid(raw) => errors.push(format!(
                    "Receipt {position}: Amount must be a number (got `{raw}`)"
                )),
                MoneyInput::Value(value) if *value < Decimal::ZERO => errors.push(format!(
                    "Receipt {position}: Amount cannot be negative"
                )),
                MoneyInput::Value(_) => {}
            }
            match &receipt.payment_mode {
                ModeInput::Known(_) => {}
                ModeInput::Other(raw) if raw.trim().is_empty() => {
                    errors.push(format!("Receipt {position}: Payment mode is required"))
                }
                ModeInput::Other(raw) => errors.push(format!(
                    "Receipt {position}: Invalid payment mode `{raw}`"
                )),
            }
        }

        ValidationReport::from_errors(errors)
    }
}
