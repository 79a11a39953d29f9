//! Receipt line items and the closed set of payment modes.

use std::{fmt, str::FromStr};

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Channel through which a receipt was paid. Only `Cash` draws on the cash float.
pub enum PaymentMode {
    Cash,
    Mpesa,
    Cheque,
    BankTransfer,
}

impl PaymentMode {
    pub const ALL: [PaymentMode; 4] = [
        PaymentMode::Cash,
        PaymentMode::Mpesa,
        PaymentMode::Cheque,
        PaymentMode::BankTransfer,
    ];

    /// Stable wire identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Mpesa => "mpesa",
            PaymentMode::Cheque => "cheque",
            PaymentMode::BankTransfer => "bank_transfer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Mpesa => "M-Pesa",
            PaymentMode::Cheque => "Cheque",
            PaymentMode::BankTransfer => "Bank Transfer",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Returned when text does not name one of the supported payment modes.
pub struct UnknownPaymentMode(pub String);

impl fmt::Display for UnknownPaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown payment mode `{}`", self.0)
    }
}

impl std::error::Error for UnknownPaymentMode {}

impl FromStr for PaymentMode {
    type Err = UnknownPaymentMode;

    /// Exact wire names only; `"CASH"` or `" cash"` are not payment modes.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PaymentMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| UnknownPaymentMode(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One expenditure line within a record.
pub struct Receipt {
    /// Receipts typed in before ids existed get a fresh one on load.
    #[serde(default = "generated_id", deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub supplier: String,
    #[serde(default)]
    pub amount: MoneyInput,
    #[serde(default)]
    pub payment_mode: ModeInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

fn generated_id() -> String {
    Uuid::now_v7().to_string()
}

impl Receipt {
    pub fn new(supplier: impl Into<String>, amount: Decimal, mode: PaymentMode) -> Self {
        Self {
            id: generated_id(),
            supplier: supplier.into(),
            amount: MoneyInput::Value(amount),
            payment_mode: ModeInput::Known(mode),
            description: None,
            timestamp: Some(Utc::now().trunc_subsecs(3)),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn mode(&self) -> Option<PaymentMode> {
        self.payment_mode.known()
    }

    /// Supplier name with surrounding whitespace removed.
    pub fn supplier_name(&self) -> &str {
        self.supplier.trim()
    }
}

impl Identifiable for Receipt {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Displayable for Receipt {
    fn display_label(&self) -> String {
        format!(
            "{} [{}] {}",
            self.supplier_name(),
            self.payment_mode,
            self.amount
        )
    }
}
