//! Shared traits, raw-input wrappers, and date helpers for purchase records.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde::{
    de::{self, Deserializer, Visitor},
    Deserialize, Serialize, Serializer,
};

use crate::receipt::PaymentMode;

/// Exposes the stable string identifier of a stored entity.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// A money field exactly as the user entered it.
///
/// Forms hand over partially typed values, so a field can be blank, hold a
/// number, or hold text that failed to parse. Strict checking happens in
/// validation; totals treat anything but [`MoneyInput::Value`] as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MoneyInput {
    #[default]
    Blank,
    Value(Decimal),
    Invalid(String),
}

impl MoneyInput {
    /// Parses free text. Surrounding whitespace is ignored and scientific
    /// notation is accepted.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return MoneyInput::Blank;
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map(MoneyInput::Value)
            .unwrap_or_else(|_| MoneyInput::Invalid(trimmed.to_string()))
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            MoneyInput::Value(value) => Some(*value),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, MoneyInput::Blank)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, MoneyInput::Value(_))
    }
}

impl From<Decimal> for MoneyInput {
    fn from(value: Decimal) -> Self {
        MoneyInput::Value(value)
    }
}

impl From<i64> for MoneyInput {
    fn from(value: i64) -> Self {
        MoneyInput::Value(Decimal::from(value))
    }
}

impl fmt::Display for MoneyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyInput::Blank => Ok(()),
            MoneyInput::Value(value) => write!(f, "{value}"),
            MoneyInput::Invalid(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for MoneyInput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MoneyInput::Blank => serializer.serialize_none(),
            MoneyInput::Value(value) => Serialize::serialize(value, serializer),
            MoneyInput::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

struct MoneyInputVisitor;

impl<'de> Visitor<'de> for MoneyInputVisitor {
    type Value = MoneyInput;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a numeric string, or null")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<MoneyInput, E> {
        Ok(MoneyInput::Value(Decimal::from(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<MoneyInput, E> {
        Ok(MoneyInput::Value(Decimal::from(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<MoneyInput, E> {
        Ok(Decimal::from_f64(value)
            .map(MoneyInput::Value)
            .unwrap_or_else(|| MoneyInput::Invalid(value.to_string())))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<MoneyInput, E> {
        Ok(MoneyInput::parse(value))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<MoneyInput, E> {
        Ok(MoneyInput::Invalid(value.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<MoneyInput, E> {
        Ok(MoneyInput::Blank)
    }

    fn visit_none<E: de::Error>(self) -> Result<MoneyInput, E> {
        Ok(MoneyInput::Blank)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<MoneyInput, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyInputVisitor)
    }
}

impl<'de> Deserialize<'de> for MoneyInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MoneyInputVisitor)
    }
}

/// A payment mode as entered: either one of the closed set or the raw text.
///
/// A missing mode is `Other("")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ModeInput {
    Known(PaymentMode),
    Other(String),
}

impl ModeInput {
    pub fn known(&self) -> Option<PaymentMode> {
        match self {
            ModeInput::Known(mode) => Some(*mode),
            ModeInput::Other(_) => None,
        }
    }
}

impl Default for ModeInput {
    fn default() -> Self {
        ModeInput::Other(String::new())
    }
}

impl From<PaymentMode> for ModeInput {
    fn from(mode: PaymentMode) -> Self {
        ModeInput::Known(mode)
    }
}

impl From<Option<String>> for ModeInput {
    fn from(raw: Option<String>) -> Self {
        let raw = raw.unwrap_or_default();
        match PaymentMode::from_str(&raw) {
            Ok(mode) => ModeInput::Known(mode),
            Err(_) => ModeInput::Other(raw),
        }
    }
}

impl From<ModeInput> for String {
    fn from(input: ModeInput) -> Self {
        match input {
            ModeInput::Known(mode) => mode.as_str().to_string(),
            ModeInput::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ModeInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeInput::Known(mode) => f.write_str(mode.as_str()),
            ModeInput::Other(raw) => f.write_str(raw),
        }
    }
}

/// Parses a record date: `YYYY-MM-DD`, or an RFC 3339 timestamp whose own
/// calendar date is kept.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer identifier")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
        Ok(value)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
        Ok(value.to_string())
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
            Ok(format!("{}", value as i64))
        } else {
            Ok(value.to_string())
        }
    }
}

/// Accepts string ids as well as the numeric (epoch millisecond) ids found in
/// older exports.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(IdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Deserialize, Serialize)]
    struct Holder {
        #[serde(default)]
        amount: MoneyInput,
        #[serde(default)]
        mode: ModeInput,
    }

    #[test]
    fn money_input_parses_numbers_and_text() {
        assert_eq!(MoneyInput::parse(" 12.50 "), MoneyInput::Value(dec!(12.50)));
        assert_eq!(MoneyInput::parse(""), MoneyInput::Blank);
        assert_eq!(MoneyInput::parse("1e3"), MoneyInput::Value(dec!(1000)));
        assert_eq!(
            MoneyInput::parse("twelve"),
            MoneyInput::Invalid("twelve".into())
        );
    }

    #[test]
    fn money_input_deserializes_from_json_shapes() {
        let parsed: Holder = serde_json::from_str(r#"{"amount": 100.5}"#).unwrap();
        assert_eq!(parsed.amount, MoneyInput::Value(dec!(100.5)));

        let parsed: Holder = serde_json::from_str(r#"{"amount": "250"}"#).unwrap();
        assert_eq!(parsed.amount, MoneyInput::Value(dec!(250)));

        let parsed: Holder = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert!(parsed.amount.is_blank());

        let parsed: Holder = serde_json::from_str(r#"{"amount": "abc"}"#).unwrap();
        assert_eq!(parsed.amount, MoneyInput::Invalid("abc".into()));
    }

    #[test]
    fn mode_input_keeps_unrecognised_text() {
        let parsed: Holder = serde_json::from_str(r#"{"mode": "paypal"}"#).unwrap();
        assert_eq!(parsed.mode, ModeInput::Other("paypal".into()));

        let parsed: Holder = serde_json::from_str(r#"{"mode": "bank_transfer"}"#).unwrap();
        assert_eq!(parsed.mode.known(), Some(PaymentMode::BankTransfer));

        let parsed: Holder = serde_json::from_str(r#"{"mode": null}"#).unwrap();
        assert_eq!(parsed.mode, ModeInput::Other(String::new()));

        let json = serde_json::to_string(&Holder {
            amount: MoneyInput::Blank,
            mode: ModeInput::Known(PaymentMode::Mpesa),
        })
        .unwrap();
        assert!(json.contains(r#""mode":"mpesa""#), "{json}");
    }

    #[test]
    fn money_values_write_as_decimal_strings() {
        let json = serde_json::to_string(&Holder {
            amount: MoneyInput::Value(dec!(1250.50)),
            mode: ModeInput::Known(PaymentMode::Cash),
        })
        .unwrap();
        assert!(json.contains(r#""amount":"1250.50""#), "{json}");

        let back: Holder = serde_json::from_str(&json).unwrap();
        assert_eq!(back.amount, MoneyInput::Value(dec!(1250.50)));

        let blank = serde_json::to_string(&Holder {
            amount: MoneyInput::Blank,
            mode: ModeInput::Known(PaymentMode::Cash),
        })
        .unwrap();
        assert!(blank.contains(r#""amount":null"#), "{blank}");
    }

    #[test]
    fn record_dates_accept_plain_and_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_record_date("2024-03-09"), Some(expected));
        assert_eq!(parse_record_date("2024-03-09T08:30:00+03:00"), Some(expected));
        assert_eq!(parse_record_date("09/03/2024"), None);
        assert_eq!(parse_record_date("   "), None);
    }
}
