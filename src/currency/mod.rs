use purchase_config::Config;
use rust_decimal::{Decimal, RoundingStrategy};

/// How amounts are rendered in CLI output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub precision: u32,
    pub grouping_separator: char,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            symbol: Config::default_currency_symbol(),
            precision: Config::default_currency_precision(),
            grouping_separator: ',',
        }
    }
}

impl CurrencyFormat {
    pub fn from_config(config: &Config) -> Self {
        Self {
            symbol: config.currency_symbol.clone(),
            precision: config.currency_precision,
            ..Self::default()
        }
    }

    /// `KSh 1,234.50`; negatives as `KSh -40.00`.
    pub fn format(&self, amount: Decimal) -> String {
        let body = format_number(amount, self.precision, self.grouping_separator);
        if self.symbol.is_empty() {
            body
        } else {
            format!("{} {}", self.symbol, body)
        }
    }
}

/// Rounds half away from zero to `precision` places, pads, and groups thousands.
pub fn format_number(amount: Decimal, precision: u32, separator: char) -> String {
    let rounded = amount.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
    let body = format!("{:.*}", precision as usize, rounded.abs());
    let (int_part, frac_part) = match body.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (body.as_str(), None),
    };

    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_digits(int_part, separator));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::new();
    for (count, ch) in digits.chars().rev().enumerate() {
        if count != 0 && count % 3 == 0 {
            grouped.insert(0, separator);
        }
        grouped.insert(0, ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn formats_with_symbol_and_grouping() {
        let fmt = CurrencyFormat::default();
        assert_eq!(fmt.format(dec!(1234.5)), "KSh 1,234.50");
        assert_eq!(fmt.format(dec!(0)), "KSh 0.00");
        assert_eq!(fmt.format(dec!(1000000)), "KSh 1,000,000.00");
    }

    #[test]
    fn negatives_keep_sign_after_symbol() {
        let fmt = CurrencyFormat::default();
        assert_eq!(fmt.format(dec!(-40)), "KSh -40.00");
        assert_eq!(fmt.format(dec!(-0.001)), "KSh 0.00");
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(format_number(dec!(2.345), 2, ','), "2.35");
        assert_eq!(format_number(dec!(-2.345), 2, ','), "-2.35");
        assert_eq!(format_number(dec!(1999.5), 0, ','), "2,000");
    }

    #[test]
    fn follows_config_symbol_and_precision() {
        let config = Config {
            currency_symbol: "$".into(),
            currency_precision: 3,
            ..Config::default()
        };
        assert_eq!(CurrencyFormat::from_config(&config).format(dec!(12.5)), "$ 12.500");
    }
}
