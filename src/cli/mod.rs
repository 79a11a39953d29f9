//! Non-interactive command driver over snapshot files and the JSON book store.

mod commands;
pub mod output;

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use purchase_core::{DisplaySort, FilterMode, RecordQuery};
use purchase_domain::PaymentMode;

use crate::errors::AppError;

pub use commands::{execute, CliContext};

/// Exit code for `validate` when at least one record is invalid.
pub const EXIT_INVALID: i32 = 2;

const BIN_NAME: &str = "purchase_tracker_cli";

#[derive(Debug, Parser)]
#[command(name = BIN_NAME)]
#[command(about = "Track purchase spending and carry cash balances from day to day")]
#[command(version)]
#[command(subcommand_required = false)]
#[command(after_help = "Set PURCHASE_TRACKER_HOME to choose where config and books are kept.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Recalculate balances in a snapshot file
    Recalc {
        file: PathBuf,

        /// Write the result here instead of over the input
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Report validation errors per record
    Validate { file: PathBuf },

    /// Financial report and top suppliers
    Summary { file: PathBuf },

    /// List records
    List {
        file: PathBuf,

        #[command(flatten)]
        query: ListArgs,
    },

    /// Import a snapshot into a stored book
    Import { book: String, file: PathBuf },

    /// Export a stored book to a snapshot file
    Export { book: String, file: PathBuf },

    /// Show build metadata
    Version {
        #[arg(long)]
        json: bool,
    },

    /// Inspect and change preferences
    #[command(subcommand)]
    Config(ConfigAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Print the active preferences as JSON
    Show,

    /// Change one preference; the previous file is backed up first
    #[command(after_help = "Keys: locale, currency_symbol, currency_precision, default_sort, \
log_filter, backup_retention, data_root, backup_root")]
    Set { key: String, value: String },

    /// Save a copy of the current preferences
    Backup {
        #[arg(long)]
        note: Option<String>,
    },

    /// List saved copies, newest first
    Backups,

    /// Make a saved copy the active preferences
    Restore { name: String },
}

/// `list` options; the sort stays unset unless given so the config default applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ListArgs {
    /// Only records dated on this day
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_day,
          conflicts_with_all = ["from", "to", "month", "year"])]
    pub on: Option<NaiveDate>,

    /// Start of an inclusive date range
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_day, requires = "to",
          conflicts_with_all = ["month", "year"])]
    pub from: Option<NaiveDate>,

    /// End of an inclusive date range
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_day, requires = "from",
          conflicts_with_all = ["month", "year"])]
    pub to: Option<NaiveDate>,

    #[arg(long, value_name = "YYYY-MM", value_parser = parse_month, conflicts_with = "year")]
    pub month: Option<YearMonth>,

    #[arg(long, value_name = "YYYY")]
    pub year: Option<i32>,

    /// Records with at least one receipt paid this way
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Case-insensitive substring of a receipt supplier
    #[arg(long)]
    pub supplier: Option<String>,

    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Cash,
    Mpesa,
    Cheque,
    #[value(name = "bank_transfer")]
    BankTransfer,
}

impl From<ModeArg> for PaymentMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Cash => PaymentMode::Cash,
            ModeArg::Mpesa => PaymentMode::Mpesa,
            ModeArg::Cheque => PaymentMode::Cheque,
            ModeArg::BankTransfer => PaymentMode::BankTransfer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    DateAsc,
    DateDesc,
    AmountAsc,
    AmountDesc,
}

impl From<SortArg> for DisplaySort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::DateAsc => DisplaySort::DateAsc,
            SortArg::DateDesc => DisplaySort::DateDesc,
            SortArg::AmountAsc => DisplaySort::AmountAsc,
            SortArg::AmountDesc => DisplaySort::AmountDesc,
        }
    }
}

impl ListArgs {
    pub fn filter(&self) -> FilterMode {
        match (self.on, self.from.zip(self.to), self.month, self.year) {
            (Some(day), ..) => FilterMode::On(day),
            (_, Some((start, end)), ..) => FilterMode::Range { start, end },
            (_, _, Some(YearMonth { year, month }), _) => FilterMode::Month { year, month },
            (_, _, _, Some(year)) => FilterMode::Year(year),
            _ => FilterMode::All,
        }
    }

    pub fn into_query(self, default_sort: DisplaySort) -> RecordQuery {
        let mut query = RecordQuery::new()
            .filter(self.filter())
            .sort(self.sort.map(DisplaySort::from).unwrap_or(default_sort));
        if let Some(mode) = self.mode {
            query = query.payment_mode(mode.into());
        }
        if let Some(supplier) = self.supplier {
            query = query.supplier(supplier);
        }
        query
    }
}

/// Entry point used by the binary: parses `std::env::args` and runs the command.
pub fn run_cli() -> Result<i32, AppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    run(&args)
}

/// Runs with `args` as they follow the program name. Help and version requests exit 0,
/// malformed arguments exit with clap's usage code.
pub fn run(args: &[String]) -> Result<i32, AppError> {
    let argv = std::iter::once(BIN_NAME.to_string()).chain(args.iter().cloned());
    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => {
            err.print()?;
            return Ok(err.exit_code());
        }
    };
    let Some(command) = cli.command else {
        println!("{}", Cli::command().render_help());
        return Ok(0);
    };
    let context = CliContext::from_env()?;
    crate::init_with_filter(context.config.log_filter.as_deref());
    execute(&context, command)
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date `{raw}` (expected YYYY-MM-DD)"))
}

fn parse_month(raw: &str) -> Result<YearMonth, String> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| format!("invalid month `{raw}` (expected YYYY-MM)"))?;
    Ok(YearMonth {
        year: first.year(),
        month: first.month(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(raw: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once(BIN_NAME).chain(raw.iter().copied()))
    }

    fn command(raw: &[&str]) -> Command {
        parse(raw).unwrap().command.unwrap()
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_leaves_command_unset() {
        assert!(parse(&[]).unwrap().command.is_none());
    }

    #[test]
    fn recalc_accepts_optional_out() {
        assert_eq!(
            command(&["recalc", "in.json", "--out", "out.json"]),
            Command::Recalc {
                file: "in.json".into(),
                out: Some("out.json".into())
            }
        );
    }

    #[test]
    fn list_parses_month_mode_and_sort() {
        let Command::List { query, .. } = command(&[
            "list", "data.json", "--month", "2024-02", "--mode", "mpesa", "--sort", "amount-desc",
        ]) else {
            panic!("expected list");
        };
        assert_eq!(query.filter(), FilterMode::Month { year: 2024, month: 2 });
        assert_eq!(query.mode, Some(ModeArg::Mpesa));
        assert_eq!(query.sort, Some(SortArg::AmountDesc));
    }

    #[test]
    fn date_range_needs_both_ends() {
        let Command::List { query, .. } =
            command(&["list", "d.json", "--from", "2024-01-01", "--to", "2024-01-31"])
        else {
            panic!("expected list");
        };
        assert!(matches!(query.filter(), FilterMode::Range { .. }));

        let err = parse(&["list", "d.json", "--from", "2024-01-01"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn conflicting_filters_are_rejected() {
        let err = parse(&["list", "d.json", "--on", "2024-01-01", "--year", "2024"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
        let err = parse(&["list", "d.json", "--month", "2024-01", "--year", "2024"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn bad_values_name_the_expected_shape() {
        let err = parse(&["list", "d.json", "--month", "2024-13"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert!(err.to_string().contains("invalid month `2024-13`"));

        assert!(parse(&["list", "d.json", "--on", "yesterday"]).is_err());
    }

    #[test]
    fn mode_names_are_the_wire_names() {
        let Command::List { query, .. } = command(&["list", "d.json", "--mode", "bank_transfer"])
        else {
            panic!("expected list");
        };
        assert_eq!(query.mode.map(PaymentMode::from), Some(PaymentMode::BankTransfer));

        let err = parse(&["list", "d.json", "--mode", "CASH"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn version_takes_optional_json_switch() {
        assert_eq!(command(&["version"]), Command::Version { json: false });
        assert_eq!(command(&["version", "--json"]), Command::Version { json: true });
        assert!(parse(&["version", "--yaml"]).is_err());
        assert_eq!(parse(&["--version"]).unwrap_err().kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn config_actions_parse() {
        assert_eq!(
            command(&["config", "backup", "--note", "before move"]),
            Command::Config(ConfigAction::Backup {
                note: Some("before move".into())
            })
        );
        assert_eq!(
            command(&["config", "set", "currency_symbol", "USD"]),
            Command::Config(ConfigAction::Set {
                key: "currency_symbol".into(),
                value: "USD".into()
            })
        );
        assert!(parse(&["config"]).is_err());
    }

    #[test]
    fn unknown_commands_and_options_fail() {
        assert_eq!(
            parse(&["frobnicate"]).unwrap_err().kind(),
            ErrorKind::InvalidSubcommand
        );
        assert_eq!(
            parse(&["validate", "a.json", "--fast"]).unwrap_err().kind(),
            ErrorKind::UnknownArgument
        );
        assert!(parse(&["import", "only-book"]).is_err());
    }
}
