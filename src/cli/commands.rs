use std::path::{Path, PathBuf};

use purchase_config::{Config, ConfigManager};
use purchase_core::{
    ordering::canonical_refs, storage::RecordStorage, BalanceRecalculator, BookSession, CoreError,
    DisplaySort, RecordValidator, SummaryService,
};
use purchase_domain::{BookSnapshot, PaymentMode, Record};
use purchase_storage_json::{load_json_from_path, save_json_to_path, JsonBookStorage, StoragePaths};
use tracing::info;

use super::{output, Command, ConfigAction, ListArgs, EXIT_INVALID};
use crate::{currency::CurrencyFormat, errors::AppError, utils::build_info};

/// Environment variable that relocates config and the book store.
pub const HOME_ENV: &str = "PURCHASE_TRACKER_HOME";

const RECENT_MONTHS: usize = 6;
const DEFAULT_ACTOR: &str = "cli";

/// Resolved configuration shared by every command.
#[derive(Debug, Clone)]
pub struct CliContext {
    pub config: Config,
    pub config_manager: ConfigManager,
    pub storage_paths: StoragePaths,
    pub currency: CurrencyFormat,
    pub actor: String,
}

impl CliContext {
    pub fn from_env() -> Result<Self, AppError> {
        let home = std::env::var_os(HOME_ENV).map(PathBuf::from);
        let actor = std::env::var("USER").unwrap_or_else(|_| DEFAULT_ACTOR.to_string());
        Self::at(home, actor)
    }

    /// With `home` set, config lives in `<home>/config` and books under `<home>/books`
    /// unless the config names its own data root.
    pub fn at(home: Option<PathBuf>, actor: impl Into<String>) -> Result<Self, AppError> {
        let config_base = match &home {
            Some(path) => path.clone(),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("purchase_tracker"),
        };
        let config_manager = ConfigManager::with_base_dir(config_base)?;
        let config = config_manager.load()?;

        let storage_paths = match (&home, &config.data_root) {
            (Some(path), None) => {
                let mut paths = StoragePaths::under(path);
                if let Some(backups) = &config.backup_root {
                    paths.backup_root = backups.clone();
                }
                paths
            }
            _ => StoragePaths {
                book_root: config.resolve_book_root(),
                backup_root: config.resolve_backup_root(),
            },
        };

        Ok(Self {
            currency: CurrencyFormat::from_config(&config),
            config,
            config_manager,
            storage_paths,
            actor: actor.into(),
        })
    }

    fn default_sort(&self) -> DisplaySort {
        DisplaySort::parse(&self.config.default_sort).unwrap_or_default()
    }

    fn storage(&self) -> Result<JsonBookStorage, AppError> {
        Ok(JsonBookStorage::with_retention(
            self.storage_paths.clone(),
            self.config.backup_retention,
        )?)
    }

    fn money(&self, amount: rust_decimal::Decimal) -> String {
        self.currency.format(amount)
    }
}

/// Runs a parsed command and returns the process exit code.
pub fn execute(context: &CliContext, command: Command) -> Result<i32, AppError> {
    match command {
        Command::Recalc { file, out } => recalc(&file, out.as_deref()),
        Command::Validate { file } => validate(&file),
        Command::Summary { file } => summary(context, &file),
        Command::List { file, query } => list(context, &file, query),
        Command::Import { book, file } => import(context, &book, &file),
        Command::Export { book, file } => export(context, &book, &file),
        Command::Version { json } => version(json),
        Command::Config(action) => config(context, action),
    }
}

fn read_snapshot(path: &Path) -> Result<BookSnapshot, AppError> {
    Ok(load_json_from_path::<BookSnapshot>(path)?)
}

fn recalculated(path: &Path) -> Result<Vec<Record>, AppError> {
    let snapshot = read_snapshot(path)?;
    Ok(BalanceRecalculator::recalculate_all(snapshot.records)?)
}

fn recalc(file: &Path, out: Option<&Path>) -> Result<i32, AppError> {
    let mut snapshot = read_snapshot(file)?;
    snapshot.records = BalanceRecalculator::recalculate_all(snapshot.records)?;
    let target = out.unwrap_or(file);
    save_json_to_path(&snapshot, target)?;
    info!(records = snapshot.records.len(), path = %target.display(), "snapshot recalculated");
    output::success(format!(
        "Recalculated {} records into {}",
        snapshot.records.len(),
        target.display()
    ));
    Ok(0)
}

fn validate(file: &Path) -> Result<i32, AppError> {
    let snapshot = read_snapshot(file)?;
    let mut invalid = 0usize;
    for record in canonical_refs(&snapshot.records) {
        let report = RecordValidator::validate(record);
        if report.is_valid {
            continue;
        }
        invalid += 1;
        for message in &report.errors {
            output::warning(format!("record {} ({}): {}", record.id, record.date, message));
        }
    }

    for discrepancy in BalanceRecalculator::chain_discrepancies(&snapshot.records) {
        output::info(discrepancy);
    }

    let total = snapshot.records.len();
    if invalid > 0 {
        output::warning(format!("{invalid} of {total} records are invalid"));
        Ok(EXIT_INVALID)
    } else {
        output::success(format!("All {total} records are valid"));
        Ok(0)
    }
}

fn summary(context: &CliContext, file: &Path) -> Result<i32, AppError> {
    let records = recalculated(file)?;
    let report = SummaryService::financial_report(&records);
    let totals = &report.summary;

    output::section("Financial Summary");
    output::line(format!("Records:            {}", totals.record_count));
    output::line(format!("Cash received:      {}", context.money(totals.total_cash_received)));
    output::line(format!("Total expenditure:  {}", context.money(totals.total_expenditure)));
    output::line(format!("Cash balance:       {}", context.money(totals.total_cash_balance)));
    for mode in PaymentMode::ALL {
        output::line(format!(
            "  {:<16}  {}",
            mode.label(),
            context.money(totals.breakdown.get(mode))
        ));
    }

    output::section("Period");
    match (report.period_start, report.period_end) {
        (Some(start), Some(end)) => output::line(format!("From {start} to {end}")),
        _ => output::line("No dated records"),
    }
    output::line(format!("Days with records:  {}", report.unique_days));
    output::line(format!(
        "Average per day:    {}",
        context.money(report.average_daily_expenditure)
    ));
    output::line(format!(
        "Cash efficiency:    {}%",
        crate::currency::format_number(report.cash_efficiency_percent, 1, ',')
    ));

    output::section("Top Suppliers");
    if totals.top_suppliers.is_empty() {
        output::info("No supplier purchases recorded");
    }
    for (rank, supplier) in totals.top_suppliers.iter().enumerate() {
        output::line(format!(
            "{:>2}. {}  {}  ({} receipts)",
            rank + 1,
            supplier.name,
            context.money(supplier.total),
            supplier.count
        ));
    }

    output::section("Recent Months");
    for month in SummaryService::recent_months(&records, RECENT_MONTHS) {
        output::line(format!(
            "{}  {}  ({} records)",
            month.label(),
            context.money(month.total),
            month.record_count
        ));
    }
    Ok(0)
}

fn list(context: &CliContext, file: &Path, args: ListArgs) -> Result<i32, AppError> {
    let records = recalculated(file)?;
    let query = args.into_query(context.default_sort());
    let rows = query.apply(&records);

    for record in &rows {
        output::line(format!(
            "{}  {}  receipts: {}  spent: {}  balance: {}",
            record.date,
            record.id,
            record.receipts.len(),
            context.money(record.totals.total_expenditure),
            context.money(record.totals.cash_balance)
        ));
    }
    output::info(format!("{} of {} records shown", rows.len(), records.len()));
    Ok(0)
}

fn open_session(context: &CliContext, book: &str) -> Result<BookSession, AppError> {
    let storage = context.storage()?;
    let mut session = BookSession::new(Box::new(storage), context.actor.clone());
    let start = session.start(book)?;
    for warning in &start.warnings {
        output::warning(warning);
    }
    Ok(session)
}

fn remember_book(context: &CliContext, book: &str) -> Result<(), AppError> {
    let mut config = context.config.clone();
    config.last_opened_book = Some(book.to_string());
    context.config_manager.save(&config)?;
    Ok(())
}

fn import(context: &CliContext, book: &str, file: &Path) -> Result<i32, AppError> {
    let snapshot = context.storage()?.import_snapshot(file)?;
    let mut session = open_session(context, book)?;
    let count = session.import_snapshot(snapshot)?;
    session.stop()?;
    remember_book(context, book)?;
    output::success(format!("Imported {count} records into `{book}`"));
    Ok(0)
}

fn export(context: &CliContext, book: &str, file: &Path) -> Result<i32, AppError> {
    let storage = context.storage()?;
    if !storage.book_exists(book) {
        return Err(CoreError::BookNotFound(book.to_string()).into());
    }
    let mut session = open_session(context, book)?;
    let snapshot = session.export_snapshot()?;
    session.storage().export_snapshot(&snapshot, file)?;
    session.stop()?;
    remember_book(context, book)?;
    output::success(format!(
        "Exported {} records from `{book}` to {}",
        snapshot.records.len(),
        file.display()
    ));
    Ok(0)
}

fn config(context: &CliContext, action: ConfigAction) -> Result<i32, AppError> {
    let manager = &context.config_manager;
    match action {
        ConfigAction::Show => {
            output::line(serde_json::to_string_pretty(&context.config)?);
            output::info(format!("Loaded from {}", manager.config_path().display()));
        }
        ConfigAction::Set { key, value } => {
            let mut updated = context.config.clone();
            updated.set(&key, &value)?;
            let backup = manager.backup(&context.config, Some(&format!("before {key}")))?;
            manager.save(&updated)?;
            info!(key = %key, backup = %backup.name, "preference changed");
            output::success(format!("Set {key}; previous preferences saved as {}", backup.name));
        }
        ConfigAction::Backup { note } => {
            let backup = manager.backup(&context.config, note.as_deref())?;
            output::success(format!("Saved preferences as {}", backup.name));
        }
        ConfigAction::Backups => {
            let backups = manager.backups()?;
            if backups.is_empty() {
                output::info("No saved preferences yet");
            }
            for backup in backups {
                let taken = backup
                    .taken_at
                    .map(|stamp| stamp.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown time".into());
                output::line(format!("{}  {}", taken, backup.name));
            }
        }
        ConfigAction::Restore { name } => {
            manager.restore(&name)?;
            info!(backup = %name, "preferences restored");
            output::success(format!("Restored preferences from {name}"));
        }
    }
    Ok(0)
}

fn version(json: bool) -> Result<i32, AppError> {
    let meta = build_info::current();
    if json {
        output::line(serde_json::to_string_pretty(&meta)?);
        return Ok(0);
    }
    output::line(meta.summary_line());
    output::line(format!("rustc: {}", meta.rustc));
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn home_directory_hosts_config_and_books() {
        let dir = tempdir().unwrap();
        let context = CliContext::at(Some(dir.path().to_path_buf()), "tester").unwrap();
        assert_eq!(context.storage_paths.book_root, dir.path().join("books"));
        assert_eq!(context.storage_paths.backup_root, dir.path().join("backups"));
        assert_eq!(
            context.config_manager.config_path(),
            dir.path().join("config").join("config.json").as_path()
        );
        assert_eq!(context.default_sort(), DisplaySort::DateDesc);
    }

    #[test]
    fn configured_data_root_wins_over_home() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = Config {
            data_root: Some(dir.path().join("elsewhere")),
            default_sort: "amount-asc".into(),
            ..Config::default()
        };
        manager.save(&config).unwrap();

        let context = CliContext::at(Some(dir.path().to_path_buf()), "tester").unwrap();
        assert_eq!(
            context.storage_paths.book_root,
            dir.path().join("elsewhere").join("books")
        );
        assert_eq!(context.default_sort(), DisplaySort::AmountAsc);
    }
}
