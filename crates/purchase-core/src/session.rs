//! Explicitly constructed persistence client for one open book.

use tracing::{info, warn};

use purchase_domain::{BookSnapshot, Record, RecordBook, CURRENT_SCHEMA_VERSION};

use crate::{
    record_service::RecordService,
    recalc::BalanceRecalculator,
    storage::{book_warnings, BookBackupInfo, RecordStorage},
    CoreError,
};

/// Outcome of [`BookSession::start`].
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub name: String,
    pub created: bool,
    pub warnings: Vec<String>,
}

struct OpenBook {
    name: String,
    book: RecordBook,
}

/// Coordinates a book, its storage backend, and the recompute-then-save cycle.
///
/// Every mutation re-fetches the stored book, applies the change (which
/// recalculates the full collection) and persists the result. Nothing works
/// until [`BookSession::start`] has been called.
pub struct BookSession {
    storage: Box<dyn RecordStorage>,
    actor: String,
    open: Option<OpenBook>,
}

impl BookSession {
    pub fn new(storage: Box<dyn RecordStorage>, actor: impl Into<String>) -> Self {
        Self {
            storage,
            actor: actor.into(),
            open: None,
        }
    }

    pub fn storage(&self) -> &dyn RecordStorage {
        self.storage.as_ref()
    }

    pub fn is_started(&self) -> bool {
        self.open.is_some()
    }

    /// Loads `name` (or creates it when missing), recalculates it and keeps it open.
    pub fn start(&mut self, name: &str) -> Result<SessionStart, CoreError> {
        let created = !self.storage.book_exists(name);
        let mut book = if created {
            RecordBook::new(name)
        } else {
            let book = self.storage.load_book(name)?;
            ensure_schema_support(book.schema_version)?;
            book
        };
        let warnings = book_warnings(&book);
        for warning in &warnings {
            warn!(book = name, "{warning}");
        }
        book.records = BalanceRecalculator::recalculate_all(book.records)?;
        if created {
            self.storage.save_book(name, &book)?;
        }
        info!(book = name, records = book.record_count(), created, "session started");
        self.open = Some(OpenBook {
            name: name.to_string(),
            book,
        });
        Ok(SessionStart {
            name: name.to_string(),
            created,
            warnings,
        })
    }

    /// Flushes the open book and closes the session.
    pub fn stop(&mut self) -> Result<(), CoreError> {
        let open = self.open.take().ok_or(CoreError::SessionNotStarted)?;
        self.storage.save_book(&open.name, &open.book)?;
        info!(book = %open.name, "session stopped");
        Ok(())
    }

    pub fn book(&self) -> Result<&RecordBook, CoreError> {
        self.open
            .as_ref()
            .map(|open| &open.book)
            .ok_or(CoreError::SessionNotStarted)
    }

    pub fn name(&self) -> Option<&str> {
        self.open.as_ref().map(|open| open.name.as_str())
    }

    pub fn draft_record(&self, date: impl Into<String>) -> Result<Record, CoreError> {
        Ok(RecordService::draft_record(self.book()?, date))
    }

    pub fn open_for_edit(&self, id: &str) -> Result<Record, CoreError> {
        RecordService::open_for_edit(self.book()?, id)
    }

    pub fn save_record(&mut self, record: Record) -> Result<Record, CoreError> {
        let actor = self.actor.clone();
        self.mutate(|book| RecordService::save_record(book, record, &actor))
    }

    pub fn delete_record(&mut self, id: &str) -> Result<Record, CoreError> {
        self.mutate(|book| RecordService::delete_record(book, id))
    }

    pub fn import_snapshot(&mut self, snapshot: BookSnapshot) -> Result<usize, CoreError> {
        self.mutate(|book| RecordService::import_snapshot(book, snapshot))
    }

    pub fn export_snapshot(&self) -> Result<BookSnapshot, CoreError> {
        Ok(RecordService::export_snapshot(self.book()?))
    }

    pub fn backup(&self, note: Option<&str>) -> Result<BookBackupInfo, CoreError> {
        let open = self.open.as_ref().ok_or(CoreError::SessionNotStarted)?;
        self.storage.backup_book(&open.name, &open.book, note)
    }

    fn mutate<T>(
        &mut self,
        change: impl FnOnce(&mut RecordBook) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let name = self
            .open
            .as_ref()
            .map(|open| open.name.clone())
            .ok_or(CoreError::SessionNotStarted)?;
        let mut book = self.refetch(&name)?;
        let outcome = change(&mut book)?;
        self.storage.save_book(&name, &book)?;
        self.open = Some(OpenBook { name, book });
        Ok(outcome)
    }

    /// Latest stored copy of the open book, falling back to the in-memory one when
    /// the backend no longer has it.
    fn refetch(&self, name: &str) -> Result<RecordBook, CoreError> {
        if self.storage.book_exists(name) {
            let book = self.storage.load_book(name)?;
            ensure_schema_support(book.schema_version)?;
            Ok(book)
        } else {
            self.book().cloned()
        }
    }
}

fn ensure_schema_support(schema_version: u8) -> Result<(), CoreError> {
    if schema_version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::UnsupportedSchema {
            found: schema_version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }
    Ok(())
}
