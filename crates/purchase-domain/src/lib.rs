//! purchase-domain
//!
//! Pure domain models (Record, Receipt, RecordBook, summaries).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod book;
pub mod common;
pub mod receipt;
pub mod record;
pub mod summary;

pub use book::*;
pub use common::*;
pub use receipt::*;
pub use record::*;
pub use summary::*;
