//! purchase-core
//!
//! The balance carry-forward engine and the services built around it.
//! Depends on purchase-domain. No CLI, no terminal I/O, no direct filesystem access.

pub mod error;
pub mod ordering;
pub mod query;
pub mod recalc;
pub mod record_service;
pub mod session;
pub mod storage;
pub mod summary_service;
pub mod totals;
pub mod validation;

pub use error::CoreError;
pub use query::*;
pub use recalc::*;
pub use record_service::*;
pub use session::*;
pub use summary_service::*;
pub use totals::*;
pub use validation::*;
