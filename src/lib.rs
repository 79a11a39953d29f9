//! Purchase Tracker keeps a daily cash float: purchase receipts by payment mode,
//! and a cash balance carried forward from one record to the next.
//!
//! The engine lives in `purchase-core`; this crate wires it to configuration,
//! JSON storage, logging and the `purchase_tracker_cli` binary.

pub mod cli;
pub mod currency;
pub mod errors;
pub mod utils;

pub use errors::AppError;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    init_with_filter(None);
}

/// Like [`init`], with extra filter directives (for example from the config file).
pub fn init_with_filter(directives: Option<&str>) {
    INIT_TRACING.call_once(|| match utils::init_tracing(directives) {
        Ok(()) => tracing::info!("Purchase Tracker tracing initialized."),
        Err(err) => tracing::debug!(%err, "keeping the already installed subscriber"),
    });
}
