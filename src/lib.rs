// Budget Ledger - Core Library
// Free-text income/expense interpreter plus a SQLite-backed monthly ledger.
// Exposes all modules for use in the chat CLI, the API server, and tests

pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod parser;
pub mod quick;
pub mod report;
pub mod store;

use std::sync::Once;

// Re-export commonly used types
pub use bot::{Bot, Button, Command, Reply};
pub use config::Config;
pub use db::{Direction, OwnerId, Transaction, TransactionId};
pub use error::{LedgerError, Result};
pub use parser::{parse_free_text, ParsedIntent};
pub use quick::QuickAdd;
pub use report::{LabelTotal, MonthlyReport, Period};
pub use store::{LedgerStore, SqliteStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static INIT_TRACING: Once = Once::new();

/// Install the global fmt subscriber. `RUST_LOG` wins over `default_filter`.
/// Later calls are no-ops.
pub fn init_tracing(default_filter: &str) {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_filter))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // A subscriber may already be set by an embedding application
        let _ = fmt().with_env_filter(filter).try_init();
        tracing::info!(version = VERSION, "budget ledger tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing("budget_ledger=debug");
        super::init_tracing("garbage[[filter");
    }
}
