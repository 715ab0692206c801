// Coffee Bean DMS - Core Library
// Exposes all modules for use in the menu CLI, the terminal form, the API server, and tests

pub mod entities;
pub mod validation;
pub mod parser;
pub mod repository;
pub mod db;
pub mod config;
pub mod logging;
pub mod menu;

// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use entities::{BeanLot, RoastLevel, RoastLevelError, ValueError};
pub use validation::{Field, FieldError, RawLot};
pub use parser::{parse_lines, parse_lot_line, LineError, ParsedLine};
pub use repository::{
    BeanRepository, ImportReport, MemoryBeanRepository, RepositoryError, SkipReason, SkippedLine,
};
pub use db::{setup_database, SqliteBeanRepository};
pub use config::StorageConfig;
pub use menu::{format_currency, Menu};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
