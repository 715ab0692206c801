// Storage selection - which BeanRepository implementation backs a session.
//
// Chosen once at startup from the command line (or COFFEE_DMS_DB) and
// handed to the front ends as a boxed trait object.

use std::path::{Path, PathBuf};

use crate::db::SqliteBeanRepository;
use crate::repository::{BeanRepository, MemoryBeanRepository, RepositoryError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Volatile Vec-backed store; lost on exit
    Memory,
    /// SQLite database file, created if missing
    Sqlite(PathBuf),
}

impl StorageConfig {
    /// `Some(path)` selects SQLite, `None` the in-memory store
    pub fn from_db_path(db_path: Option<&Path>) -> Self {
        match db_path {
            Some(path) => StorageConfig::Sqlite(path.to_path_buf()),
            None => StorageConfig::Memory,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            StorageConfig::Memory => "in-memory".to_string(),
            StorageConfig::Sqlite(path) => format!("SQLite ({})", path.display()),
        }
    }

    pub fn open(&self) -> Result<Box<dyn BeanRepository + Send>, RepositoryError> {
        let repo: Box<dyn BeanRepository + Send> = match self {
            StorageConfig::Memory => Box::new(MemoryBeanRepository::new()),
            StorageConfig::Sqlite(path) => Box::new(SqliteBeanRepository::open(path)?),
        };
        tracing::info!(backend = repo.backend_name(), "repository ready");
        Ok(repo)
    }
}
