// 🗃️ Repository Contract
//
// One trait, two implementations:
// - MemoryBeanRepository: ordered Vec, linear scans
// - SqliteBeanRepository (crate::db): one row per lot, keyed by bean_id
//
// Duplicate and missing ids are ordinary outcomes (false / None), never errors.
// RepositoryError is reserved for storage failures and arithmetic overflow.

pub mod error;
pub mod memory;

pub use error::RepositoryError;
pub use memory::MemoryBeanRepository;

use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;

use crate::entities::BeanLot;
use crate::parser::{parse_lines, LineError};

// ============================================================================
// IMPORT REPORT
// ============================================================================

/// Why a line of a bulk import did not produce a lot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    Malformed(#[serde(serialize_with = "as_display")] LineError),
    DuplicateId,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Malformed(e) => write!(f, "{}", e),
            SkipReason::DuplicateId => f.write_str("bean ID already exists"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLine {
    pub line_number: u64,
    pub raw_line: String,
    pub reason: SkipReason,
}

/// Per-line outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Lots actually inserted, in source order
    pub imported: Vec<BeanLot>,
    pub skipped: Vec<SkippedLine>,
}

fn as_display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

// ============================================================================
// REPOSITORY TRAIT
// ============================================================================

pub trait BeanRepository {
    /// Snapshot of every lot in insertion order
    fn find_all(&self) -> Result<Vec<BeanLot>, RepositoryError>;

    fn find_by_id(&self, bean_id: &str) -> Result<Option<BeanLot>, RepositoryError>;

    /// Insert unless a lot with the same id exists; `Ok(false)` on duplicate
    fn add(&mut self, lot: BeanLot) -> Result<bool, RepositoryError>;

    /// Replace the lot with the same id, keeping its position; `Ok(false)` if absent
    fn update(&mut self, lot: BeanLot) -> Result<bool, RepositoryError>;

    fn remove_by_id(&mut self, bean_id: &str) -> Result<bool, RepositoryError>;

    /// Σ quantity × cost over all lots, in exact decimal arithmetic
    fn total_inventory_value(&self) -> Result<Decimal, RepositoryError>;

    /// Short name for logs and UI headers
    fn backend_name(&self) -> &'static str;

    /// Bulk import with a per-line account of what was skipped and why.
    ///
    /// Malformed lines and duplicate ids are skipped (and logged); the rest
    /// of the source is still processed.
    fn import_report(&mut self, source: &str) -> Result<ImportReport, RepositoryError> {
        let mut report = ImportReport::default();

        for parsed in parse_lines(source) {
            let reason = match parsed.result {
                Ok(lot) => {
                    if self.add(lot.clone())? {
                        report.imported.push(lot);
                        continue;
                    }
                    SkipReason::DuplicateId
                }
                Err(e) => SkipReason::Malformed(e),
            };

            tracing::warn!(
                line = parsed.line_number,
                reason = %reason,
                "Skipping invalid line: {}",
                parsed.raw_line
            );
            report.skipped.push(SkippedLine {
                line_number: parsed.line_number,
                raw_line: parsed.raw_line,
                reason,
            });
        }

        tracing::info!(
            imported = report.imported.len(),
            skipped = report.skipped.len(),
            backend = self.backend_name(),
            "bulk import finished"
        );

        Ok(report)
    }

    /// Bulk import returning only the lots that were inserted
    fn import_lines(&mut self, source: &str) -> Result<Vec<BeanLot>, RepositoryError> {
        Ok(self.import_report(source)?.imported)
    }

    /// Read a line-delimited file and bulk import it, reporting every skipped line
    fn import_file_report(&mut self, path: &Path) -> Result<ImportReport, RepositoryError> {
        let source = std::fs::read_to_string(path).map_err(|source| RepositoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_report(&source)
    }

    /// Read a line-delimited file and bulk import it
    fn import_file(&mut self, path: &Path) -> Result<Vec<BeanLot>, RepositoryError> {
        Ok(self.import_file_report(path)?.imported)
    }
}

/// Add one lot's value to a running decimal total
pub(crate) fn accumulate_value(
    total: Decimal,
    lot_value: Decimal,
) -> Result<Decimal, RepositoryError> {
    let sum = total
        .checked_add(lot_value)
        .ok_or(RepositoryError::TotalOverflow)?;

    // a sum that no longer fits 96 bits comes back at a lower scale, rounded
    if !total.is_zero()
        && !lot_value.is_zero()
        && sum.scale() < total.scale().max(lot_value.scale())
    {
        return Err(RepositoryError::TotalInexact);
    }
    Ok(sum)
}
