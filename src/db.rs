// 🗄️ SQLite Repository - same contract as the in-memory store, one row per lot
//
// bean_id carries a UNIQUE constraint, so the database itself rejects
// duplicates; a constraint violation on insert is reported as Ok(false).
// cost_per_kg is stored as decimal TEXT because SQLite has no exact
// decimal column type; REAL would round money.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::entities::{exact_value, BeanLot, RoastLevel};
use crate::repository::{accumulate_value, BeanRepository, RepositoryError};

const SELECT_LOT_COLUMNS: &str = "SELECT bean_id, origin, farm, roast_level, roast_date,
        quantity_kg, cost_per_kg, notes, caffeine_mg_per_g
 FROM bean_lots";

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS bean_lots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bean_id TEXT UNIQUE NOT NULL,
            origin TEXT NOT NULL,
            farm TEXT NOT NULL,
            roast_level TEXT NOT NULL CHECK (roast_level IN ('LIGHT', 'MEDIUM', 'DARK')),
            roast_date TEXT NOT NULL,
            quantity_kg REAL NOT NULL,
            cost_per_kg TEXT NOT NULL,
            notes TEXT NOT NULL,
            caffeine_mg_per_g REAL NOT NULL
        )",
        [],
    )?;

    Ok(())
}

// ============================================================================
// STORED ROW
// ============================================================================

/// Columns exactly as read back, before decoding into a BeanLot
struct StoredLot {
    bean_id: String,
    origin: String,
    farm: String,
    roast_level: String,
    roast_date: String,
    quantity_kg: f64,
    cost_per_kg: String,
    notes: String,
    caffeine_mg_per_g: f64,
}

impl StoredLot {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(StoredLot {
            bean_id: row.get(0)?,
            origin: row.get(1)?,
            farm: row.get(2)?,
            roast_level: row.get(3)?,
            roast_date: row.get(4)?,
            quantity_kg: row.get(5)?,
            cost_per_kg: row.get(6)?,
            notes: row.get(7)?,
            caffeine_mg_per_g: row.get(8)?,
        })
    }

    fn into_lot(self) -> Result<BeanLot, RepositoryError> {
        let roast_level = RoastLevel::from_str(&self.roast_level)
            .map_err(|e| corrupt(&self.bean_id, e))?;
        let roast_date = NaiveDate::parse_from_str(&self.roast_date, "%Y-%m-%d")
            .map_err(|e| {
                corrupt(&self.bean_id, format!("roast_date {:?}: {}", self.roast_date, e))
            })?;
        let cost_per_kg = parse_stored_cost(&self.bean_id, &self.cost_per_kg)?;

        Ok(BeanLot::new(
            self.bean_id,
            self.origin,
            self.farm,
            roast_level,
            roast_date,
            self.quantity_kg,
            cost_per_kg,
            self.notes,
            self.caffeine_mg_per_g,
        ))
    }
}

fn corrupt(bean_id: &str, message: impl ToString) -> RepositoryError {
    RepositoryError::Corrupt {
        bean_id: bean_id.to_string(),
        message: message.to_string(),
    }
}

fn parse_stored_cost(bean_id: &str, text: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(text).map_err(|e| corrupt(bean_id, format!("cost_per_kg {:?}: {}", text, e)))
}

// ============================================================================
// SQLITE REPOSITORY
// ============================================================================

pub struct SqliteBeanRepository {
    conn: Connection,
}

impl SqliteBeanRepository {
    /// Open (or create) a database file; WAL mode for crash recovery
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        setup_database(&conn)?;
        tracing::info!(path = %path.display(), "SQLite inventory opened");
        Ok(SqliteBeanRepository { conn })
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteBeanRepository { conn })
    }
}

impl BeanRepository for SqliteBeanRepository {
    fn find_all(&self) -> Result<Vec<BeanLot>, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id", SELECT_LOT_COLUMNS))?;

        let rows = stmt
            .query_map([], StoredLot::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredLot::into_lot).collect()
    }

    fn find_by_id(&self, bean_id: &str) -> Result<Option<BeanLot>, RepositoryError> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE bean_id = ?1", SELECT_LOT_COLUMNS),
                params![bean_id],
                StoredLot::from_row,
            )
            .optional()?;

        row.map(StoredLot::into_lot).transpose()
    }

    fn add(&mut self, lot: BeanLot) -> Result<bool, RepositoryError> {
        let result = self.conn.execute(
            "INSERT INTO bean_lots (
                bean_id, origin, farm, roast_level, roast_date,
                quantity_kg, cost_per_kg, notes, caffeine_mg_per_g
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                lot.bean_id(),
                lot.origin_country(),
                lot.farm_name(),
                lot.roast_level().as_str(),
                lot.roast_date().format("%Y-%m-%d").to_string(),
                lot.quantity_kg(),
                lot.cost_per_kg().to_string(),
                lot.flavor_notes(),
                lot.caffeine_mg_per_g(),
            ],
        );

        match result {
            Ok(_) => {
                tracing::debug!(bean_id = lot.bean_id(), "lot inserted");
                Ok(true)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                tracing::debug!(bean_id = lot.bean_id(), "insert rejected: duplicate id");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(&mut self, lot: BeanLot) -> Result<bool, RepositoryError> {
        let changed = self.conn.execute(
            "UPDATE bean_lots
             SET origin = ?1, farm = ?2, roast_level = ?3, roast_date = ?4,
                 quantity_kg = ?5, cost_per_kg = ?6, notes = ?7, caffeine_mg_per_g = ?8
             WHERE bean_id = ?9",
            params![
                lot.origin_country(),
                lot.farm_name(),
                lot.roast_level().as_str(),
                lot.roast_date().format("%Y-%m-%d").to_string(),
                lot.quantity_kg(),
                lot.cost_per_kg().to_string(),
                lot.flavor_notes(),
                lot.caffeine_mg_per_g(),
                lot.bean_id(),
            ],
        )?;

        Ok(changed == 1)
    }

    fn remove_by_id(&mut self, bean_id: &str) -> Result<bool, RepositoryError> {
        let changed = self
            .conn
            .execute("DELETE FROM bean_lots WHERE bean_id = ?1", params![bean_id])?;

        Ok(changed == 1)
    }

    fn total_inventory_value(&self) -> Result<Decimal, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT bean_id, quantity_kg, cost_per_kg FROM bean_lots")?;
        let mut rows = stmt.query([])?;

        let mut total = Decimal::ZERO;
        while let Some(row) = rows.next()? {
            let bean_id: String = row.get(0)?;
            let quantity_kg: f64 = row.get(1)?;
            let cost_text: String = row.get(2)?;

            let cost = parse_stored_cost(&bean_id, &cost_text)?;
            let value = exact_value(&bean_id, quantity_kg, cost)?;

            total = accumulate_value(total, value)?;
        }

        Ok(total)
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
