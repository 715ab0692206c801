// In-memory repository: an ordered Vec searched linearly by bean_id.
// The inventory is small, so there is no secondary index.

use rust_decimal::Decimal;

use super::{accumulate_value, BeanRepository, RepositoryError};
use crate::entities::BeanLot;

#[derive(Debug, Default, Clone)]
pub struct MemoryBeanRepository {
    lots: Vec<BeanLot>,
}

impl MemoryBeanRepository {
    pub fn new() -> Self {
        MemoryBeanRepository { lots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    fn position(&self, bean_id: &str) -> Option<usize> {
        self.lots.iter().position(|lot| lot.bean_id() == bean_id)
    }
}

impl BeanRepository for MemoryBeanRepository {
    fn find_all(&self) -> Result<Vec<BeanLot>, RepositoryError> {
        Ok(self.lots.clone())
    }

    fn find_by_id(&self, bean_id: &str) -> Result<Option<BeanLot>, RepositoryError> {
        Ok(self.lots.iter().find(|lot| lot.bean_id() == bean_id).cloned())
    }

    fn add(&mut self, lot: BeanLot) -> Result<bool, RepositoryError> {
        if self.position(lot.bean_id()).is_some() {
            tracing::debug!(bean_id = lot.bean_id(), "add rejected: duplicate id");
            return Ok(false);
        }
        tracing::debug!(bean_id = lot.bean_id(), "lot added");
        self.lots.push(lot);
        Ok(true)
    }

    fn update(&mut self, lot: BeanLot) -> Result<bool, RepositoryError> {
        match self.position(lot.bean_id()) {
            Some(index) => {
                tracing::debug!(bean_id = lot.bean_id(), "lot replaced");
                self.lots[index] = lot;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove_by_id(&mut self, bean_id: &str) -> Result<bool, RepositoryError> {
        match self.position(bean_id) {
            Some(index) => {
                self.lots.remove(index);
                tracing::debug!(bean_id, "lot removed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn total_inventory_value(&self) -> Result<Decimal, RepositoryError> {
        self.lots
            .iter()
            .try_fold(Decimal::ZERO, |total, lot| accumulate_value(total, lot.value()?))
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{RoastLevel, ValueError};
    use crate::repository::SkipReason;
    use chrono::NaiveDate;
    use std::io::Write;
    use std::str::FromStr;

    fn create_test_lot(bean_id: &str, quantity_kg: f64, cost: &str) -> BeanLot {
        BeanLot::new(
            bean_id,
            "Guatemala",
            "Finca El Injerto",
            RoastLevel::Medium,
            NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            quantity_kg,
            Decimal::from_str(cost).unwrap(),
            "chocolate, orange",
            12.0,
        )
    }

    #[test]
    fn test_add_and_find() {
        let mut repo = MemoryBeanRepository::new();
        let lot = create_test_lot("ID3", 3.0, "7.0");

        assert!(repo.add(lot.clone()).unwrap());
        assert_eq!(repo.find_by_id("ID3").unwrap(), Some(lot));
        assert_eq!(repo.find_by_id("missing").unwrap(), None);
    }

    #[test]
    fn test_add_duplicate_keeps_original() {
        let mut repo = MemoryBeanRepository::new();
        let original = create_test_lot("DUP", 1.0, "1.00");
        let impostor = create_test_lot("DUP", 9.0, "9.00");

        assert!(repo.add(original.clone()).unwrap());
        assert!(!repo.add(impostor).unwrap());

        assert_eq!(repo.len(), 1);
        assert_eq!(repo.find_by_id("DUP").unwrap(), Some(original));
    }

    #[test]
    fn test_update_preserves_position() {
        let mut repo = MemoryBeanRepository::new();
        repo.add(create_test_lot("A", 1.0, "1")).unwrap();
        repo.add(create_test_lot("B", 2.0, "2")).unwrap();
        repo.add(create_test_lot("C", 3.0, "3")).unwrap();

        let replacement = create_test_lot("B", 20.0, "2.5");
        assert!(repo.update(replacement.clone()).unwrap());

        let ids: Vec<String> = repo
            .find_all()
            .unwrap()
            .iter()
            .map(|lot| lot.bean_id().to_string())
            .collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(repo.find_by_id("B").unwrap(), Some(replacement));
    }

    #[test]
    fn test_update_missing_does_not_insert() {
        let mut repo = MemoryBeanRepository::new();
        assert!(!repo.update(create_test_lot("NO_ID", 1.0, "1.0")).unwrap());
        assert!(repo.is_empty());
    }

    #[test]
    fn test_remove() {
        let mut repo = MemoryBeanRepository::new();
        repo.add(create_test_lot("ID4", 4.0, "8.0")).unwrap();

        assert!(!repo.remove_by_id("NOPE").unwrap());
        assert_eq!(repo.len(), 1);

        assert!(repo.remove_by_id("ID4").unwrap());
        assert_eq!(repo.find_by_id("ID4").unwrap(), None);
        assert!(!repo.remove_by_id("ID4").unwrap());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut repo = MemoryBeanRepository::new();
        repo.add(create_test_lot("S1", 1.0, "1")).unwrap();

        let snapshot = repo.find_all().unwrap();
        repo.add(create_test_lot("S2", 1.0, "1")).unwrap();
        repo.remove_by_id("S1").unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].bean_id(), "S1");
    }

    #[test]
    fn test_total_inventory_value() {
        let mut repo = MemoryBeanRepository::new();
        assert_eq!(repo.total_inventory_value().unwrap(), Decimal::ZERO);

        repo.add(create_test_lot("ID6", 1.0, "10.0")).unwrap();
        repo.add(create_test_lot("ID7", 2.0, "20.0")).unwrap();
        repo.add(create_test_lot("ID8", 3.333, "9.99")).unwrap();

        assert_eq!(
            repo.total_inventory_value().unwrap(),
            Decimal::from_str("83.29667").unwrap()
        );
    }

    #[test]
    fn test_total_reports_overflow() {
        let mut repo = MemoryBeanRepository::new();
        repo.add(create_test_lot("BIG", 1e20, "10000000000")).unwrap();

        assert!(matches!(
            repo.total_inventory_value(),
            Err(RepositoryError::Value(ValueError::Overflow { .. }))
        ));
    }

    #[test]
    fn test_total_reports_rounding_instead_of_returning_it() {
        let mut repo = MemoryBeanRepository::new();
        repo.add(create_test_lot("MAX", 1.0, "7.9228162514264337593543950335"))
            .unwrap();
        assert_eq!(
            repo.total_inventory_value().unwrap(),
            Decimal::from_str("7.9228162514264337593543950335").unwrap()
        );

        repo.add(create_test_lot("ONE", 1.0, "1")).unwrap();
        assert!(matches!(
            repo.total_inventory_value(),
            Err(RepositoryError::TotalInexact)
        ));
    }

    #[test]
    fn test_import_lines_three_line_batch() {
        let mut repo = MemoryBeanRepository::new();
        let source = "L1,Brazil,Fazenda,LIGHT,2024-03-01,10.0,5.50,fruity,1.2\n\
                      L2,Kenya,Kiambu,MEDIUM,2024-02-31,1.0,1.00,berry,1.0\n\
                      L1,Other,Other,DARK,2024-01-01,1.0,1.00,x,0.1\n";

        let imported = repo.import_lines(source).unwrap();

        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].bean_id(), "L1");
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.find_by_id("L1").unwrap().unwrap().origin_country(), "Brazil");
    }

    #[test]
    fn test_import_report_explains_skips() {
        let mut repo = MemoryBeanRepository::new();
        let source = "L1,Brazil,Fazenda,LIGHT,2024-03-01,10.0,5.50,fruity,1.2\n\
                      L2,Kenya,Kiambu,MEDIUM,2024-02-31,1.0,1.00,berry,1.0\n\
                      L1,Other,Other,DARK,2024-01-01,1.0,1.00,x,0.1\n";

        let report = repo.import_report(source).unwrap();

        assert_eq!(report.imported.len(), 1);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].line_number, 2);
        assert!(matches!(report.skipped[0].reason, SkipReason::Malformed(_)));
        assert_eq!(report.skipped[1].line_number, 3);
        assert_eq!(report.skipped[1].reason, SkipReason::DuplicateId);
    }

    #[test]
    fn test_import_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "ID1,Country1,Farm1,LIGHT,2025-01-01,1.0,5.0,notes1,0.1").unwrap();
        writeln!(file, "ID2,Country2,Farm2,MEDIUM,2025-02-02,2.0,6.0,notes2,0.2").unwrap();

        let mut repo = MemoryBeanRepository::new();
        let loaded = repo.import_file(file.path()).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].bean_id(), "ID1");
        assert_eq!(
            loaded[0].roast_date(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_import_file_report_numbers_crlf_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "W1,Kenya,Kiambu,LIGHT,2025-01-01,1.0,5.0,notes1,0.1\r\n\
             \r\n\
             W2,Kenya,Nyeri,DARK,2025-01-32,1.0,5.0,notes2,0.1\r\n\
             W1,Kenya,Kiambu,LIGHT,2025-01-01,1.0,5.0,notes1,0.1\r\n"
        )
        .unwrap();

        let mut repo = MemoryBeanRepository::new();
        let report = repo.import_file_report(file.path()).unwrap();

        assert_eq!(report.imported.len(), 1);
        let lines: Vec<u64> = report.skipped.iter().map(|s| s.line_number).collect();
        assert_eq!(lines, vec![3, 4]);
        assert_eq!(report.skipped[1].reason, SkipReason::DuplicateId);
    }

    #[test]
    fn test_import_missing_file_is_an_error() {
        let mut repo = MemoryBeanRepository::new();
        let result = repo.import_file(std::path::Path::new("no_such_file.txt"));
        assert!(matches!(result, Err(RepositoryError::Io { .. })));

        let result = repo.import_file_report(std::path::Path::new("no_such_file.txt"));
        assert!(matches!(result, Err(RepositoryError::Io { .. })));
    }
}
