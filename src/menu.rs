// Text menu front end
//
// Reads answers line by line and re-prompts a single field until it is
// valid, so earlier answers are never lost. End of input behaves like
// choosing Exit. Repository errors are printed and the menu carries on.

use rust_decimal::{Decimal, RoundingStrategy};
use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::entities::{exact_value, BeanLot};
use crate::repository::BeanRepository;
use crate::validation::{
    parse_non_negative_decimal, parse_non_negative_f64, parse_roast_date, parse_roast_level,
    require_non_empty, Field, FieldError,
};

/// `$` + value rounded half away from zero to two places
pub fn format_currency(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    format!("${}", rounded)
}

enum Flow {
    Continue,
    Quit,
}

pub struct Menu<'a, R, W> {
    repo: &'a mut dyn BeanRepository,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(repo: &'a mut dyn BeanRepository, input: R, output: W) -> Self {
        Menu { repo, input, output }
    }

    /// Show the menu until the user exits or input ends
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "\n=== Coffee Bean DMS ===")?;
            writeln!(self.output, "1) Add bean lot")?;
            writeln!(self.output, "2) Remove bean lot")?;
            writeln!(self.output, "3) Update bean lot")?;
            writeln!(self.output, "4) View all bean lots")?;
            writeln!(self.output, "5) Calculate inventory value")?;
            writeln!(self.output, "6) Exit")?;

            let Some(choice) = self.ask("Select an option")? else {
                break;
            };

            let flow = match choice.as_str() {
                "1" => self.handle_add()?,
                "2" => self.handle_remove()?,
                "3" => self.handle_update()?,
                "4" => self.handle_view()?,
                "5" => self.handle_calculate()?,
                "6" => Flow::Quit,
                _ => {
                    writeln!(self.output, "Invalid option, please try again.")?;
                    Flow::Continue
                }
            };

            if let Flow::Quit = flow {
                break;
            }
        }

        writeln!(self.output, "Goodbye!")?;
        self.output.flush()
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    fn handle_add(&mut self) -> io::Result<Flow> {
        let Some(mode) = self.ask("Batch import (1) or manual entry (2)?")? else {
            return Ok(Flow::Quit);
        };

        match mode.as_str() {
            "1" => {
                let Some(path) = self.ask("Enter file path")? else {
                    return Ok(Flow::Quit);
                };
                self.import_from_path(&path)?;
            }
            "2" => {
                let Some(lot) = self.prompt_lot(None)? else {
                    return Ok(Flow::Quit);
                };
                let bean_id = lot.bean_id().to_string();
                match self.repo.add(lot) {
                    Ok(true) => writeln!(self.output, "Bean added.")?,
                    Ok(false) => writeln!(
                        self.output,
                        "Failed to add bean: ID {} already exists.",
                        bean_id
                    )?,
                    Err(e) => writeln!(self.output, "Error: {}", e)?,
                }
            }
            _ => writeln!(self.output, "Invalid choice.")?,
        }
        Ok(Flow::Continue)
    }

    fn import_from_path(&mut self, path: &str) -> io::Result<()> {
        match self.repo.import_file_report(Path::new(path)) {
            Ok(report) => {
                writeln!(self.output, "{} bean(s) imported.", report.imported.len())?;
                for skipped in &report.skipped {
                    writeln!(
                        self.output,
                        "  skipped line {}: {}",
                        skipped.line_number, skipped.reason
                    )?;
                }
            }
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(())
    }

    fn handle_remove(&mut self) -> io::Result<Flow> {
        let Some(bean_id) =
            self.prompt_field(Field::BeanId, |raw| require_non_empty(Field::BeanId, raw))?
        else {
            return Ok(Flow::Quit);
        };

        match self.repo.remove_by_id(&bean_id) {
            Ok(true) => writeln!(self.output, "Bean removed.")?,
            Ok(false) => writeln!(self.output, "No bean with that ID.")?,
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Flow::Continue)
    }

    fn handle_update(&mut self) -> io::Result<Flow> {
        let Some(bean_id) =
            self.prompt_field(Field::BeanId, |raw| require_non_empty(Field::BeanId, raw))?
        else {
            return Ok(Flow::Quit);
        };

        match self.repo.find_by_id(&bean_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                writeln!(self.output, "No bean with that ID.")?;
                return Ok(Flow::Continue);
            }
            Err(e) => {
                writeln!(self.output, "Error: {}", e)?;
                return Ok(Flow::Continue);
            }
        }

        writeln!(self.output, "Enter new values:")?;
        let Some(lot) = self.prompt_lot(Some(bean_id))? else {
            return Ok(Flow::Quit);
        };

        match self.repo.update(lot) {
            Ok(true) => writeln!(self.output, "Bean updated.")?,
            Ok(false) => writeln!(self.output, "Update failed.")?,
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Flow::Continue)
    }

    fn handle_view(&mut self) -> io::Result<Flow> {
        match self.repo.find_all() {
            Ok(lots) if lots.is_empty() => writeln!(self.output, "No beans to display.")?,
            Ok(lots) => {
                for lot in &lots {
                    writeln!(self.output, "{}", lot)?;
                }
            }
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Flow::Continue)
    }

    fn handle_calculate(&mut self) -> io::Result<Flow> {
        match self.repo.total_inventory_value() {
            Ok(total) => {
                writeln!(self.output, "Total inventory value: {}", format_currency(total))?
            }
            Err(e) => writeln!(self.output, "Error: {}", e)?,
        }
        Ok(Flow::Continue)
    }

    // ------------------------------------------------------------------------
    // Prompts
    // ------------------------------------------------------------------------

    /// Every field of a lot; `fixed_id` skips the id prompt (update)
    fn prompt_lot(&mut self, fixed_id: Option<String>) -> io::Result<Option<BeanLot>> {
        let bean_id = match fixed_id {
            Some(id) => id,
            None => {
                let answer =
                    self.prompt_field(Field::BeanId, |raw| require_non_empty(Field::BeanId, raw))?;
                match answer {
                    Some(id) => id,
                    None => return Ok(None),
                }
            }
        };

        let Some(origin) = self.prompt_field(Field::OriginCountry, |raw| {
            require_non_empty(Field::OriginCountry, raw)
        })?
        else {
            return Ok(None);
        };
        let Some(farm) =
            self.prompt_field(Field::FarmName, |raw| require_non_empty(Field::FarmName, raw))?
        else {
            return Ok(None);
        };
        let Some(roast) = self.prompt_field(Field::RoastLevel, parse_roast_level)? else {
            return Ok(None);
        };
        let Some(date) = self.prompt_field(Field::RoastDate, parse_roast_date)? else {
            return Ok(None);
        };
        // quantity and cost are asked again together until their product is exact
        let (quantity, cost) = loop {
            let Some(quantity) = self.prompt_field(Field::QuantityKg, |raw| {
                parse_non_negative_f64(Field::QuantityKg, raw)
            })?
            else {
                return Ok(None);
            };
            let Some(cost) = self.prompt_field(Field::CostPerKg, |raw| {
                parse_non_negative_decimal(Field::CostPerKg, raw)
            })?
            else {
                return Ok(None);
            };

            match exact_value(&bean_id, quantity, cost) {
                Ok(_) => break (quantity, cost),
                Err(e) => writeln!(self.output, "{}. Try again.", e)?,
            }
        };
        let Some(notes) = self.prompt_field(Field::FlavorNotes, |raw| {
            require_non_empty(Field::FlavorNotes, raw)
        })?
        else {
            return Ok(None);
        };
        let Some(caffeine) = self.prompt_field(Field::CaffeineMgPerG, |raw| {
            parse_non_negative_f64(Field::CaffeineMgPerG, raw)
        })?
        else {
            return Ok(None);
        };

        Ok(Some(BeanLot::new(
            bean_id, origin, farm, roast, date, quantity, cost, notes, caffeine,
        )))
    }

    /// Ask for one field until `parse` accepts the answer
    fn prompt_field<T>(
        &mut self,
        field: Field,
        parse: impl Fn(&str) -> Result<T, FieldError>,
    ) -> io::Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(field.label())? else {
                return Ok(None);
            };
            match parse(&answer) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "{}. Try again.", e)?,
            }
        }
    }

    /// Print a prompt and read one trimmed line; `None` at end of input
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}: ", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryBeanRepository;
    use std::io::Cursor;
    use std::str::FromStr;

    fn run_script(repo: &mut MemoryBeanRepository, script: &str) -> String {
        let mut output = Vec::new();
        Menu::new(repo, Cursor::new(script.as_bytes()), &mut output)
            .run()
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    const MANUAL_A1: &str = "1\n2\nA1\nBrazil\nFazenda\nlight\n2024-03-01\n10\n5.50\nfruity\n1.2\n";

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(Decimal::from_str("55").unwrap()), "$55.00");
        assert_eq!(format_currency(Decimal::from_str("33.29667").unwrap()), "$33.30");
        assert_eq!(format_currency(Decimal::from_str("0.125").unwrap()), "$0.13");
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn test_manual_add_then_view_and_total() {
        let mut repo = MemoryBeanRepository::new();
        let script = format!("{}4\n5\n6\n", MANUAL_A1);

        let out = run_script(&mut repo, &script);

        assert!(out.contains("Bean added."));
        assert!(out.contains(
            "A1 | Brazil | Fazenda | LIGHT | 2024-03-01 | 10.00 kg | $5.50/kg | fruity | 1.20 mg/g"
        ));
        assert!(out.contains("Total inventory value: $55.00"));
        assert!(out.ends_with("Goodbye!\n"));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_invalid_answers_reprompt_same_field() {
        let mut repo = MemoryBeanRepository::new();
        let script = "1\n2\nB7\n\nPeru\nFinca\nespresso\ndark\n31-12-2024\n2024-12-31\n\
                      -5\n5\nabc\n4.20\nnutty\n1\n6\n";

        let out = run_script(&mut repo, script);

        assert!(out.contains("Origin country cannot be empty. Try again."));
        assert!(out.contains("invalid roast level"));
        assert!(out.contains("invalid date"));
        assert!(out.contains("must be zero or greater"));
        assert!(out.contains("is not a number"));

        let lot = repo.find_by_id("B7").unwrap().unwrap();
        assert_eq!(lot.origin_country(), "Peru");
        assert_eq!(lot.quantity_kg(), 5.0);
        assert_eq!(lot.cost_per_kg(), Decimal::from_str("4.20").unwrap());
    }

    #[test]
    fn test_quantity_and_cost_reprompt_when_value_would_round() {
        let mut repo = MemoryBeanRepository::new();
        let script = "1\n2\nD1\nPeru\nFinca\nDARK\n2024-12-31\n\
                      0.0000000000000000000000000000001\n5.00\n2\n5.00\nnutty\n1\n5\n6\n";

        let out = run_script(&mut repo, script);

        assert!(out.contains("has no exact decimal form. Try again."));
        assert!(out.contains("Bean added."));
        assert!(out.contains("Total inventory value: $10.00"));
        assert_eq!(repo.find_by_id("D1").unwrap().unwrap().quantity_kg(), 2.0);
    }

    #[test]
    fn test_duplicate_manual_add_is_reported() {
        let mut repo = MemoryBeanRepository::new();
        let script = format!("{}{}6\n", MANUAL_A1, MANUAL_A1);

        let out = run_script(&mut repo, &script);

        assert!(out.contains("Failed to add bean: ID A1 already exists."));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_update_existing_and_missing() {
        let mut repo = MemoryBeanRepository::new();
        let script = format!(
            "{}3\nNOPE\n3\nA1\nColombia\nHuila\nMEDIUM\n2024-04-04\n2\n8\nsweet\n1.1\n6\n",
            MANUAL_A1
        );

        let out = run_script(&mut repo, &script);

        assert!(out.contains("No bean with that ID."));
        assert!(out.contains("Bean updated."));
        let lot = repo.find_by_id("A1").unwrap().unwrap();
        assert_eq!(lot.origin_country(), "Colombia");
        assert_eq!(lot.value().unwrap(), Decimal::from(16));
    }

    #[test]
    fn test_remove() {
        let mut repo = MemoryBeanRepository::new();
        let script = format!("{}2\nA1\n2\nA1\n4\n6\n", MANUAL_A1);

        let out = run_script(&mut repo, &script);

        assert!(out.contains("Bean removed."));
        assert!(out.contains("No bean with that ID."));
        assert!(out.contains("No beans to display."));
        assert!(repo.is_empty());
    }

    #[test]
    fn test_batch_import_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beans.txt");
        std::fs::write(
            &path,
            "A1,Brazil,Fazenda,LIGHT,2024-03-01,10.0,5.50,fruity,1.2\n\
             A1,Other,Other,DARK,2024-01-01,1.0,1.00,x,0.1\n",
        )
        .unwrap();

        let mut repo = MemoryBeanRepository::new();
        let script = format!("1\n1\n{}\n5\n6\n", path.display());
        let out = run_script(&mut repo, &script);

        assert!(out.contains("1 bean(s) imported."));
        assert!(out.contains("skipped line 2: bean ID already exists"));
        assert!(out.contains("Total inventory value: $55.00"));
    }

    #[test]
    fn test_missing_import_file_is_reported() {
        let mut repo = MemoryBeanRepository::new();
        let out = run_script(&mut repo, "1\n1\n/definitely/not/here.txt\n6\n");

        assert!(out.contains("Error: failed to read /definitely/not/here.txt"));
    }

    #[test]
    fn test_invalid_option_and_end_of_input() {
        let mut repo = MemoryBeanRepository::new();
        let out = run_script(&mut repo, "9\n");

        assert!(out.contains("Invalid option, please try again."));
        assert!(out.ends_with("Goodbye!\n"));
    }

    #[test]
    fn test_end_of_input_mid_entry_adds_nothing() {
        let mut repo = MemoryBeanRepository::new();
        let out = run_script(&mut repo, "1\n2\nA1\nBrazil\n");

        assert!(out.ends_with("Goodbye!\n"));
        assert!(repo.is_empty());
    }
}
