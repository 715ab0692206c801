// 📐 Field Validation - raw text → typed lot attributes
//
// Every front end (import lines, text menu, terminal form, HTTP API) goes
// through these functions, so a lot that reaches a repository always has
// non-empty text fields, a known roast level, an ISO date and non-negative
// numbers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::entities::{BeanLot, RoastLevel, RoastLevelError, ValueError};

// ============================================================================
// FIELDS
// ============================================================================

/// The nine attributes of a lot, in import-line order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    BeanId,
    OriginCountry,
    FarmName,
    RoastLevel,
    RoastDate,
    QuantityKg,
    CostPerKg,
    FlavorNotes,
    CaffeineMgPerG,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::BeanId,
        Field::OriginCountry,
        Field::FarmName,
        Field::RoastLevel,
        Field::RoastDate,
        Field::QuantityKg,
        Field::CostPerKg,
        Field::FlavorNotes,
        Field::CaffeineMgPerG,
    ];

    /// Human-readable label used in prompts and error messages
    pub fn label(&self) -> &'static str {
        match self {
            Field::BeanId => "Bean ID",
            Field::OriginCountry => "Origin country",
            Field::FarmName => "Farm name",
            Field::RoastLevel => "Roast level (LIGHT/MEDIUM/DARK)",
            Field::RoastDate => "Roast date (YYYY-MM-DD)",
            Field::QuantityKg => "Quantity (kg)",
            Field::CostPerKg => "Cost per kg",
            Field::FlavorNotes => "Flavor notes",
            Field::CaffeineMgPerG => "Caffeine mg per gram",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// FIELD ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0} cannot be empty")]
    Empty(Field),

    #[error(transparent)]
    RoastLevel(#[from] RoastLevelError),

    #[error("invalid date {0:?} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("{field}: {value:?} is not a number")]
    NotANumber { field: Field, value: String },

    #[error("{field}: {value} must be zero or greater")]
    Negative { field: Field, value: String },

    #[error(transparent)]
    Value(#[from] ValueError),
}

impl FieldError {
    /// Which attribute the error belongs to
    pub fn field(&self) -> Field {
        match self {
            FieldError::Empty(field) => *field,
            FieldError::RoastLevel(_) => Field::RoastLevel,
            FieldError::InvalidDate(_) => Field::RoastDate,
            FieldError::NotANumber { field, .. } | FieldError::Negative { field, .. } => *field,
            FieldError::Value(_) => Field::QuantityKg,
        }
    }
}

// ============================================================================
// SINGLE-FIELD RULES
// ============================================================================

pub fn require_non_empty(field: Field, raw: &str) -> Result<String, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(FieldError::Empty(field))
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn parse_roast_level(raw: &str) -> Result<RoastLevel, FieldError> {
    Ok(raw.parse::<RoastLevel>()?)
}

pub fn parse_roast_date(raw: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| FieldError::InvalidDate(raw.trim().to_string()))
}

/// Finite, non-negative floating-point value
pub fn parse_non_negative_f64(field: Field, raw: &str) -> Result<f64, FieldError> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FieldError::NotANumber {
            field,
            value: trimmed.to_string(),
        })?;

    if value < 0.0 {
        return Err(FieldError::Negative {
            field,
            value: trimmed.to_string(),
        });
    }
    Ok(value)
}

/// Non-negative exact decimal (money)
pub fn parse_non_negative_decimal(field: Field, raw: &str) -> Result<Decimal, FieldError> {
    let trimmed = raw.trim();
    let value = Decimal::from_str(trimmed).map_err(|_| FieldError::NotANumber {
        field,
        value: trimmed.to_string(),
    })?;

    if value.is_sign_negative() && !value.is_zero() {
        return Err(FieldError::Negative {
            field,
            value: trimmed.to_string(),
        });
    }
    Ok(value)
}

// ============================================================================
// RAW LOT (nine untyped fields)
// ============================================================================

/// A lot as typed by a user or read from a line: nine pieces of text.
///
/// Numbers may arrive as JSON numbers or strings; both are kept as text
/// until `validate` runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawLot {
    pub bean_id: String,
    pub origin_country: String,
    pub farm_name: String,
    pub roast_level: String,
    pub roast_date: String,
    #[serde(deserialize_with = "text_or_number")]
    pub quantity_kg: String,
    #[serde(deserialize_with = "text_or_number")]
    pub cost_per_kg: String,
    pub flavor_notes: String,
    #[serde(deserialize_with = "text_or_number")]
    pub caffeine_mg_per_g: String,
}

impl RawLot {
    /// Raw text of an existing lot, e.g. to pre-fill an update form
    pub fn from_lot(lot: &BeanLot) -> Self {
        RawLot {
            bean_id: lot.bean_id().to_string(),
            origin_country: lot.origin_country().to_string(),
            farm_name: lot.farm_name().to_string(),
            roast_level: lot.roast_level().to_string(),
            roast_date: lot.roast_date().format("%Y-%m-%d").to_string(),
            quantity_kg: lot.quantity_kg().to_string(),
            cost_per_kg: lot.cost_per_kg().to_string(),
            flavor_notes: lot.flavor_notes().to_string(),
            caffeine_mg_per_g: lot.caffeine_mg_per_g().to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::BeanId => &self.bean_id,
            Field::OriginCountry => &self.origin_country,
            Field::FarmName => &self.farm_name,
            Field::RoastLevel => &self.roast_level,
            Field::RoastDate => &self.roast_date,
            Field::QuantityKg => &self.quantity_kg,
            Field::CostPerKg => &self.cost_per_kg,
            Field::FlavorNotes => &self.flavor_notes,
            Field::CaffeineMgPerG => &self.caffeine_mg_per_g,
        }
    }

    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::BeanId => &mut self.bean_id,
            Field::OriginCountry => &mut self.origin_country,
            Field::FarmName => &mut self.farm_name,
            Field::RoastLevel => &mut self.roast_level,
            Field::RoastDate => &mut self.roast_date,
            Field::QuantityKg => &mut self.quantity_kg,
            Field::CostPerKg => &mut self.cost_per_kg,
            Field::FlavorNotes => &mut self.flavor_notes,
            Field::CaffeineMgPerG => &mut self.caffeine_mg_per_g,
        }
    }

    /// Check every field and build the lot, or report every problem found
    pub fn validate(&self) -> Result<BeanLot, Vec<FieldError>> {
        let mut errors = Vec::new();

        let bean_id = require_non_empty(Field::BeanId, &self.bean_id);
        let origin = require_non_empty(Field::OriginCountry, &self.origin_country);
        let farm = require_non_empty(Field::FarmName, &self.farm_name);
        let roast = parse_roast_level(&self.roast_level);
        let date = parse_roast_date(&self.roast_date);
        let quantity = parse_non_negative_f64(Field::QuantityKg, &self.quantity_kg);
        let cost = parse_non_negative_decimal(Field::CostPerKg, &self.cost_per_kg);
        let notes = require_non_empty(Field::FlavorNotes, &self.flavor_notes);
        let caffeine = parse_non_negative_f64(Field::CaffeineMgPerG, &self.caffeine_mg_per_g);

        match (bean_id, origin, farm, roast, date, quantity, cost, notes, caffeine) {
            (
                Ok(id),
                Ok(origin),
                Ok(farm),
                Ok(roast),
                Ok(date),
                Ok(qty),
                Ok(cost),
                Ok(notes),
                Ok(caf),
            ) => {
                let lot = BeanLot::new(id, origin, farm, roast, date, qty, cost, notes, caf);
                match lot.value() {
                    Ok(_) => Ok(lot),
                    Err(e) => Err(vec![FieldError::Value(e)]),
                }
            }
            (id, origin, farm, roast, date, qty, cost, notes, caf) => {
                collect_err(&mut errors, id);
                collect_err(&mut errors, origin);
                collect_err(&mut errors, farm);
                collect_err(&mut errors, roast);
                collect_err(&mut errors, date);
                collect_err(&mut errors, qty);
                collect_err(&mut errors, cost);
                collect_err(&mut errors, notes);
                collect_err(&mut errors, caf);
                Err(errors)
            }
        }
    }
}

fn collect_err<T>(errors: &mut Vec<FieldError>, result: Result<T, FieldError>) {
    if let Err(e) = result {
        errors.push(e);
    }
}

/// Accept `"2.5"` or `2.5` for numeric fields in JSON bodies
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a number or a string, got {}",
            other
        ))),
    }
}
