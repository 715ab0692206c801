// ☕ Bean Lot Entity - one batch of coffee beans
//
// A lot is a value: it is built whole and never mutated in place.
// Updating a lot means handing the repository a complete replacement
// with the same bean_id.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::roast_level::RoastLevel;

/// The derived value of a lot has no exact Decimal result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("quantity {quantity} of lot {bean_id} has no exact decimal form")]
    Quantity { bean_id: String, quantity: String },

    #[error("value of lot {bean_id} is outside the representable decimal range")]
    Overflow { bean_id: String },

    #[error("value of lot {bean_id} needs more than 28 decimal places")]
    Inexact { bean_id: String },
}

// ============================================================================
// BEAN LOT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeanLot {
    bean_id: String,
    origin_country: String,
    farm_name: String,
    roast_level: RoastLevel,
    roast_date: NaiveDate,
    quantity_kg: f64,
    cost_per_kg: Decimal,
    flavor_notes: String,
    caffeine_mg_per_g: f64,
}

impl BeanLot {
    /// Build a lot from already-validated values.
    ///
    /// No range checks happen here; the import parser and the interactive
    /// front ends are responsible for handing over well-formed values
    /// (see `crate::validation`).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bean_id: impl Into<String>,
        origin_country: impl Into<String>,
        farm_name: impl Into<String>,
        roast_level: RoastLevel,
        roast_date: NaiveDate,
        quantity_kg: f64,
        cost_per_kg: Decimal,
        flavor_notes: impl Into<String>,
        caffeine_mg_per_g: f64,
    ) -> Self {
        BeanLot {
            bean_id: bean_id.into(),
            origin_country: origin_country.into(),
            farm_name: farm_name.into(),
            roast_level,
            roast_date,
            quantity_kg,
            cost_per_kg,
            flavor_notes: flavor_notes.into(),
            caffeine_mg_per_g,
        }
    }

    pub fn bean_id(&self) -> &str {
        &self.bean_id
    }

    pub fn origin_country(&self) -> &str {
        &self.origin_country
    }

    pub fn farm_name(&self) -> &str {
        &self.farm_name
    }

    pub fn roast_level(&self) -> RoastLevel {
        self.roast_level
    }

    pub fn roast_date(&self) -> NaiveDate {
        self.roast_date
    }

    pub fn quantity_kg(&self) -> f64 {
        self.quantity_kg
    }

    pub fn cost_per_kg(&self) -> Decimal {
        self.cost_per_kg
    }

    pub fn flavor_notes(&self) -> &str {
        &self.flavor_notes
    }

    pub fn caffeine_mg_per_g(&self) -> f64 {
        self.caffeine_mg_per_g
    }

    /// Monetary value of the lot: quantity_kg × cost_per_kg.
    ///
    /// Computed on every call, never cached. The quantity is brought into
    /// decimal through its shortest round-trip text form, so 3.333 kg counts
    /// as exactly 3.333 and not as the nearest binary fraction.
    pub fn value(&self) -> Result<Decimal, ValueError> {
        exact_value(&self.bean_id, self.quantity_kg, self.cost_per_kg)
    }
}

/// quantity_kg × cost_per_kg, or an error when Decimal would have to round
pub fn exact_value(
    bean_id: &str,
    quantity_kg: f64,
    cost_per_kg: Decimal,
) -> Result<Decimal, ValueError> {
    let quantity = quantity_to_decimal(quantity_kg).ok_or_else(|| ValueError::Quantity {
        bean_id: bean_id.to_string(),
        quantity: quantity_kg.to_string(),
    })?;

    let product = quantity
        .checked_mul(cost_per_kg)
        .ok_or_else(|| ValueError::Overflow {
            bean_id: bean_id.to_string(),
        })?;

    // checked_mul drops fractional digits past scale 28 instead of failing
    let exact = if product.is_zero() {
        quantity.is_zero() || cost_per_kg.is_zero()
    } else {
        product.scale() == quantity.scale() + cost_per_kg.scale()
    };
    if !exact {
        return Err(ValueError::Inexact {
            bean_id: bean_id.to_string(),
        });
    }

    Ok(product)
}

/// Exact decimal equivalent of the shortest text form of `quantity`.
///
/// `None` when no Decimal holds that text exactly: non-finite values,
/// values beyond the 96-bit range, or more than 28 fractional digits.
pub fn quantity_to_decimal(quantity: f64) -> Option<Decimal> {
    if !quantity.is_finite() {
        return None;
    }
    if quantity == 0.0 {
        return Some(Decimal::ZERO);
    }

    let text = quantity.to_string();
    let decimal = Decimal::from_str(&text).ok()?;
    (decimal.to_string() == text).then_some(decimal)
}

impl fmt::Display for BeanLot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {} | {} | {:.2} kg | ${}/kg | {} | {:.2} mg/g",
            self.bean_id,
            self.origin_country,
            self.farm_name,
            self.roast_level,
            self.roast_date.format("%Y-%m-%d"),
            self.quantity_kg,
            self.cost_per_kg,
            self.flavor_notes,
            self.caffeine_mg_per_g,
        )
    }
}
