// Entity Models
//
// Each lot is an immutable value identified by its bean_id.
// The roast level is a closed enumeration parsed from free text.

pub mod bean_lot;
pub mod roast_level;

pub use bean_lot::{exact_value, quantity_to_decimal, BeanLot, ValueError};
pub use roast_level::{RoastLevel, RoastLevelError};
