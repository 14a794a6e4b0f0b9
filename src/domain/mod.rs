//! Domain layer: aggregates, value objects and the pure pricing rules.
pub mod aggregates;
pub mod checkout;
pub mod discount;
pub mod value_objects;
