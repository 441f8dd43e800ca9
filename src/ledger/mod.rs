//! Money arithmetic and the database aggregates that feed it.

pub mod balance;
pub mod queries;
pub mod salary;
