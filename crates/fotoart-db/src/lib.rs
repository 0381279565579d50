//! Fotoart persistence layer
//!
//! One repository trait per entity, PostgreSQL implementations on `sqlx`, and
//! (behind `test-helpers`) an in-memory implementation of every trait.

pub mod db;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use db::*;
