//! Domain layer: plain data types and the pure logic operating on them.
//!
//! Nothing in here performs I/O; persistence is reached through the traits
//! in [`ports`].

pub mod amount;
pub mod lifecycle;
pub mod ports;
pub mod recurrence;
pub mod summary;
pub mod transaction;
