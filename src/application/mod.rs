//! Application layer orchestrating the domain over the persistence ports.
//!
//! `LedgerEngine` plays the scheduler role (materializing due occurrences of
//! every rule) and serves status changes requested by users.

pub mod engine;
