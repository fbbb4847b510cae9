pub mod action_reader;
pub mod rule_reader;
pub mod transaction_writer;
