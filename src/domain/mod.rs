//! Core domain types and logic.

pub mod asset;
pub mod broker;
pub mod config_validation;
pub mod error;
pub mod fees;
pub mod ledger;
pub mod order;
pub mod position;
pub mod schedule;
pub mod simulation;
pub mod sizer;
pub mod transaction;
pub mod universe;
