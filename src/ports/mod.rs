//! Port traits for external collaborators.

pub mod allocation_port;
pub mod config_port;
pub mod price_port;
