//! Route modules for the fleet reports server

pub mod health;
pub mod reports;
