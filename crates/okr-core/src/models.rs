//! Domain models for the OKR system.
//!
//! These are the core types shared across all crates. Every record
//! collection in the backend has exactly one model here.

pub mod checkin;
pub mod company;
pub mod key_result;
pub mod objective;
pub mod objective_group;
pub mod profile;
pub mod quarter;
pub mod quarter_result;
