//! Core domain model and contracts for tabstage.

pub mod coords;
pub mod diff;
pub mod protocol;
pub mod staging;

pub use protocol::*;
