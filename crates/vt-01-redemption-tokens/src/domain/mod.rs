//! # Domain Layer
//!
//! Claims model, wire codec and validation rules. No I/O.

pub mod claims;
pub mod encoding;
pub mod errors;
pub mod header;
pub mod validation;
