//! # Domain Layer
//!
//! Key records, lifecycle rules and errors. No I/O.

pub mod entities;
pub mod errors;
pub mod lifecycle;
