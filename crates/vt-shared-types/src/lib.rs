//! # Shared Types Crate
//!
//! Types every trust subsystem agrees on.
//!
//! ## Design Principles
//!
//! - **Stable error identifiers**: [`ErrorCode`] is the only error vocabulary
//!   exposed to callers outside the workspace.
//! - **Injected time**: all lifecycle and expiry decisions read a [`Clock`].
//! - **Emit, don't store**: audit events go to an [`AuditLogger`]; nothing here
//!   persists them.

pub mod audit;
pub mod clock;
pub mod errors;

pub use audit::*;
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::{ErrorCode, UnknownErrorCode};
