//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that redemption workflows use
//! - **Outbound (Driven)**: Key lookup this subsystem needs

pub mod inbound;
pub mod outbound;
