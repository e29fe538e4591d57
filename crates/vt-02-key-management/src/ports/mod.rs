//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API that token services and operators use
//! - **Outbound (Driven)**: Key storage backend this subsystem needs

pub mod inbound;
pub mod outbound;
