//! Runtime orchestration and lifecycle management.
//!
//! # Main Components
//!
//! - [`KioskSystem`] - The orchestrator that spawns all actors and wires
//!   their dependencies
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod kiosk_system;
pub mod tracing;

pub use self::kiosk_system::*;
pub use self::tracing::*;
