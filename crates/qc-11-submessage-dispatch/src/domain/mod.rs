//! # Domain Layer (Inner Hexagon)
//!
//! Pure business logic for submessage dispatch.
//! NO I/O, NO async, NO external dependencies.
//!
//! - This is the **inner layer** of the hexagonal architecture.
//! - All types here are pure domain concepts.
//! - Dependencies point INWARD only (adapters depend on this, not vice versa).

pub mod entities;
pub mod event_builder;
pub mod event_filter;
pub mod invariants;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use event_builder::*;
pub use event_filter::*;
pub use invariants::*;
pub use services::*;
pub use value_objects::*;
