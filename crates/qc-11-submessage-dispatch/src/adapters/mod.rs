//! # Adapters Layer (Outer Hexagon)
//!
//! Adapters connect the dispatcher to message handlers, the contract sandbox
//! and committed state.
//!
//! - Adapters implement ports, never the other way around
//! - All external communication via Event Bus (EDA pattern)

pub mod bank_handler;
pub mod contract_replyer;
pub mod memory_store;
pub mod message_router;

pub use bank_handler::*;
pub use contract_replyer::*;
pub use memory_store::*;
pub use message_router::*;
