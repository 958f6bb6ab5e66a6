//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for submessage dispatch.
//! These are the interfaces between the domain and the outside world.
//!
//! - **Driving Ports (Inbound)**: `SubmessageDispatch`, `SubmessageApi`
//! - **Driven Ports (Outbound)**: `MessageHandler`, `Replyer`, `ContractRuntime`, `CommittedStore`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
