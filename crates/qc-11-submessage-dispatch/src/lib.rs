//! # QC-11 Submessage Dispatch - Contract Submessage & Reply Subsystem
//!
//! **Subsystem ID:** 11
//! **Architecture:** Architecture.md v2.3, IPC-MATRIX.md v2.3
//!
//! ## Purpose
//!
//! Executes the submessages a contract returns, strictly in order. Each one
//! runs in an isolated context, optionally under its own gas ceiling. Its
//! effects are committed or discarded according to the outcome, and the
//! issuing contract is called back through its `reply` entry point when its
//! reply policy asks for it.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Contract address attribute first and unique | `domain/event_builder.rs` - `new_module_event()`, `new_custom_events()` |
//! | INVARIANT-2 | No reserved attribute keys | `domain/event_builder.rs` - `contract_attributes()` |
//! | INVARIANT-3 | Reply echoes id and payload | `dispatcher.rs` - `send_reply()` |
//! | INVARIANT-4 | Visible events are a subsequence of the full log | `domain/event_filter.rs` - `filter()` |
//! | INVARIANT-5 | Gas limit never exceeded | `context/gas.rs` - `scoped_charge()` |
//!
//! ## Security (IPC-MATRIX.md)
//!
//! - **Envelope-Only Identity**: Identity derived solely from `sender_id`
//! - **Isolation**: A failed submessage leaves no state and no events behind
//! - **Error Redaction**: Reply errors carry only `codespace` and `code` by default
//!
//! ### IPC Authorization Matrix
//!
//! | Message | Authorized Sender(s) | Enforcement |
//! |---------|---------------------|-------------|
//! | `DispatchSubmessagesRequest` | Smart Contracts (11), Cross-Chain (15) | `service.rs` - `handle_dispatch_submessages()` |
//!
//! ## Outbound Dependencies
//!
//! | Component | Trait | Purpose |
//! |-----------|-------|---------|
//! | Message routing | `MessageHandler` | Execute bank, wasm, IBC and custom messages |
//! | Contract sandbox | `ContractRuntime` | Contract `reply` entry point |
//! | 4 (State Mgmt) | `CommittedStore` | Committed state of the transaction |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Dispatcher | `dispatcher.rs` | Ordered execution, reply policies |
//! | Contexts | `context/` | Isolated layers, gas meters |
//! | Event Constructor | `domain/event_builder.rs` | `wasm` / `wasm-*` events |
//! | Event Filter | `domain/event_filter.rs` | Contract-visible events |
//! | Replyer | `adapters/contract_replyer.rs` | Reply delivery, nested dispatch |
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc_11_submessage_dispatch::prelude::*;
//!
//! let dispatcher = MessageDispatcher::new(router, replyer);
//! let mut ctx = ExecutionContext::root(&mut arena, &mut meter);
//! let report = dispatcher.dispatch(&mut ctx, &contract, &port_id, &submessages)?;
//! println!("Reply data: {:?}", report.data);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod context;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        AnyMessage, BankMessage, ContractMessage, ContractResponse, DispatchOutcome,
        DispatchReport, DispatcherConfig, Event, EventAttribute, EventFilterConfig, IbcMessage,
        IbcTimeout, MessageKind, ProtocolResponse, Reply, ReplyPolicy, SubMessage,
        SubMessageReport, SubMsgResponse, SubMsgResult, WasmMessage,
    };

    // Value objects
    pub use crate::domain::value_objects::{Address, Bytes, Coin, Gas, U256};

    // Domain services
    pub use crate::domain::event_builder::{new_custom_events, new_module_event};
    pub use crate::domain::event_filter::{EventFilter, FilteredEvents};
    pub use crate::domain::services::{
        contract_from_port_id, ibc_v2_port_id_for_contract, port_id_for_contract,
    };

    // Invariants
    pub use crate::domain::invariants::{InvariantCheckResult, InvariantViolation};

    // Contexts
    pub use crate::context::{BasicGasMeter, ContextArena, ExecutionContext, GasMeter, LayerId};

    // Dispatcher
    pub use crate::dispatcher::MessageDispatcher;

    // Ports
    pub use crate::ports::inbound::{
        DispatchRequest, DispatchResult, SubmessageApi, SubmessageDispatch,
    };
    pub use crate::ports::outbound::{CommittedStore, ContractRuntime, MessageHandler, Replyer};

    // Events
    pub use crate::events::{
        subsystem_ids, topics, DispatchSubmessagesRequestPayload,
        DispatchSubmessagesResponsePayload,
    };

    // Errors
    pub use crate::errors::{
        ConfigError, DispatchError, EventError, HandlerError, IpcError, ReplyError,
    };

    // Adapters
    pub use crate::adapters::{BankHandler, ContractReplyer, InMemoryStore, MessageRouter};

    // Service
    pub use crate::service::{ServiceConfig, ServiceStats, SubmessageService};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID for IPC (per IPC-MATRIX.md).
pub const SUBSYSTEM_ID: u8 = 11;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Submessage Dispatch";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_id() {
        assert_eq!(SUBSYSTEM_ID, events::subsystem_ids::SMART_CONTRACTS);
    }

    #[test]
    fn test_prelude_exports() {
        // Verify prelude exports compile
        use prelude::*;
        let _ = DispatcherConfig::default();
        let _ = Address::ZERO;
        let _ = ReplyPolicy::default();
    }
}
