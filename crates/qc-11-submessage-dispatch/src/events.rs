//! # Event Schema (EDA Compliance)
//!
//! Defines all IPC message payloads for submessage dispatch.
//! These messages are wrapped in `AuthenticatedMessage<T>` for transport.
//!
//! - **Envelope-Only Identity:** NO `requester_id` fields in payloads
//! - **Correlation IDs:** All request/response pairs use `correlation_id`
//! - **Security Boundaries:** Validated via `envelope.sender_id`
//!
//! ## Authorized Senders
//!
//! | Message Type | Authorized Sender(s) |
//! |--------------|---------------------|
//! | `DispatchSubmessagesRequest` | Subsystems 11, 15 ONLY |

use crate::domain::entities::{DispatchReport, Event, SubMessage, SubMessageReport};
use crate::domain::value_objects::{Address, Bytes, Gas};
use crate::ports::inbound::DispatchRequest;
use serde::{Deserialize, Serialize};

// =============================================================================
// INBOUND EVENTS (From Other Subsystems)
// =============================================================================

/// Request to dispatch the submessages returned by a contract.
///
/// - Authorized senders: Subsystem 11 (Smart Contracts), Subsystem 15 (Cross-Chain)
/// - Identity from `AuthenticatedMessage.sender_id`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSubmessagesRequestPayload {
    // NO requester_id - per Envelope-Only Identity
    /// Issuing contract.
    pub contract: Address,
    /// Protocol identifier of the contract (its port id if `None`).
    pub protocol_id: Option<String>,
    /// Submessages in execution order.
    pub submessages: Vec<SubMessage>,
    /// Gas available to the dispatch (service default if `None`).
    pub gas_limit: Option<Gas>,
}

impl From<DispatchSubmessagesRequestPayload> for DispatchRequest {
    fn from(payload: DispatchSubmessagesRequestPayload) -> Self {
        Self {
            contract: payload.contract,
            protocol_id: payload.protocol_id,
            submessages: payload.submessages,
            gas_limit: payload.gas_limit,
        }
    }
}

// =============================================================================
// OUTBOUND EVENTS (To Other Subsystems)
// =============================================================================

/// Result of a dispatch request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchSubmessagesResponsePayload {
    /// Whether the dispatch completed and its effects were committed.
    pub success: bool,
    /// Final response data (last non-`None` reply data).
    pub data: Option<Bytes>,
    /// Events committed by the dispatch, in emission order.
    pub events: Vec<Event>,
    /// Gas consumed by the whole dispatch.
    pub gas_used: Gas,
    /// Per-submessage reports (empty on abort).
    pub submessages: Vec<SubMessageReport>,
    /// Abort reason (if failed).
    pub error: Option<String>,
}

impl DispatchSubmessagesResponsePayload {
    /// Response for a committed dispatch.
    #[must_use]
    pub fn committed(report: DispatchReport, events: Vec<Event>, gas_used: Gas) -> Self {
        Self {
            success: true,
            data: report.data,
            events,
            gas_used,
            submessages: report.submessages,
            error: None,
        }
    }

    /// Response for an aborted dispatch. Nothing was committed.
    #[must_use]
    pub fn aborted(error: String, gas_used: Gas) -> Self {
        Self {
            success: false,
            gas_used,
            error: Some(error),
            ..Self::default()
        }
    }
}

// =============================================================================
// EVENT BUS TOPICS
// =============================================================================

/// Event topics for the submessage dispatch subsystem.
pub mod topics {
    /// Topic for receiving dispatch requests.
    pub const DISPATCH_SUBMESSAGES_REQUEST: &str = "submessages.dispatch.request";

    /// Topic for publishing dispatch responses.
    pub const DISPATCH_SUBMESSAGES_RESPONSE: &str = "submessages.dispatch.response";

    /// Dead letter queue for aborted dispatches.
    pub const DLQ: &str = "dlq.submessages";
}

// =============================================================================
// SUBSYSTEM ID VALIDATION
// =============================================================================

/// Subsystem IDs for validation.
pub mod subsystem_ids {
    /// Smart Contracts (runs the contracts issuing submessages).
    pub const SMART_CONTRACTS: u8 = 11;

    /// Cross-Chain (contract callbacks for IBC packets).
    pub const CROSS_CHAIN: u8 = 15;

    /// Validates that sender is authorized for `DispatchSubmessagesRequest`.
    #[must_use]
    pub fn is_authorized_dispatch_sender(sender_id: u8) -> bool {
        sender_id == SMART_CONTRACTS || sender_id == CROSS_CHAIN
    }
}

// =============================================================================
// TESTS
// =============================================================================
